//! Flattens nested dashboard events into store entities.

use crate::models::{FbId, ImportedEvent, ImportedEventPayload};
use crate::store::Entities;

/// Result id(s) plus the entities extracted from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized<R> {
    pub result: R,
    pub entities: Entities,
}

fn flatten_into(payload: ImportedEventPayload, entities: &mut Entities) -> FbId {
    let ImportedEventPayload {
        id,
        fbid,
        details,
        categories,
    } = payload;

    let category_ids = categories.iter().map(|c| c.id).collect();
    for category in categories {
        entities.categories.insert(category.id, category);
    }

    entities.imported_events.insert(
        fbid.clone(),
        ImportedEvent {
            id,
            fbid: fbid.clone(),
            details,
            categories: category_ids,
        },
    );
    fbid
}

/// Normalizes a single imported event; `result` is its `fbid`.
pub fn normalize_one(payload: ImportedEventPayload) -> Normalized<FbId> {
    let mut entities = Entities::default();
    let result = flatten_into(payload, &mut entities);
    Normalized { result, entities }
}

/// Normalizes a list of imported events; `result` keeps the input order.
pub fn normalize_many(payloads: Vec<ImportedEventPayload>) -> Normalized<Vec<FbId>> {
    let mut entities = Entities::default();
    let result = payloads
        .into_iter()
        .map(|p| flatten_into(p, &mut entities))
        .collect();
    Normalized { result, entities }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> ImportedEventPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_one_flattens_categories() {
        let normalized = normalize_one(payload(json!({
            "id": 10,
            "fbid": "111",
            "name": "Party",
            "categories": [
                { "id": 1, "description": "Music" },
                { "id": 3, "description": "Food" }
            ]
        })));

        assert_eq!(normalized.result, "111");
        let event = &normalized.entities.imported_events["111"];
        assert_eq!(event.id, Some(10));
        assert_eq!(event.categories, vec![1, 3]);
        assert_eq!(event.details.name.as_deref(), Some("Party"));
        assert_eq!(
            normalized.entities.categories[&3].description.as_deref(),
            Some("Food")
        );
        assert!(normalized.entities.fb_events.is_empty());
    }

    #[test]
    fn test_normalize_many_keeps_order() {
        let normalized = normalize_many(vec![
            payload(json!({ "id": 2, "fbid": "222" })),
            payload(json!({ "id": 1, "fbid": "111" })),
        ]);

        assert_eq!(normalized.result, vec!["222".to_string(), "111".to_string()]);
        assert_eq!(normalized.entities.imported_events.len(), 2);
    }

    #[test]
    fn test_malformed_event_yields_absent_fields() {
        let normalized = normalize_one(payload(json!({})));
        assert_eq!(normalized.result, "");
        assert_eq!(normalized.entities.imported_events[""].id, None);
    }
}
