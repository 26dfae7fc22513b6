//! Event and category types shared by the gateways, the normalizer and the store.
//!
//! Wire bodies on both upstreams are snake_case, which is also how the Rust
//! fields are named, so the derived serde names double as the key-case
//! conversion layer at the boundary.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Facebook object identifier, always handled as a string.
pub type FbId = String;
/// Dashboard category identifier.
pub type CategoryId = u64;
/// Dashboard-internal identifier of an imported event.
pub type EventId = u64;

/// Flattened place location as found under `place.location` on the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub street: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub zip: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub country: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
}

/// Descriptive fields common to a Facebook event and its imported record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub fb_attending_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub fb_cover_image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub place_name: Option<String>,
    #[serde(flatten)]
    pub location: Location,
}

/// An event as read from the social graph, reshaped for import.
///
/// This is also the exact body posted to the dashboard when importing or
/// resyncing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookEvent {
    #[serde(default, deserialize_with = "lenient_id")]
    pub fbid: FbId,
    #[serde(flatten)]
    pub details: EventDetails,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

impl FacebookEvent {
    /// Copy of the event with its category choice dropped.
    pub fn without_categories(&self) -> Self {
        Self {
            categories: Vec::new(),
            ..self.clone()
        }
    }
}

/// Normalized dashboard record; categories are reduced to their ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedEvent {
    #[serde(default)]
    pub id: Option<EventId>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub fbid: FbId,
    #[serde(flatten)]
    pub details: EventDetails,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub description: Option<String>,
}

/// Imported event exactly as the dashboard returns it, categories nested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportedEventPayload {
    #[serde(default, deserialize_with = "lenient_count")]
    pub id: Option<EventId>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub fbid: FbId,
    #[serde(flatten)]
    pub details: EventDetails,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphCover {
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Event node as served by the graph API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphEvent {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: FbId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(
        default,
        alias = "attendingCount",
        deserialize_with = "lenient_count"
    )]
    pub attending_count: Option<u64>,
    #[serde(default)]
    pub cover: Option<GraphCover>,
    #[serde(default)]
    pub place: Option<GraphPlace>,
}

impl GraphEvent {
    /// Renames graph fields into the import shape; categories always start empty.
    pub fn into_facebook_event(self) -> FacebookEvent {
        let (place_name, location) = match self.place {
            Some(place) => (place.name, place.location.unwrap_or_default()),
            None => (None, Location::default()),
        };

        FacebookEvent {
            fbid: self.id,
            details: EventDetails {
                name: self.name,
                description: self.description,
                start_time: self.start_time,
                end_time: self.end_time,
                fb_attending_count: self.attending_count,
                fb_cover_image_url: self.cover.and_then(|c| c.source),
                place_name,
                location,
            },
            categories: Vec::new(),
        }
    }
}

/// One entry of `/{page}/posts?fields=link`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub link: Option<String>,
}

/// Graph paging block, kept verbatim between loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsPage {
    #[serde(default)]
    pub data: Vec<Post>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

// Ids come back as strings from the graph but the dashboard may serialize
// them as numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<FbId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        Some(IdRepr::Text(s)) => s,
        Some(IdRepr::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

// Scalar fields of a record that has the wrong JSON type read as absent
// instead of failing the whole record. Numbers stored as strings (decimal
// columns, for one) are parsed.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
