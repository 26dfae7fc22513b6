//! Endpoint helpers: one typed call per graph or dashboard endpoint.

use super::Importer;
use crate::error::ImportError;
use crate::gateway::{DashboardRequest, UpstreamError};
use crate::models::{
    Category, CategoryId, EventId, FacebookEvent, FbId, GraphEvent, ImportedEventPayload, PostsPage,
};
use crate::normalize::{normalize_many, normalize_one, Normalized};
use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Event fields requested from the graph for import.
pub const FB_EVENT_FIELDS: &[&str] = &[
    "name",
    "description",
    "start_time",
    "end_time",
    "cover",
    "place",
    "attending_count",
];

fn fields() -> String {
    FB_EVENT_FIELDS.join(",")
}

pub(crate) fn first_page_path(source: &str) -> String {
    format!("/{source}/posts?fields=link&pretty=0")
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, UpstreamError> {
    serde_json::from_value(value).map_err(UpstreamError::malformed)
}

/// Decodes a JSON array element by element, skipping entries that do not fit.
fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, UpstreamError> {
    let items: Vec<Value> = decode(value)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping malformed list entry: {}", e);
                None
            }
        })
        .collect())
}

impl Importer {
    async fn graph_get(&self, path: &str) -> Result<Value, ImportError> {
        self.graph.get(path).await.map_err(ImportError::Graph)
    }

    async fn dashboard_call(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<Value, ImportError> {
        let mut request =
            DashboardRequest::new(method, path).csrf_token(self.session.csrf_token());
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dashboard
            .send(request)
            .await
            .map_err(ImportError::Dashboard)
    }

    pub(crate) async fn page_posts(&self, url: &str) -> Result<PostsPage, ImportError> {
        let value = self.graph_get(url).await?;
        decode(value).map_err(ImportError::Graph)
    }

    /// Graph events keyed by id; ids the graph did not return are absent.
    pub(crate) async fn fb_events_by_ids(
        &self,
        fbids: &[FbId],
    ) -> Result<HashMap<FbId, FacebookEvent>, ImportError> {
        let path = format!("/?ids={}&fields={}&pretty=0", fbids.join(","), fields());
        let value = self.graph_get(&path).await?;
        let nodes: HashMap<FbId, Value> = decode(value).map_err(ImportError::Graph)?;

        let mut events = HashMap::with_capacity(nodes.len());
        for (key, node) in nodes {
            if !node.is_object() {
                debug!("Graph returned no event body for {}", key);
                continue;
            }
            let mut event: GraphEvent = decode(node).map_err(ImportError::Graph)?;
            if event.id.is_empty() {
                event.id = key.clone();
            }
            events.insert(key, event.into_facebook_event());
        }
        Ok(events)
    }

    pub(crate) async fn fb_event_by_id(&self, fbid: &str) -> Result<FacebookEvent, ImportError> {
        let path = format!("/{fbid}?fields={}&pretty=0", fields());
        let value = self.graph_get(&path).await?;
        let mut event: GraphEvent = decode(value).map_err(ImportError::Graph)?;
        if event.id.is_empty() {
            event.id = fbid.to_string();
        }
        Ok(event.into_facebook_event())
    }

    pub(crate) async fn imported_events_by_fbids(
        &self,
        fbids: &[FbId],
    ) -> Result<Normalized<Vec<FbId>>, ImportError> {
        let path = format!("/events/fb?fbids={}", fbids.join(","));
        let value = self.dashboard_call(Method::GET, path, None).await?;
        let payloads: Vec<ImportedEventPayload> =
            decode_list(value).map_err(ImportError::Dashboard)?;
        Ok(normalize_many(payloads))
    }

    pub(crate) async fn create_imported_event(
        &self,
        event: &FacebookEvent,
    ) -> Result<Normalized<FbId>, ImportError> {
        let body = serde_json::to_value(event)?;
        let value = self
            .dashboard_call(Method::POST, "/events/fb".to_string(), Some(body))
            .await?;
        let payload: ImportedEventPayload = decode(value).map_err(ImportError::Dashboard)?;
        Ok(normalize_one(payload))
    }

    /// Overwrites the record stored under `fbid`, whatever id the graph echoed
    /// back in `event`.
    pub(crate) async fn update_imported_event(
        &self,
        fbid: &str,
        event: &FacebookEvent,
    ) -> Result<Normalized<FbId>, ImportError> {
        let body = serde_json::to_value(event)?;
        let path = format!("/events/fb/{fbid}");
        let value = self.dashboard_call(Method::PUT, path, Some(body)).await?;
        let payload: ImportedEventPayload = decode(value).map_err(ImportError::Dashboard)?;
        Ok(normalize_one(payload))
    }

    pub(crate) async fn delete_imported(&self, fbid: &str) -> Result<(), ImportError> {
        self.dashboard_call(Method::DELETE, format!("/events/fb/{fbid}"), None)
            .await?;
        Ok(())
    }

    pub(crate) async fn attach_category(
        &self,
        event_id: EventId,
        category: CategoryId,
    ) -> Result<(), ImportError> {
        let body = json!({ "categories": [category] });
        let path = format!("/events/{event_id}/categories");
        self.dashboard_call(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    pub(crate) async fn detach_category(
        &self,
        event_id: EventId,
        category: CategoryId,
    ) -> Result<(), ImportError> {
        let path = format!("/events/{event_id}/categories/{category}");
        self.dashboard_call(Method::DELETE, path, None).await?;
        Ok(())
    }

    pub(crate) async fn fetch_categories(&self) -> Result<Vec<Category>, ImportError> {
        let value = self
            .dashboard_call(Method::GET, "/categories".to_string(), None)
            .await?;
        decode_list(value).map_err(ImportError::Dashboard)
    }
}
