//! Normalized entity store.
//!
//! Entities are keyed by type, then by id. `merge` and `remove` are the only
//! ways to change what is stored.

use crate::models::{Category, CategoryId, FacebookEvent, FbId, ImportedEvent};
use std::collections::HashMap;

/// A batch of entities grouped by type, as produced by the normalizer and the
/// workflows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub fb_events: HashMap<FbId, FacebookEvent>,
    pub imported_events: HashMap<FbId, ImportedEvent>,
    pub categories: HashMap<CategoryId, Category>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.fb_events.is_empty()
            && self.imported_events.is_empty()
            && self.categories.is_empty()
    }

    pub fn with_fb_event(mut self, event: FacebookEvent) -> Self {
        self.fb_events.insert(event.fbid.clone(), event);
        self
    }

    pub fn with_imported_event(mut self, event: ImportedEvent) -> Self {
        self.imported_events.insert(event.fbid.clone(), event);
        self
    }

    /// Folds `other` into `self`; entries from `other` win on id clashes.
    pub fn extend(&mut self, other: Entities) {
        self.fb_events.extend(other.fb_events);
        self.imported_events.extend(other.imported_events);
        self.categories.extend(other.categories);
    }
}

/// Ids to drop, grouped by type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityKeys {
    pub fb_events: Vec<FbId>,
    pub imported_events: Vec<FbId>,
    pub categories: Vec<CategoryId>,
}

impl EntityKeys {
    pub fn imported_event(fbid: &str) -> Self {
        Self {
            imported_events: vec![fbid.to_string()],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fb_events.is_empty()
            && self.imported_events.is_empty()
            && self.categories.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: Entities,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts every entity in the batch. Records are replaced whole: callers
    /// carry unchanged fields forward themselves.
    pub fn merge(&mut self, batch: Entities) {
        self.entities.extend(batch);
    }

    pub fn remove(&mut self, keys: &EntityKeys) {
        for fbid in &keys.fb_events {
            self.entities.fb_events.remove(fbid);
        }
        for fbid in &keys.imported_events {
            self.entities.imported_events.remove(fbid);
        }
        for id in &keys.categories {
            self.entities.categories.remove(id);
        }
    }

    pub fn fb_event(&self, fbid: &str) -> Option<&FacebookEvent> {
        self.entities.fb_events.get(fbid)
    }

    pub fn imported_event(&self, fbid: &str) -> Option<&ImportedEvent> {
        self.entities.imported_events.get(fbid)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.entities.categories.get(&id)
    }

    pub fn is_imported(&self, fbid: &str) -> bool {
        self.entities.imported_events.contains_key(fbid)
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }
}
