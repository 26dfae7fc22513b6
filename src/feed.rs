//! Per-source import feed state and the signals that drive it.
//!
//! Workflows never touch this state directly: they emit [`Signal`]s and
//! [`ImportState::apply`] folds them in.

use crate::models::{CategoryId, EventDetails, EventId, FbId, Paging};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Page id (or name) whose post feed is being imported.
pub type SourceId = String;

/// The workflow a signal belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadEvents { source: SourceId },
    ImportEvent { source: SourceId, fbid: FbId },
    DeleteImportedEvent { source: SourceId, fbid: FbId },
    ResyncImportedEvent { source: SourceId, fbid: FbId },
    AddCategory { source: SourceId, fbid: FbId },
    RemoveCategory { source: SourceId, fbid: FbId },
    LoadCategories,
}

/// Summary of one load of candidate events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedPage {
    pub paging: Paging,
    pub ids: Vec<FbId>,
    pub received_at: DateTime<Utc>,
}

impl LoadedPage {
    pub fn now(paging: Paging, ids: Vec<FbId>) -> Self {
        Self {
            paging,
            ids,
            received_at: Utc::now(),
        }
    }
}

/// What a completed workflow reports besides the entities it merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    None,
    Page(LoadedPage),
    Categories(Vec<CategoryId>),
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::None
    }
}

impl From<LoadedPage> for Payload {
    fn from(page: LoadedPage) -> Self {
        Payload::Page(page)
    }
}

impl From<Vec<CategoryId>> for Payload {
    fn from(ids: Vec<CategoryId>) -> Self {
        Payload::Categories(ids)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Started(Action),
    Completed(Action, Payload),
    Failed(Action, String),
    ShowAlreadyImported { source: SourceId },
    HideAlreadyImported { source: SourceId },
    ShowFullDescription { source: SourceId, fbid: FbId },
    ShowLessDescription { source: SourceId, fbid: FbId },
}

/// Transient per-event UI flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUi {
    pub importing: bool,
    pub deleting: bool,
    /// Resync in flight.
    pub saving: bool,
    pub saving_categories: bool,
    pub show_full_description: bool,
    pub error: Option<String>,
}

/// Cursor and UI state for one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportFeed {
    /// Opaque paging URL for the next load, as handed back by the graph.
    pub next_url: Option<String>,
    /// Every Facebook id offered so far, in load order.
    pub ids: Vec<FbId>,
    pub loading: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub show_already_imported: bool,
    pub events_ui: HashMap<FbId, EventUi>,
}

impl ImportFeed {
    pub fn can_load_more(&self) -> bool {
        self.next_url.is_some()
    }

    pub fn event_ui(&self, fbid: &str) -> EventUi {
        self.events_ui.get(fbid).cloned().unwrap_or_default()
    }
}

/// Categories the operator can tag events with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryList {
    pub ids: Vec<CategoryId>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportState {
    feeds: HashMap<SourceId, ImportFeed>,
    pub categories: CategoryList,
}

#[derive(Clone, Copy)]
enum Phase<'a> {
    Start,
    Done,
    Fail(&'a str),
}

impl ImportState {
    pub fn feed(&self, source: &str) -> Option<&ImportFeed> {
        self.feeds.get(source)
    }

    fn feed_mut(&mut self, source: &str) -> &mut ImportFeed {
        self.feeds.entry(source.to_string()).or_default()
    }

    fn event_ui_mut(&mut self, source: &str, fbid: &str) -> &mut EventUi {
        self.feed_mut(source)
            .events_ui
            .entry(fbid.to_string())
            .or_default()
    }

    pub fn apply(&mut self, signal: &Signal) {
        match signal {
            Signal::Started(action) => self.apply_action(action, Phase::Start, &Payload::None),
            Signal::Completed(action, payload) => self.apply_action(action, Phase::Done, payload),
            Signal::Failed(action, error) => {
                self.apply_action(action, Phase::Fail(error), &Payload::None)
            }
            Signal::ShowAlreadyImported { source } => {
                self.feed_mut(source).show_already_imported = true
            }
            Signal::HideAlreadyImported { source } => {
                self.feed_mut(source).show_already_imported = false
            }
            Signal::ShowFullDescription { source, fbid } => {
                self.event_ui_mut(source, fbid).show_full_description = true
            }
            Signal::ShowLessDescription { source, fbid } => {
                self.event_ui_mut(source, fbid).show_full_description = false
            }
        }
    }

    fn apply_action(&mut self, action: &Action, phase: Phase<'_>, payload: &Payload) {
        match action {
            Action::LoadEvents { source } => {
                let feed = self.feed_mut(source);
                match phase {
                    Phase::Start => {
                        feed.loading = true;
                        feed.error = None;
                    }
                    Phase::Done => {
                        feed.loading = false;
                        if let Payload::Page(page) = payload {
                            for id in &page.ids {
                                if !feed.ids.contains(id) {
                                    feed.ids.push(id.clone());
                                }
                            }
                            feed.next_url = page.paging.next.clone();
                            feed.received_at = Some(page.received_at);
                        }
                    }
                    Phase::Fail(error) => {
                        feed.loading = false;
                        feed.error = Some(error.to_string());
                    }
                }
            }
            Action::ImportEvent { source, fbid } => {
                let ui = self.event_ui_mut(source, fbid);
                set_flag(ui, phase, |ui| &mut ui.importing);
            }
            Action::DeleteImportedEvent { source, fbid } => {
                let ui = self.event_ui_mut(source, fbid);
                set_flag(ui, phase, |ui| &mut ui.deleting);
            }
            Action::ResyncImportedEvent { source, fbid } => {
                let ui = self.event_ui_mut(source, fbid);
                set_flag(ui, phase, |ui| &mut ui.saving);
            }
            Action::AddCategory { source, fbid } | Action::RemoveCategory { source, fbid } => {
                let ui = self.event_ui_mut(source, fbid);
                set_flag(ui, phase, |ui| &mut ui.saving_categories);
            }
            Action::LoadCategories => {
                let list = &mut self.categories;
                match phase {
                    Phase::Start => {
                        list.loading = true;
                        list.error = None;
                    }
                    Phase::Done => {
                        list.loading = false;
                        if let Payload::Categories(ids) = payload {
                            list.ids = ids.clone();
                        }
                    }
                    Phase::Fail(error) => {
                        list.loading = false;
                        list.error = Some(error.to_string());
                    }
                }
            }
        }
    }
}

fn set_flag(ui: &mut EventUi, phase: Phase<'_>, flag: impl Fn(&mut EventUi) -> &mut bool) {
    match phase {
        Phase::Start => {
            *flag(ui) = true;
            ui.error = None;
        }
        Phase::Done => *flag(ui) = false,
        Phase::Fail(error) => {
            *flag(ui) = false;
            ui.error = Some(error.to_string());
        }
    }
}

/// Category as shown on an event: every known category, marked when the
/// event carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub id: CategoryId,
    pub description: Option<String>,
    pub imported: bool,
}

/// An event of a feed joined with its store records.
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    pub fbid: FbId,
    /// Dashboard id when the event is imported.
    pub imported_id: Option<EventId>,
    pub imported: bool,
    pub details: EventDetails,
    pub categories: Vec<CategoryView>,
    pub ui: EventUi,
}

impl EventView {
    pub fn has_long_description(&self, preview_chars: usize) -> bool {
        self.details
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > preview_chars)
    }
}

/// Events of `source` in load order. Imported events are hidden unless the
/// feed's filter asks for them; ids with no record in the store are skipped.
pub fn visible_events(state: &ImportState, store: &EntityStore, source: &str) -> Vec<EventView> {
    let Some(feed) = state.feed(source) else {
        return Vec::new();
    };

    feed.ids
        .iter()
        .filter_map(|fbid| {
            let records = (store.imported_event(fbid), store.fb_event(fbid));
            let (imported_id, details, carried) = match records {
                (Some(imported), _) => (
                    imported.id,
                    imported.details.clone(),
                    &imported.categories,
                ),
                (None, Some(fb_event)) => (None, fb_event.details.clone(), &fb_event.categories),
                (None, None) => return None,
            };
            let imported = store.is_imported(fbid);
            if imported && !feed.show_already_imported {
                return None;
            }

            let categories = state
                .categories
                .ids
                .iter()
                .map(|id| CategoryView {
                    id: *id,
                    description: store.category(*id).and_then(|c| c.description.clone()),
                    imported: carried.contains(id),
                })
                .collect();

            Some(EventView {
                fbid: fbid.clone(),
                imported_id,
                imported,
                details,
                categories,
                ui: feed.event_ui(fbid),
            })
        })
        .collect()
}

/// Number of offered events that are already imported.
pub fn already_imported_count(state: &ImportState, store: &EntityStore, source: &str) -> usize {
    state.feed(source).map_or(0, |feed| {
        feed.ids
            .iter()
            .filter(|id| store.is_imported(id))
            .count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, FacebookEvent, ImportedEvent};
    use crate::store::Entities;
    use pretty_assertions::assert_eq;

    fn load(source: &str) -> Action {
        Action::LoadEvents {
            source: source.to_string(),
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> Payload {
        Payload::Page(LoadedPage::now(
            Paging {
                next: next.map(str::to_string),
                ..Default::default()
            },
            ids.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn test_load_complete_appends_without_duplicates() {
        let mut state = ImportState::default();
        state.apply(&Signal::Started(load("page")));
        assert!(state.feed("page").unwrap().loading);

        state.apply(&Signal::Completed(
            load("page"),
            page(&["1", "2"], Some("https://next")),
        ));
        state.apply(&Signal::Completed(load("page"), page(&["2", "3"], None)));

        let feed = state.feed("page").unwrap();
        assert_eq!(feed.ids, vec!["1", "2", "3"]);
        assert!(!feed.loading);
        assert!(feed.received_at.is_some());
        assert!(!feed.can_load_more());
    }

    #[test]
    fn test_load_failure_records_error() {
        let mut state = ImportState::default();
        state.apply(&Signal::Started(load("page")));
        state.apply(&Signal::Failed(
            load("page"),
            "Facebook error: nope".to_string(),
        ));

        let feed = state.feed("page").unwrap();
        assert!(!feed.loading);
        assert_eq!(feed.error.as_deref(), Some("Facebook error: nope"));
    }

    #[test]
    fn test_event_flags_follow_phases() {
        let mut state = ImportState::default();
        let action = Action::DeleteImportedEvent {
            source: "page".to_string(),
            fbid: "1".to_string(),
        };

        state.apply(&Signal::Started(action.clone()));
        assert!(state.feed("page").unwrap().event_ui("1").deleting);

        state.apply(&Signal::Failed(action, "Server Error".to_string()));
        let ui = state.feed("page").unwrap().event_ui("1");
        assert!(!ui.deleting);
        assert_eq!(ui.error.as_deref(), Some("Server Error"));
    }

    #[test]
    fn test_visible_events_hide_imported_by_default() {
        let mut state = ImportState::default();
        state.apply(&Signal::Completed(
            load("page"),
            page(&["1", "2", "3"], None),
        ));
        state.apply(&Signal::Completed(
            Action::LoadCategories,
            Payload::Categories(vec![7, 8]),
        ));

        let mut store = EntityStore::new();
        store.merge(Entities {
            categories: HashMap::from([(
                7,
                Category {
                    id: 7,
                    description: Some("Music".to_string()),
                },
            )]),
            ..Default::default()
        });
        store.merge(
            Entities::default()
                .with_fb_event(FacebookEvent {
                    fbid: "1".to_string(),
                    categories: vec![8],
                    ..Default::default()
                })
                .with_imported_event(ImportedEvent {
                    id: Some(40),
                    fbid: "2".to_string(),
                    categories: vec![7],
                    ..Default::default()
                }),
        );

        let views = visible_events(&state, &store, "page");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].fbid, "1");
        assert_eq!(
            views[0].categories,
            vec![
                CategoryView {
                    id: 7,
                    description: Some("Music".to_string()),
                    imported: false,
                },
                CategoryView {
                    id: 8,
                    description: None,
                    imported: true,
                },
            ]
        );
        assert_eq!(already_imported_count(&state, &store, "page"), 1);

        state.apply(&Signal::ShowAlreadyImported {
            source: "page".to_string(),
        });
        let views = visible_events(&state, &store, "page");
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].imported_id, Some(40));
        assert!(views[1].categories[0].imported);
    }

    #[test]
    fn test_description_toggle() {
        let mut state = ImportState::default();
        let source = "page".to_string();
        let fbid = "1".to_string();

        state.apply(&Signal::ShowFullDescription {
            source: source.clone(),
            fbid: fbid.clone(),
        });
        assert!(state.feed("page").unwrap().event_ui("1").show_full_description);

        state.apply(&Signal::ShowLessDescription { source, fbid });
        assert!(!state.feed("page").unwrap().event_ui("1").show_full_description);
    }
}
