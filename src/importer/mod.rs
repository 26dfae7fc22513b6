//! Import workflows.
//!
//! Each workflow checks its preconditions against the store, emits a start
//! signal, runs its remote calls in order, and only then merges into the
//! store and emits completion. A rejected call emits a failure signal and
//! ends the workflow with nothing merged. Nothing is retried.

use crate::error::ImportError;
use crate::feed::{Action, LoadedPage, Payload, Signal};
use crate::gateway::{DashboardApi, GraphApi};
use crate::models::{CategoryId, FbId, Paging};
use crate::session::Session;
use crate::store::{Entities, EntityKeys};
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;

pub mod links;
mod remote;

pub use remote::FB_EVENT_FIELDS;

/// What a successful run applies to the store, and the value it reports.
#[derive(Debug, Default)]
struct Outcome<T = ()> {
    merge: Entities,
    remove: EntityKeys,
    value: T,
}

impl Outcome {
    fn merging(merge: Entities) -> Self {
        Self {
            merge,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CategoryEdit {
    Add,
    Remove,
}

pub struct Importer {
    session: Session,
    graph: Arc<dyn GraphApi>,
    dashboard: Arc<dyn DashboardApi>,
}

impl Importer {
    pub fn new(
        session: Session,
        graph: Arc<dyn GraphApi>,
        dashboard: Arc<dyn DashboardApi>,
    ) -> Self {
        Self {
            session,
            graph,
            dashboard,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn run<T, F>(&self, action: Action, steps: F) -> Result<T, ImportError>
    where
        T: Clone + Into<Payload>,
        F: Future<Output = Result<Outcome<T>, ImportError>>,
    {
        self.session.dispatch(Signal::Started(action.clone()));

        match steps.await {
            Ok(outcome) => {
                self.session.merge(outcome.merge);
                self.session.remove(&outcome.remove);
                info!("Completed {:?}", action);
                let payload = outcome.value.clone().into();
                self.session.dispatch(Signal::Completed(action, payload));
                Ok(outcome.value)
            }
            Err(err) => {
                error!("{:?} failed: {}", action, err);
                self.session
                    .dispatch(Signal::Failed(action, err.user_message()));
                Err(err)
            }
        }
    }

    /// Fetches the next page of the source's posts and returns the event ids
    /// it links to that were never offered before, with the page's paging.
    async fn fb_ids_to_import(&self, source: &str) -> Result<(Vec<FbId>, Paging), ImportError> {
        let feed = self.session.feed(source);
        let url = feed
            .next_url
            .clone()
            .unwrap_or_else(|| remote::first_page_path(source));

        let page = self.page_posts(&url).await?;
        let extracted = links::event_ids_from_links(page.data.iter().map(|p| p.link.as_deref()));
        let candidates = links::candidate_ids(extracted, &feed.ids);

        Ok((candidates, page.paging.unwrap_or_default()))
    }

    /// Loads the next batch of candidate events for `source`.
    ///
    /// Candidates already imported come from the dashboard, the rest from the
    /// graph. Ids neither side knows about are dropped from the result.
    pub async fn load_import_events(&self, source: &str) -> Result<LoadedPage, ImportError> {
        let action = Action::LoadEvents {
            source: source.to_string(),
        };

        self.run(action, async {
            let (candidates, paging) = self.fb_ids_to_import(source).await?;

            if candidates.is_empty() {
                return Ok(Outcome {
                    value: LoadedPage::now(paging, candidates),
                    ..Default::default()
                });
            }

            let imported = self.imported_events_by_fbids(&candidates).await?;
            let not_imported = links::difference(&candidates, &imported.result);

            if not_imported.is_empty() {
                return Ok(Outcome {
                    merge: imported.entities,
                    value: LoadedPage::now(paging, candidates),
                    ..Default::default()
                });
            }

            let fb_events = self.fb_events_by_ids(&not_imported).await?;
            let (ids, dropped): (Vec<FbId>, Vec<FbId>) =
                candidates.into_iter().partition(|fbid| {
                    imported.entities.imported_events.contains_key(fbid)
                        || fb_events.contains_key(fbid)
                });
            if !dropped.is_empty() {
                warn!("Dropping ids unknown to both dashboard and graph: {:?}", dropped);
            }

            let mut merge = Entities {
                fb_events,
                ..Default::default()
            };
            merge.extend(imported.entities);
            Ok(Outcome {
                merge,
                value: LoadedPage::now(paging, ids),
                ..Default::default()
            })
        })
        .await
    }

    /// Loads the first batch unless one was already received or is loading.
    pub async fn load_import_events_first_time(
        &self,
        source: &str,
    ) -> Result<Option<LoadedPage>, ImportError> {
        let feed = self.session.feed(source);
        if feed.received_at.is_some() || feed.loading {
            return Ok(None);
        }
        self.load_import_events(source).await.map(Some)
    }

    /// Imports a candidate event into the dashboard.
    pub async fn import_event(&self, source: &str, fbid: &str) -> Result<(), ImportError> {
        let fb_event = self
            .session
            .store()
            .fb_event(fbid)
            .cloned()
            .ok_or_else(|| {
                ImportError::Precondition(format!(
                    "Invalid provided facebook id {fbid} to import."
                ))
            })?;

        let action = Action::ImportEvent {
            source: source.to_string(),
            fbid: fbid.to_string(),
        };
        self.run(action, async {
            let created = self.create_imported_event(&fb_event).await?;
            Ok(Outcome::merging(created.entities))
        })
        .await
    }

    /// Deletes the dashboard record and leaves a fresh, importable Facebook
    /// event in its place.
    pub async fn delete_imported_event(&self, source: &str, fbid: &str) -> Result<(), ImportError> {
        let cached = {
            let store = self.session.store();
            if !store.is_imported(fbid) {
                return Err(ImportError::Precondition(format!(
                    "Invalid provided facebook id {fbid} to remove."
                )));
            }
            store.fb_event(fbid).cloned()
        };

        let action = Action::DeleteImportedEvent {
            source: source.to_string(),
            fbid: fbid.to_string(),
        };
        self.run(action, async {
            let fb_event = match cached {
                Some(event) => event.without_categories(),
                None => self.fb_event_by_id(fbid).await?,
            };
            self.delete_imported(fbid).await?;

            Ok(Outcome {
                merge: Entities::default().with_fb_event(fb_event),
                remove: EntityKeys::imported_event(fbid),
                ..Default::default()
            })
        })
        .await
    }

    /// Overwrites the dashboard record with fresh graph data.
    pub async fn resync_imported_event(&self, source: &str, fbid: &str) -> Result<(), ImportError> {
        if !self.session.store().is_imported(fbid) {
            return Err(ImportError::Precondition(format!(
                "Invalid provided facebook id {fbid} to resync."
            )));
        }

        let action = Action::ResyncImportedEvent {
            source: source.to_string(),
            fbid: fbid.to_string(),
        };
        self.run(action, async {
            let fb_event = self.fb_event_by_id(fbid).await?;
            let updated = self.update_imported_event(fbid, &fb_event).await?;

            let mut merge = updated.entities;
            merge.fb_events.insert(fbid.to_string(), fb_event);
            Ok(Outcome::merging(merge))
        })
        .await
    }

    pub async fn add_category_to_event(
        &self,
        source: &str,
        fbid: &str,
        category: CategoryId,
    ) -> Result<(), ImportError> {
        self.edit_category(source, fbid, category, CategoryEdit::Add)
            .await
    }

    pub async fn remove_category_from_event(
        &self,
        source: &str,
        fbid: &str,
        category: CategoryId,
    ) -> Result<(), ImportError> {
        self.edit_category(source, fbid, category, CategoryEdit::Remove)
            .await
    }

    /// Imported events are edited through the dashboard. Candidates only keep
    /// the choice in memory until they get imported.
    async fn edit_category(
        &self,
        source: &str,
        fbid: &str,
        category: CategoryId,
        edit: CategoryEdit,
    ) -> Result<(), ImportError> {
        if !self.session.known_categories().contains(&category) {
            return Err(ImportError::Precondition(format!(
                "Invalid category {category}"
            )));
        }

        let imported = self.session.store().imported_event(fbid).cloned();
        let Some(mut imported) = imported else {
            let verb = if edit == CategoryEdit::Add {
                "adding"
            } else {
                "removing"
            };
            let mut fb_event = self
                .session
                .store()
                .fb_event(fbid)
                .cloned()
                .ok_or_else(|| {
                    ImportError::Precondition(format!(
                        "Invalid facebook id {fbid} for {verb} category"
                    ))
                })?;
            apply_edit(&mut fb_event.categories, category, edit);
            self.session
                .merge(Entities::default().with_fb_event(fb_event));
            return Ok(());
        };

        let event_id = imported.id.ok_or_else(|| {
            ImportError::Precondition(format!("Imported event {fbid} has no dashboard id"))
        })?;

        let (source, fbid) = (source.to_string(), fbid.to_string());
        let action = match edit {
            CategoryEdit::Add => Action::AddCategory { source, fbid },
            CategoryEdit::Remove => Action::RemoveCategory { source, fbid },
        };
        self.run(action, async {
            match edit {
                CategoryEdit::Add => self.attach_category(event_id, category).await?,
                CategoryEdit::Remove => self.detach_category(event_id, category).await?,
            }
            apply_edit(&mut imported.categories, category, edit);
            Ok(Outcome::merging(
                Entities::default().with_imported_event(imported),
            ))
        })
        .await
    }

    /// Refreshes the categories operators can tag events with.
    pub async fn load_categories(&self) -> Result<Vec<CategoryId>, ImportError> {
        self.run(Action::LoadCategories, async {
            let categories = self.fetch_categories().await?;
            let ids = categories.iter().map(|c| c.id).collect();

            let mut merge = Entities::default();
            merge
                .categories
                .extend(categories.into_iter().map(|c| (c.id, c)));
            Ok(Outcome {
                merge,
                value: ids,
                ..Default::default()
            })
        })
        .await
    }

    pub fn show_already_imported(&self, source: &str) {
        self.session.dispatch(Signal::ShowAlreadyImported {
            source: source.to_string(),
        });
    }

    pub fn hide_already_imported(&self, source: &str) {
        self.session.dispatch(Signal::HideAlreadyImported {
            source: source.to_string(),
        });
    }

    pub fn show_full_description(&self, source: &str, fbid: &str) {
        self.session.dispatch(Signal::ShowFullDescription {
            source: source.to_string(),
            fbid: fbid.to_string(),
        });
    }

    pub fn show_less_description(&self, source: &str, fbid: &str) {
        self.session.dispatch(Signal::ShowLessDescription {
            source: source.to_string(),
            fbid: fbid.to_string(),
        });
    }
}

fn apply_edit(categories: &mut Vec<CategoryId>, category: CategoryId, edit: CategoryEdit) {
    match edit {
        CategoryEdit::Add => {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        CategoryEdit::Remove => categories.retain(|c| *c != category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edit() {
        let mut categories = vec![1, 2];
        apply_edit(&mut categories, 3, CategoryEdit::Add);
        apply_edit(&mut categories, 3, CategoryEdit::Add);
        assert_eq!(categories, vec![1, 2, 3]);

        apply_edit(&mut categories, 1, CategoryEdit::Remove);
        assert_eq!(categories, vec![2, 3]);
    }
}
