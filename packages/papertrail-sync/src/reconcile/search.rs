use papertrail_client::{Papertrail, RemoteApi, Search};
use tracing::{debug, info};

use crate::action::Action;
use crate::error::{Result, SyncError};
use crate::ledger::{Item, ItemKind};

/// Natural key of a saved search: all three fields must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchKey<'a> {
    pub name: &'a str,
    pub query: &'a str,
    pub group_id: i64,
}

impl SearchKey<'_> {
    fn matches(&self, search: &Search) -> bool {
        search.name == self.name && search.query == self.query && search.group.id == self.group_id
    }
}

pub struct SearchReconciler<'a, A> {
    papertrail: &'a Papertrail<A>,
}

impl<'a, A: RemoteApi> SearchReconciler<'a, A> {
    pub fn new(papertrail: &'a Papertrail<A>) -> Self {
        Self { papertrail }
    }

    pub async fn lookup(&self, key: &SearchKey<'_>) -> Result<Option<Search>> {
        let found = self.papertrail.find::<Search, _>(|s| key.matches(s)).await?;
        debug!(
            search = key.name,
            group_id = key.group_id,
            found = found.is_some(),
            "Search lookup"
        );
        Ok(found)
    }

    /// Apply `action` to the search behind `key`.
    ///
    /// Obtain and delete fail with [`SyncError::SearchNotFound`] when the
    /// search does not exist.
    pub async fn reconcile(&self, key: &SearchKey<'_>, action: Action) -> Result<Item> {
        let existing = self.lookup(key).await?;

        match (action, existing) {
            (Action::Create, Some(search)) | (Action::Obtain, Some(search)) => {
                info!(search = %search.name, id = search.id, "Search already exists");
                Ok(Item::existing(ItemKind::Search, search.id, search.name))
            }
            (Action::Create, None) => {
                let search = self
                    .papertrail
                    .create_search(key.name, key.query, key.group_id)
                    .await?;
                info!(
                    search = %search.name,
                    id = search.id,
                    group_id = key.group_id,
                    "Search created"
                );
                Ok(Item::created(ItemKind::Search, search.id, search.name))
            }
            (Action::Delete, Some(search)) => {
                self.papertrail.delete::<Search>(search.id).await?;
                info!(search = %search.name, id = search.id, "Search deleted");
                Ok(Item::deleted(ItemKind::Search, search.id, search.name))
            }
            (Action::Obtain, None) | (Action::Delete, None) => Err(SyncError::SearchNotFound {
                name: key.name.to_string(),
                group_id: key.group_id,
            }),
        }
    }
}
