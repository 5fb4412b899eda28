use papertrail_client::{Group, Papertrail, RemoteApi};
use tracing::{debug, info};

use crate::action::Action;
use crate::error::{Result, SyncError};
use crate::ledger::{Item, ItemKind};

/// Reconciles a group identified by its name.
pub struct GroupReconciler<'a, A> {
    papertrail: &'a Papertrail<A>,
}

impl<'a, A: RemoteApi> GroupReconciler<'a, A> {
    pub fn new(papertrail: &'a Papertrail<A>) -> Self {
        Self { papertrail }
    }

    pub async fn lookup(&self, name: &str) -> Result<Option<Group>> {
        let found = self.papertrail.find::<Group, _>(|g| g.name == name).await?;
        debug!(group = name, found = found.is_some(), "Group lookup");
        Ok(found)
    }

    /// Apply `action` to the group called `name`.
    ///
    /// `system_wildcard` is only used when the group has to be created.
    /// Obtain and delete fail with [`SyncError::GroupNotFound`] when the group
    /// does not exist.
    pub async fn reconcile(&self, name: &str, system_wildcard: &str, action: Action) -> Result<Item> {
        let existing = self.lookup(name).await?;

        match (action, existing) {
            (Action::Create, Some(group)) | (Action::Obtain, Some(group)) => {
                info!(group = %group.name, id = group.id, "Group already exists");
                Ok(Item::existing(ItemKind::Group, group.id, group.name))
            }
            (Action::Create, None) => {
                let group = self.papertrail.create_group(name, system_wildcard).await?;
                info!(group = %group.name, id = group.id, "Group created");
                Ok(Item::created(ItemKind::Group, group.id, group.name))
            }
            (Action::Delete, Some(group)) => {
                self.papertrail.delete::<Group>(group.id).await?;
                info!(group = %group.name, id = group.id, "Group deleted");
                Ok(Item::deleted(ItemKind::Group, group.id, group.name))
            }
            (Action::Obtain, None) | (Action::Delete, None) => Err(SyncError::GroupNotFound {
                name: name.to_string(),
            }),
        }
    }
}
