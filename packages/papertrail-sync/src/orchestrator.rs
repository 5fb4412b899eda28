//! Dependency orchestration.
//!
//! A run validates its options, decides which phases apply, and then walks
//! systems, the group, the search and (for obtain) event retrieval in that
//! order. A failing phase stops the run; items recorded by earlier phases are
//! returned with the error.

use papertrail_client::{Papertrail, RemoteApi};
use std::fmt;
use tracing::{info, instrument};

use crate::action::{validate, Action, Invocation};
use crate::error::{Result, SyncError};
use crate::events::{EventRetriever, EventsRequest};
use crate::ledger::{Item, Ledger};
use crate::options::Options;
use crate::reconcile::{GroupReconciler, SearchKey, SearchReconciler, SystemKey, SystemReconciler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Systems,
    Group,
    Search,
    EventRetrieval,
}

/// Which action each phase performs, or `None` when the phase is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub systems: Option<Action>,
    pub group: Option<Action>,
    pub search: Option<Action>,
    pub retrieve_events: bool,
}

impl Plan {
    pub fn new(invocation: &Invocation, options: &Options) -> Self {
        let action = invocation.action;

        let systems = match action {
            _ if options.is_universal_wildcard() => None,
            Action::Obtain => None,
            Action::Delete if !(options.delete_all_systems || options.delete_only_systems) => None,
            _ => Some(action),
        };

        let (group, search) = match action {
            Action::Delete if options.delete_only_systems => (None, None),
            // Removing the group takes its searches with it.
            Action::Delete if options.delete_all_searches => (Some(Action::Delete), None),
            Action::Delete => (Some(Action::Obtain), Some(Action::Delete)),
            Action::Create | Action::Obtain => (Some(action), Some(action)),
        };

        Self {
            systems,
            group,
            search,
            retrieve_events: action == Action::Obtain && search.is_some(),
        }
    }

    /// Phases that will run, in order.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = Vec::with_capacity(4);
        if self.systems.is_some() {
            phases.push(Phase::Systems);
        }
        if self.group.is_some() {
            phases.push(Phase::Group);
        }
        if self.search.is_some() {
            phases.push(Phase::Search);
        }
        if self.retrieve_events {
            phases.push(Phase::EventRetrieval);
        }
        phases
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub action: Action,
    pub items: Vec<Item>,
}

/// A failed run together with whatever it managed to do first.
///
/// `action` is `None` when the options failed validation.
#[derive(Debug)]
pub struct RunFailure {
    pub action: Option<Action>,
    pub items: Vec<Item>,
    pub error: SyncError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} items completed)", self.error, self.items.len())
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct Orchestrator<A> {
    papertrail: Papertrail<A>,
}

impl<A: RemoteApi> Orchestrator<A> {
    pub fn new(papertrail: Papertrail<A>) -> Self {
        Self { papertrail }
    }

    /// Validate `options` and apply them against the remote service.
    ///
    /// Validation failures happen before any remote call and carry no items.
    pub async fn run(&self, options: &Options) -> std::result::Result<RunReport, RunFailure> {
        let invocation = validate(options).map_err(|e| RunFailure {
            action: None,
            items: Vec::new(),
            error: e.into(),
        })?;
        let plan = Plan::new(&invocation, options);
        info!(action = %invocation.action, phases = ?plan.phases(), "Starting run");

        let mut ledger = Ledger::new();
        match self.execute(&invocation, &plan, options, &mut ledger).await {
            Ok(()) => {
                info!(items = ledger.len(), "Run complete");
                Ok(RunReport {
                    action: invocation.action,
                    items: ledger.into_items(),
                })
            }
            Err(error) => Err(RunFailure {
                action: Some(invocation.action),
                items: ledger.into_items(),
                error,
            }),
        }
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        plan: &Plan,
        options: &Options,
        ledger: &mut Ledger,
    ) -> Result<()> {
        if let Some(action) = plan.systems {
            self.systems_phase(action, invocation, options, ledger).await?;
        }

        let Some(group_action) = plan.group else {
            return Ok(());
        };
        let group = self.group_phase(group_action, options).await?;
        let group_id = group.id;
        ledger.record(group);

        let Some(search_action) = plan.search else {
            return Ok(());
        };
        let key = SearchKey {
            name: &options.search,
            query: &options.query,
            group_id,
        };
        ledger.record(self.search_phase(search_action, &key).await?);

        if plan.retrieve_events {
            let request = EventsRequest {
                group_id,
                group_name: &options.group_name,
                search_name: &options.search,
                query: &options.query,
                window: invocation.window,
                directory: &options.path,
            };
            ledger.record(self.event_retrieval_phase(&request).await?);
        }
        Ok(())
    }

    #[instrument(name = "systems_phase", skip_all, fields(action = %action))]
    async fn systems_phase(
        &self,
        action: Action,
        invocation: &Invocation,
        options: &Options,
        ledger: &mut Ledger,
    ) -> Result<()> {
        let reconciler = SystemReconciler::new(&self.papertrail);
        // Repeated entries are processed again; the second pass finds the first.
        for entry in options.wildcard_entries() {
            let key = SystemKey::for_entry(entry, invocation, options);
            if let Some(item) = reconciler.reconcile(&key, action).await? {
                ledger.record(item);
            }
        }
        Ok(())
    }

    #[instrument(name = "group_phase", skip_all, fields(action = %action, group = %options.group_name))]
    async fn group_phase(&self, action: Action, options: &Options) -> Result<Item> {
        GroupReconciler::new(&self.papertrail)
            .reconcile(&options.group_name, &options.system_wildcard, action)
            .await
    }

    #[instrument(name = "search_phase", skip_all, fields(action = %action, search = key.name, group_id = key.group_id))]
    async fn search_phase(&self, action: Action, key: &SearchKey<'_>) -> Result<Item> {
        SearchReconciler::new(&self.papertrail).reconcile(key, action).await
    }

    #[instrument(name = "event_retrieval_phase", skip_all, fields(group_id = request.group_id))]
    async fn event_retrieval_phase(&self, request: &EventsRequest<'_>) -> Result<Item> {
        EventRetriever::new(&self.papertrail).retrieve(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_for(options: &Options) -> Plan {
        let invocation = validate(options).unwrap();
        Plan::new(&invocation, options)
    }

    fn options(action: &str) -> Options {
        Options {
            action: action.to_string(),
            system_wildcard: "web-1".to_string(),
            destination_port: 514,
            ..Options::default()
        }
    }

    #[test]
    fn test_create_runs_everything_but_events() {
        let plan = plan_for(&options("create"));
        assert_eq!(plan.phases(), vec![Phase::Systems, Phase::Group, Phase::Search]);
        assert_eq!(plan.group, Some(Action::Create));
        assert_eq!(plan.search, Some(Action::Create));
    }

    #[test]
    fn test_universal_wildcard_skips_systems() {
        let plan = plan_for(&Options {
            system_wildcard: "*".to_string(),
            ..options("c")
        });
        assert_eq!(plan.systems, None);
    }

    #[test]
    fn test_obtain_retrieves_events_without_systems() {
        let plan = plan_for(&options("o"));
        assert_eq!(plan.phases(), vec![Phase::Group, Phase::Search, Phase::EventRetrieval]);
        assert_eq!(plan.group, Some(Action::Obtain));
    }

    #[test]
    fn test_delete_one_search_resolves_group_only() {
        let plan = plan_for(&options("d"));
        assert_eq!(plan.systems, None);
        assert_eq!(plan.group, Some(Action::Obtain));
        assert_eq!(plan.search, Some(Action::Delete));
        assert!(!plan.retrieve_events);
    }

    #[test]
    fn test_delete_all_searches_deletes_group() {
        let plan = plan_for(&Options {
            delete_all_searches: true,
            delete_all_systems: true,
            ..options("delete")
        });
        assert_eq!(plan.systems, Some(Action::Delete));
        assert_eq!(plan.group, Some(Action::Delete));
        assert_eq!(plan.search, None);
    }

    #[test]
    fn test_delete_only_systems_alone_deletes_systems() {
        let plan = plan_for(&Options {
            delete_only_systems: true,
            ..options("d")
        });
        assert_eq!(plan.systems, Some(Action::Delete));
        assert_eq!(plan.phases(), vec![Phase::Systems]);
    }

    #[test]
    fn test_delete_only_systems() {
        let plan = plan_for(&Options {
            delete_all_systems: true,
            delete_only_systems: true,
            ..options("d")
        });
        assert_eq!(plan.phases(), vec![Phase::Systems]);
    }
}
