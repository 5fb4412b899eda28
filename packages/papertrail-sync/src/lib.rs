//! Papertrail resource reconciliation.
//!
//! Brings systems, a group and a saved search in line with a set of
//! [`Options`], and for obtain runs pulls the search's events for a time
//! window into a file.
//!
//! # Example
//!
//! ```rust,ignore
//! use papertrail_client::{Papertrail, PapertrailClient};
//! use papertrail_sync::{Options, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(Papertrail::new(PapertrailClient::from_env()?));
//! let report = orchestrator
//!     .run(&Options {
//!         action: "create".into(),
//!         system_wildcard: "web-1, web-2".into(),
//!         destination_port: 514,
//!         ..Options::default()
//!     })
//!     .await?;
//!
//! for item in &report.items {
//!     println!("{} {} {}", item.kind, item.id, item.name);
//! }
//! ```

pub mod action;
pub mod error;
pub mod events;
pub mod ledger;
pub mod options;
pub mod orchestrator;
pub mod reconcile;
pub mod time;

pub use action::{validate, Action, Invocation, SyslogTarget, SystemType};
pub use error::{Result, SyncError, ValidationError};
pub use events::{events_file_path, EventCursor, EventRetriever, EventsRequest};
pub use ledger::{Item, ItemKind, Ledger};
pub use options::Options;
pub use orchestrator::{Orchestrator, Phase, Plan, RunFailure, RunReport};
pub use time::TimeWindow;
