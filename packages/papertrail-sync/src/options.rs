use chrono::{Duration, Utc};
use std::path::PathBuf;

use crate::time::format_date;

/// Separator between entries of a system wildcard.
pub const WILDCARD_SEPARATOR: &str = ", ";

/// Wildcard matching every system. Systems are never reconciled for it.
pub const UNIVERSAL_WILDCARD: &str = "*";

/// Everything a caller can ask of a run, as raw tokens.
///
/// Tokens are classified and validated by [`crate::action::validate`]
/// before any remote call.
#[derive(Debug, Clone)]
pub struct Options {
    /// Group defined or to be defined in Papertrail
    pub group_name: String,

    /// Systems the group selects; also the list of systems to reconcile
    pub system_wildcard: String,

    /// Destination port for hostname systems (0 = unset)
    pub destination_port: u16,

    /// Destination id for hostname systems (0 = unset)
    pub destination_id: i64,

    /// Source address for ip-address systems (empty = use each wildcard entry)
    pub ip_address: String,

    /// `h`/`hostname` or `i`/`ip-address`
    pub system_type: String,

    /// Saved search name
    pub search: String,

    /// Saved search query, also used to retrieve events
    pub query: String,

    /// `c`/`create`, `o`/`obtain` or `d`/`delete`
    pub action: String,

    /// On delete, remove the whole group (its searches go with it)
    pub delete_all_searches: bool,

    /// On delete, also remove the systems listed in the wildcard
    pub delete_all_systems: bool,

    /// On delete, only remove systems and leave the group and search alone
    pub delete_only_systems: bool,

    /// Start of the event window, `MM/DD/YYYY hh:mm:ss` UTC
    pub start_date: String,

    /// End of the event window, `MM/DD/YYYY hh:mm:ss` UTC
    pub end_date: String,

    /// Directory where retrieved events are written
    pub path: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            group_name: "my-log-group".to_string(),
            system_wildcard: UNIVERSAL_WILDCARD.to_string(),
            destination_port: 0,
            destination_id: 0,
            ip_address: String::new(),
            system_type: "hostname".to_string(),
            search: "default search".to_string(),
            query: "*".to_string(),
            action: "c".to_string(),
            delete_all_searches: false,
            delete_all_systems: false,
            delete_only_systems: false,
            start_date: format_date(now - Duration::days(1)),
            end_date: format_date(now),
            path: PathBuf::from("."),
        }
    }
}

impl Options {
    /// Wildcard entries in order. Repeated entries are kept.
    pub fn wildcard_entries(&self) -> Vec<&str> {
        self.system_wildcard.split(WILDCARD_SEPARATOR).collect()
    }

    pub fn is_universal_wildcard(&self) -> bool {
        self.system_wildcard == UNIVERSAL_WILDCARD
    }

    /// Address used for an ip-address system named `entry`.
    pub fn address_for<'a>(&'a self, entry: &'a str) -> &'a str {
        if self.ip_address.is_empty() {
            entry
        } else {
            &self.ip_address
        }
    }
}
