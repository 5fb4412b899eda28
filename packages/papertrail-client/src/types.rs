use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Syslog endpoint a system sends to, or a destination accepts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syslog {
    pub hostname: String,
    pub port: u16,
    #[serde(default)]
    pub description: Option<String>,
}

/// A log sender registered in Papertrail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub syslog: Option<Syslog>,
    #[serde(default)]
    pub last_event_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_delete: bool,
}

impl System {
    /// Port of the syslog destination this system logs to, if known.
    pub fn syslog_port(&self) -> Option<u16> {
        self.syslog.as_ref().map(|s| s.port)
    }
}

/// A named set of systems selected by a wildcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub system_wildcard: Option<String>,
    #[serde(default)]
    pub systems: Vec<System>,
}

/// Owning group reference embedded in a saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchGroup {
    pub id: i64,
    pub name: String,
}

/// A saved search attached to a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub id: i64,
    pub name: String,
    pub query: String,
    pub group: SearchGroup,
}

/// A log destination (syslog host/port pair owned by the account).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    #[serde(default)]
    pub filter: Option<String>,
    pub syslog: Syslog,
}

/// How a new system is registered. One variant per creation body shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemCreationRequest {
    ByHostnamePort { hostname: String, port: u16 },
    ByHostnameDestinationId { hostname: String, destination_id: i64 },
    ByIpAddress { name: String, ip_address: String },
}

impl SystemCreationRequest {
    /// Display name the system will be created with.
    pub fn name(&self) -> &str {
        match self {
            Self::ByHostnamePort { hostname, .. } => hostname,
            Self::ByHostnameDestinationId { hostname, .. } => hostname,
            Self::ByIpAddress { name, .. } => name,
        }
    }

    /// JSON body expected by `POST systems.json`.
    pub fn body(&self) -> CreateSystemBody {
        match self {
            Self::ByHostnamePort { hostname, port } => CreateSystemBody {
                system: NewSystem::hostname(hostname),
                destination_port: Some(*port),
                destination_id: None,
            },
            Self::ByHostnameDestinationId {
                hostname,
                destination_id,
            } => CreateSystemBody {
                system: NewSystem::hostname(hostname),
                destination_port: None,
                destination_id: Some(*destination_id),
            },
            Self::ByIpAddress { name, ip_address } => CreateSystemBody {
                system: NewSystem {
                    name: name.clone(),
                    hostname: None,
                    ip_address: Some(ip_address.clone()),
                },
                destination_port: None,
                destination_id: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSystem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl NewSystem {
    fn hostname(hostname: &str) -> Self {
        Self {
            name: hostname.to_string(),
            hostname: Some(hostname.to_string()),
            ip_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSystemBody {
    pub system: NewSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub system_wildcard: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupBody {
    pub group: NewGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSearch {
    pub name: String,
    pub query: String,
    pub group_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSearchBody {
    pub search: NewSearch,
}

/// Body of an `events/search.json` call.
///
/// The first page is bounded by `max_time`; follow-up pages replace it with
/// `max_id` taken from the previous page's oldest event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsQuery {
    pub group_id: i64,
    pub q: String,
    pub min_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_id: Option<String>,
}

/// A single log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub display_received_at: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub source_id: Option<i64>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub facility: Option<String>,
}

/// One page of events plus the cursor values for requesting older pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub min_id: String,
    #[serde(default)]
    pub max_id: String,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub min_time_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reached_beginning: bool,
    #[serde(default)]
    pub reached_record_limit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hostname_port_body_shape() {
        let request = SystemCreationRequest::ByHostnamePort {
            hostname: "web-1".into(),
            port: 23633,
        };
        let body = serde_json::to_value(request.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "system": { "name": "web-1", "hostname": "web-1" },
                "destination_port": 23633
            })
        );
    }

    #[test]
    fn test_ip_address_body_has_no_destination() {
        let request = SystemCreationRequest::ByIpAddress {
            name: "1.2.3.4".into(),
            ip_address: "1.2.3.4".into(),
        };
        let body = serde_json::to_value(request.body()).unwrap();
        assert_eq!(
            body,
            json!({ "system": { "name": "1.2.3.4", "ip_address": "1.2.3.4" } })
        );
        assert_eq!(request.name(), "1.2.3.4");
    }

    #[test]
    fn test_events_page_tolerates_missing_fields() {
        let page: EventsPage = serde_json::from_value(json!({
            "min_id": "10",
            "max_id": "12",
            "events": [{ "id": "10", "message": "hello" }],
            "min_time_at": "2021-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(page.events.len(), 1);
        assert_eq!(page.min_time_at.unwrap().timestamp(), 1_614_592_800);
        assert!(!page.reached_beginning);
    }

    #[test]
    fn test_follow_up_query_omits_max_time() {
        let query = EventsQuery {
            group_id: 7,
            q: "*".into(),
            min_time: 100,
            max_time: None,
            max_id: Some("55".into()),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "group_id": 7, "q": "*", "min_time": 100, "max_id": "55" })
        );
    }
}
