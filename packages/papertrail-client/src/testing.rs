//! Testing utilities.
//!
//! [`FakePapertrail`] is an in-memory [`RemoteApi`] that behaves like the
//! Papertrail endpoints this crate talks to: it stores systems, groups,
//! searches and destinations, assigns ids, cascades group deletes to their
//! searches and serves a synthetic event stream with cursor pagination.
//! Every call is recorded for assertions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::types::{
    CreateGroupBody, CreateSearchBody, CreateSystemBody, Destination, Event, EventsPage,
    EventsQuery, Group, Search, SearchGroup, Syslog, System,
};
use crate::{ApiResponse, RemoteApi};

/// Syslog host the fake assigns to systems registered by port.
pub const FAKE_SYSLOG_HOST: &str = "logs.papertrailapp.com";

/// Record of a call made to the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

struct State {
    next_id: i64,
    systems: Vec<System>,
    groups: Vec<Group>,
    searches: Vec<Search>,
    destinations: Vec<Destination>,
    events: Vec<Event>,
    page_size: usize,
    failures: HashMap<(Method, String), u16>,
    calls: Vec<RecordedCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_id: 1,
            systems: Vec::new(),
            groups: Vec::new(),
            searches: Vec::new(),
            destinations: Vec::new(),
            events: Vec::new(),
            page_size: 100,
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory stand-in for the Papertrail API.
#[derive(Clone, Default)]
pub struct FakePapertrail {
    state: Arc<RwLock<State>>,
}

impl FakePapertrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of events returned per events page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.write().unwrap().page_size = page_size;
        self
    }

    /// Register a destination and return its id.
    pub fn seed_destination(&self, hostname: &str, port: u16) -> i64 {
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.destinations.push(Destination {
            id,
            filter: None,
            syslog: Syslog {
                hostname: hostname.to_string(),
                port,
                description: None,
            },
        });
        id
    }

    /// Register a group directly and return its id.
    pub fn seed_group(&self, name: &str, system_wildcard: &str) -> i64 {
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        state.groups.push(Group {
            id,
            name: name.to_string(),
            system_wildcard: Some(system_wildcard.to_string()),
            systems: Vec::new(),
        });
        id
    }

    /// Register a search directly and return its id.
    pub fn seed_search(&self, name: &str, query: &str, group_id: i64) -> i64 {
        let mut state = self.state.write().unwrap();
        let id = state.allocate_id();
        let group_name = state
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.name.clone())
            .unwrap_or_default();
        state.searches.push(Search {
            id,
            name: name.to_string(),
            query: query.to_string(),
            group: SearchGroup {
                id: group_id,
                name: group_name,
            },
        });
        id
    }

    /// Append an event to the synthetic stream. Ids must be numeric strings.
    pub fn push_event(&self, id: u64, message: &str, received_at: DateTime<Utc>) {
        self.state.write().unwrap().events.push(Event {
            id: id.to_string(),
            message: message.to_string(),
            received_at: Some(received_at),
            generated_at: Some(received_at),
            display_received_at: None,
            source_ip: None,
            source_id: None,
            source_name: None,
            hostname: None,
            program: None,
            severity: None,
            facility: None,
        });
    }

    /// Answer every `method path` call with `status` and an empty body.
    pub fn fail_with(&self, method: Method, path: &str, status: u16) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert((method, path.to_string()), status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Number of calls made with `method` to exactly `path`.
    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Calls that changed remote state (POST and DELETE), in order.
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == Method::POST || c.method == Method::DELETE)
            .collect()
    }

    pub fn systems(&self) -> Vec<System> {
        self.state.read().unwrap().systems.clone()
    }

    pub fn groups(&self) -> Vec<Group> {
        self.state.read().unwrap().groups.clone()
    }

    pub fn searches(&self) -> Vec<Search> {
        self.state.read().unwrap().searches.clone()
    }

    fn handle(&self, method: &Method, path: &str, body: Option<Value>) -> Result<ApiResponse> {
        let mut state = self.state.write().unwrap();

        if let Some(status) = state.failures.get(&(method.clone(), path.to_string())) {
            return Ok(ApiResponse::new(*status, Vec::new()));
        }

        match (method.as_str(), path) {
            ("GET", "systems.json") => ok(&state.systems),
            ("POST", "systems.json") => {
                let body: CreateSystemBody = serde_json::from_value(body.unwrap_or_default())?;
                let syslog = match (body.destination_port, body.destination_id) {
                    (Some(port), _) => Some(Syslog {
                        hostname: FAKE_SYSLOG_HOST.to_string(),
                        port,
                        description: None,
                    }),
                    (None, Some(destination_id)) => {
                        match state.destinations.iter().find(|d| d.id == destination_id) {
                            Some(destination) => Some(destination.syslog.clone()),
                            None => return Ok(ApiResponse::new(400, Vec::new())),
                        }
                    }
                    (None, None) => None,
                };
                let system = System {
                    id: state.allocate_id(),
                    name: body.system.name,
                    hostname: body.system.hostname,
                    ip_address: body.system.ip_address,
                    syslog,
                    last_event_at: None,
                    auto_delete: false,
                };
                state.systems.push(system.clone());
                ok(&system)
            }
            ("GET", "groups.json") => ok(&state.groups),
            ("POST", "groups.json") => {
                let body: CreateGroupBody = serde_json::from_value(body.unwrap_or_default())?;
                let group = Group {
                    id: state.allocate_id(),
                    name: body.group.name,
                    system_wildcard: Some(body.group.system_wildcard),
                    systems: Vec::new(),
                };
                state.groups.push(group.clone());
                ok(&group)
            }
            ("GET", "searches.json") => ok(&state.searches),
            ("POST", "searches.json") => {
                let body: CreateSearchBody = serde_json::from_value(body.unwrap_or_default())?;
                let Some(group) = state.groups.iter().find(|g| g.id == body.search.group_id)
                else {
                    return Ok(ApiResponse::new(400, Vec::new()));
                };
                let group = SearchGroup {
                    id: group.id,
                    name: group.name.clone(),
                };
                let search = Search {
                    id: state.allocate_id(),
                    name: body.search.name,
                    query: body.search.query,
                    group,
                };
                state.searches.push(search.clone());
                ok(&search)
            }
            ("GET", "events/search.json") => {
                let query: EventsQuery = serde_json::from_value(body.unwrap_or_default())?;
                ok(&events_page(&state, &query))
            }
            ("GET", _) => match member_id(path, "destinations") {
                Some(id) => match state.destinations.iter().find(|d| d.id == id) {
                    Some(destination) => ok(destination),
                    None => Ok(not_found()),
                },
                None => Ok(not_found()),
            },
            ("DELETE", _) => {
                if let Some(id) = member_id(path, "systems") {
                    return Ok(remove(&mut state.systems, |s| s.id == id));
                }
                if let Some(id) = member_id(path, "groups") {
                    let resp = remove(&mut state.groups, |g| g.id == id);
                    if resp.is_ok() {
                        state.searches.retain(|s| s.group.id != id);
                    }
                    return Ok(resp);
                }
                if let Some(id) = member_id(path, "searches") {
                    return Ok(remove(&mut state.searches, |s| s.id == id));
                }
                Ok(not_found())
            }
            _ => Ok(not_found()),
        }
    }
}

#[async_trait]
impl RemoteApi for FakePapertrail {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        self.state.write().unwrap().calls.push(RecordedCall {
            method: method.clone(),
            path: path.to_string(),
            body: body.clone(),
        });
        self.handle(&method, path, body)
    }
}

/// Newest `page_size` events inside the query bounds, oldest first.
///
/// `max_id` is inclusive, so a follow-up page repeats the previous page's
/// oldest event as its newest one.
fn events_page(state: &State, query: &EventsQuery) -> EventsPage {
    let max_id = query.max_id.as_deref().and_then(|id| id.parse::<u64>().ok());

    let mut matching: Vec<&Event> = state
        .events
        .iter()
        .filter(|e| {
            let at = e.received_at.map(|t| t.timestamp()).unwrap_or_default();
            let id = e.id.parse::<u64>().unwrap_or_default();
            at >= query.min_time
                && query.max_time.map_or(true, |max| at <= max)
                && max_id.map_or(true, |max| id <= max)
        })
        .collect();
    matching.sort_by_key(|e| e.id.parse::<u64>().unwrap_or_default());

    let reached_beginning = matching.len() <= state.page_size;
    let start = matching.len().saturating_sub(state.page_size);
    let events: Vec<Event> = matching[start..].iter().map(|e| (*e).clone()).collect();

    // Once the window is exhausted the search has covered back to min_time.
    let min_time_at = if reached_beginning {
        DateTime::<Utc>::from_timestamp(query.min_time, 0)
    } else {
        events.first().and_then(|e| e.received_at)
    };

    EventsPage {
        min_id: events.first().map(|e| e.id.clone()).unwrap_or_default(),
        max_id: events.last().map(|e| e.id.clone()).unwrap_or_default(),
        min_time_at,
        events,
        reached_beginning,
        reached_record_limit: false,
    }
}

fn member_id(path: &str, collection: &str) -> Option<i64> {
    path.strip_prefix(collection)?
        .strip_prefix('/')?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn remove<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> ApiResponse {
    match items.iter().position(matches) {
        Some(index) => {
            items.remove(index);
            ApiResponse::new(200, json!({ "message": "deleted" }).to_string())
        }
        None => not_found(),
    }
}

fn ok<T: Serialize + ?Sized>(value: &T) -> Result<ApiResponse> {
    Ok(ApiResponse::new(200, serde_json::to_vec(value)?))
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({ "message": "Not Found" }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_member_id_parsing() {
        assert_eq!(member_id("groups/12.json", "groups"), Some(12));
        assert_eq!(member_id("groups.json", "groups"), None);
        assert_eq!(member_id("searches/12.json", "groups"), None);
    }

    #[test]
    fn test_events_page_walks_backwards() {
        let fake = FakePapertrail::new().with_page_size(2);
        let base = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        for i in 1..=5u64 {
            fake.push_event(i, &format!("m{i}"), base + chrono::Duration::minutes(i as i64));
        }
        let state = fake.state.read().unwrap();

        let first = events_page(
            &state,
            &EventsQuery {
                group_id: 1,
                q: "*".into(),
                min_time: base.timestamp(),
                max_time: Some(base.timestamp() + 3600),
                max_id: None,
            },
        );
        assert_eq!(first.min_id, "4");
        assert_eq!(first.max_id, "5");
        assert!(!first.reached_beginning);

        let second = events_page(
            &state,
            &EventsQuery {
                group_id: 1,
                q: "*".into(),
                min_time: base.timestamp(),
                max_time: None,
                max_id: Some(first.min_id.clone()),
            },
        );
        assert_eq!(second.min_id, "3");
        assert_eq!(second.max_id, "4");

        let last = events_page(
            &state,
            &EventsQuery {
                group_id: 1,
                q: "*".into(),
                min_time: base.timestamp(),
                max_time: None,
                max_id: Some("2".into()),
            },
        );
        assert!(last.reached_beginning);
        assert_eq!(last.min_time_at.unwrap().timestamp(), base.timestamp());
    }
}
