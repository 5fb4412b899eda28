//! Event retrieval for a resolved group and search.
//!
//! The events endpoint returns at most one page per call. Pages are walked
//! backwards in time: each follow-up request is bounded by the oldest event
//! id of the previous page, and older pages are prepended so the assembled
//! list stays oldest-first. The loop ends once a page reports that the
//! search reached back to the start of the window.

use papertrail_client::{EventsPage, EventsQuery, Papertrail, RemoteApi};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::ledger::Item;
use crate::time::{format_unix, TimeWindow};

/// Pagination state taken from one events page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    pub min_id: String,
    pub max_id: String,
    /// Unix seconds the page's search reached back to.
    pub min_time_at: Option<i64>,
}

impl EventCursor {
    pub fn from_page(page: &EventsPage) -> Self {
        Self {
            min_id: page.min_id.clone(),
            max_id: page.max_id.clone(),
            min_time_at: page.min_time_at.map(|t| t.timestamp()),
        }
    }

    /// True once no older events remain inside the window.
    pub fn converged(&self, start: i64) -> bool {
        self.min_time_at.map_or(true, |t| t <= start)
    }
}

/// What to retrieve and where to put it.
#[derive(Debug, Clone)]
pub struct EventsRequest<'a> {
    pub group_id: i64,
    pub group_name: &'a str,
    pub search_name: &'a str,
    pub query: &'a str,
    pub window: TimeWindow,
    pub directory: &'a Path,
}

/// Messages assembled from every page, plus how many calls it took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub messages: Vec<String>,
    pub pages: usize,
}

pub struct EventRetriever<'a, A> {
    papertrail: &'a Papertrail<A>,
}

impl<'a, A: RemoteApi> EventRetriever<'a, A> {
    pub fn new(papertrail: &'a Papertrail<A>) -> Self {
        Self { papertrail }
    }

    /// Fetch the window into a file and describe the result as an item.
    ///
    /// An empty window produces a "0 events" item and no file.
    pub async fn retrieve(&self, request: &EventsRequest<'_>) -> Result<Item> {
        let file_path = events_file_path(
            request.directory,
            request.group_name,
            request.search_name,
            request.window,
        );
        let collected = self.collect(request).await?;

        if !collected.messages.is_empty() {
            write_messages(&file_path, &collected.messages).await?;
            info!(
                path = %file_path.display(),
                events = collected.messages.len(),
                pages = collected.pages,
                "Events written"
            );
        } else {
            info!(group_id = request.group_id, "No events in the requested window");
        }

        Ok(Item::events_search(format!(
            "{} with {} events retrieved",
            escape_file_name(&file_path.to_string_lossy()),
            collected.messages.len()
        )))
    }

    /// Walk the pages of the window and assemble messages oldest-first.
    ///
    /// No iteration limit: the loop relies on the service eventually
    /// reporting a `min_time_at` at or before the window start, or
    /// returning an empty page.
    pub async fn collect(&self, request: &EventsRequest<'_>) -> Result<Collected> {
        let start = request.window.start();

        let first = self
            .papertrail
            .search_events(&EventsQuery {
                group_id: request.group_id,
                q: request.query.to_string(),
                min_time: start,
                max_time: Some(request.window.end()),
                max_id: None,
            })
            .await?;
        let mut pages = 1;

        if first.events.is_empty() {
            return Ok(Collected {
                messages: Vec::new(),
                pages,
            });
        }

        let mut cursor = EventCursor::from_page(&first);
        let mut messages: Vec<String> = first.events.into_iter().map(|e| e.message).collect();

        while !cursor.converged(start) {
            debug!(
                max_id = %cursor.min_id,
                min_time_at = ?cursor.min_time_at,
                "Requesting older events"
            );
            let page = self
                .papertrail
                .search_events(&EventsQuery {
                    group_id: request.group_id,
                    q: request.query.to_string(),
                    min_time: start,
                    max_time: None,
                    max_id: Some(cursor.min_id.clone()),
                })
                .await?;
            pages += 1;

            // An empty page has no cursor to continue from.
            if page.events.is_empty() {
                debug!(min_time_at = ?page.min_time_at, "Older page is empty, stopping");
                break;
            }

            // max_id is inclusive: the boundary event was already collected.
            let boundary = cursor.min_id.as_str();
            let older: Vec<String> = page
                .events
                .iter()
                .filter(|e| e.id != boundary)
                .map(|e| e.message.clone())
                .collect();
            debug!(received = page.events.len(), kept = older.len(), "Older page");

            cursor = EventCursor::from_page(&page);
            messages.splice(0..0, older);
        }

        Ok(Collected { messages, pages })
    }
}

/// `directory/group_search_start_end`, with spaces turned into underscores
/// and `/` in the dates turned into `-`.
pub fn events_file_path(
    directory: &Path,
    group_name: &str,
    search_name: &str,
    window: TimeWindow,
) -> PathBuf {
    let date = |ts: i64| format_unix(ts).replace(' ', "_").replace('/', "-");
    directory.join(format!(
        "{}_{}_{}_{}",
        group_name.replace(' ', "_"),
        search_name.replace(' ', "_"),
        date(window.start()),
        date(window.end())
    ))
}

/// Escape `[` and `]` so the reported name can be pasted into a shell.
pub fn escape_file_name(name: &str) -> String {
    name.replace('[', "\\[").replace(']', "\\]")
}

/// Create or truncate `path` and write one message per line.
async fn write_messages(path: &Path, messages: &[String]) -> Result<()> {
    let mut contents = String::with_capacity(messages.iter().map(|m| m.len() + 1).sum());
    for message in messages {
        contents.push_str(message);
        contents.push('\n');
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| SyncError::Io {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use papertrail_client::{ApiResponse, Event, Method};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers events searches from a fixed list of pages and records each query.
    struct ScriptedEvents {
        pages: Mutex<VecDeque<EventsPage>>,
        queries: Mutex<Vec<EventsQuery>>,
    }

    impl ScriptedEvents {
        fn new(pages: Vec<EventsPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteApi for ScriptedEvents {
        async fn request(
            &self,
            _method: Method,
            _path: &str,
            body: Option<serde_json::Value>,
        ) -> papertrail_client::Result<ApiResponse> {
            let query: EventsQuery = serde_json::from_value(body.unwrap_or_default())?;
            self.queries.lock().unwrap().push(query);
            // Once the script runs out, report the window as covered.
            let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
            Ok(ApiResponse::new(200, serde_json::to_vec(&page)?))
        }
    }

    fn event(id: &str) -> Event {
        serde_json::from_value(serde_json::json!({ "id": id, "message": format!("m{id}") }))
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_follow_up_page_ends_retrieval() {
        let start = 1_614_556_800;
        let after_start = Utc.timestamp_opt(start + 600, 0).unwrap();
        let api = ScriptedEvents::new(vec![
            EventsPage {
                min_id: "10".into(),
                max_id: "11".into(),
                events: vec![event("10"), event("11")],
                min_time_at: Some(after_start),
                ..EventsPage::default()
            },
            EventsPage {
                min_time_at: Some(after_start),
                ..EventsPage::default()
            },
        ]);
        let papertrail = Papertrail::new(api);
        let request = EventsRequest {
            group_id: 1,
            group_name: "g1",
            search_name: "s1",
            query: "*",
            window: TimeWindow::new(start, start + 3600).unwrap(),
            directory: Path::new("."),
        };

        let collected = EventRetriever::new(&papertrail).collect(&request).await.unwrap();

        assert_eq!(collected.messages, vec!["m10", "m11"]);
        assert_eq!(collected.pages, 2);
        let max_ids: Vec<Option<String>> = papertrail
            .api()
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.max_id.clone())
            .collect();
        assert_eq!(max_ids, vec![None, Some("10".to_string())]);
    }

    #[test]
    fn test_file_name_replaces_spaces_and_slashes() {
        let window = TimeWindow::new(1_614_556_800, 1_614_643_200).unwrap();
        let path = events_file_path(Path::new("/tmp/logs"), "my group", "default search", window);
        assert_eq!(
            path,
            PathBuf::from("/tmp/logs/my_group_default_search_03-01-2021_00:00:00_03-02-2021_00:00:00")
        );
    }

    #[test]
    fn test_escape_brackets() {
        assert_eq!(escape_file_name("./g_[prod]_s"), "./g_\\[prod\\]_s");
        assert_eq!(escape_file_name("plain"), "plain");
    }

    #[test]
    fn test_cursor_convergence() {
        let cursor = EventCursor {
            min_id: "5".into(),
            max_id: "9".into(),
            min_time_at: Some(100),
        };
        assert!(cursor.converged(100));
        assert!(cursor.converged(150));
        assert!(!cursor.converged(99));

        let empty = EventCursor {
            min_time_at: None,
            ..cursor
        };
        assert!(empty.converged(0));
    }
}
