//! Typed calls over a [`RemoteApi`].

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::types::{
    CreateGroupBody, CreateSearchBody, Destination, EventsPage, EventsQuery, Group, NewGroup,
    NewSearch, Search, System, SystemCreationRequest,
};
use crate::RemoteApi;

const EVENTS_SEARCH_PATH: &str = "events/search.json";

/// A remote collection that can be listed and deleted by id.
pub trait Collection: DeserializeOwned + Send {
    /// Resource name used in errors and logs ("System", "Group", ...).
    const RESOURCE: &'static str;

    /// Collection segment of the endpoint ("systems", "groups", ...).
    const COLLECTION: &'static str;

    fn id(&self) -> i64;

    fn list_path() -> String {
        format!("{}.json", Self::COLLECTION)
    }

    fn member_path(id: i64) -> String {
        format!("{}/{}.json", Self::COLLECTION, id)
    }
}

impl Collection for System {
    const RESOURCE: &'static str = "System";
    const COLLECTION: &'static str = "systems";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Collection for Group {
    const RESOURCE: &'static str = "Group";
    const COLLECTION: &'static str = "groups";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Collection for Search {
    const RESOURCE: &'static str = "Search";
    const COLLECTION: &'static str = "searches";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Collection for Destination {
    const RESOURCE: &'static str = "Destination";
    const COLLECTION: &'static str = "destinations";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Typed Papertrail API on top of a transport.
pub struct Papertrail<A> {
    api: A,
}

impl<A: RemoteApi> Papertrail<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the full collection.
    pub async fn list<T: Collection>(&self) -> Result<Vec<T>> {
        self.call(Method::GET, &T::list_path(), None, T::RESOURCE, "Listing")
            .await
    }

    /// First element of the collection matching `predicate`.
    ///
    /// The service offers no keyed lookup for these collections, so this is a
    /// linear scan over [`Papertrail::list`].
    pub async fn find<T, P>(&self, predicate: P) -> Result<Option<T>>
    where
        T: Collection,
        P: Fn(&T) -> bool,
    {
        let items = self.list::<T>().await?;
        debug!(
            resource = T::RESOURCE,
            scanned = items.len(),
            "Scanning collection"
        );
        Ok(items.into_iter().find(|item| predicate(item)))
    }

    pub async fn get<T: Collection>(&self, id: i64) -> Result<T> {
        self.call(Method::GET, &T::member_path(id), None, T::RESOURCE, "Obtaining")
            .await
    }

    pub async fn delete<T: Collection>(&self, id: i64) -> Result<()> {
        let resp = self
            .api
            .request(Method::DELETE, &T::member_path(id), None)
            .await?;
        if !resp.is_ok() {
            return Err(ClientError::from_status(resp.status, T::RESOURCE, "Deleting"));
        }
        Ok(())
    }

    pub async fn create_system(&self, request: &SystemCreationRequest) -> Result<System> {
        self.post(&System::list_path(), &request.body(), System::RESOURCE)
            .await
    }

    pub async fn create_group(&self, name: &str, system_wildcard: &str) -> Result<Group> {
        let body = CreateGroupBody {
            group: NewGroup {
                name: name.to_string(),
                system_wildcard: system_wildcard.to_string(),
            },
        };
        self.post(&Group::list_path(), &body, Group::RESOURCE).await
    }

    pub async fn create_search(&self, name: &str, query: &str, group_id: i64) -> Result<Search> {
        let body = CreateSearchBody {
            search: NewSearch {
                name: name.to_string(),
                query: query.to_string(),
                group_id,
            },
        };
        self.post(&Search::list_path(), &body, Search::RESOURCE)
            .await
    }

    /// Look up a destination by id.
    pub async fn destination(&self, id: i64) -> Result<Destination> {
        self.get::<Destination>(id).await
    }

    /// Fetch one page of events.
    pub async fn search_events(&self, query: &EventsQuery) -> Result<EventsPage> {
        let body = serde_json::to_value(query)?;
        self.call(
            Method::GET,
            EVENTS_SEARCH_PATH,
            Some(body),
            "EventsSearch",
            "Obtaining",
        )
        .await
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        resource: &str,
    ) -> Result<R> {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, Some(body), resource, "Creating")
            .await
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        resource: &str,
        action: &str,
    ) -> Result<R> {
        let resp = self.api.request(method, path, body).await?;
        if !resp.is_ok() {
            return Err(ClientError::from_status(resp.status, resource, action));
        }
        resp.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePapertrail;

    #[tokio::test]
    async fn test_find_scans_list() {
        let fake = FakePapertrail::new();
        fake.seed_group("alpha", "*");
        let beta = fake.seed_group("beta", "web-*");
        let papertrail = Papertrail::new(fake.clone());

        let found = papertrail
            .find::<Group, _>(|g| g.name == "beta")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, beta);
        assert_eq!(found.system_wildcard.as_deref(), Some("web-*"));

        let missing = papertrail
            .find::<Group, _>(|g| g.name == "gamma")
            .await
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(fake.calls_to(Method::GET, "groups.json"), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_member_is_not_found() {
        let papertrail = Papertrail::new(FakePapertrail::new());
        let err = papertrail.delete::<Search>(99).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure_surfaces_status() {
        let fake = FakePapertrail::new();
        fake.fail_with(Method::GET, "systems.json", 503);
        let papertrail = Papertrail::new(fake);

        let err = papertrail.list::<System>().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_create_search_round_trip() {
        tokio_test::block_on(async {
            let fake = FakePapertrail::new();
            let group_id = fake.seed_group("g1", "*");
            let papertrail = Papertrail::new(fake.clone());

            let search = papertrail
                .create_search("errors", "severity:error", group_id)
                .await
                .unwrap();
            assert_eq!(search.group.id, group_id);
            assert_eq!(fake.searches().len(), 1);
        });
    }
}
