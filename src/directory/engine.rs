//! Directory search against Microsoft Graph.
//!
//! The engine builds listing URLs, follows `@odata.nextLink` cursors and
//! attaches photos fetched through one `$batch` request per page. Every fetch
//! carries a request token; only the response of the most recent fetch is
//! allowed to change [`EngineState`].

use std::sync::Arc;

use serde::Serialize;

use crate::directory::store::Store;
use crate::domain::group::Group;
use crate::domain::person::{PERSON_FIELDS, Person};
use crate::domain::types::{DepartmentKey, GroupId, PageSize, SearchText};
use crate::graph::batch::{BatchExecutor, BatchItem, text_lookup};
use crate::graph::query::{Collection, FilterExpr, GraphQuery};
use crate::graph::{ConsistencyLevel, GraphResult, GraphTransport, ODataPage};

/// Properties matched by the free-text search.
pub const SEARCH_PROPERTIES: [&str; 3] = ["displayName", "department", "jobTitle"];

/// Observable state of the engine.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EngineState {
    /// `@odata.count` of the active query.
    pub total: usize,
    pub loading: bool,
    /// People of the most recently applied page.
    pub results: Vec<Person>,
    /// Continuation URL of the active query.
    pub cursor: Option<String>,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// Token of the most recently issued fetch.
    pub request_token: u64,
    /// Scope of the most recently issued query.
    #[serde(skip)]
    pub scope: DirectoryScope,
    #[serde(skip)]
    consistency: ConsistencyLevel,
}

/// Which people the directory lists and how many per page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryScope {
    /// `None` lists every user of the tenant.
    pub group: Option<GroupId>,
    pub page_size: PageSize,
}

/// Page of people accepted into the engine state.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedPage {
    pub people: Vec<Person>,
    pub total: usize,
}

/// Result of a fetch that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Response was the latest and has been applied.
    Applied(FetchedPage),
    /// A newer fetch was issued meanwhile; the response was discarded.
    Stale,
    /// No cursor left, nothing was requested.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchKind {
    NewQuery,
    Continuation,
}

/// Fetch that holds a request token but has not been sent yet.
#[derive(Debug)]
#[must_use]
pub struct PendingFetch {
    token: u64,
    url: String,
    consistency: ConsistencyLevel,
    kind: FetchKind,
}

/// Listing query for one scope.
pub fn listing_query(
    scope: DirectoryScope,
    text: Option<&SearchText>,
    department: Option<&DepartmentKey>,
) -> GraphQuery {
    let collection = match scope.group {
        Some(group) => Collection::GroupMembers(group),
        None => Collection::Users,
    };

    let mut query = GraphQuery::new(collection);
    if let Some(text) = text {
        query = query.search_any(&SEARCH_PROPERTIES, text.as_str());
    }
    query = query
        .top(scope.page_size.get())
        .select(&PERSON_FIELDS)
        .count();
    if let Some(department) = department {
        query = query.filter(FilterExpr::equals("department", department.as_str()));
    }
    query
}

pub struct SearchEngine {
    transport: Arc<dyn GraphTransport>,
    batch: BatchExecutor,
    graph_url: String,
    store: Store<EngineState>,
}

impl SearchEngine {
    pub fn new(transport: Arc<dyn GraphTransport>, graph_url: &str, scope: DirectoryScope) -> Self {
        Self {
            batch: BatchExecutor::new(transport.clone(), graph_url),
            transport,
            graph_url: graph_url.trim_end_matches('/').to_string(),
            store: Store::new(EngineState {
                scope,
                ..EngineState::default()
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        self.store.snapshot()
    }

    pub fn scope(&self) -> DirectoryScope {
        self.store.read(|state| state.scope)
    }

    pub fn has_cursor(&self) -> bool {
        self.store.read(|state| state.cursor.is_some())
    }

    /// Starts a new query in the current scope, discarding the cursor of the
    /// previous one.
    ///
    /// Empty `text` or `department` omit the `$search` or `$filter` clause.
    pub async fn search_by_text(&self, text: &str, department: &str) -> GraphResult<FetchOutcome> {
        let pending = self.begin_query(None, text, department)?;
        self.complete(pending).await
    }

    /// Fetches one more page of the active query.
    pub async fn next_page(&self) -> GraphResult<FetchOutcome> {
        match self.begin_next_page() {
            Some(pending) => self.complete(pending).await,
            None => Ok(FetchOutcome::Exhausted),
        }
    }

    /// Switches to `scope` and issues the token of a new query in one step.
    /// The request is sent by [`SearchEngine::complete`].
    pub fn begin_search(
        &self,
        scope: DirectoryScope,
        text: &str,
        department: &str,
    ) -> GraphResult<PendingFetch> {
        self.begin_query(Some(scope), text, department)
    }

    /// Issues the token of a continuation request, or `None` without a cursor.
    pub fn begin_next_page(&self) -> Option<PendingFetch> {
        self.store.update_if(|state| {
            let url = state.cursor.clone()?;
            state.request_token += 1;
            state.loading = true;
            state.error = None;
            Some(PendingFetch {
                token: state.request_token,
                url,
                consistency: state.consistency,
                kind: FetchKind::Continuation,
            })
        })
    }

    /// Sends a begun fetch and applies its response if it is still the latest.
    pub async fn complete(&self, pending: PendingFetch) -> GraphResult<FetchOutcome> {
        if pending.kind == FetchKind::NewQuery {
            log::info!("Searching directory: {}", pending.url);
        }
        let PendingFetch {
            token,
            url,
            consistency,
            kind,
        } = pending;

        let page = match self.load_page(&url, consistency).await {
            Ok(page) => page,
            Err(err) => {
                log::error!("Failed to load directory page: {err}");
                let message = err.to_string();
                let applied = self.store.update_if(|state| {
                    (state.request_token == token).then(|| {
                        state.loading = false;
                        state.error = Some(message);
                    })
                });
                return match applied {
                    Some(()) => Err(err),
                    None => Ok(FetchOutcome::Stale),
                };
            }
        };

        let people = if page.value.is_empty() {
            Vec::new()
        } else {
            self.attach_photos(page.value).await
        };

        let applied = self.store.update_if(|state| {
            if state.request_token != token {
                return None;
            }
            match (kind, page.count) {
                (_, Some(count)) => state.total = count,
                (FetchKind::NewQuery, None) => state.total = people.len(),
                (FetchKind::Continuation, None) => {}
            }
            state.cursor = page.next_link;
            state.results = people.clone();
            state.loading = false;
            state.error = None;
            Some(state.total)
        });

        Ok(match applied {
            Some(total) => FetchOutcome::Applied(FetchedPage { people, total }),
            None => {
                log::debug!("Discarding stale directory response #{token}");
                FetchOutcome::Stale
            }
        })
    }

    /// Lists the groups offered by the group selector, following every cursor.
    pub async fn list_groups(&self) -> GraphResult<Vec<Group>> {
        let query = GraphQuery::new(Collection::Groups).select(&["id", "displayName"]);
        let consistency = query.consistency_level();
        let mut url = query.to_url(&self.graph_url)?.to_string();
        let mut groups = Vec::new();

        loop {
            let value = self.transport.get(&url, consistency).await?;
            let page: ODataPage<Group> = serde_json::from_value(value)?;
            groups.extend(page.value);

            match page.next_link {
                Some(next) => url = next,
                None => return Ok(groups),
            }
        }
    }

    fn begin_query(
        &self,
        scope: Option<DirectoryScope>,
        text: &str,
        department: &str,
    ) -> GraphResult<PendingFetch> {
        let text = SearchText::new(text).ok();
        let department = DepartmentKey::new(department).ok();

        self.store.update(|state| {
            let scope = scope.unwrap_or(state.scope);
            let query = listing_query(scope, text.as_ref(), department.as_ref());
            let url = query.to_url(&self.graph_url)?;

            state.scope = scope;
            state.consistency = query.consistency_level();
            state.request_token += 1;
            state.loading = true;
            state.error = None;
            state.cursor = None;
            Ok(PendingFetch {
                token: state.request_token,
                url: url.into(),
                consistency: state.consistency,
                kind: FetchKind::NewQuery,
            })
        })
    }

    async fn load_page(
        &self,
        url: &str,
        consistency: ConsistencyLevel,
    ) -> GraphResult<ODataPage<Person>> {
        let value = self.transport.get(url, consistency).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fills in `picture` for every person whose photo the batch returned.
    async fn attach_photos(&self, people: Vec<Person>) -> Vec<Person> {
        let items = people
            .iter()
            .map(|person| BatchItem::new(person.id.as_str(), format!("/users/{}/photo/$value", person.id)))
            .collect::<Vec<_>>();

        let responses = self.batch.execute("GET", &items).await;
        let lookup = text_lookup(&responses);

        people
            .into_iter()
            .map(|mut person| {
                person.picture = lookup.get(person.id.as_str()).map(|body| body.to_string());
                person
            })
            .collect()
    }
}
