//! Per-session directory state and the UI events that drive it.

use serde::Serialize;

use crate::directory::engine::{DirectoryScope, FetchOutcome, SearchEngine};
use crate::directory::store::Store;
use crate::domain::person::Person;
use crate::domain::types::{GroupId, PageSize};
use crate::graph::GraphResult;
use crate::pagination::{Pager, PagerView};

/// Search state owned by the controller.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub query_text: String,
    /// Empty string means every department.
    pub selected_department: String,
    pub group: Option<GroupId>,
    /// Every person fetched for the active query, in page order.
    pub accumulated_results: Vec<Person>,
    pub initialized: bool,
    page_size: PageSize,
    pager: Pager,
    generation: u64,
}

impl SearchState {
    fn new(scope: DirectoryScope) -> Self {
        Self {
            query_text: String::new(),
            selected_department: String::new(),
            group: scope.group,
            accumulated_results: Vec::new(),
            initialized: false,
            page_size: scope.page_size,
            pager: Pager::new(0, scope.page_size.get()),
            generation: 0,
        }
    }

    /// Scope the next query is issued in.
    pub fn scope(&self) -> DirectoryScope {
        DirectoryScope {
            group: self.group,
            page_size: self.page_size,
        }
    }

    pub fn current_page(&self) -> usize {
        self.pager.selected()
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    /// People shown on the current page.
    pub fn displayed(&self) -> &[Person] {
        let size = self.page_size();
        let len = self.accumulated_results.len();
        let start = ((self.current_page() - 1) * size).min(len);
        let end = (self.current_page() * size).min(len);
        &self.accumulated_results[start..end]
    }
}

/// Snapshot rendered by templates and returned by the JSON API.
#[derive(Clone, Debug, Serialize)]
pub struct DirectoryView {
    pub query_text: String,
    pub selected_department: String,
    pub group: Option<GroupId>,
    pub page_size: usize,
    pub people: Vec<Person>,
    pub pager: PagerView,
    pub summary: String,
    pub total: usize,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct DirectoryController {
    engine: SearchEngine,
    state: Store<SearchState>,
}

impl DirectoryController {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            state: Store::new(SearchState::new(engine.scope())),
            engine,
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn state(&self) -> SearchState {
        self.state.snapshot()
    }

    /// Loads the first page unless the directory was already loaded.
    pub async fn initial_load(&self) -> GraphResult<()> {
        if self.state.read(|state| state.initialized) {
            return Ok(());
        }
        self.restart(|_| {}).await
    }

    /// Runs a free-text search within the selected department.
    pub async fn submit_search(&self, text: &str) -> GraphResult<()> {
        let text = text.trim().to_string();
        self.restart(move |state| state.query_text = text).await
    }

    /// Selects a department and reloads the directory without search text.
    pub async fn select_department(&self, key: &str) -> GraphResult<()> {
        let key = key.trim().to_string();
        self.restart(move |state| {
            state.selected_department = key;
            state.query_text.clear();
        })
        .await
    }

    /// Switches the backing group and reloads the directory without search text.
    pub async fn change_group(&self, group: Option<GroupId>) -> GraphResult<()> {
        self.restart(move |state| {
            state.group = group;
            state.query_text.clear();
        })
        .await
    }

    /// Changes the page size and reruns the current search.
    pub async fn set_page_size(&self, page_size: PageSize) -> GraphResult<()> {
        self.restart(move |state| {
            state.page_size = page_size;
            state.pager.set_page_size(page_size.get());
        })
        .await
    }

    /// Moves to `page`, fetching further pages until it is covered or the
    /// cursor runs out.
    pub async fn go_to_page(&self, page: usize) -> GraphResult<()> {
        let generation = self.state.read(|state| state.generation);

        loop {
            // Issued under the state lock, after any restart that bumped the generation.
            let pending = self.state.read(|state| {
                let target = page.clamp(1, state.pager.total_pages());
                let covered = state.accumulated_results.len() >= target * state.page_size();
                if state.generation != generation || covered {
                    return None;
                }
                self.engine.begin_next_page()
            });
            let Some(pending) = pending else {
                break;
            };

            match self.engine.complete(pending).await? {
                FetchOutcome::Applied(fetched) => {
                    let appended = self.state.update_if(|state| {
                        (state.generation == generation).then(|| {
                            state.accumulated_results.extend(fetched.people);
                            state.pager.set_count(fetched.total);
                        })
                    });
                    if appended.is_none() {
                        return Ok(());
                    }
                }
                FetchOutcome::Stale => return Ok(()),
                FetchOutcome::Exhausted => break,
            }
        }

        self.state.update_if(|state| {
            (state.generation == generation).then(|| state.pager.select(page))
        });
        Ok(())
    }

    pub fn view(&self) -> DirectoryView {
        let engine = self.engine.state();
        self.state.read(|state| {
            let pager = state.pager.view();
            DirectoryView {
                query_text: state.query_text.clone(),
                selected_department: state.selected_department.clone(),
                group: state.group,
                page_size: state.page_size(),
                people: state.displayed().to_vec(),
                summary: pager.summary(),
                pager,
                total: engine.total,
                loading: engine.loading,
                error: engine.error,
            }
        })
    }

    /// Clears accumulated results, applies `change` and fetches page one.
    ///
    /// The engine token is issued inside the same state update as the new
    /// generation, so both orders agree.
    async fn restart(&self, change: impl FnOnce(&mut SearchState)) -> GraphResult<()> {
        let (generation, pending) = self.state.update(|state| {
            change(state);
            state.generation += 1;
            state.initialized = true;
            state.accumulated_results.clear();
            state.pager.select(1);
            let pending = self.engine.begin_search(
                state.scope(),
                &state.query_text,
                &state.selected_department,
            );
            (state.generation, pending)
        });

        if let FetchOutcome::Applied(fetched) = self.engine.complete(pending?).await? {
            self.state.update_if(|state| {
                (state.generation == generation).then(|| {
                    state.accumulated_results = fetched.people;
                    state.pager.set_count(fetched.total);
                    state.pager.select(1);
                })
            });
        }
        Ok(())
    }
}
