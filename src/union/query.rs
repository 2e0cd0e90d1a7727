//! Reactive union query.
//!
//! Holds the current `UnionRequest`, the pages loaded so far and the query
//! status. Changing the request starts a new generation with its own
//! paginator; results that resolve for an older generation are dropped
//! instead of being applied.

use super::paginator::UnionPaginator;
use crate::data::{UnionRequest, UnionResult};
use crate::error::UnionError;
use crate::integrations::SourceReader;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Ready,
    Failed(UnionError),
}

/// What happened to a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<T> {
    /// The page was loaded and appended to the query data
    Applied(UnionResult<T>),
    /// The last loaded page had no successor
    Exhausted,
    /// The request changed while the page was in flight; result dropped
    Stale,
    /// `set_request` was called with the current request
    Unchanged,
}

/// Point-in-time view of a query
#[derive(Debug, Clone)]
pub struct UnionSnapshot<T> {
    pub data: Vec<T>,
    pub is_loading: bool,
    pub has_next: bool,
    pub status: QueryStatus,
    pub pages_loaded: u32,
    pub generation: u64,
}

impl<T> UnionSnapshot<T> {
    pub fn error(&self) -> Option<&UnionError> {
        match &self.status {
            QueryStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

type SharedPaginator<A, B> = Arc<Mutex<UnionPaginator<Arc<A>, Arc<B>>>>;

/// Counts one in-flight page fetch for as long as it lives.
///
/// Dropping the fetch future mid-flight drops the guard too, so an abandoned
/// fetch never leaves the query reporting `Loading`.
struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl LoadingGuard {
    fn new(in_flight: &Arc<AtomicUsize>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A page fetch started under the state lock
struct PendingPage<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    generation: u64,
    page_number: u32,
    paginator: SharedPaginator<A, B>,
    loading: LoadingGuard,
}

struct State<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    generation: u64,
    request: UnionRequest,
    paginator: SharedPaginator<A, B>,
    data: Vec<A::Item>,
    pages_loaded: u32,
    has_next: bool,
    /// Last settled status; `Loading` is derived from `in_flight`
    status: QueryStatus,
    /// Fetches of this generation still running
    in_flight: Arc<AtomicUsize>,
}

impl<A, B> State<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn status(&self) -> QueryStatus {
        if self.is_loading() {
            QueryStatus::Loading
        } else {
            self.status.clone()
        }
    }

    fn start_page(&self) -> PendingPage<A, B> {
        PendingPage {
            generation: self.generation,
            page_number: self.pages_loaded + 1,
            paginator: Arc::clone(&self.paginator),
            loading: LoadingGuard::new(&self.in_flight),
        }
    }
}

/// Union of two sources exposed as one growing list, in the style of an
/// infinite query: `load` fetches the first page, `fetch_next_page` appends.
pub struct UnionQuery<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    source_a: Arc<A>,
    source_b: Arc<B>,
    state: Mutex<State<A, B>>,
}

impl<A, B> UnionQuery<A, B>
where
    A: SourceReader,
    B: SourceReader<Item = A::Item>,
{
    pub fn new(source_a: A, source_b: B, request: UnionRequest) -> Self {
        let source_a = Arc::new(source_a);
        let source_b = Arc::new(source_b);
        let paginator = Self::paginator_for(&source_a, &source_b, &request);

        Self {
            source_a,
            source_b,
            state: Mutex::new(State {
                generation: 0,
                request,
                paginator,
                data: Vec::new(),
                pages_loaded: 0,
                has_next: false,
                status: QueryStatus::Idle,
                in_flight: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    fn paginator_for(
        source_a: &Arc<A>,
        source_b: &Arc<B>,
        request: &UnionRequest,
    ) -> SharedPaginator<A, B> {
        Arc::new(Mutex::new(UnionPaginator::new(
            Arc::clone(source_a),
            Arc::clone(source_b),
            request.clone(),
        )))
    }

    pub async fn request(&self) -> UnionRequest {
        self.state.lock().await.request.clone()
    }

    pub async fn snapshot(&self) -> UnionSnapshot<A::Item> {
        let state = self.state.lock().await;
        UnionSnapshot {
            data: state.data.clone(),
            is_loading: state.is_loading(),
            has_next: state.has_next,
            status: state.status(),
            pages_loaded: state.pages_loaded,
            generation: state.generation,
        }
    }

    /// Load the first page of the current request if nothing is loaded yet.
    pub async fn load(&self) -> Result<PageOutcome<A::Item>, UnionError> {
        {
            let state = self.state.lock().await;
            if state.pages_loaded > 0 {
                return Ok(PageOutcome::Unchanged);
            }
        }
        self.fetch_next_page().await
    }

    /// Append the next union page to the data.
    pub async fn fetch_next_page(&self) -> Result<PageOutcome<A::Item>, UnionError> {
        let pending = {
            let state = self.state.lock().await;
            if state.pages_loaded > 0 && !state.has_next {
                return Ok(PageOutcome::Exhausted);
            }
            state.start_page()
        };
        self.finish_page(pending).await
    }

    async fn finish_page(
        &self,
        pending: PendingPage<A, B>,
    ) -> Result<PageOutcome<A::Item>, UnionError> {
        let PendingPage {
            generation,
            page_number,
            paginator,
            loading,
        } = pending;

        let result = paginator.lock().await.fetch_union_page(page_number).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!(
                "discarding union page {} of generation {} (current {})",
                page_number,
                generation,
                state.generation
            );
            return Ok(PageOutcome::Stale);
        }

        let outcome = match result {
            Ok(page) => {
                // A concurrent caller may already have applied this page.
                if page_number == state.pages_loaded + 1 {
                    state.data.extend(page.items.iter().cloned());
                    state.pages_loaded = page_number;
                }
                state.has_next = page.has_next;
                state.status = QueryStatus::Ready;
                Ok(PageOutcome::Applied(page))
            }
            Err(e) => {
                tracing::warn!("union query failed: {}", e);
                state.status = QueryStatus::Failed(e.clone());
                Err(e)
            }
        };
        // Settle while the state lock is still held.
        drop(loading);
        outcome
    }

    /// Switch to `request` and load its first page.
    ///
    /// Data of the previous request is cleared and any of its in-flight
    /// pages are discarded when they resolve.
    pub async fn set_request(
        &self,
        request: UnionRequest,
    ) -> Result<PageOutcome<A::Item>, UnionError> {
        let pending = {
            let mut state = self.state.lock().await;
            if state.request == request && state.status() != QueryStatus::Idle {
                return Ok(PageOutcome::Unchanged);
            }
            self.reset(&mut state, request);
            state.start_page()
        };
        self.finish_page(pending).await
    }

    /// Drop loaded pages and load the current request again from page 1.
    pub async fn refetch(&self) -> Result<PageOutcome<A::Item>, UnionError> {
        let pending = {
            let mut state = self.state.lock().await;
            let request = state.request.clone();
            self.reset(&mut state, request);
            state.start_page()
        };
        self.finish_page(pending).await
    }

    fn reset(&self, state: &mut State<A, B>, request: UnionRequest) {
        state.generation += 1;
        state.paginator = Self::paginator_for(&self.source_a, &self.source_b, &request);
        state.request = request;
        state.data.clear();
        state.pages_loaded = 0;
        state.has_next = false;
        state.status = QueryStatus::Idle;
        state.in_flight = Arc::new(AtomicUsize::new(0));
        tracing::debug!("union query reset to generation {}", state.generation);
    }
}
