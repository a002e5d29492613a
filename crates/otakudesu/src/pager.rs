//! Paged list loader.
//!
//! Drives the fetch-and-append cycle behind the completed, ongoing and genre
//! lists. A loader owns the items fetched so far, the page cursor and the
//! view flags, and enforces two rules:
//!
//! - at most one page request is in flight per list;
//! - no request is issued past the last page.
//!
//! Every loader carries a [`CancellationToken`]. Once cancelled, an
//! outstanding request is abandoned and no later completion touches state.

use crate::catalog::ListResource;
use crate::error::{LoadError, Messages};
use crate::source::PageSource;
use crate::view::SlotGuard;
use shared::{AnimeSummary, PageCursor};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default remaining distance, in viewports, that triggers a load-more
pub const DEFAULT_LOAD_MORE_THRESHOLD: f64 = 0.5;

/// Scroll position of a list view, in any consistent length unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top
    pub offset: f64,
    /// Visible length
    pub viewport_len: f64,
    /// Total content length
    pub content_len: f64,
}

impl ScrollMetrics {
    /// Distance between the bottom of the viewport and the end of the content
    pub fn distance_from_end(&self) -> f64 {
        (self.content_len - self.offset - self.viewport_len).max(0.0)
    }

    /// Whether the end of the content is within `threshold` viewports
    pub fn is_near_end(&self, threshold: f64) -> bool {
        self.viewport_len > 0.0 && self.distance_from_end() <= threshold * self.viewport_len
    }
}

/// One page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub append: bool,
}

/// Why a trigger did not issue a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A page request is already outstanding
    InFlight,
    /// The last page has been loaded
    LastPage,
    /// The scroll position is not close enough to the end
    NotNearEnd,
}

/// Result of a load trigger that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was fetched and merged
    Loaded { page: u32, received: usize },
    /// No request was issued
    Skipped(SkipReason),
    /// The loader was cancelled; state is untouched
    Cancelled,
}

/// What a list view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub items: Vec<AnimeSummary>,
    pub cursor: PageCursor,
    /// A page-1 load is in flight
    pub loading: bool,
    /// A later page is in flight
    pub loading_more: bool,
    pub error: Option<&'static str>,
}

#[derive(Debug, Default)]
struct ListState {
    items: Vec<AnimeSummary>,
    cursor: PageCursor,
    in_flight: Option<PageRequest>,
    last_attempt: Option<PageRequest>,
    error: Option<&'static str>,
}

/// Incremental loader for one list view
pub struct PagedListLoader<S> {
    source: S,
    resource: ListResource,
    state: Mutex<ListState>,
    cancel: CancellationToken,
    threshold: f64,
}

impl<S: PageSource> PagedListLoader<S> {
    /// Create a loader with its own cancellation token
    pub fn new(source: S, resource: ListResource) -> Self {
        Self {
            source,
            resource,
            state: Mutex::new(ListState::default()),
            cancel: CancellationToken::new(),
            threshold: DEFAULT_LOAD_MORE_THRESHOLD,
        }
    }

    /// Tie the loader to its owner's lifetime: cancelling `parent` cancels
    /// this loader too
    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    /// Set the load-more threshold, in viewports
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.max(0.0);
        self
    }

    pub fn resource(&self) -> &ListResource {
        &self.resource
    }

    /// Fetch `page`, replacing the list or appending to it
    pub async fn load(&self, page: u32, append: bool) -> Result<LoadOutcome, LoadError> {
        let page = if page == 0 {
            warn!(resource = %self.resource, "Page 0 requested, loading page 1");
            1
        } else {
            page
        };

        match self.reserve(|_| Ok(PageRequest { page, append })) {
            Ok(request) => self.run(request).await,
            Err(outcome) => Ok(outcome),
        }
    }

    /// Fetch the page after the cursor and append it
    pub async fn load_more(&self) -> Result<LoadOutcome, LoadError> {
        let reserved = self.reserve(|state| {
            state
                .cursor
                .next_page()
                .map(|page| PageRequest { page, append: true })
                .ok_or(SkipReason::LastPage)
        });

        match reserved {
            Ok(request) => self.run(request).await,
            Err(outcome) => Ok(outcome),
        }
    }

    /// Load-more trigger for a scroll event
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Result<LoadOutcome, LoadError> {
        if !metrics.is_near_end(self.threshold) {
            return Ok(LoadOutcome::Skipped(SkipReason::NotNearEnd));
        }
        self.load_more().await
    }

    /// Start over from page 1
    pub async fn retry(&self) -> Result<LoadOutcome, LoadError> {
        self.load(1, false).await
    }

    /// Re-issue the last attempted request, or page 1 if there was none
    pub async fn retry_last(&self) -> Result<LoadOutcome, LoadError> {
        let last = self.state().last_attempt;
        match last {
            Some(request) => self.load(request.page, request.append).await,
            None => self.retry().await,
        }
    }

    /// Abandon any outstanding request and ignore all future triggers
    pub fn cancel(&self) {
        debug!(resource = %self.resource, "Cancelling list loader");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.state();
        ListSnapshot {
            items: state.items.clone(),
            cursor: state.cursor,
            loading: matches!(state.in_flight, Some(r) if r.page == 1),
            loading_more: matches!(state.in_flight, Some(r) if r.page > 1),
            error: state.error,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.state().cursor
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.state().in_flight.is_some()
    }

    pub fn error(&self) -> Option<&'static str> {
        self.state().error
    }

    /// Claim the in-flight slot for the request `pick` chooses
    fn reserve<F>(&self, pick: F) -> Result<PageRequest, LoadOutcome>
    where
        F: FnOnce(&ListState) -> Result<PageRequest, SkipReason>,
    {
        if self.cancel.is_cancelled() {
            return Err(LoadOutcome::Cancelled);
        }

        let mut state = self.state();
        if let Some(current) = state.in_flight {
            debug!(resource = %self.resource, page = current.page, "Load already in flight");
            return Err(LoadOutcome::Skipped(SkipReason::InFlight));
        }

        let request = pick(&*state).map_err(|reason| {
            debug!(resource = %self.resource, cursor = %state.cursor, ?reason, "Not loading");
            LoadOutcome::Skipped(reason)
        })?;

        state.in_flight = Some(request);
        state.last_attempt = Some(request);
        state.error = None;
        Ok(request)
    }

    async fn run(&self, request: PageRequest) -> Result<LoadOutcome, LoadError> {
        info!(
            resource = %self.resource,
            page = request.page,
            append = request.append,
            "Loading page"
        );

        let slot = SlotGuard::new(&self.state, |state: &mut ListState| state.in_flight = None);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.source.fetch_page(request.page) => Some(result),
        };

        let mut state = self.state();
        state.in_flight = None;
        slot.disarm();

        let result = match result {
            Some(result) if !self.cancel.is_cancelled() => result,
            _ => {
                debug!(resource = %self.resource, page = request.page, "Discarding cancelled load");
                return Ok(LoadOutcome::Cancelled);
            }
        };

        let response = match result {
            Ok(response) if response.ok => response,
            Ok(_) => {
                warn!(resource = %self.resource, page = request.page, "API rejected page request");
                let err = LoadError::rejected(Messages::LIST);
                state.error = Some(err.user_message());
                return Err(err);
            }
            Err(e) => {
                warn!(resource = %self.resource, page = request.page, error = %e, "Error loading anime list");
                let err = LoadError::failed(Messages::LIST, e);
                state.error = Some(err.user_message());
                return Err(err);
            }
        };

        let (records, in_data) = match response.data {
            Some(data) => (data.anime_list, data.pagination),
            None => (Vec::new(), None),
        };

        let received = records.len();
        let items = records
            .into_iter()
            .map(|record| self.resource.normalize(record));

        if request.append {
            state.items.extend(items);
        } else {
            state.items = items.collect();
        }

        state.cursor =
            self.resource
                .cursor_after(request.page, response.pagination.as_ref(), in_data.as_ref());

        info!(
            resource = %self.resource,
            page = state.cursor.current_page,
            has_next_page = state.cursor.has_next_page,
            received = received,
            total = state.items.len(),
            "Page loaded"
        );

        Ok(LoadOutcome::Loaded {
            page: request.page,
            received,
        })
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoint;
    use crate::catalog::CatalogSource;
    use crate::testing::FakeApi;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio::time::timeout;

    type Loader = PagedListLoader<CatalogSource<FakeApi>>;

    fn loader(api: &Arc<FakeApi>, resource: ListResource) -> Loader {
        PagedListLoader::new(CatalogSource::new(Arc::clone(api), resource.clone()), resource)
    }

    fn page(ids: &[&str], current: u32, has_next: bool) -> serde_json::Value {
        let list: Vec<_> = ids
            .iter()
            .map(|id| json!({"animeId": id, "title": format!("{} (Sub)", id)}))
            .collect();
        json!({
            "ok": true,
            "data": {"animeList": list},
            "pagination": {"currentPage": current, "hasNextPage": has_next}
        })
    }

    fn ids(loader: &Loader) -> Vec<String> {
        loader
            .snapshot()
            .items
            .into_iter()
            .map(|item| item.anime_id)
            .collect()
    }

    #[tokio::test]
    async fn test_first_page_normalizes_and_advances() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(
                    Endpoint::Completed { page: 1 },
                    json!({
                        "ok": true,
                        "data": {"animeList": [{"animeId": "a1", "title": "Foo (Dub)"}]},
                        "pagination": {"currentPage": 1, "hasNextPage": true}
                    }),
                )
                .reply(Endpoint::Completed { page: 2 }, page(&["a2"], 2, false)),
        );
        let list = loader(&api, ListResource::Completed);

        let outcome = list.load(1, false).await?;
        assert_eq!(outcome, LoadOutcome::Loaded { page: 1, received: 1 });
        assert_eq!(list.snapshot().items[0].title, "Foo");

        // the next trigger asks for page 2
        let next = list.load_more().await?;
        assert!(matches!(next, LoadOutcome::Loaded { page: 2, .. }));
        assert_eq!(api.requests(), vec!["/completed?page=1", "/completed?page=2"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_page_one_replaces_existing_items() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(Endpoint::Completed { page: 1 }, page(&["a", "b"], 1, true))
                .reply(Endpoint::Completed { page: 2 }, page(&["c"], 2, true))
                .reply(Endpoint::Completed { page: 1 }, page(&["z"], 1, true)),
        );
        let list = loader(&api, ListResource::Completed);

        list.load(1, false).await?;
        list.load_more().await?;
        assert_eq!(ids(&list), vec!["a", "b", "c"]);

        list.retry().await?;
        assert_eq!(ids(&list), vec!["z"]);
        assert_eq!(list.cursor(), PageCursor { current_page: 1, has_next_page: true });

        Ok(())
    }

    #[tokio::test]
    async fn test_append_keeps_prior_order() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(Endpoint::Ongoing { page: 1 }, page(&["a", "b"], 1, true))
                .reply(Endpoint::Ongoing { page: 2 }, page(&["c", "d", "e"], 2, false)),
        );
        let list = loader(&api, ListResource::Ongoing);

        list.load(1, false).await?;
        let before = list.snapshot().items;

        let outcome = list.load(2, true).await?;
        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, received: 3 });

        let after = list.snapshot().items;
        assert_eq!(after.len(), before.len() + 3);
        assert_eq!(&after[..before.len()], &before[..]);
        // ongoing titles are not normalized
        assert_eq!(after[0].title, "a (Sub)");

        Ok(())
    }

    #[tokio::test]
    async fn test_no_request_past_last_page() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new().reply(Endpoint::Completed { page: 1 }, page(&["a"], 1, false)),
        );
        let list = loader(&api, ListResource::Completed);

        list.load(1, false).await?;
        let outcome = list.load_more().await?;

        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::LastPage));
        assert_eq!(api.requests().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_pagination_means_last_page() -> Result<(), LoadError> {
        let api = Arc::new(FakeApi::new().reply(
            Endpoint::Completed { page: 3 },
            json!({"ok": true, "data": {"animeList": []}}),
        ));
        let list = loader(&api, ListResource::Completed);

        list.load(3, false).await?;
        assert_eq!(list.cursor(), PageCursor { current_page: 3, has_next_page: false });

        Ok(())
    }

    #[tokio::test]
    async fn test_load_more_while_in_flight_is_a_no_op() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            FakeApi::gated(Arc::clone(&gate))
                .reply(Endpoint::Completed { page: 1 }, page(&["a"], 1, true)),
        );
        let list = loader(&api, ListResource::Completed);

        let (first, second) = tokio::join!(list.load(1, false), async {
            // first future is now parked on the gate
            assert!(list.is_loading());
            assert!(list.snapshot().loading);
            let outcome = list.load_more().await;
            gate.add_permits(1);
            outcome
        });

        assert!(matches!(first, Ok(LoadOutcome::Loaded { page: 1, .. })));
        assert!(matches!(second, Ok(LoadOutcome::Skipped(SkipReason::InFlight))));
        assert_eq!(api.requests(), vec!["/completed?page=1"]);
    }

    #[tokio::test]
    async fn test_dropped_load_frees_the_in_flight_slot() -> Result<(), LoadError> {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            FakeApi::gated(Arc::clone(&gate))
                .reply(Endpoint::Completed { page: 1 }, page(&["a"], 1, true)),
        );
        let list = loader(&api, ListResource::Completed);

        let timed_out = timeout(Duration::from_millis(20), list.load(1, false)).await;
        assert!(timed_out.is_err());
        assert!(!list.is_loading());

        gate.add_permits(1);
        let outcome = list.retry().await?;
        assert_eq!(outcome, LoadOutcome::Loaded { page: 1, received: 1 });
        assert_eq!(ids(&list), vec!["a"]);
        assert_eq!(api.requests().len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_page_keeps_list_and_cursor() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(Endpoint::GenreAnime { genre_id: "action", page: 1 }, page(&["a"], 1, true))
                .reply(Endpoint::GenreAnime { genre_id: "action", page: 2 }, json!({"ok": false})),
        );
        let list = loader(&api, ListResource::genre("action"));

        list.load(1, false).await?;
        let err = list.load_more().await.unwrap_err();

        assert!(matches!(err, LoadError::Rejected { .. }));
        let snapshot = list.snapshot();
        assert_eq!(snapshot.error, Some("Gagal memuat daftar anime"));
        assert_eq!(ids(&list), vec!["a"]);
        assert_eq!(snapshot.cursor, PageCursor { current_page: 1, has_next_page: true });
        assert!(!snapshot.loading_more);

        Ok(())
    }

    #[tokio::test]
    async fn test_transport_failure_then_retry_last() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(Endpoint::Ongoing { page: 1 }, page(&["a"], 1, true))
                .fail(Endpoint::Ongoing { page: 2 })
                .reply(Endpoint::Ongoing { page: 2 }, page(&["b"], 2, false)),
        );
        let list = loader(&api, ListResource::Ongoing);

        list.load(1, false).await?;
        let err = list.load_more().await.unwrap_err();
        assert_eq!(err.user_message(), "Terjadi kesalahan");
        assert_eq!(list.error(), Some("Terjadi kesalahan"));

        let outcome = list.retry_last().await?;
        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, received: 1 });
        assert_eq!(ids(&list), vec!["a", "b"]);
        assert_eq!(list.error(), None);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_discards_late_completion() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            FakeApi::gated(Arc::clone(&gate))
                .reply(Endpoint::Completed { page: 1 }, page(&["a"], 1, true)),
        );
        let screen = CancellationToken::new();
        let list = loader(&api, ListResource::Completed).with_parent(&screen);

        let (outcome, ()) = tokio::join!(list.load(1, false), async {
            screen.cancel();
            gate.add_permits(1);
        });

        assert!(matches!(outcome, Ok(LoadOutcome::Cancelled)));
        assert!(list.is_empty());
        assert!(!list.is_loading());

        // later triggers never reach the network
        assert!(matches!(list.load(1, false).await, Ok(LoadOutcome::Cancelled)));
        assert_eq!(api.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_scroll_threshold() -> Result<(), LoadError> {
        let api = Arc::new(
            FakeApi::new()
                .reply(Endpoint::Completed { page: 1 }, page(&["a"], 1, true))
                .reply(Endpoint::Completed { page: 2 }, page(&["b"], 2, true)),
        );
        let list = loader(&api, ListResource::Completed);
        list.load(1, false).await?;

        let far = ScrollMetrics { offset: 0.0, viewport_len: 100.0, content_len: 400.0 };
        assert_eq!(
            list.on_scroll(far).await?,
            LoadOutcome::Skipped(SkipReason::NotNearEnd)
        );

        let near = ScrollMetrics { offset: 260.0, viewport_len: 100.0, content_len: 400.0 };
        assert_eq!(list.on_scroll(near).await?, LoadOutcome::Loaded { page: 2, received: 1 });

        Ok(())
    }

    #[test]
    fn test_scroll_metrics() {
        let short = ScrollMetrics { offset: 0.0, viewport_len: 500.0, content_len: 200.0 };
        assert_eq!(short.distance_from_end(), 0.0);
        assert!(short.is_near_end(0.5));

        let edge = ScrollMetrics { offset: 250.0, viewport_len: 100.0, content_len: 400.0 };
        assert!(edge.is_near_end(0.5));
        assert!(!edge.is_near_end(0.4));

        let hidden = ScrollMetrics { offset: 0.0, viewport_len: 0.0, content_len: 0.0 };
        assert!(!hidden.is_near_end(0.5));
    }
}
