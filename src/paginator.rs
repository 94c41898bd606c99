//! Incremental list paginator.
//!
//! Wraps a [`ListWindow`] for a single rendered collection. In client-side
//! mode paging never touches the network; in server-paged mode each
//! `load_more` past the buffered items fetches the next page from a
//! [`PageSource`]. A busy flag keeps at most one page fetch in flight, and the
//! window generation lets answers that arrive after a reset be discarded.

use crate::error::ApiError;
use async_trait::async_trait;
use feedcore::api::{Page, PageRequest};
use feedcore::types::events::{CoreEventBus, Event, NoticeKind};
use feedcore::window::{ListWindow, PagingMode, normalize_page_size};
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page<T>, ApiError>;
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// The window changed.
    Loaded,
    /// Nothing left to show; no request was made.
    NoMore,
    /// A page fetch is already in flight; this call was dropped.
    Busy,
    /// The answer arrived after a reset and was discarded.
    Stale,
    /// The fetch failed; the window is unchanged and a retry is allowed.
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded)
    }
}

/// Owned copy of what the view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub visible_count: usize,
    pub total: usize,
    pub generation: u64,
}

struct PagerState<T> {
    window: ListWindow<T>,
    next_page: PageRequest,
}

pub struct Paginator<T> {
    name: String,
    state: Mutex<PagerState<T>>,
    source: Option<Arc<dyn PageSource<T>>>,
    busy: AtomicBool,
    event_bus: CoreEventBus,
}

impl<T: Send> Paginator<T> {
    fn with_mode(
        name: impl Into<String>,
        mode: PagingMode,
        page_size: usize,
        source: Option<Arc<dyn PageSource<T>>>,
        event_bus: CoreEventBus,
    ) -> Self {
        let page_size = normalize_page_size(page_size);
        Self {
            name: name.into(),
            state: Mutex::new(PagerState {
                window: ListWindow::empty(mode, page_size),
                next_page: PageRequest::first(page_size),
            }),
            source,
            busy: AtomicBool::new(false),
            event_bus,
        }
    }

    /// A window over a collection fetched in one go.
    pub fn client_side(name: impl Into<String>, page_size: usize, event_bus: CoreEventBus) -> Self {
        Self::with_mode(name, PagingMode::ClientSide, page_size, None, event_bus)
    }

    /// A window whose pages are fetched from `source` on demand.
    pub fn server_paged(
        name: impl Into<String>,
        source: Arc<dyn PageSource<T>>,
        page_size: usize,
        event_bus: CoreEventBus,
    ) -> Self {
        Self::with_mode(name, PagingMode::ServerPaged, page_size, Some(source), event_bus)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn notify_failure(&self, error: &ApiError, summary: &str) {
        warn!(target: "Paginator", "[{}] {summary}: {error}", self.name);
        self.event_bus.dispatch(&Event::Notice(
            error.notice(NoticeKind::PageFailed, summary),
        ));
    }

    /// Replaces the source with `items` (already sorted by the caller).
    ///
    /// The items are the whole collection: `has_more` only covers what is
    /// still hidden, and a server-paged pager fetches again after `refresh`.
    /// The cursor is parked past the first page so appended pages continue
    /// from page 2.
    pub async fn reset(&self, items: Vec<T>) {
        let mut state = self.state.lock().await;
        state.window.reset(items);
        state.next_page = PageRequest::first(state.window.page_size()).next();
        debug!(
            target: "Paginator",
            "[{}] reset: {} items, generation {}",
            self.name,
            state.window.len(),
            state.window.generation()
        );
    }

    /// Adds items to the end of the source and reveals the next page.
    ///
    /// In server-paged mode the items stand in for the next server page: the
    /// cursor moves past it and the server's `hasMore` is left as it was.
    pub async fn append(&self, items: Vec<T>) {
        let mut state = self.state.lock().await;
        state.window.append(items);
        if state.window.mode() == PagingMode::ServerPaged {
            state.next_page = state.next_page.next();
        }
        debug!(
            target: "Paginator",
            "[{}] appended: {} of {} visible",
            self.name,
            state.window.visible_count(),
            state.window.len()
        );
    }

    /// Loads a full collection with `fetch` and resets onto it. A failure
    /// leaves the current window untouched.
    pub async fn refresh_with<Fut>(&self, fetch: Fut) -> LoadOutcome
    where
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        let generation = self.state.lock().await.window.generation();
        match fetch.await {
            Ok(items) => {
                let mut state = self.state.lock().await;
                if state.window.generation() != generation {
                    debug!(target: "Paginator", "[{}] dropping refresh superseded by a reset", self.name);
                    return LoadOutcome::Stale;
                }
                state.window.reset(items);
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.notify_failure(&e, "couldn't refresh");
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Server-paged mode: fetches the first page and resets onto it.
    /// In client-side mode there is nothing to fetch and this is a no-op.
    pub async fn refresh(&self) -> LoadOutcome {
        let Some(source) = &self.source else {
            return LoadOutcome::NoMore;
        };
        let (generation, request) = {
            let state = self.state.lock().await;
            (
                state.window.generation(),
                PageRequest::first(state.window.page_size()),
            )
        };
        match source.fetch_page(request).await {
            Ok(page) => {
                let mut state = self.state.lock().await;
                if state.window.generation() != generation {
                    return LoadOutcome::Stale;
                }
                state.window.reset_server_page(page.items, page.has_more);
                state.next_page = request.next();
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.notify_failure(&e, "couldn't refresh");
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Reveals the next page, fetching it first when the window is
    /// server-paged and nothing is buffered.
    pub async fn load_more(&self) -> LoadOutcome {
        let (source, generation, request) = {
            let mut state = self.state.lock().await;
            if !state.window.has_more() {
                return LoadOutcome::NoMore;
            }
            let source = match &self.source {
                Some(source) if !state.window.has_buffered() => source.clone(),
                _ => {
                    state.window.load_more();
                    return LoadOutcome::Loaded;
                }
            };
            // Claimed under the state lock so a completing fetch cannot slip
            // between reading `next_page` and marking the window busy.
            if self.busy.swap(true, Ordering::AcqRel) {
                debug!(target: "Paginator", "[{}] load_more ignored: fetch in flight", self.name);
                return LoadOutcome::Busy;
            }
            (source, state.window.generation(), state.next_page)
        };
        let _busy = scopeguard::guard(&self.busy, |busy| busy.store(false, Ordering::Release));

        debug!(target: "Paginator", "[{}] fetching page {}", self.name, request.page);
        match source.fetch_page(request).await {
            Ok(page) => {
                let mut state = self.state.lock().await;
                if state.window.generation() != generation {
                    debug!(
                        target: "Paginator",
                        "[{}] discarding page {} from generation {generation}",
                        self.name, request.page
                    );
                    return LoadOutcome::Stale;
                }
                state.window.append_server_page(page.items, page.has_more);
                state.next_page = request.next();
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.notify_failure(&e, "couldn't load more");
                LoadOutcome::Failed(e)
            }
        }
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.window.has_more()
    }

    pub async fn visible_count(&self) -> usize {
        self.state.lock().await.window.visible_count()
    }
}

impl<T: Clone + Send> Paginator<T> {
    pub async fn visible(&self) -> Vec<T> {
        self.state.lock().await.window.visible().to_vec()
    }

    pub async fn snapshot(&self) -> WindowSnapshot<T> {
        let state = self.state.lock().await;
        WindowSnapshot {
            items: state.window.visible().to_vec(),
            has_more: state.window.has_more(),
            visible_count: state.window.visible_count(),
            total: state.window.len(),
            generation: state.window.generation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Page source answering from a script, optionally parked on a gate.
    struct ScriptedSource {
        pages: std::sync::Mutex<VecDeque<Result<Page<u32>, ApiError>>>,
        requests: std::sync::Mutex<Vec<PageRequest>>,
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page<u32>, ApiError>>) -> Self {
            Self {
                pages: std::sync::Mutex::new(pages.into()),
                requests: std::sync::Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource<u32> for ScriptedSource {
        async fn fetch_page(&self, request: PageRequest) -> Result<Page<u32>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate open").forget();
            }
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport(anyhow::anyhow!("script exhausted"))))
        }
    }

    fn explore_pager(source: Arc<ScriptedSource>, bus: CoreEventBus) -> Paginator<u32> {
        let source: Arc<dyn PageSource<u32>> = source;
        Paginator::server_paged("explore", source, 10, bus)
    }

    fn page(range: std::ops::RangeInclusive<u32>, has_more: bool) -> Result<Page<u32>, ApiError> {
        Ok(Page {
            items: range.collect(),
            has_more,
        })
    }

    #[tokio::test]
    async fn test_client_side_paging_is_deterministic() {
        let pager = Paginator::<u32>::client_side("grid", 10, CoreEventBus::new());
        pager.reset((1..=30).collect::<Vec<u32>>()).await;

        assert!(pager.load_more().await.is_loaded());
        assert!(pager.load_more().await.is_loaded());
        let snapshot = pager.snapshot().await;
        assert_eq!(snapshot.visible_count, 30);
        assert!(!snapshot.has_more);
        assert_eq!(snapshot.items, (1..=30).collect::<Vec<u32>>());
        assert!(matches!(pager.load_more().await, LoadOutcome::NoMore));
    }

    #[tokio::test]
    async fn test_server_paged_fetches_next_pages() {
        let source = Arc::new(ScriptedSource::new(vec![
            page(1..=10, true),
            page(11..=20, true),
            page(21..=25, false),
        ]));
        let pager = explore_pager(source.clone(), CoreEventBus::new());

        assert!(pager.refresh().await.is_loaded());
        assert!(pager.load_more().await.is_loaded());
        assert!(pager.load_more().await.is_loaded());

        let snapshot = pager.snapshot().await;
        assert_eq!(snapshot.items, (1..=25).collect::<Vec<u32>>());
        assert!(!snapshot.has_more);
        let pages: Vec<u32> = source.requests.lock().unwrap().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_exhausted_window_makes_no_request() {
        let source = Arc::new(ScriptedSource::new(vec![page(1..=4, false)]));
        let pager = explore_pager(source.clone(), CoreEventBus::new());
        pager.refresh().await;

        let before = pager.snapshot().await;
        assert!(matches!(pager.load_more().await, LoadOutcome::NoMore));
        assert_eq!(pager.snapshot().await, before);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_load_more_fetches_once() {
        // One permit lets the first page through; page two waits for the test.
        let gate = Arc::new(Semaphore::new(1));
        let source = Arc::new(
            ScriptedSource::new(vec![page(1..=10, true), page(11..=20, true)]).gated(gate.clone()),
        );
        let pager = explore_pager(source.clone(), CoreEventBus::new());
        assert!(pager.refresh().await.is_loaded());

        let first = pager.load_more();
        let second = async {
            assert!(pager.is_busy());
            let outcome = pager.load_more().await;
            gate.add_permits(1);
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_loaded());
        assert!(matches!(second, LoadOutcome::Busy));
        assert_eq!(source.calls(), 2);
        assert!(!pager.is_busy());
        assert_eq!(pager.visible_count().await, 20);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_window_and_allows_retry() {
        let source = Arc::new(ScriptedSource::new(vec![
            page(1..=10, true),
            Err(ApiError::Timeout(std::time::Duration::from_secs(30))),
            page(11..=15, false),
        ]));
        let bus = CoreEventBus::new();
        let notices = Arc::new(AtomicUsize::new(0));
        let counter = notices.clone();
        bus.add_handler(Arc::new(move |event: &Event| {
            if matches!(event, Event::Notice(n) if n.kind == NoticeKind::PageFailed) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let pager = explore_pager(source.clone(), bus);
        pager.refresh().await;

        let before = pager.snapshot().await;
        assert!(matches!(pager.load_more().await, LoadOutcome::Failed(ApiError::Timeout(_))));
        assert_eq!(pager.snapshot().await, before);
        assert!(!pager.is_busy());
        assert_eq!(notices.load(Ordering::SeqCst), 1);

        assert!(pager.load_more().await.is_loaded());
        assert_eq!(pager.visible_count().await, 15);
        let pages: Vec<u32> = source.requests.lock().unwrap().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_page_arriving_after_reset_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(ScriptedSource::new(vec![page(11..=20, true)]).gated(gate.clone()));
        let pager = explore_pager(source.clone(), CoreEventBus::new());
        pager
            .state
            .lock()
            .await
            .window
            .reset_server_page((1..=10).collect(), true);

        let load = pager.load_more();
        let reset = async {
            pager.reset((100..=105).collect()).await;
            gate.add_permits(1);
        };
        let (load, ()) = tokio::join!(load, reset);

        assert!(matches!(load, LoadOutcome::Stale));
        assert_eq!(pager.visible().await, (100..=105).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_reset_on_server_pager_stops_fetching() {
        let source = Arc::new(ScriptedSource::new(vec![page(1..=10, true), page(11..=20, true)]));
        let pager = explore_pager(source.clone(), CoreEventBus::new());
        assert!(pager.refresh().await.is_loaded());

        pager.reset((100..=105).collect()).await;
        assert!(!pager.has_more().await);
        assert!(matches!(pager.load_more().await, LoadOutcome::NoMore));
        assert_eq!(pager.visible().await, (100..=105).collect::<Vec<u32>>());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_append_on_server_pager_moves_cursor() {
        let source = Arc::new(ScriptedSource::new(vec![page(1..=10, true), page(21..=30, false)]));
        let pager = explore_pager(source.clone(), CoreEventBus::new());
        assert!(pager.refresh().await.is_loaded());

        pager.append((11..=20).collect()).await;
        assert_eq!(pager.visible_count().await, 20);
        assert!(pager.has_more().await);

        assert!(pager.load_more().await.is_loaded());
        let snapshot = pager.snapshot().await;
        assert_eq!(snapshot.items, (1..=30).collect::<Vec<u32>>());
        assert!(!snapshot.has_more);
        let pages: Vec<u32> = source.requests.lock().unwrap().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_append_on_client_side_pager_reveals_next_page() {
        let pager = Paginator::<u32>::client_side("grid", 10, CoreEventBus::new());
        pager.reset((1..=10).collect::<Vec<u32>>()).await;
        assert!(!pager.has_more().await);

        pager.append((11..=25).collect()).await;
        let snapshot = pager.snapshot().await;
        assert_eq!(snapshot.visible_count, 20);
        assert_eq!(snapshot.total, 25);
        assert!(snapshot.has_more);

        assert!(pager.load_more().await.is_loaded());
        assert_eq!(pager.visible().await, (1..=25).collect::<Vec<u32>>());
        assert!(matches!(pager.load_more().await, LoadOutcome::NoMore));
    }

    #[tokio::test]
    async fn test_refresh_superseded_by_reset_is_discarded() {
        let pager = Paginator::<u32>::client_side("notifications", 10, CoreEventBus::new());
        pager.reset(vec![1u32, 2, 3]).await;
        let (tx, rx) = tokio::sync::oneshot::channel::<Vec<u32>>();

        let refresh = pager.refresh_with(async {
            Ok(rx.await.expect("sender kept alive"))
        });
        let reset = async {
            pager.reset(vec![40u32, 41]).await;
            tx.send(vec![7, 8, 9]).expect("refresh still waiting");
        };
        let (refresh, ()) = tokio::join!(refresh, reset);

        assert!(matches!(refresh, LoadOutcome::Stale));
        assert_eq!(pager.visible().await, vec![40, 41]);
    }

    #[tokio::test]
    async fn test_refresh_with_failure_keeps_previous_items() {
        let pager = Paginator::<u32>::client_side("conversations", 2, CoreEventBus::new());
        pager.reset(vec![1u32, 2, 3]).await;

        let outcome = pager
            .refresh_with(async { Err(ApiError::Unauthorized) })
            .await;
        assert!(matches!(outcome, LoadOutcome::Failed(ApiError::Unauthorized)));
        assert_eq!(pager.visible().await, vec![1, 2]);

        let outcome = pager.refresh_with(async { Ok(vec![7, 8, 9]) }).await;
        assert!(outcome.is_loaded());
        assert_eq!(pager.visible().await, vec![7, 8]);
        assert!(pager.has_more().await);
    }
}
