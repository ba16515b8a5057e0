//! URL-backed filter synchronisation.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use sitewire_api_types::{ContentSummary, FilterState, SortOrder};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::lock::mutex_lock;

use super::{DebouncePolicy, QueryClient, Schedule};

/// The only failure text a viewer ever sees.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

const SYNC_TARGET: &str = "sitewire::client::sync";

/// What the listing currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    Idle,
    Loading,
    Ready(Arc<Vec<ContentSummary>>),
    Empty,
    Failed(&'static str),
}

impl ResultsView {
    pub fn items(&self) -> &[ContentSummary] {
        match self {
            ResultsView::Ready(items) => items.as_slice(),
            _ => &[],
        }
    }
}

struct Inner {
    client: Arc<dyn QueryClient>,
    location: Mutex<String>,
    policy: DebouncePolicy,
    seq: AtomicU64,
    search_generation: AtomicU64,
    view: watch::Sender<ResultsView>,
}

/// Keeps the filter triple in canonical query-string form and re-runs the
/// listing query whenever a commit changes it.
///
/// The query string is the source of truth; [`FilterSync::state`] is always
/// parsed back from it. Only the response of the most recently issued query
/// is ever applied to the view.
#[derive(Clone)]
pub struct FilterSync {
    inner: Arc<Inner>,
}

impl FilterSync {
    pub fn new(client: Arc<dyn QueryClient>, initial_query: &str, policy: DebouncePolicy) -> Self {
        let canonical = FilterState::from_query_string(initial_query).to_query_string();
        let (view, _) = watch::channel(ResultsView::Idle);
        Self {
            inner: Arc::new(Inner {
                client,
                location: Mutex::new(canonical),
                policy,
                seq: AtomicU64::new(0),
                search_generation: AtomicU64::new(0),
                view,
            }),
        }
    }

    /// Canonical query string, without a leading `?`.
    pub fn query_string(&self) -> String {
        mutex_lock(&self.inner.location, SYNC_TARGET, "query_string").clone()
    }

    pub fn state(&self) -> FilterState {
        FilterState::from_query_string(&self.query_string())
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultsView> {
        self.inner.view.subscribe()
    }

    pub fn view(&self) -> ResultsView {
        self.inner.view.borrow().clone()
    }

    /// Typed input waits for the debounce window; clearing the field commits
    /// at once. Either way any pending search update is superseded.
    pub async fn set_search(&self, value: impl Into<String>) {
        let value = value.into();
        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;

        match self.inner.policy.schedule(&value) {
            Schedule::Immediate => {
                self.inner.commit(move |state| state.with_search(value)).await;
            }
            Schedule::After(delay) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if inner.search_generation.load(Ordering::SeqCst) != generation {
                        debug!(target: SYNC_TARGET, "superseded search update dropped");
                        return;
                    }
                    inner.commit(move |state| state.with_search(value)).await;
                });
            }
        }
    }

    pub async fn set_category(&self, category: impl Into<String>) {
        let category = category.into();
        self.inner
            .commit(move |state| state.with_category(category))
            .await;
    }

    pub async fn set_sort(&self, sort: SortOrder) {
        self.inner.commit(move |state| state.with_sort(sort)).await;
    }

    pub async fn reset(&self) {
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(|_| FilterState::default()).await;
    }

    /// Replace the location wholesale, as a back/forward navigation does.
    pub async fn navigate(&self, query: &str) {
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        let state = FilterState::from_query_string(query);
        self.inner.commit(move |_| state).await;
    }

    /// Re-run the query for the current location.
    pub async fn refresh(&self) {
        let (state, seq) = {
            let location = mutex_lock(&self.inner.location, SYNC_TARGET, "refresh");
            (FilterState::from_query_string(&location), self.inner.next_seq())
        };
        self.inner.run_query(state, seq).await;
    }
}

impl Inner {
    /// The sequence number is taken under the location lock, so the latest
    /// issued query always belongs to the current location.
    async fn commit(&self, update: impl FnOnce(FilterState) -> FilterState) {
        let (state, query, seq) = {
            let mut location = mutex_lock(&self.location, SYNC_TARGET, "commit");
            let next = update(FilterState::from_query_string(&location));
            *location = next.to_query_string();
            (next, location.clone(), self.next_seq())
        };
        debug!(target: SYNC_TARGET, query = %query, seq, "filter committed");
        self.run_query(state, seq).await;
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run_query(&self, state: FilterState, seq: u64) {
        self.apply(seq, ResultsView::Loading);

        let next = match self.client.fetch_posts(&state).await {
            Ok(items) if items.is_empty() => ResultsView::Empty,
            Ok(items) => ResultsView::Ready(Arc::new(items)),
            Err(err) => {
                warn!(target: SYNC_TARGET, seq, error = %err, "listing query failed");
                ResultsView::Failed(GENERIC_FAILURE)
            }
        };

        self.apply(seq, next);
    }

    /// Writes `next` only while `seq` is still the latest issued query.
    fn apply(&self, seq: u64, next: ResultsView) {
        self.view.send_if_modified(|current| {
            let latest = self.seq.load(Ordering::SeqCst);
            if latest != seq {
                debug!(target: SYNC_TARGET, seq, latest, "stale update discarded");
                return false;
            }
            *current = next;
            true
        });
    }
}
