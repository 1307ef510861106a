//! Debounced product search.
//!
//! Keystrokes go through a [`Debouncer`]; when input settles the query is sent
//! to the backend. Every query that fires gets a generation number and a
//! response is only published if no newer query has fired since, so a slow
//! response can never overwrite a faster, newer one.
//!
//! Observers read [`SearchState`] from a `tokio::sync::watch` channel.

mod debounce;

pub use debounce::Debouncer;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use qkart_core::Product;
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::backend::Backend;
use crate::error::StorefrontError;
use crate::notify::{Notification, Notifier};

/// What the search view should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    /// No query; the full catalog applies.
    #[default]
    Idle,
    /// A query has fired and its response is outstanding.
    Loading { query: String },
    /// Products matching `query`.
    Results { query: String, products: Vec<Product> },
    /// The backend found nothing for `query`.
    NoMatches { query: String },
    /// The search failed; `message` has already been notified.
    Failed { query: String, message: String },
}

impl SearchState {
    /// The query this state belongs to, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { query }
            | Self::Results { query, .. }
            | Self::NoMatches { query }
            | Self::Failed { query, .. } => Some(query),
        }
    }
}

struct Shared {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    generation: AtomicU64,
    state: watch::Sender<SearchState>,
}

/// Debounced search over a [`Backend`].
pub struct SearchController {
    shared: Arc<Shared>,
    debouncer: Debouncer<String>,
}

impl SearchController {
    /// Create a controller that waits `interval` of quiet before searching.
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        let shared = Arc::new(Shared {
            backend,
            notifier,
            generation: AtomicU64::new(0),
            state,
        });

        let fire_shared = Arc::clone(&shared);
        let debouncer = Debouncer::new(interval, move |query: String| {
            fire(&fire_shared, query);
        });

        Self { shared, debouncer }
    }

    /// Feed the current contents of the search box.
    pub fn input(&self, query: impl Into<String>) {
        self.debouncer.trigger(query.into());
    }

    /// Watch search state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    /// Current search state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }
}

/// Start a search for a query that survived the quiet interval.
fn fire(shared: &Arc<Shared>, query: String) {
    let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

    if query.trim().is_empty() {
        shared.state.send_replace(SearchState::Idle);
        return;
    }

    shared.state.send_replace(SearchState::Loading {
        query: query.clone(),
    });
    tokio::spawn(run_search(Arc::clone(shared), query, generation));
}

#[instrument(skip(shared))]
async fn run_search(shared: Arc<Shared>, query: String, generation: u64) {
    let result = shared.backend.search_products(&query).await;

    let latest = shared.generation.load(Ordering::SeqCst);
    if latest != generation {
        debug!(latest, "Discarding stale search response");
        return;
    }

    let state = match result {
        Ok(products) if products.is_empty() => SearchState::NoMatches { query },
        Ok(products) => {
            debug!(count = products.len(), "Search results published");
            SearchState::Results { query, products }
        }
        Err(e) => {
            let message = StorefrontError::from(e).user_message();
            shared.notifier.notify(Notification::error(message.clone()));
            SearchState::Failed { query, message }
        }
    };
    shared.state.send_replace(state);
}
