//! Paginated, filterable listing feed.
//!
//! Every [`FeedController::fetch`] takes a request token from a monotonically
//! increasing counter. When a response resolves, it is applied only if its
//! token is still the latest issued; otherwise it is dropped without touching
//! state, and the newer fetch owns the loading flags. This keeps the feed
//! consistent with the last *initiated* fetch even when responses resolve out
//! of order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use classifieds_client::{ClientError, MarketplaceClient};
use classifieds_core::{CategoryConfig, CleanedFilters, FeedState, LATITUDE, LONGITUDE};

use crate::filter_panel::ApplyFilters;
use crate::interaction::{Interaction, NoticeLevel};
use crate::location::LocationProvider;

/// Which endpoint a feed reads and the fixed parameters it always sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub path: String,
    pub base_params: Vec<(String, String)>,
}

impl FeedConfig {
    #[must_use]
    pub fn for_category(category: &CategoryConfig) -> Self {
        Self {
            path: category.feed_path.clone(),
            base_params: category.base_params(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: "/filter".to_string(),
            base_params: Vec::new(),
        }
    }
}

/// How a single fetch ended.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response was merged into the feed.
    Applied,
    /// A newer fetch was issued while this one was in flight; the response
    /// was discarded.
    Superseded,
    /// The request failed; the feed recorded the failure.
    Failed(ClientError),
}

impl FetchOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}

/// Owns the [`FeedState`] of one feed. The view reads snapshots and calls
/// [`FeedController::fetch`] / [`FeedController::load_more`].
pub struct FeedController {
    client: Arc<MarketplaceClient>,
    config: FeedConfig,
    location: Arc<dyn LocationProvider>,
    interaction: Arc<dyn Interaction>,
    state: Mutex<FeedState>,
    filters: Mutex<CleanedFilters>,
    latest_token: AtomicU64,
}

impl FeedController {
    pub fn new(
        client: Arc<MarketplaceClient>,
        config: FeedConfig,
        location: Arc<dyn LocationProvider>,
        interaction: Arc<dyn Interaction>,
    ) -> Self {
        Self {
            client,
            config,
            location,
            interaction,
            state: Mutex::new(FeedState::default()),
            filters: Mutex::new(CleanedFilters::default()),
            latest_token: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_filters(&self) -> MutexGuard<'_, CleanedFilters> {
        self.filters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current feed state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.lock_state().can_load_more()
    }

    /// Filters used by the most recent fetch.
    #[must_use]
    pub fn current_filters(&self) -> CleanedFilters {
        self.lock_filters().clone()
    }

    /// Fetches `page`. With `append == false` the items are replaced,
    /// otherwise the page is concatenated after the existing items.
    ///
    /// `filters == None` reuses the filters of the previous fetch.
    pub async fn fetch(
        &self,
        page: u32,
        append: bool,
        filters: Option<CleanedFilters>,
    ) -> FetchOutcome {
        let (token, filters) = {
            let mut state = self.lock_state();
            self.start(&mut state, append, filters)
        };
        self.run(token, page, append, &filters).await
    }

    /// Fetches the next page if the feed has more, is idle and has not
    /// reached the last page. Returns `None` when nothing was requested.
    pub async fn load_more(&self) -> Option<FetchOutcome> {
        let (token, page, filters) = {
            let mut state = self.lock_state();
            if !state.can_load_more() {
                tracing::debug!(
                    has_more = state.has_more,
                    loading_more = state.loading_more,
                    current_page = state.current_page,
                    last_page = state.last_page,
                    "load_more skipped"
                );
                return None;
            }
            let page = state.current_page + 1;
            let (token, filters) = self.start(&mut state, true, None);
            (token, page, filters)
        };
        Some(self.run(token, page, true, &filters).await)
    }

    /// Marks the fetch as started and issues its token. Runs under the state
    /// lock so precondition checks and flag changes are one step.
    fn start(
        &self,
        state: &mut FeedState,
        append: bool,
        filters: Option<CleanedFilters>,
    ) -> (u64, CleanedFilters) {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        state.begin(append);
        let filters = {
            let mut current = self.lock_filters();
            if let Some(f) = filters {
                *current = f;
            }
            current.clone()
        };
        (token, filters)
    }

    async fn run(
        &self,
        token: u64,
        page: u32,
        append: bool,
        filters: &CleanedFilters,
    ) -> FetchOutcome {
        let params = self.build_params(filters);
        tracing::debug!(token, page, append, filters = %filters, "feed fetch started");

        let result = self
            .client
            .fetch_listings(&self.config.path, page, &params)
            .await;

        let mut state = self.lock_state();
        let latest = self.latest_token.load(Ordering::SeqCst);
        if token != latest {
            tracing::debug!(token, latest, page, "discarding superseded feed response");
            return FetchOutcome::Superseded;
        }

        let outcome = match result {
            Ok(feed_page) => {
                tracing::debug!(
                    token,
                    page = feed_page.current_page,
                    items = feed_page.items.len(),
                    has_more = feed_page.has_more,
                    "feed page applied"
                );
                state.apply_page(feed_page, append);
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(token, page, error = %err, "feed fetch failed");
                state.apply_failure(page, err.user_message());
                FetchOutcome::Failed(err)
            }
        };
        state.finish();
        drop(state);

        if let FetchOutcome::Failed(err) = &outcome {
            self.report(err);
        }
        outcome
    }

    fn report(&self, err: &ClientError) {
        if err.is_unauthorized() {
            self.interaction
                .notify(NoticeLevel::Warning, &err.user_message());
            self.interaction.open_login();
        } else {
            self.interaction.notify(NoticeLevel::Error, &err.user_message());
        }
    }

    /// Query parameters after `page`: the feed's fixed parameters, the
    /// cleaned filters, then the stored location. A stored location replaces
    /// any geo entries in the filters.
    fn build_params(&self, filters: &CleanedFilters) -> Vec<(String, String)> {
        let location = self.location.current();
        let mut params = self.config.base_params.clone();
        let owned = |(k, v): (&str, &str)| (k.to_owned(), v.to_owned());
        match location {
            Some(loc) => {
                params.extend(filters.without_geo().map(owned));
                params.push((LATITUDE.to_owned(), loc.latitude.to_string()));
                params.push((LONGITUDE.to_owned(), loc.longitude.to_string()));
            }
            None => params.extend(filters.iter().map(owned)),
        }
        params
    }

    /// Callback for [`crate::FilterPanel`]: each applied filter set starts a
    /// replacing page-1 fetch on the current tokio runtime.
    ///
    /// Holds only a weak reference, so a dropped controller turns the
    /// callback into a no-op.
    pub fn filter_sink(self: &Arc<Self>) -> ApplyFilters {
        let weak = Arc::downgrade(self);
        Arc::new(move |filters: CleanedFilters| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        controller.fetch(1, false, Some(filters)).await;
                    });
                }
                Err(e) => tracing::warn!(error = %e, "no runtime; filter change not applied"),
            }
        })
    }
}
