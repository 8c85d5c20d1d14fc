//! Filter selection with debounced auto-apply.
//!
//! Mutating a fetch-triggering key (re)starts a cancellable timer; only the
//! last mutation in a quiet window reaches the [`ApplyFilters`] callback.
//! Geo keys are never fetch-triggering: they change through the location
//! flow, not the panel.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use classifieds_core::{AppConfig, CleanedFilters, FilterState, FilterValue};
use tokio::task::JoinHandle;

/// Receives cleaned filters whenever the panel applies them.
pub type ApplyFilters = Arc<dyn Fn(CleanedFilters) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPanelOptions {
    /// Apply automatically after `debounce` instead of waiting for an
    /// explicit [`FilterPanel::apply_filters`].
    pub auto_apply: bool,
    pub debounce: Duration,
}

impl FilterPanelOptions {
    /// Auto-apply on, with the configured debounce window.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            auto_apply: true,
            debounce: Duration::from_millis(config.filter_debounce_ms),
        }
    }
}

impl Default for FilterPanelOptions {
    fn default() -> Self {
        Self {
            auto_apply: true,
            debounce: Duration::from_millis(500),
        }
    }
}

struct Shared {
    state: Mutex<FilterState>,
    defaults: FilterState,
    triggers: BTreeSet<String>,
    options: FilterPanelOptions,
    apply: ApplyFilters,
    pending: Mutex<Option<JoinHandle<()>>>,
    route: Mutex<Option<String>>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, FilterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_now(&self) {
        let cleaned = self.lock_state().cleaned();
        tracing::debug!(filters = %cleaned, "applying filters");
        (self.apply)(cleaned);
    }
}

/// Filter state for one mounted panel.
pub struct FilterPanel {
    shared: Arc<Shared>,
}

impl FilterPanel {
    /// `defaults` is the cleared selection; `triggers` the keys whose changes
    /// auto-apply. Geo keys in `triggers` are ignored.
    pub fn new<I, S>(
        defaults: FilterState,
        triggers: I,
        options: FilterPanelOptions,
        apply: ApplyFilters,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let triggers = triggers
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !FilterState::is_geo_key(k))
            .collect();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(defaults.clone()),
                defaults,
                triggers,
                options,
                apply,
                pending: Mutex::new(None),
                route: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn filters(&self) -> FilterState {
        self.shared.lock_state().clone()
    }

    /// Whether an auto-apply is scheduled but has not fired yet.
    #[must_use]
    pub fn has_pending_apply(&self) -> bool {
        self.shared
            .lock_pending()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Updates one key. Never applies synchronously; a change to a
    /// fetch-triggering key restarts the auto-apply timer.
    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let changed = self.shared.lock_state().set(key.clone(), value);
        if changed && self.shared.options.auto_apply && self.shared.triggers.contains(&key) {
            self.schedule();
        }
    }

    /// Cleans the current selection and hands it to the callback now,
    /// cancelling any scheduled auto-apply.
    pub fn apply_filters(&self) {
        self.cancel_pending();
        self.shared.apply_now();
    }

    /// Resets every non-geo key to its default. Without auto-apply the
    /// cleared set is applied immediately; with auto-apply the usual timer
    /// runs if a fetch-triggering key changed.
    pub fn clear_filters(&self) {
        let changed = self
            .shared
            .lock_state()
            .reset_to(&self.shared.defaults);

        if !self.shared.options.auto_apply {
            self.apply_filters();
        } else if changed.iter().any(|k| self.shared.triggers.contains(k)) {
            self.schedule();
        }
    }

    /// Route guard. The first call records the mounted route; a later call
    /// with a different path clears the filters. Returns `true` if cleared.
    pub fn on_route_change(&self, path: &str) -> bool {
        {
            let mut route = self
                .shared
                .route
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match route.as_deref() {
                Some(current) if current == path => return false,
                None => {
                    *route = Some(path.to_owned());
                    return false;
                }
                Some(_) => *route = Some(path.to_owned()),
            }
        }
        tracing::debug!(path, "route changed; clearing filters");
        self.clear_filters();
        true
    }

    fn schedule(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "no runtime; applying filters without debounce");
                self.shared.apply_now();
                return;
            }
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let delay = self.shared.options.debounce;
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.apply_now();
            }
        });

        if let Some(previous) = self.shared.lock_pending().replace(task) {
            previous.abort();
        }
    }

    fn cancel_pending(&self) {
        if let Some(task) = self.shared.lock_pending().take() {
            task.abort();
        }
    }
}

impl Drop for FilterPanel {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
