//! Infinite scroll: a throttle/guard state machine plus the event hub that
//! feeds it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use classifieds_core::AppConfig;
use tokio::time::Instant;

use crate::controller::FeedController;

/// Viewport position at the time of a scroll event, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        self.document_height - (self.scroll_y + self.viewport_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    /// Events closer together than this are ignored.
    pub throttle: Duration,
    /// Fire when the viewport bottom is within this many pixels of the end.
    pub threshold_px: u32,
    /// After firing, further triggers are suppressed for this long.
    pub guard: Duration,
}

impl ScrollOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            throttle: Duration::from_millis(config.scroll_throttle_ms),
            threshold_px: config.scroll_threshold_px,
            guard: Duration::from_millis(config.scroll_guard_ms),
        }
    }
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(100),
            threshold_px: 500,
            guard: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    options: ScrollOptions,
    last_evaluated: Option<Instant>,
    guard_until: Option<Instant>,
}

impl ScrollTrigger {
    #[must_use]
    pub fn new(options: ScrollOptions) -> Self {
        Self {
            options,
            last_evaluated: None,
            guard_until: None,
        }
    }

    /// Decides whether this scroll event should request the next page.
    ///
    /// `can_load_more` is the feed's own precondition; it is only consulted
    /// for events that pass the throttle, guard and threshold checks.
    pub fn evaluate(
        &mut self,
        metrics: ScrollMetrics,
        can_load_more: impl FnOnce() -> bool,
        now: Instant,
    ) -> bool {
        if let Some(last) = self.last_evaluated {
            if now.saturating_duration_since(last) < self.options.throttle {
                return false;
            }
        }
        self.last_evaluated = Some(now);

        if self.guard_until.is_some_and(|until| now < until) {
            return false;
        }

        if metrics.distance_to_bottom() > f64::from(self.options.threshold_px) {
            return false;
        }

        if !can_load_more() {
            return false;
        }

        self.guard_until = Some(now + self.options.guard);
        true
    }

    /// Whether the post-trigger guard is still active at `now`.
    #[must_use]
    pub fn is_guarded(&self, now: Instant) -> bool {
        self.guard_until.is_some_and(|until| now < until)
    }
}

type Handler = Arc<dyn Fn(ScrollMetrics) + Send + Sync>;

#[derive(Default)]
struct HandlerTable {
    next_id: u64,
    handlers: BTreeMap<u64, Handler>,
}

/// Scroll event hub. Handlers stay registered until their [`Subscription`]
/// is unsubscribed or dropped.
#[derive(Clone, Default)]
pub struct ViewportEvents {
    table: Arc<Mutex<HandlerTable>>,
}

fn lock_table(table: &Mutex<HandlerTable>) -> MutexGuard<'_, HandlerTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ViewportEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn(ScrollMetrics) + Send + Sync + 'static) -> Subscription {
        let mut table = lock_table(&self.table);
        let id = table.next_id;
        table.next_id += 1;
        table.handlers.insert(id, Arc::new(handler));
        Subscription {
            table: Arc::downgrade(&self.table),
            id,
        }
    }

    /// Delivers one event to every current subscriber.
    pub fn emit(&self, metrics: ScrollMetrics) {
        let handlers: Vec<Handler> = lock_table(&self.table).handlers.values().cloned().collect();
        for handler in handlers {
            handler(metrics);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock_table(&self.table).handlers.len()
    }
}

/// Registration handle returned by [`ViewportEvents::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the handler"]
pub struct Subscription {
    table: Weak<Mutex<HandlerTable>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            // Released outside the lock: the handler may own subscriptions.
            let removed = lock_table(&table).handlers.remove(&self.id);
            drop(removed);
        }
    }
}

impl FeedController {
    /// Subscribes this feed to `events`: a scroll that passes the trigger
    /// spawns [`FeedController::load_more`] on the current runtime.
    pub fn attach_scroll(self: &Arc<Self>, events: &ViewportEvents, options: ScrollOptions) -> Subscription {
        let weak = Arc::downgrade(self);
        let trigger = Mutex::new(ScrollTrigger::new(options));
        events.subscribe(move |metrics| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            let fire = trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .evaluate(metrics, || controller.can_load_more(), Instant::now());
            if !fire {
                return;
            }
            tracing::debug!(
                distance = metrics.distance_to_bottom(),
                "scroll threshold reached; loading next page"
            );
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        controller.load_more().await;
                    });
                }
                Err(e) => tracing::warn!(error = %e, "no runtime; scroll trigger dropped"),
            }
        })
    }
}
