//! Listing feed state machine and wishlist synchronisation.
//!
//! - [`FeedController`] fetches, paginates and accumulates one feed, and
//!   discards responses superseded by a newer fetch.
//! - [`FilterPanel`] holds the filter selection and auto-applies committed
//!   changes after a quiet period.
//! - [`ScrollTrigger`] and [`ViewportEvents`] drive infinite scroll with an
//!   explicit subscribe/unsubscribe lifecycle.
//! - [`WishlistToggle`] flips a listing's favourite flag only after the server
//!   confirms, and routes 401s into the login flow through [`Interaction`].

pub mod controller;
pub mod error;
pub mod filter_panel;
pub mod interaction;
pub mod location;
pub mod scroll;
pub mod wishlist;

pub use controller::{FeedConfig, FeedController, FetchOutcome};
pub use error::StorageError;
pub use filter_panel::{ApplyFilters, FilterPanel, FilterPanelOptions};
pub use interaction::{Interaction, NoticeLevel, TracingInteraction};
pub use location::{JsonFileStore, LocationProvider, StaticLocation, SELECTED_LOCATION_KEY};
pub use scroll::{ScrollMetrics, ScrollOptions, ScrollTrigger, Subscription, ViewportEvents};
pub use wishlist::{ToggleOutcome, WishlistToggle};
