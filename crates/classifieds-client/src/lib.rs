//! HTTP client for the classifieds marketplace REST API.
//!
//! A thin `reqwest` wrapper: bearer-token injection from a shared
//! [`SessionToken`], typed endpoints for the listing feed, slider images and
//! wishlist, and the [`ClientError`] taxonomy the UI layer converts into
//! flags and messages.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

mod wishlist;

pub use client::MarketplaceClient;
pub use error::ClientError;
pub use session::SessionToken;
pub use types::{SliderImage, WishlistPage};
