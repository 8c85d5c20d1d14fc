//! Response types for endpoints other than the listing feed.
//!
//! ### `/sliderimage`
//! Most deployments answer `{ "data": [ ... ] }`, older ones a bare array.
//! Both are accepted. The image URL has shipped under `image`, `image_url`
//! and `url`.
//!
//! ### `/wishlist` (GET)
//! `{ "success": true, "data": { "data": [...], "current_page": 1,
//! "total": 3, "next_page_url": null } }`. There is no `last_page`, so
//! `has_more` is derived from the cursor and a non-empty page.

use classifieds_core::Listing;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SliderImage {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default, alias = "image_url", alias = "url")]
    pub image: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the user's wishlist for a category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WishlistPage {
    pub items: Vec<Listing>,
    pub current_page: u32,
    pub total: u64,
    pub has_more: bool,
}
