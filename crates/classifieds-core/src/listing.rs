//! Listing records and the feed state built from paginated responses.
//!
//! ## `/filter` envelope
//!
//! ```text
//! { "data": { "data": [Listing, ...], "current_page": 1, "last_page": 3,
//!             "total": 57, "next_page_url": "https://.../filter?page=2" } }
//! ```
//!
//! The server is not trusted to keep `next_page_url` consistent with the page
//! counters: a non-null cursor with zero rows is treated as end of data.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Stable listing identity. The API emits numeric ids for most categories but
/// string ids for a few legacy ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Num(i64),
    Text(String),
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingId::Num(n) => write!(f, "{n}"),
            ListingId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ListingId {
    fn from(value: i64) -> Self {
        ListingId::Num(value)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        value
            .parse::<i64>()
            .map_or_else(|_| ListingId::Text(value.to_owned()), ListingId::Num)
    }
}

/// A listing as returned by the server. Only `id` is relied upon; display
/// fields are optional and everything else is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,

    #[serde(default)]
    pub title: Option<String>,

    /// Either a number or a preformatted string, depending on category.
    #[serde(default)]
    pub price: Option<Value>,

    /// Whether the current user has this listing in their wishlist. The API
    /// sends `true`/`false`, `1`/`0` or `null`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub wishlist: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Display label for the price; empty when the listing has none.
    #[must_use]
    pub fn price_label(&self) -> String {
        match &self.price {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Title with a fallback for listings that arrive without one.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled listing")
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

/// Reads a non-negative integer that may be encoded as a number or a string.
pub(crate) fn value_as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `true` when the envelope carries a usable next-page cursor.
pub(crate) fn has_next_cursor(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// One fetch outcome.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    pub items: Vec<Listing>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    pub has_more: bool,
    /// The payload's item list was not an array; the page is treated as empty.
    pub malformed: bool,
}

impl FeedPage {
    /// Builds a page from the `/filter` response envelope.
    ///
    /// `requested_page` is used when the envelope omits `current_page`.
    /// Individual items that do not deserialize are skipped with a warning.
    #[must_use]
    pub fn from_envelope(body: &Value, requested_page: u32) -> Self {
        let inner = body.get("data").unwrap_or(&Value::Null);

        let Some(raw_items) = inner.get("data").and_then(Value::as_array) else {
            tracing::warn!(
                page = requested_page,
                "feed payload item list is not an array; treating as empty"
            );
            return Self {
                current_page: requested_page,
                last_page: requested_page,
                malformed: true,
                ..Self::default()
            };
        };

        let items: Vec<Listing> = raw_items
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| {
                serde_json::from_value::<Listing>(v.clone())
                    .map_err(|e| {
                        tracing::warn!(index = idx, error = %e, "skipping malformed listing");
                    })
                    .ok()
            })
            .collect();

        let current_page = value_as_u64(inner.get("current_page"))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(requested_page);
        let last_page = value_as_u64(inner.get("last_page"))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(current_page);
        let total = value_as_u64(inner.get("total")).unwrap_or(items.len() as u64);

        let has_more = has_next_cursor(inner.get("next_page_url"))
            && current_page < last_page
            && !items.is_empty();

        Self {
            items,
            current_page,
            last_page,
            total,
            has_more,
            malformed: false,
        }
    }
}

/// Accumulated feed state owned by the feed controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    pub items: Vec<Listing>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    pub loading: bool,
    pub loading_more: bool,
    pub has_more: bool,
    /// Last user-visible failure message; cleared by the next successful fetch.
    pub error: Option<String>,
}

impl FeedState {
    /// Marks a fetch as started. A replacing fetch supersedes an in-flight
    /// append, so at most one flag is ever set.
    pub fn begin(&mut self, append: bool) {
        if append {
            self.loading = false;
            self.loading_more = true;
        } else {
            self.loading = true;
            self.loading_more = false;
        }
    }

    /// Clears both loading flags.
    pub fn finish(&mut self) {
        self.loading = false;
        self.loading_more = false;
    }

    /// Merges a successful page: replace when `append` is false, concatenate
    /// otherwise. Duplicates are not removed.
    pub fn apply_page(&mut self, page: FeedPage, append: bool) {
        if page.malformed && append {
            // Keep what is already loaded; only pagination stops.
            self.has_more = false;
            self.error = None;
            return;
        }

        if append {
            self.items.extend(page.items);
        } else {
            self.items = page.items;
        }
        self.current_page = page.current_page;
        self.last_page = page.last_page;
        self.total = page.total;
        self.has_more = page.has_more;
        self.error = None;
    }

    /// Records a failed fetch: the first page empties the feed, any failure
    /// halts pagination.
    pub fn apply_failure(&mut self, requested_page: u32, message: String) {
        if requested_page == 1 {
            self.items.clear();
        }
        self.has_more = false;
        self.error = Some(message);
    }

    /// Whether `load_more` would issue a fetch.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.loading_more && !self.loading && self.current_page < self.last_page
    }
}

/// Per-card favourite state. The server is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WishlistEntry {
    pub is_favorite: bool,
    pub is_pending: bool,
}

/// Identity pair sent to `/wishlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistKey {
    pub wishable_type: String,
    pub wishable_id: ListingId,
}

/// The persisted `selectedLocation` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}
