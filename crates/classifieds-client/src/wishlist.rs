//! Wishlist endpoints for the marketplace client.

use classifieds_core::{Listing, WishlistKey};
use serde_json::Value;

use crate::client::{extract_message, MarketplaceClient};
use crate::error::ClientError;
use crate::types::WishlistPage;

impl MarketplaceClient {
    /// Adds a listing to the current user's wishlist (`POST /wishlist`).
    ///
    /// Returns the server's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] when no valid session exists.
    /// - [`ClientError::Api`] on any other non-2xx status or `"success": false`.
    /// - [`ClientError::Http`] on network failure.
    pub async fn add_to_wishlist(&self, key: &WishlistKey) -> Result<Option<String>, ClientError> {
        let url = self.endpoint("/wishlist")?;
        let body = self
            .send_json(self.client.post(url).json(key), "wishlist add")
            .await?;
        Self::check_success(&body)?;
        Ok(extract_message(&body))
    }

    /// Removes a listing from the current user's wishlist (`DELETE /wishlist`
    /// with the identity pair as a JSON body).
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_to_wishlist`].
    pub async fn remove_from_wishlist(
        &self,
        key: &WishlistKey,
    ) -> Result<Option<String>, ClientError> {
        let url = self.endpoint("/wishlist")?;
        let body = self
            .send_json(self.client.delete(url).json(key), "wishlist remove")
            .await?;
        Self::check_success(&body)?;
        Ok(extract_message(&body))
    }

    /// Fetches one page of the user's wishlist for a category type.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] when no valid session exists.
    /// - [`ClientError::Api`] on a non-2xx status or `"success": false`.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the item list is present but malformed.
    pub async fn wishlist(&self, page: u32, wishable_type: &str) -> Result<WishlistPage, ClientError> {
        let mut url = self.endpoint("/wishlist")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("type", wishable_type);

        let body = self
            .send_json(self.client.get(url.clone()), url.as_str())
            .await?;
        Self::check_success(&body)?;

        let inner = body.get("data").cloned().unwrap_or(Value::Null);
        let items: Vec<Listing> = match inner.get("data") {
            Some(list @ Value::Array(_)) => {
                serde_json::from_value(list.clone()).map_err(|e| ClientError::Deserialize {
                    context: format!("wishlist(page={page}, type={wishable_type})"),
                    source: e,
                })?
            }
            _ => {
                tracing::warn!(page, wishable_type, "wishlist payload has no item array");
                Vec::new()
            }
        };

        let current_page = inner
            .get("current_page")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(page);
        let total = inner
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);
        let has_next = inner
            .get("next_page_url")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());

        Ok(WishlistPage {
            has_more: has_next && !items.is_empty(),
            items,
            current_page,
            total,
        })
    }

    /// Treats a 2xx envelope carrying `"success": false` as an API error.
    fn check_success(body: &Value) -> Result<(), ClientError> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ClientError::Api {
                status: 200,
                message: extract_message(body),
            });
        }
        Ok(())
    }
}
