//! HTTP client for the marketplace REST API.
//!
//! Wraps `reqwest` with base-URL handling, bearer-token injection and status
//! mapping: 401 becomes [`ClientError::Unauthorized`], any other non-2xx
//! becomes [`ClientError::Api`] carrying the server's `message` when present.
//! There are no automatic retries.

use std::time::Duration;

use classifieds_core::FeedPage;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;

use crate::error::ClientError;
use crate::session::SessionToken;
use crate::types::SliderImage;

/// Client for the marketplace REST API.
pub struct MarketplaceClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) session: SessionToken,
}

impl MarketplaceClient {
    /// Creates a client for `base_url` (e.g. `https://api.example.com/api`).
    ///
    /// `timeout_secs` bounds every request; an expired request surfaces as a
    /// recoverable [`ClientError::Http`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        session: SessionToken,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends to the API prefix
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    /// Fetches one page of listings from a feed endpoint such as `/filter`.
    ///
    /// `params` must already be cleaned; they are appended after `page` in
    /// order. A payload whose item list is not an array yields an empty page
    /// flagged `malformed` rather than an error.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] on HTTP 401.
    /// - [`ClientError::Api`] on any other non-2xx status.
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Deserialize`] if the body is not JSON.
    pub async fn fetch_listings(
        &self,
        path: &str,
        page: u32,
        params: &[(String, String)],
    ) -> Result<FeedPage, ClientError> {
        let mut url = self.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }

        tracing::debug!(%url, page, "fetching listings");
        let body = self
            .send_json(self.client.get(url.clone()), url.as_str())
            .await?;
        Ok(FeedPage::from_envelope(&body, page))
    }

    /// Fetches the banner images for a category.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_listings`]; an unrecognised shape is a
    /// [`ClientError::Deserialize`].
    pub async fn slider_images(&self, category_id: i64) -> Result<Vec<SliderImage>, ClientError> {
        let mut url = self.endpoint("/sliderimage")?;
        url.query_pairs_mut()
            .append_pair("category_id", &category_id.to_string());

        let body = self
            .send_json(self.client.get(url.clone()), url.as_str())
            .await?;
        let list = match body {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
            other @ Value::Array(_) => other,
            _ => Value::Array(Vec::new()),
        };

        serde_json::from_value(list).map_err(|e| ClientError::Deserialize {
            context: format!("sliderimage(category_id={category_id})"),
            source: e,
        })
    }

    /// Resolves an API path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Adds the bearer token, sends the request, maps the status and parses
    /// the JSON body.
    pub(crate) async fn send_json(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<Value, ClientError> {
        let mut request = request.header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.session.get() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(context, "request rejected with 401");
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(extract_message);
            tracing::warn!(context, status = status.as_u16(), ?message, "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Pulls a human-readable message out of an error envelope: `message`, then
/// `error`, then the first entry of a Laravel-style `errors` map.
pub(crate) fn extract_message(body: &Value) -> Option<String> {
    if let Some(m) = body.get("message").and_then(Value::as_str) {
        return Some(m.to_owned());
    }
    if let Some(m) = body.get("error").and_then(Value::as_str) {
        return Some(m.to_owned());
    }
    body.get("errors")
        .and_then(Value::as_object)
        .and_then(|errors| errors.values().next())
        .and_then(|v| match v {
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_owned),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
