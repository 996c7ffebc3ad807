//! HTTP client for the platform cart API.

mod retry;

use std::time::Duration;

use cartmirror_core::ProductMetadata;
use futures::future::BoxFuture;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::commerce::CommerceApi;
use crate::error::ExtractError;
use crate::normalize::normalize_remote_product;
use crate::types::{CartResponse, ProductResponse, RemoteCart};

use retry::retry_with_backoff;

/// HTTP client for the platform cart API.
///
/// Maps 429 to [`ExtractError::RateLimited`], 404 to
/// [`ExtractError::NotFound`] and any other non-2xx to
/// [`ExtractError::UnexpectedStatus`].
pub struct CartApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    /// Additional attempts after the first failure; `0` disables retries.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl CartApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`ExtractError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        token: Option<String>,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ExtractError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            token,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds the URL for `segments` below the base, percent-encoding each
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ExtractError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ExtractError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request with the retry policy applied and returns the raw
    /// response body.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<String, ExtractError> {
        let url = self.endpoint(segments)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let method = method.clone();
            let body = body.clone();
            async move {
                let mut request = self
                    .client
                    .request(method.clone(), url.clone())
                    .header(reqwest::header::ACCEPT, "application/json");
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = &body {
                    request = request.json(body);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ExtractError::RateLimited {
                        endpoint: url.host_str().unwrap_or_default().to_string(),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ExtractError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ExtractError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                tracing::debug!(%method, %url, status = status.as_u16(), "cart API call succeeded");
                Ok(response.text().await?)
            }
        })
        .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
        context: &str,
    ) -> Result<T, ExtractError> {
        let text = self.send(method, segments, body).await?;
        serde_json::from_str::<T>(&text).map_err(|e| ExtractError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    /// Fetches the current cart.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request or from decoding the body.
    pub async fn fetch_cart(&self) -> Result<RemoteCart, ExtractError> {
        let response: CartResponse = self
            .send_json(Method::GET, &["cart"], None, "cart")
            .await?;
        Ok(response.data)
    }

    /// Adds `quantity` units of `product_id` to the cart.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request.
    pub async fn add_cart_item(&self, product_id: &str, quantity: u32) -> Result<(), ExtractError> {
        let body = json!({ "product_id": product_id, "quantity": quantity });
        self.send(Method::POST, &["cart", "items"], Some(body))
            .await
            .map(drop)
    }

    /// Sets the quantity of cart line `item_id`.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request.
    pub async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<(), ExtractError> {
        let body = json!({ "quantity": quantity });
        self.send(Method::PUT, &["cart", "items", item_id], Some(body))
            .await
            .map(drop)
    }

    /// Removes cart line `item_id`.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request.
    pub async fn delete_cart_item(&self, item_id: &str) -> Result<(), ExtractError> {
        self.send(Method::DELETE, &["cart", "items", item_id], None)
            .await
            .map(drop)
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request.
    pub async fn clear(&self) -> Result<(), ExtractError> {
        self.send(Method::DELETE, &["cart"], None).await.map(drop)
    }

    /// Looks up display metadata for `product_id`.
    ///
    /// # Errors
    ///
    /// Any [`ExtractError`] from the request or from decoding the body.
    pub async fn fetch_product(&self, product_id: &str) -> Result<ProductMetadata, ExtractError> {
        let response: ProductResponse = self
            .send_json(
                Method::GET,
                &["products", product_id],
                None,
                &format!("product {product_id}"),
            )
            .await?;
        Ok(normalize_remote_product(response.data, product_id))
    }
}

impl CommerceApi for CartApiClient {
    fn get_cart(&self) -> BoxFuture<'_, Result<RemoteCart, ExtractError>> {
        Box::pin(self.fetch_cart())
    }

    fn add_item<'a>(
        &'a self,
        product_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>> {
        Box::pin(self.add_cart_item(product_id, quantity))
    }

    fn update_item<'a>(
        &'a self,
        item_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>> {
        Box::pin(self.update_cart_item(item_id, quantity))
    }

    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<(), ExtractError>> {
        Box::pin(self.delete_cart_item(item_id))
    }

    fn clear_cart(&self) -> BoxFuture<'_, Result<(), ExtractError>> {
        Box::pin(self.clear())
    }

    fn get_product<'a>(
        &'a self,
        product_id: &'a str,
    ) -> BoxFuture<'a, Result<ProductMetadata, ExtractError>> {
        Box::pin(self.fetch_product(product_id))
    }
}

/// Parses and validates the API base URL.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidBaseUrl`] for unparsable or non-http(s) URLs.
fn parse_base_url(base_url: &str) -> Result<Url, ExtractError> {
    let url = Url::parse(base_url.trim()).map_err(|e| ExtractError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: format!("unsupported scheme \"{}\"", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
