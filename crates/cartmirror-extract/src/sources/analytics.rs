//! The analytics data layer's checkout product list.

use cartmirror_core::{CartItem, ItemSource};
use futures::future::BoxFuture;
use serde_json::Value;

use super::{ready, CartSourceReader, SourceRead};
use crate::error::ExtractError;
use crate::normalize::normalize_analytics_product;
use crate::page::PageState;
use crate::types::AnalyticsProduct;

/// Paths under the first data-layer entry that may hold the product list.
const PRODUCT_PATHS: [&str; 2] = ["/ecommerce/checkout/products", "/ecommerce/cart/products"];

/// Reads cart lines from `dataLayer[0].ecommerce.checkout.products`.
pub struct AnalyticsReader {
    currency: String,
}

impl AnalyticsReader {
    #[must_use]
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Reads the product list out of an analytics payload.
    ///
    /// The payload is usually the data-layer array; a bare object is treated
    /// as its first entry. An empty product array is an authoritative empty
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::MalformedAnalytics`] when the product list is
    /// present but is not an array of objects.
    pub fn read_value(&self, analytics: &Value) -> Result<SourceRead, ExtractError> {
        let entry = match analytics {
            Value::Array(entries) => match entries.first() {
                Some(entry) => entry,
                None => return Ok(SourceRead::Absent),
            },
            other => other,
        };
        let Some(products) = PRODUCT_PATHS.iter().find_map(|path| entry.pointer(path)) else {
            return Ok(SourceRead::Absent);
        };

        let products: Vec<AnalyticsProduct> =
            serde_json::from_value(products.clone()).map_err(|e| {
                ExtractError::MalformedAnalytics {
                    reason: e.to_string(),
                }
            })?;
        if products.is_empty() {
            return Ok(SourceRead::Empty);
        }

        let listed = products.len();
        let items: Vec<CartItem> = products
            .into_iter()
            .enumerate()
            .filter_map(|(position, product)| {
                normalize_analytics_product(product, position, &self.currency)
            })
            .collect();
        if items.is_empty() {
            tracing::debug!(listed, "analytics products present but none readable");
            return Ok(SourceRead::Absent);
        }
        Ok(SourceRead::Items(items))
    }
}

impl CartSourceReader for AnalyticsReader {
    fn source(&self) -> ItemSource {
        ItemSource::Analytics
    }

    fn read<'a>(&'a self, page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>> {
        let result = match &page.analytics {
            Some(analytics) => self.read_value(analytics),
            None => Ok(SourceRead::Absent),
        };
        ready(result)
    }
}
