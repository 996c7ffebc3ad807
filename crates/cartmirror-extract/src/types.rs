//! Wire shapes of the platform cart API and the analytics data layer.
//!
//! ## Observed quirks
//!
//! ### IDs
//! Item and product IDs arrive as JSON numbers on some endpoints and as
//! strings on others (and in the analytics payload). Both are modelled as
//! [`JsonScalar`] and rendered to strings during normalization.
//!
//! ### Prices
//! The cart API returns numeric prices; the data layer frequently carries
//! pre-formatted strings such as `"٦٣ ر.س"`. Strings are run through
//! [`crate::price::parse_price`].
//!
//! ### Images
//! Cart items nest the product image as `{ "url": "..." }`; the product
//! endpoint sometimes returns a bare string instead.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::price::{parse_price, parse_quantity};

/// A JSON value that should be a number but may arrive as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonScalar {
    Number(serde_json::Number),
    Text(String),
}

impl JsonScalar {
    /// Renders the value as an identifier string. Empty strings yield `None`.
    #[must_use]
    pub fn as_id(&self) -> Option<String> {
        match self {
            JsonScalar::Number(n) => Some(n.to_string()),
            JsonScalar::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Interprets the value as a non-negative amount.
    #[must_use]
    pub fn as_price(&self) -> Decimal {
        match self {
            JsonScalar::Number(n) => parse_price(&n.to_string()),
            JsonScalar::Text(s) => parse_price(s),
        }
    }

    /// Interprets the value as a positive quantity.
    #[must_use]
    pub fn as_quantity(&self) -> Option<u32> {
        match self {
            JsonScalar::Number(n) => n.as_u64().and_then(|q| u32::try_from(q).ok()).filter(|&q| q > 0),
            JsonScalar::Text(s) => parse_quantity(s),
        }
    }
}

/// Envelope of `GET /cart`.
#[derive(Debug, Deserialize)]
pub struct CartResponse {
    pub data: RemoteCart,
}

/// The cart as the platform reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    /// Platform-computed total, informational only.
    #[serde(default)]
    pub total: Option<JsonScalar>,
}

/// One line of the platform cart.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCartItem {
    /// Cart-line ID used by update/delete calls.
    pub id: JsonScalar,
    #[serde(default)]
    pub product_id: Option<JsonScalar>,
    #[serde(default)]
    pub variant_id: Option<JsonScalar>,
    #[serde(default)]
    pub quantity: Option<JsonScalar>,
    /// Line total, when the platform includes one.
    #[serde(default)]
    pub total: Option<JsonScalar>,
    #[serde(default)]
    pub product: Option<RemoteProduct>,
}

/// Envelope of `GET /products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub data: RemoteProduct,
}

/// Product details, nested in cart lines and returned by the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteProduct {
    #[serde(default)]
    pub id: Option<JsonScalar>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<JsonScalar>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub image: Option<RemoteImage>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Product image: `{ "url": "..." }` or a bare URL string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteImage {
    Object { url: String },
    Url(String),
}

impl RemoteImage {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            RemoteImage::Object { url } | RemoteImage::Url(url) => url,
        }
    }
}

/// One entry of `ecommerce.checkout.products` in the analytics data layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsProduct {
    #[serde(default)]
    pub id: Option<JsonScalar>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<JsonScalar>,
    #[serde(default)]
    pub quantity: Option<JsonScalar>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub variant: Option<JsonScalar>,
    #[serde(default)]
    pub url: Option<String>,
}
