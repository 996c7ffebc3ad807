//! Normalization from API and analytics wire shapes to
//! [`cartmirror_core::CartItem`] and [`cartmirror_core::ProductMetadata`].
//!
//! Lines without a readable quantity or price are dropped rather than
//! guessed, so malformed entries never leak into totals.

use cartmirror_core::{CartItem, ItemSource, ProductMetadata};
use rust_decimal::Decimal;

use crate::text::collapse_whitespace;
use crate::types::{AnalyticsProduct, JsonScalar, RemoteCartItem, RemoteImage, RemoteProduct};

/// Normalizes one platform cart line. Returns `None` when the line has no
/// usable ID or quantity, or carries neither a unit price nor a line total.
#[must_use]
pub fn normalize_remote_item(item: RemoteCartItem, default_currency: &str) -> Option<CartItem> {
    let Some(item_id) = item.id.as_id() else {
        tracing::debug!("dropping remote cart line without an id");
        return None;
    };
    let Some(quantity) = item.quantity.as_ref().and_then(|q| q.as_quantity()) else {
        tracing::debug!(item_id, "dropping remote cart line without a quantity");
        return None;
    };

    let product = item.product.unwrap_or_default();
    let line_total = item.total.as_ref().map(JsonScalar::as_price);
    let unit_price = match (product.price.as_ref(), line_total) {
        (Some(price), _) => price.as_price(),
        (None, Some(total)) => (total / Decimal::from(quantity)).round_dp(2),
        (None, None) => {
            tracing::debug!(item_id, "dropping remote cart line without a price");
            return None;
        }
    };

    let product_id = item
        .product_id
        .as_ref()
        .and_then(|p| p.as_id())
        .or_else(|| product.id.as_ref().and_then(|p| p.as_id()));

    let mut line = CartItem::new(item_id, quantity, unit_price, ItemSource::RemoteApi);
    line.product_id = product_id;
    line.line_total = line_total;
    line.title = collapse_whitespace(&product.name);
    line.image_url = product
        .image
        .as_ref()
        .map(|i| i.url().to_string())
        .unwrap_or_default();
    line.link_url = product.url.unwrap_or_default();
    line.currency = product
        .currency
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    line.variant = item.variant_id.as_ref().and_then(|v| v.as_id());
    Some(line)
}

/// Normalizes a catalog product into display metadata.
///
/// `requested_id` is used when the response omits its own ID.
#[must_use]
pub fn normalize_remote_product(product: RemoteProduct, requested_id: &str) -> ProductMetadata {
    ProductMetadata {
        product_id: product
            .id
            .as_ref()
            .and_then(|id| id.as_id())
            .unwrap_or_else(|| requested_id.to_string()),
        name: collapse_whitespace(&product.name),
        image_url: product
            .image
            .as_ref()
            .map(RemoteImage::url)
            .unwrap_or_default()
            .to_string(),
        link_url: product.url.unwrap_or_default(),
        price: product.price.as_ref().map(|p| p.as_price()),
        currency: product.currency.filter(|c| !c.is_empty()),
    }
}

/// Normalizes one analytics product entry. `position` keeps line IDs unique
/// when the entry carries no ID.
///
/// The same product may appear once per variant, so the variant is folded
/// into the line ID when present.
#[must_use]
pub fn normalize_analytics_product(
    product: AnalyticsProduct,
    position: usize,
    default_currency: &str,
) -> Option<CartItem> {
    let product_id = product.id.as_ref().and_then(|id| id.as_id());
    let variant = product.variant.as_ref().and_then(|v| v.as_id());

    let Some(quantity) = product.quantity.as_ref().and_then(|q| q.as_quantity()) else {
        tracing::debug!(position, "dropping analytics product without a quantity");
        return None;
    };
    let Some(price) = product.price.as_ref() else {
        tracing::debug!(position, "dropping analytics product without a price");
        return None;
    };

    let base_id = product_id
        .clone()
        .unwrap_or_else(|| format!("analytics-{position}"));
    let item_id = match &variant {
        Some(v) => format!("{base_id}:{v}"),
        None => base_id,
    };

    let mut line = CartItem::new(item_id, quantity, price.as_price(), ItemSource::Analytics);
    line.product_id = product_id;
    line.title = collapse_whitespace(&product.name);
    line.image_url = product.image.unwrap_or_default();
    line.link_url = product.url.filter(|u| u != "#").unwrap_or_default();
    line.currency = product
        .currency
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    line.variant = variant;
    Some(line)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
