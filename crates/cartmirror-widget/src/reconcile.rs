//! Merges product metadata into freshly extracted snapshots.
//!
//! Reconciliation only fills gaps in display fields. Quantities and prices
//! always come from the extracted source, and totals are recomputed from the
//! lines on every pass.

use cartmirror_core::{CartItem, CartSnapshot, ProductMetadata};
use cartmirror_extract::CommerceApi;
use futures::future::join_all;

use crate::metadata::ProductMetadataCache;

/// Returns a copy of `snapshot` with empty titles, images, links and
/// currencies filled from `cache`.
///
/// Each line is matched by product ID first, then by exact normalized title.
#[must_use]
pub fn reconcile(
    snapshot: &CartSnapshot,
    cache: &ProductMetadataCache,
    default_currency: &str,
) -> CartSnapshot {
    let items = snapshot
        .items
        .iter()
        .map(|item| reconcile_item(item, cache, default_currency))
        .collect();
    snapshot.with_items(items)
}

fn reconcile_item(item: &CartItem, cache: &ProductMetadataCache, default_currency: &str) -> CartItem {
    let mut line = item.clone();
    let meta = line
        .product_id
        .as_deref()
        .and_then(|id| cache.get(id))
        .or_else(|| cache.find_by_name(&line.title));

    if let Some(meta) = meta {
        fill(&mut line.title, &meta.name);
        fill(&mut line.image_url, &meta.image_url);
        fill(&mut line.link_url, &meta.link_url);
        if line.currency.is_empty() {
            if let Some(currency) = &meta.currency {
                line.currency.clone_from(currency);
            }
        }
        if line.product_id.is_none() {
            line.product_id = Some(meta.product_id.clone());
        }
    }
    if line.currency.is_empty() {
        line.currency = default_currency.to_string();
    }
    line
}

fn fill(field: &mut String, value: &str) {
    if field.trim().is_empty() && !value.is_empty() {
        *field = value.to_string();
    }
}

/// Product IDs of lines lacking a title or image whose metadata is not
/// cached yet. Deduplicated, in line order.
#[must_use]
pub fn missing_metadata(snapshot: &CartSnapshot, cache: &ProductMetadataCache) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for item in &snapshot.items {
        let incomplete = item.title.trim().is_empty() || item.image_url.trim().is_empty();
        let Some(product_id) = item.product_id.as_deref() else {
            continue;
        };
        if incomplete && !cache.contains(product_id) && !ids.iter().any(|id| id == product_id) {
            ids.push(product_id.to_string());
        }
    }
    ids
}

/// Fetches metadata for `product_ids` concurrently. Failures are logged and
/// skipped, so the result may be shorter than the request.
pub async fn fetch_metadata(api: &dyn CommerceApi, product_ids: &[String]) -> Vec<ProductMetadata> {
    if product_ids.is_empty() {
        return Vec::new();
    }
    let results = join_all(product_ids.iter().map(|id| api.get_product(id))).await;

    let mut fetched = Vec::with_capacity(product_ids.len());
    for (product_id, result) in product_ids.iter().zip(results) {
        match result {
            Ok(meta) => fetched.push(ProductMetadata {
                product_id: product_id.clone(),
                ..meta
            }),
            Err(e) => {
                tracing::warn!(product_id, error = %e, "product metadata lookup failed");
            }
        }
    }
    tracing::debug!(
        requested = product_ids.len(),
        fetched = fetched.len(),
        "product metadata fetched"
    );
    fetched
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
