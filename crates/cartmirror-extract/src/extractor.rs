//! Priority-ordered cart extraction.

use std::collections::HashMap;
use std::sync::Arc;

use cartmirror_core::{AppConfig, CartItem, CartSnapshot, ProductCatalog};

use crate::commerce::CommerceApi;
use crate::page::PageState;
use crate::sources::{
    AnalyticsReader, CartSourceReader, FormReader, RemoteReader, SourceRead, SummaryReader,
};

/// Settings the standard reader chain needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    pub currency: String,
    pub summary_placeholder_title: String,
}

impl ExtractSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            summary_placeholder_title: config.summary_placeholder_title.clone(),
        }
    }
}

/// Builds a [`CartSnapshot`] from the first source that has something to
/// say.
pub struct Extractor {
    readers: Vec<Box<dyn CartSourceReader>>,
}

impl Extractor {
    /// An extractor over `readers`, tried in the given order.
    #[must_use]
    pub fn new(readers: Vec<Box<dyn CartSourceReader>>) -> Self {
        Self { readers }
    }

    /// Appends a lower-priority reader.
    #[must_use]
    pub fn with_reader(mut self, reader: Box<dyn CartSourceReader>) -> Self {
        self.readers.push(reader);
        self
    }

    /// The storefront chain: cart-line forms, the header summary, the
    /// analytics data layer, and, when an API is available, the remote cart.
    #[must_use]
    pub fn standard(
        catalog: Arc<ProductCatalog>,
        settings: &ExtractSettings,
        api: Option<Arc<dyn CommerceApi>>,
    ) -> Self {
        let mut readers: Vec<Box<dyn CartSourceReader>> = vec![
            Box::new(FormReader::new(catalog, settings.currency.clone())),
            Box::new(SummaryReader::new(
                settings.summary_placeholder_title.clone(),
                settings.currency.clone(),
            )),
            Box::new(AnalyticsReader::new(settings.currency.clone())),
        ];
        if let Some(api) = api {
            readers.push(Box::new(RemoteReader::new(api, settings.currency.clone())));
        }
        Self::new(readers)
    }

    /// Number of readers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Reads the cart from `page`.
    ///
    /// Never fails: reader errors are logged and skipped, and when no reader
    /// answers the result is [`CartSnapshot::unavailable`].
    pub async fn extract(&self, page: &PageState) -> CartSnapshot {
        for reader in &self.readers {
            let source = reader.source();
            match reader.read(page).await {
                Ok(SourceRead::Items(items)) => {
                    let items = merge_duplicate_lines(items);
                    tracing::debug!(%source, lines = items.len(), "cart extracted");
                    return CartSnapshot::from_items(items, source);
                }
                Ok(SourceRead::Empty) => {
                    tracing::debug!(%source, "source reports an empty cart");
                    return CartSnapshot::confirmed_empty(source);
                }
                Ok(SourceRead::Absent) => {
                    tracing::trace!(%source, "source absent, trying next");
                }
                Err(e) => {
                    tracing::warn!(%source, error = %e, "cart source failed, trying next");
                }
            }
        }
        tracing::debug!("no cart source available");
        CartSnapshot::unavailable()
    }
}

/// Folds lines sharing an `item_id` into the first occurrence, summing
/// quantities and line totals.
fn merge_duplicate_lines(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        if let Some(&at) = index.get(&item.item_id) {
            let existing = &mut merged[at];
            tracing::debug!(item_id = %item.item_id, "merging duplicate cart line");
            let total = existing.line_total() + item.line_total();
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.line_total = Some(total);
        } else {
            index.insert(item.item_id.clone(), merged.len());
            merged.push(item);
        }
    }
    merged
}
