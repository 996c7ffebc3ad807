//! The platform cart API as a source of last resort.

use std::sync::Arc;

use cartmirror_core::{CartItem, ItemSource};
use futures::future::BoxFuture;

use super::{CartSourceReader, SourceRead};
use crate::commerce::CommerceApi;
use crate::error::ExtractError;
use crate::normalize::normalize_remote_item;
use crate::page::PageState;

/// Reads the cart through [`CommerceApi::get_cart`].
pub struct RemoteReader {
    api: Arc<dyn CommerceApi>,
    currency: String,
}

impl RemoteReader {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, currency: impl Into<String>) -> Self {
        Self {
            api,
            currency: currency.into(),
        }
    }

    async fn fetch(&self) -> Result<SourceRead, ExtractError> {
        let cart = self.api.get_cart().await?;
        if cart.items.is_empty() {
            return Ok(SourceRead::Empty);
        }
        let listed = cart.items.len();
        let items: Vec<CartItem> = cart
            .items
            .into_iter()
            .filter_map(|item| normalize_remote_item(item, &self.currency))
            .collect();
        if items.is_empty() {
            tracing::warn!(listed, "remote cart lines present but none readable");
            return Ok(SourceRead::Absent);
        }
        Ok(SourceRead::Items(items))
    }
}

impl CartSourceReader for RemoteReader {
    fn source(&self) -> ItemSource {
        ItemSource::RemoteApi
    }

    fn read<'a>(&'a self, _page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>> {
        Box::pin(self.fetch())
    }
}
