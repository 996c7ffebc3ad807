//! The host platform's cart API, as this crate consumes it.

use cartmirror_core::ProductMetadata;
use futures::future::BoxFuture;

use crate::error::ExtractError;
use crate::types::RemoteCart;

/// Asynchronous cart operations offered by the commerce platform.
///
/// Every call may fail; callers degrade rather than propagate. Implemented
/// over HTTP by [`crate::CartApiClient`] and by in-memory fakes in tests.
pub trait CommerceApi: Send + Sync {
    /// Reads the current cart.
    fn get_cart(&self) -> BoxFuture<'_, Result<RemoteCart, ExtractError>>;

    /// Adds `quantity` units of a catalog product.
    fn add_item<'a>(
        &'a self,
        product_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>>;

    /// Sets the quantity of an existing cart line.
    fn update_item<'a>(
        &'a self,
        item_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>>;

    /// Removes a cart line.
    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<(), ExtractError>>;

    /// Empties the cart.
    fn clear_cart(&self) -> BoxFuture<'_, Result<(), ExtractError>>;

    /// Looks up display metadata for a catalog product.
    fn get_product<'a>(
        &'a self,
        product_id: &'a str,
    ) -> BoxFuture<'a, Result<ProductMetadata, ExtractError>>;
}
