//! Interchangeable readers for each place cart state can be found.
//!
//! Each reader answers one of three things: here are the lines, the cart is
//! definitely empty, or this source has nothing to say. The
//! [`crate::Extractor`] walks them in priority order.

mod analytics;
mod forms;
mod remote;
mod summary;

use cartmirror_core::{CartItem, ItemSource};
use futures::future::BoxFuture;

use crate::error::ExtractError;
use crate::page::PageState;

pub use analytics::AnalyticsReader;
pub use forms::{contains_cart_line, FormReader, ITEM_FORM_ID_PREFIX};
pub use remote::RemoteReader;
pub use summary::{SummaryReader, SUMMARY_ITEM_ID};

/// What a single source reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRead {
    /// At least one readable cart line.
    Items(Vec<CartItem>),
    /// The source is authoritative and the cart holds nothing.
    Empty,
    /// The source is missing or unreadable; try the next one.
    Absent,
}

/// One way of reading the cart.
///
/// Implementations must not guess: a line whose quantity or price cannot be
/// read is dropped, and a source with no readable lines reports
/// [`SourceRead::Absent`].
pub trait CartSourceReader: Send + Sync {
    /// The tag stamped on lines this reader produces.
    fn source(&self) -> ItemSource;

    /// Reads the cart from `page` (or from outside the page, for remote
    /// readers).
    fn read<'a>(&'a self, page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>>;
}

/// Wraps a synchronous read result for the async reader interface.
pub(crate) fn ready(
    result: Result<SourceRead, ExtractError>,
) -> BoxFuture<'static, Result<SourceRead, ExtractError>> {
    Box::pin(std::future::ready(result))
}
