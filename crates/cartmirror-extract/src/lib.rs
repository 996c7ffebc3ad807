pub mod client;
pub mod commerce;
pub mod error;
pub mod extractor;
pub mod normalize;
pub mod page;
pub mod price;
pub mod sources;
pub mod text;
pub mod types;

pub use client::CartApiClient;
pub use commerce::CommerceApi;
pub use error::ExtractError;
pub use extractor::{ExtractSettings, Extractor};
pub use normalize::{normalize_analytics_product, normalize_remote_item, normalize_remote_product};
pub use page::PageState;
pub use price::{normalize_digits, parse_count, parse_price, parse_quantity};
pub use sources::{
    contains_cart_line, AnalyticsReader, CartSourceReader, FormReader, RemoteReader, SourceRead,
    SummaryReader, ITEM_FORM_ID_PREFIX, SUMMARY_ITEM_ID,
};
pub use text::{collapse_whitespace, normalize_title};
pub use types::{RemoteCart, RemoteCartItem, RemoteProduct};
