//! The header cart-summary widget, which exposes only an item count and a
//! total.

use std::sync::LazyLock;

use cartmirror_core::{CartItem, ItemSource};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use super::{ready, CartSourceReader, SourceRead};
use crate::error::ExtractError;
use crate::page::PageState;
use crate::price::{parse_count, parse_price};
use crate::text::collapse_whitespace;

/// Line ID of the single line synthesized from the summary.
pub const SUMMARY_ITEM_ID: &str = "cart-summary";

static SUMMARY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("salla-cart-summary").expect("valid static selector"));
static SUMMARY_COUNT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".s-cart-summary-count").expect("valid static selector"));
static SUMMARY_TOTAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".s-cart-summary-total").expect("valid static selector"));

/// Reads the aggregate count and total from the header summary widget and
/// stands in one placeholder line for "all items".
pub struct SummaryReader {
    placeholder_title: String,
    currency: String,
}

impl SummaryReader {
    #[must_use]
    pub fn new(placeholder_title: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            placeholder_title: placeholder_title.into(),
            currency: currency.into(),
        }
    }

    /// Reads the summary widget in `html`.
    ///
    /// A count of zero is an authoritative empty cart. A missing widget,
    /// missing count/total element, or unreadable count is
    /// [`SourceRead::Absent`].
    #[must_use]
    pub fn read_html(&self, html: &str) -> SourceRead {
        let document = Html::parse_document(html);
        let Some(widget) = document.select(&SUMMARY).next() else {
            return SourceRead::Absent;
        };
        let (Some(count_el), Some(total_el)) = (
            widget.select(&SUMMARY_COUNT).next(),
            widget.select(&SUMMARY_TOTAL).next(),
        ) else {
            tracing::debug!("cart summary widget lacks count or total element");
            return SourceRead::Absent;
        };

        let Some(count) = parse_count(&element_text(count_el)) else {
            tracing::debug!("cart summary count is unreadable");
            return SourceRead::Absent;
        };
        if count == 0 {
            return SourceRead::Empty;
        }

        let total = parse_price(&element_text(total_el));
        let unit_price = (total / Decimal::from(count)).round_dp(2);

        let mut line = CartItem::new(SUMMARY_ITEM_ID, count, unit_price, ItemSource::CartSummary);
        line.line_total = Some(total);
        line.title.clone_from(&self.placeholder_title);
        line.link_url = "/cart".to_string();
        line.currency.clone_from(&self.currency);
        SourceRead::Items(vec![line])
    }
}

impl CartSourceReader for SummaryReader {
    fn source(&self) -> ItemSource {
        ItemSource::CartSummary
    }

    fn read<'a>(&'a self, page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>> {
        ready(Ok(self.read_html(&page.html)))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
