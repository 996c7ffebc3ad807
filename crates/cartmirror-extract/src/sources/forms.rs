//! Itemized cart-line forms rendered on the cart page.
//!
//! Each line is a `<form id="item-…">` carrying a hidden `id` input, a
//! `quantity` input, an `.item-price` element, optionally an `.item-total`,
//! a title link inside an `<h1>`, and an image.

use std::sync::{Arc, LazyLock};

use cartmirror_core::{CartItem, ItemSource, ProductCatalog};
use futures::future::BoxFuture;
use scraper::{ElementRef, Html, Selector};

use super::{ready, CartSourceReader, SourceRead};
use crate::error::ExtractError;
use crate::page::PageState;
use crate::price::{parse_price, parse_quantity};
use crate::text::collapse_whitespace;

/// ID prefix identifying cart-line forms.
pub const ITEM_FORM_ID_PREFIX: &str = "item-";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

static ITEM_FORM: LazyLock<Selector> = LazyLock::new(|| selector(r#"form[id^="item-"]"#));
static ITEM_ID_INPUT: LazyLock<Selector> = LazyLock::new(|| selector(r#"input[name="id"]"#));
static PRODUCT_ID_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="product_id"]"#));
static QUANTITY_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="quantity"]"#));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector(".item-price"));
static LINE_TOTAL: LazyLock<Selector> = LazyLock::new(|| selector(".item-total"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h1 a"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// Reads cart lines from `form[id^="item-"]` elements.
pub struct FormReader {
    catalog: Arc<ProductCatalog>,
    currency: String,
}

impl FormReader {
    #[must_use]
    pub fn new(catalog: Arc<ProductCatalog>, currency: impl Into<String>) -> Self {
        Self {
            catalog,
            currency: currency.into(),
        }
    }

    /// Reads every cart-line form in `html`.
    ///
    /// Returns [`SourceRead::Absent`] when the page has no cart-line forms or
    /// none of them is readable.
    #[must_use]
    pub fn read_html(&self, html: &str) -> SourceRead {
        let document = Html::parse_document(html);
        let forms: Vec<ElementRef<'_>> = document.select(&ITEM_FORM).collect();
        if forms.is_empty() {
            return SourceRead::Absent;
        }

        let items: Vec<CartItem> = forms
            .iter()
            .filter_map(|form| self.read_form(*form))
            .collect();

        if items.is_empty() {
            tracing::debug!(
                forms = forms.len(),
                "cart-line forms present but none readable"
            );
            return SourceRead::Absent;
        }
        if items.len() < forms.len() {
            tracing::debug!(
                forms = forms.len(),
                readable = items.len(),
                "dropped unreadable cart-line forms"
            );
        }
        SourceRead::Items(items)
    }

    /// Reads one form. Returns `None` when the quantity control or price
    /// element is missing.
    fn read_form(&self, form: ElementRef<'_>) -> Option<CartItem> {
        let form_id = form.value().id().unwrap_or_default();
        let item_id = first_attr(form, &ITEM_ID_INPUT, "value")
            .or_else(|| {
                form_id
                    .strip_prefix(ITEM_FORM_ID_PREFIX)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })?;

        let Some(quantity_input) = form.select(&QUANTITY_INPUT).next() else {
            tracing::debug!(item_id, "cart line has no quantity control; dropping");
            return None;
        };
        let Some(price_element) = form.select(&PRICE).next() else {
            tracing::debug!(item_id, "cart line has no price element; dropping");
            return None;
        };

        let quantity = quantity_input
            .value()
            .attr("value")
            .and_then(parse_quantity)
            .unwrap_or(1);
        let unit_price = parse_price(&element_text(price_element));

        let title_link = form
            .select(&TITLE_LINK)
            .next()
            .or_else(|| form.select(&ANY_LINK).next());
        let title = title_link.map(element_text).unwrap_or_default();
        let link_url = title_link
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty() && *href != "#")
            .unwrap_or_default()
            .to_string();

        let image_url = form
            .select(&IMAGE)
            .next()
            .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let product_id = first_attr(form, &PRODUCT_ID_INPUT, "value")
            .or_else(|| self.catalog.resolve_url(&link_url));

        let mut line = CartItem::new(item_id, quantity, unit_price, ItemSource::DomForm);
        line.product_id = product_id;
        line.line_total = form
            .select(&LINE_TOTAL)
            .next()
            .map(|el| parse_price(&element_text(el)));
        line.title = title;
        line.image_url = image_url;
        line.link_url = link_url;
        line.currency.clone_from(&self.currency);
        Some(line)
    }
}

impl CartSourceReader for FormReader {
    fn source(&self) -> ItemSource {
        ItemSource::DomForm
    }

    fn read<'a>(&'a self, page: &'a PageState) -> BoxFuture<'a, Result<SourceRead, ExtractError>> {
        ready(Ok(self.read_html(&page.html)))
    }
}

/// Returns `true` if an HTML fragment is, or contains, a cart-line form.
#[must_use]
pub fn contains_cart_line(fragment: &str) -> bool {
    Html::parse_fragment(fragment)
        .select(&ITEM_FORM)
        .next()
        .is_some()
}

fn first_attr(root: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    root.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
