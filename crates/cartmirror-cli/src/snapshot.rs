//! One-shot commands: `snapshot` and `price`.

use std::path::Path;

use anyhow::Context as _;
use cartmirror_extract::{normalize_digits, parse_price, PageState};
use cartmirror_widget::{CartView, RenderTarget, SharedPage};
use serde_json::json;

use crate::context::AppContext;

/// Discards renders; one-shot commands print their own output.
pub(crate) struct Discard;

impl RenderTarget for Discard {
    fn render(&mut self, _view: &CartView) {}
}

/// Reads a page (and optionally a separate data-layer capture) from disk.
pub(crate) fn read_page(html: &Path, analytics: Option<&Path>) -> anyhow::Result<PageState> {
    let markup = std::fs::read_to_string(html)
        .with_context(|| format!("reading page {}", html.display()))?;
    let page = PageState::from_html(markup);
    let Some(analytics) = analytics else {
        return Ok(page);
    };
    let raw = std::fs::read_to_string(analytics)
        .with_context(|| format!("reading analytics {}", analytics.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing analytics {}", analytics.display()))?;
    Ok(page.with_analytics(value))
}

/// Runs a single refresh pass over `html` and prints the snapshot and its
/// view as JSON.
///
/// # Errors
///
/// Returns an error if either input file cannot be read or the analytics
/// file is not JSON. Extraction itself never fails.
pub(crate) async fn run_snapshot(
    ctx: &AppContext,
    html: &Path,
    analytics: Option<&Path>,
) -> anyhow::Result<()> {
    let page = read_page(html, analytics)?;
    let mut mirror = ctx.mirror(SharedPage::new(page), Box::new(Discard));

    let view = mirror.refresh().await;
    let snapshot = mirror.snapshot();
    tracing::info!(
        source = ?snapshot.source,
        items = snapshot.items.len(),
        total = %snapshot.total_price,
        "snapshot extracted"
    );

    let output = json!({ "snapshot": snapshot, "view": view });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn run_price(text: &str) -> anyhow::Result<()> {
    let output = json!({
        "input": text,
        "normalized": normalize_digits(text),
        "price": parse_price(text),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
