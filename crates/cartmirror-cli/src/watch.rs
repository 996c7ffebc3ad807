//! `watch`: mirrors a page file that some other process keeps rewriting.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use cartmirror_extract::PageState;
use cartmirror_widget::{CartView, ChangeDetector, PageEvent, RenderTarget, SharedPage};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::context::AppContext;

const MIN_POLL_MS: u64 = 50;

/// Writes each view as one JSON line on stdout.
struct JsonLines;

impl RenderTarget for JsonLines {
    fn render(&mut self, view: &CartView) {
        match serde_json::to_string(view) {
            Ok(line) => {
                let mut out = std::io::stdout().lock();
                if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                    tracing::warn!(error = %e, "failed to write view");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize view"),
        }
    }
}

/// The event a rewrite of the page amounts to. A rewrite that touches no
/// cart line is still reported, as the platform's own cart-updated signal,
/// so summary-only changes are picked up too.
pub(crate) fn change_event(old_html: &str, new_html: &str) -> PageEvent {
    let structural = PageEvent::ChildList {
        added: vec![new_html.to_string()],
        removed: vec![old_html.to_string()],
    };
    if ChangeDetector.classify(&structural).is_some() {
        structural
    } else {
        PageEvent::Platform {
            name: "cart::updated".to_string(),
        }
    }
}

/// Polls `html` every `poll_ms` and feeds changes to a running mirror until
/// interrupted.
///
/// # Errors
///
/// Returns an error if the file cannot be read at startup or the mirror task
/// panics. Read failures while polling are logged and retried.
pub(crate) async fn run_watch(ctx: &AppContext, html: &Path, poll_ms: u64) -> anyhow::Result<()> {
    let mut current = std::fs::read_to_string(html)?;
    let page = SharedPage::new(PageState::from_html(current.clone()));

    let mirror = ctx.mirror(page.clone(), Box::new(JsonLines));

    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(mirror.run(rx));

    let mut interval = tokio::time::interval(Duration::from_millis(poll_ms.max(MIN_POLL_MS)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(path = %html.display(), poll_ms, "watching page");

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to listen for interrupt");
                }
                break;
            }
            _ = interval.tick() => {
                let next = match tokio::fs::read_to_string(html).await {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::warn!(path = %html.display(), error = %e, "page read failed");
                        continue;
                    }
                };
                if next == current {
                    continue;
                }
                let event = change_event(&current, &next);
                page.set(PageState::from_html(next.clone()));
                current = next;
                if tx.send(event).await.is_err() {
                    tracing::warn!("mirror stopped early");
                    break;
                }
            }
        }
    }

    drop(tx);
    let snapshot = handle.await?;
    tracing::info!(
        quantity = snapshot.total_quantity,
        total = %snapshot.total_price,
        "watch finished"
    );
    Ok(())
}
