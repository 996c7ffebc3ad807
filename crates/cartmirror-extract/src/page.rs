//! The page state a refresh pass reads from.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static DATA_LAYER_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:window\.)?dataLayer\s*=\s*").expect("valid dataLayer regex")
});

/// Everything the extractor can see of the host page at one moment: the
/// rendered markup and the analytics data layer, if the page set one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub html: String,
    pub analytics: Option<Value>,
}

impl PageState {
    /// Wraps markup, lifting an inline `dataLayer = [...]` assignment out of
    /// the page scripts when one is present.
    #[must_use]
    pub fn from_html(html: impl Into<String>) -> Self {
        let html = html.into();
        let analytics = find_inline_data_layer(&html);
        Self { html, analytics }
    }

    /// Replaces the analytics payload, e.g. with one captured separately.
    #[must_use]
    pub fn with_analytics(mut self, analytics: Value) -> Self {
        self.analytics = Some(analytics);
        self
    }
}

/// Finds the first `dataLayer = <json>` assignment that parses as JSON.
fn find_inline_data_layer(html: &str) -> Option<Value> {
    DATA_LAYER_ASSIGN_RE.find_iter(html).find_map(|m| {
        let rest = &html[m.end()..];
        let parsed = serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()?;
        match parsed {
            Ok(value) if value.is_array() || value.is_object() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "inline dataLayer assignment is not JSON; ignoring");
                None
            }
        }
    })
}
