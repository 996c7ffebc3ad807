use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default currency for lines whose source does not state one. Every store
/// in scope prices in Saudi Riyal.
pub const DEFAULT_CURRENCY: &str = "SAR";

/// Which extraction path produced a line item.
///
/// Sources are listed in extraction priority order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Itemized `form[id^="item-"]` elements rendered on the cart page.
    DomForm,
    /// Header cart-summary widget exposing only count and total.
    CartSummary,
    /// Page-global analytics data layer set at page load.
    Analytics,
    /// The host platform's cart API.
    RemoteApi,
    /// Locally persisted cart used when no platform API is available.
    LocalFallback,
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemSource::DomForm => write!(f, "dom_form"),
            ItemSource::CartSummary => write!(f, "cart_summary"),
            ItemSource::Analytics => write!(f, "analytics"),
            ItemSource::RemoteApi => write!(f, "remote_api"),
            ItemSource::LocalFallback => write!(f, "local_fallback"),
        }
    }
}

/// One normalized cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Identifier unique within a snapshot. Stable across passes only if the
    /// source preserves it.
    pub item_id: String,
    /// Canonical catalog ID, when one could be resolved.
    pub product_id: Option<String>,
    /// Always at least 1; sources drop lines they cannot read a quantity for.
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Explicit line total when the source renders one.
    pub line_total: Option<Decimal>,
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    /// ISO 4217 currency code, e.g. `"SAR"`.
    pub currency: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub source: ItemSource,
}

impl CartItem {
    /// Creates a line with empty presentation fields.
    #[must_use]
    pub fn new(item_id: impl Into<String>, quantity: u32, unit_price: Decimal, source: ItemSource) -> Self {
        Self {
            item_id: item_id.into(),
            product_id: None,
            quantity: quantity.max(1),
            unit_price,
            line_total: None,
            title: String::new(),
            image_url: String::new(),
            link_url: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            variant: None,
            source,
        }
    }

    /// The explicit line total, or `unit_price * quantity` when the source
    /// carried none.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.line_total
            .unwrap_or_else(|| self.unit_price * Decimal::from(self.quantity))
    }
}

/// Point-in-time cart state, rebuilt from scratch on every pass.
///
/// Fields are public for serialization and inspection, but snapshots should
/// only be built through the constructors so the totals stay consistent with
/// `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total_quantity: u32,
    pub total_price: Decimal,
    /// Source that produced the snapshot; `None` when no source answered.
    pub source: Option<ItemSource>,
    /// `false` only when no source could say anything about the cart.
    pub confirmed: bool,
}

impl CartSnapshot {
    /// Builds a snapshot from extracted lines, computing both aggregates.
    ///
    /// An empty `items` list produces a confirmed empty snapshot.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>, source: ItemSource) -> Self {
        let total_quantity = items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity));
        let total_price = items.iter().map(CartItem::line_total).sum();
        Self {
            items,
            total_quantity,
            total_price,
            source: Some(source),
            confirmed: true,
        }
    }

    /// A source reported, authoritatively, that the cart holds nothing.
    #[must_use]
    pub fn confirmed_empty(source: ItemSource) -> Self {
        Self::from_items(Vec::new(), source)
    }

    /// No source could be read. Rendered as the "visit the cart page" state,
    /// never as an empty cart.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            items: Vec::new(),
            total_quantity: 0,
            total_price: Decimal::ZERO,
            source: None,
            confirmed: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a line by its snapshot-local ID.
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Rebuilds the aggregates from a new item list, keeping the source tag.
    #[must_use]
    pub fn with_items(&self, items: Vec<CartItem>) -> Self {
        match self.source {
            Some(source) => Self::from_items(items, source),
            None if items.is_empty() => Self::unavailable(),
            None => Self::from_items(items, ItemSource::LocalFallback),
        }
    }
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Best-known display metadata for a catalog product. Never authoritative
/// for price or quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub link_url: String,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
}
