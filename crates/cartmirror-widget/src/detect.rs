//! Classifies host-page events into refresh triggers.

use std::time::Duration;

use cartmirror_core::RefreshDelays;
use cartmirror_extract::{contains_cart_line, ITEM_FORM_ID_PREFIX};
use serde::{Deserialize, Serialize};

/// One element on a click path: the clicked element first, then each
/// ancestor outward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub aria_label: String,
}

impl ElementInfo {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    #[must_use]
    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = label.into();
        self
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    fn is_cart_line(&self) -> bool {
        self.is_tag("form") && self.id.starts_with(ITEM_FORM_ID_PREFIX)
    }
}

/// Something that happened on the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageEvent {
    /// Nodes were inserted or removed; each entry is the node's outer HTML.
    ChildList {
        #[serde(default)]
        added: Vec<String>,
        #[serde(default)]
        removed: Vec<String>,
    },
    /// A form field's value changed.
    FieldChanged { name: String, in_cart_line: bool },
    /// A click, with the path from the clicked element outward.
    Click { path: Vec<ElementInfo> },
    /// A named event on the platform's event bus.
    Platform { name: String },
    /// A push onto the analytics data layer.
    AnalyticsPush,
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    StructuralMutation,
    QuantityChanged,
    DeleteClicked,
    CartUpdated,
    ItemDeleted,
    ProductAdded,
    AddToCartClicked,
    AnalyticsPush,
}

impl Trigger {
    /// Delay before the refresh this trigger asks for.
    #[must_use]
    pub fn delay(self, delays: &RefreshDelays) -> Duration {
        let ms = match self {
            Trigger::StructuralMutation | Trigger::QuantityChanged | Trigger::DeleteClicked => {
                delays.structural_ms
            }
            Trigger::CartUpdated | Trigger::ItemDeleted | Trigger::ProductAdded => {
                delays.platform_ms
            }
            Trigger::AddToCartClicked => delays.add_click_ms,
            Trigger::AnalyticsPush => delays.analytics_ms,
        };
        Duration::from_millis(ms)
    }

    /// Whether the refresh should also open the drawer and play the
    /// attention animation.
    #[must_use]
    pub fn opens_drawer(self) -> bool {
        matches!(self, Trigger::ProductAdded | Trigger::AddToCartClicked)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Trigger::StructuralMutation => "structural_mutation",
            Trigger::QuantityChanged => "quantity_changed",
            Trigger::DeleteClicked => "delete_clicked",
            Trigger::CartUpdated => "cart_updated",
            Trigger::ItemDeleted => "item_deleted",
            Trigger::ProductAdded => "product_added",
            Trigger::AddToCartClicked => "add_to_cart_clicked",
            Trigger::AnalyticsPush => "analytics_push",
        };
        f.write_str(name)
    }
}

pub const PLATFORM_CART_UPDATED: &str = "cart::updated";
pub const PLATFORM_ITEM_DELETED: &str = "cart::item.deleted";
pub const PLATFORM_PRODUCT_ADDED: &str = "product::added";

/// Stateless event classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Maps an event to a trigger, or `None` when it cannot affect the cart.
    #[must_use]
    pub fn classify(&self, event: &PageEvent) -> Option<Trigger> {
        match event {
            PageEvent::ChildList { added, removed } => added
                .iter()
                .chain(removed)
                .any(|fragment| contains_cart_line(fragment))
                .then_some(Trigger::StructuralMutation),
            PageEvent::FieldChanged { name, in_cart_line } => {
                (*in_cart_line && name == "quantity").then_some(Trigger::QuantityChanged)
            }
            PageEvent::Click { path } => classify_click(path),
            PageEvent::Platform { name } => match name.as_str() {
                PLATFORM_CART_UPDATED => Some(Trigger::CartUpdated),
                PLATFORM_ITEM_DELETED => Some(Trigger::ItemDeleted),
                PLATFORM_PRODUCT_ADDED => Some(Trigger::ProductAdded),
                _ => None,
            },
            PageEvent::AnalyticsPush => Some(Trigger::AnalyticsPush),
        }
    }
}

fn classify_click(path: &[ElementInfo]) -> Option<Trigger> {
    if path.iter().any(is_add_to_cart_control) {
        return Some(Trigger::AddToCartClicked);
    }
    let in_cart_line = path.iter().any(ElementInfo::is_cart_line);
    if in_cart_line && path.iter().any(is_delete_control) {
        return Some(Trigger::DeleteClicked);
    }
    None
}

fn is_add_to_cart_control(el: &ElementInfo) -> bool {
    el.is_tag("salla-add-product-button")
        || el.class.contains("addToCart")
        || (el.is_tag("button") && el.aria_label.contains("Add to cart"))
}

fn is_delete_control(el: &ElementInfo) -> bool {
    let class = el.class.to_ascii_lowercase();
    let label = el.aria_label.to_lowercase();
    class.contains("delete")
        || class.contains("remove")
        || label.contains("delete")
        || label.contains("remove")
        || label.contains("حذف")
}
