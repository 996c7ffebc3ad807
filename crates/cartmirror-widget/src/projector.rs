//! Presentation model of the floating cart and intent resolution.
//!
//! The projector is pure: it turns a snapshot plus drawer state into a
//! [`CartView`], and turns user intents into [`Resolved`] actions. It never
//! changes cart state itself.

use cartmirror_core::{CartItem, CartSnapshot};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::gateway::{Mutation, MutationPath};

/// Default checkout destination.
pub const DEFAULT_CHECKOUT_URL: &str = "/ar/cart";

/// Which of the drawer's mutually exclusive regions is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// No pass has completed yet.
    Loading,
    /// A source confirmed the cart is empty.
    Empty,
    Populated,
    /// No source could be read.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub item_id: String,
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    pub quantity: u32,
    pub unit_price_label: String,
    pub line_total: Decimal,
    pub line_total_label: String,
    pub decrement_enabled: bool,
    pub increment_enabled: bool,
    pub delete_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub region: Region,
    pub badge_count: u32,
    pub badge_visible: bool,
    pub items: Vec<ItemView>,
    pub subtotal_label: String,
    pub total_label: String,
    pub drawer_open: bool,
    /// Play the "item added" animation on this render.
    pub attention: bool,
}

/// UI state that is not part of the cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawerState {
    /// At least one pass has been committed.
    pub loaded: bool,
    pub open: bool,
    pub attention: bool,
}

/// A user action on the drawer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Increment { item_id: String },
    Decrement { item_id: String },
    Delete { item_id: String },
    Clear,
    Open,
    Close,
    Checkout,
}

/// What an intent amounts to against the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Mutate(Mutation),
    SetDrawer { open: bool },
    Navigate { url: String },
    Ignored { reason: &'static str },
}

/// Receives every rendered view.
pub trait RenderTarget: Send + Sync {
    fn render(&mut self, view: &CartView);
}

/// Builds views and resolves intents.
#[derive(Debug, Clone)]
pub struct Projector {
    currency_label: String,
    checkout_url: String,
    mutations: MutationPath,
}

impl Projector {
    #[must_use]
    pub fn new(currency_label: impl Into<String>) -> Self {
        Self {
            currency_label: currency_label.into(),
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
            mutations: MutationPath::Remote,
        }
    }

    /// Sets the path mutations will take. Line controls are only enabled
    /// for lines that path can edit.
    #[must_use]
    pub fn with_mutation_path(mut self, path: MutationPath) -> Self {
        self.mutations = path;
        self
    }

    #[must_use]
    pub fn with_checkout_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_url = url.into();
        self
    }

    /// Renders an amount with the currency label, e.g. `"63 ر.س"`.
    #[must_use]
    pub fn format_amount(&self, amount: Decimal) -> String {
        let amount = amount.round_dp(2).normalize();
        if self.currency_label.is_empty() {
            amount.to_string()
        } else {
            format!("{amount} {}", self.currency_label)
        }
    }

    #[must_use]
    pub fn project(&self, snapshot: &CartSnapshot, drawer: DrawerState) -> CartView {
        let region = if !drawer.loaded {
            Region::Loading
        } else if !snapshot.is_empty() {
            Region::Populated
        } else if snapshot.confirmed {
            Region::Empty
        } else {
            Region::Unavailable
        };

        let items = if region == Region::Populated {
            snapshot.items.iter().map(|i| self.item_view(i)).collect()
        } else {
            Vec::new()
        };
        let total_label = self.format_amount(snapshot.total_price);

        CartView {
            region,
            badge_count: snapshot.total_quantity,
            badge_visible: snapshot.total_quantity > 0,
            items,
            subtotal_label: total_label.clone(),
            total_label,
            drawer_open: drawer.open,
            attention: drawer.attention,
        }
    }

    fn item_view(&self, item: &CartItem) -> ItemView {
        let editable = self.is_editable(item);
        let line_total = item.line_total();
        ItemView {
            item_id: item.item_id.clone(),
            title: item.title.clone(),
            image_url: item.image_url.clone(),
            link_url: item.link_url.clone(),
            quantity: item.quantity,
            unit_price_label: self.format_amount(item.unit_price),
            line_total,
            line_total_label: self.format_amount(line_total),
            decrement_enabled: editable && item.quantity > 1,
            increment_enabled: editable,
            delete_enabled: editable,
        }
    }

    /// Maps `intent` to an action. Quantity never drops below one through
    /// decrement; removal goes through [`Intent::Delete`]. Line intents are
    /// ignored for lines the mutation path cannot reach. The API clears the
    /// whole cart, whatever its lines came from.
    #[must_use]
    pub fn resolve(&self, intent: &Intent, snapshot: &CartSnapshot) -> Resolved {
        match intent {
            Intent::Open => Resolved::SetDrawer { open: true },
            Intent::Close => Resolved::SetDrawer { open: false },
            Intent::Checkout => Resolved::Navigate {
                url: self.checkout_url.clone(),
            },
            Intent::Clear => {
                if snapshot.is_empty() {
                    Resolved::Ignored {
                        reason: "cart is already empty",
                    }
                } else if self.mutations == MutationPath::Local
                    && !snapshot.items.iter().any(|i| self.is_editable(i))
                {
                    Resolved::Ignored {
                        reason: "no line can be edited on this mutation path",
                    }
                } else {
                    Resolved::Mutate(Mutation::Clear)
                }
            }
            Intent::Increment { item_id } => match self.editable_item(snapshot, item_id) {
                Ok(item) => Resolved::Mutate(Mutation::SetQuantity {
                    item_id: item.item_id.clone(),
                    quantity: item.quantity.saturating_add(1),
                }),
                Err(reason) => Resolved::Ignored { reason },
            },
            Intent::Decrement { item_id } => match self.editable_item(snapshot, item_id) {
                Ok(item) if item.quantity > 1 => Resolved::Mutate(Mutation::SetQuantity {
                    item_id: item.item_id.clone(),
                    quantity: item.quantity - 1,
                }),
                Ok(_) => Resolved::Ignored {
                    reason: "quantity is already at minimum",
                },
                Err(reason) => Resolved::Ignored { reason },
            },
            Intent::Delete { item_id } => match self.editable_item(snapshot, item_id) {
                Ok(item) => Resolved::Mutate(Mutation::Delete {
                    item_id: item.item_id.clone(),
                }),
                Err(reason) => Resolved::Ignored { reason },
            },
        }
    }

    fn is_editable(&self, item: &CartItem) -> bool {
        self.mutations.reaches(item.source)
    }

    fn editable_item<'a>(
        &self,
        snapshot: &'a CartSnapshot,
        item_id: &str,
    ) -> Result<&'a CartItem, &'static str> {
        let item = snapshot.item(item_id).ok_or("unknown item")?;
        if self.is_editable(item) {
            Ok(item)
        } else {
            Err("line cannot be edited on this mutation path")
        }
    }
}

#[cfg(test)]
#[path = "projector_test.rs"]
mod tests;
