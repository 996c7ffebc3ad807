//! Cart mutations against the platform API, or the local fallback cart
//! when no API is configured.

use std::sync::Arc;

use cartmirror_core::{CartItem, ItemSource};
use cartmirror_extract::CommerceApi;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::storage::LocalStore;

/// A change to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Sets a line's quantity. Zero removes the line.
    SetQuantity { item_id: String, quantity: u32 },
    Delete { item_id: String },
    Clear,
    /// Adds units of a product. `unit_price` is only used by the local
    /// fallback, where no catalog price is available.
    Add {
        product_id: String,
        quantity: u32,
        unit_price: Option<Decimal>,
    },
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::SetQuantity { item_id, quantity } => {
                write!(f, "set {item_id} quantity to {quantity}")
            }
            Mutation::Delete { item_id } => write!(f, "delete {item_id}"),
            Mutation::Clear => write!(f, "clear cart"),
            Mutation::Add {
                product_id,
                quantity,
                ..
            } => write!(f, "add {quantity} x {product_id}"),
        }
    }
}

/// Where a mutation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPath {
    Remote,
    Local,
}

impl MutationPath {
    /// Whether lines read from `source` carry IDs this path can mutate.
    ///
    /// Form lines use the platform's cart line IDs, so the API can edit
    /// them. Analytics lines are keyed by product and the summary line
    /// stands for the whole cart, so nothing can. The local path only knows
    /// its own stored lines.
    #[must_use]
    pub fn reaches(self, source: ItemSource) -> bool {
        match self {
            MutationPath::Remote => {
                matches!(source, ItemSource::DomForm | ItemSource::RemoteApi)
            }
            MutationPath::Local => source == ItemSource::LocalFallback,
        }
    }
}

/// Result of a mutation. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied(MutationPath),
    Failed { path: MutationPath, reason: String },
}

impl MutationOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

/// Applies [`Mutation`]s through the commerce API when one is configured,
/// otherwise to the fallback cart in the [`LocalStore`].
pub struct MutationGateway {
    api: Option<Arc<dyn CommerceApi>>,
    store: LocalStore,
    currency: String,
}

impl MutationGateway {
    #[must_use]
    pub fn new(
        api: Option<Arc<dyn CommerceApi>>,
        store: LocalStore,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            currency: currency.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> MutationPath {
        if self.api.is_some() {
            MutationPath::Remote
        } else {
            MutationPath::Local
        }
    }

    /// Applies `mutation`. Never fails; see [`MutationOutcome`].
    pub async fn apply(&self, mutation: &Mutation) -> MutationOutcome {
        let outcome = match &self.api {
            Some(api) => apply_remote(api.as_ref(), mutation).await,
            None => self.apply_local(mutation),
        };
        match &outcome {
            MutationOutcome::Applied(path) => {
                tracing::info!(%mutation, ?path, "cart mutation applied");
            }
            MutationOutcome::Failed { path, reason } => {
                tracing::warn!(%mutation, ?path, reason, "cart mutation failed");
            }
        }
        outcome
    }

    fn apply_local(&self, mutation: &Mutation) -> MutationOutcome {
        let failed = |reason: String| MutationOutcome::Failed {
            path: MutationPath::Local,
            reason,
        };
        let mut items = match self.store.cart() {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => return failed(e.to_string()),
        };

        match mutation {
            Mutation::SetQuantity {
                item_id,
                quantity: 0,
            }
            | Mutation::Delete { item_id } => {
                let before = items.len();
                items.retain(|i| &i.item_id != item_id);
                if items.len() == before {
                    return failed(format!("no local cart line {item_id}"));
                }
            }
            Mutation::SetQuantity { item_id, quantity } => {
                let Some(line) = items.iter_mut().find(|i| &i.item_id == item_id) else {
                    return failed(format!("no local cart line {item_id}"));
                };
                line.quantity = *quantity;
                line.line_total = None;
            }
            Mutation::Clear => items.clear(),
            Mutation::Add {
                product_id,
                quantity,
                unit_price,
            } => {
                let quantity = (*quantity).max(1);
                if let Some(line) = items
                    .iter_mut()
                    .find(|i| i.product_id.as_deref() == Some(product_id.as_str()))
                {
                    line.quantity = line.quantity.saturating_add(quantity);
                    line.line_total = None;
                } else {
                    let mut line = CartItem::new(
                        Uuid::new_v4().to_string(),
                        quantity,
                        unit_price.unwrap_or_default(),
                        ItemSource::LocalFallback,
                    );
                    line.product_id = Some(product_id.clone());
                    line.currency.clone_from(&self.currency);
                    items.push(line);
                }
            }
        }

        match self.store.set_cart(&items) {
            Ok(()) => MutationOutcome::Applied(MutationPath::Local),
            Err(e) => failed(e.to_string()),
        }
    }
}

async fn apply_remote(api: &dyn CommerceApi, mutation: &Mutation) -> MutationOutcome {
    let result = match mutation {
        Mutation::SetQuantity {
            item_id,
            quantity: 0,
        }
        | Mutation::Delete { item_id } => api.delete_item(item_id).await,
        Mutation::SetQuantity { item_id, quantity } => api.update_item(item_id, *quantity).await,
        Mutation::Clear => api.clear_cart().await,
        Mutation::Add {
            product_id,
            quantity,
            ..
        } => api.add_item(product_id, (*quantity).max(1)).await,
    };
    match result {
        Ok(()) => MutationOutcome::Applied(MutationPath::Remote),
        Err(e) => MutationOutcome::Failed {
            path: MutationPath::Remote,
            reason: e.to_string(),
        },
    }
}
