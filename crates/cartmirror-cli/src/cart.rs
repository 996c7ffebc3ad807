//! Cart command handlers for the CLI.
//!
//! Mutations go through the same gateway the mirror uses: the commerce API
//! when `CARTMIRROR_API_BASE_URL` is set, otherwise the local fallback cart
//! in the store file. Every mutation is followed by a fresh read of the cart.

use anyhow::bail;
use cartmirror_extract::PageState;
use cartmirror_widget::{
    format_remaining, CartMirror, Countdown, Mutation, MutationOutcome, SharedPage,
};
use chrono::Utc;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;

use crate::context::AppContext;
use crate::snapshot::Discard;

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Print the current cart
    Show,
    /// Add units of a product
    Add {
        /// Product slug or ID
        product: String,
        /// Units to add
        #[arg(long, default_value = "1")]
        qty: u32,
        /// Unit price, recorded by the local fallback cart only
        #[arg(long)]
        price: Option<Decimal>,
    },
    /// Set a line's quantity; zero removes the line
    Set {
        /// Cart line ID
        item_id: String,
        /// New quantity
        #[arg(long)]
        qty: u32,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        item_id: String,
    },
    /// Empty the cart
    Clear,
}

impl CartCommands {
    fn mutation(self, ctx: &AppContext) -> Option<Mutation> {
        match self {
            CartCommands::Show => None,
            CartCommands::Add {
                product,
                qty,
                price,
            } => Some(Mutation::Add {
                product_id: ctx.catalog.resolve(&product),
                quantity: qty,
                unit_price: price,
            }),
            CartCommands::Set { item_id, qty } => Some(Mutation::SetQuantity {
                item_id,
                quantity: qty,
            }),
            CartCommands::Remove { item_id } => Some(Mutation::Delete { item_id }),
            CartCommands::Clear => Some(Mutation::Clear),
        }
    }
}

/// Reads the cart without a page, so only the API or the local fallback
/// cart can answer.
fn headless_mirror(ctx: &AppContext) -> CartMirror {
    ctx.mirror(SharedPage::new(PageState::default()), Box::new(Discard))
}

/// Applies the command's mutation, if any, then prints the resulting cart.
///
/// # Errors
///
/// Returns an error when the mutation fails, after printing the cart as it
/// stands.
pub(crate) async fn run_cart(ctx: &AppContext, command: CartCommands) -> anyhow::Result<()> {
    let outcome = match command.mutation(ctx) {
        Some(mutation) => {
            let outcome = ctx.gateway().apply(&mutation).await;
            tracing::info!(%mutation, ?outcome, "cart mutation");
            Some(outcome)
        }
        None => None,
    };

    let mut mirror = headless_mirror(ctx);
    let view = mirror.refresh().await;
    let output = json!({ "snapshot": mirror.snapshot(), "view": view });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(MutationOutcome::Failed { path, reason }) = outcome {
        bail!("cart mutation failed on {path:?} path: {reason}");
    }
    Ok(())
}

/// Prints the time left in the current countdown period, starting a new
/// period when the stored one has expired.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub(crate) fn run_countdown(ctx: &AppContext) -> anyhow::Result<()> {
    let countdown = Countdown::new(ctx.config.countdown_reset_hour_utc);
    let now = Utc::now();
    let started = countdown.ensure_started(&ctx.store, now)?;
    let remaining = countdown.remaining(now);

    let output = json!({
        "started_at": started.to_rfc3339(),
        "resets_at": countdown.next_reset(now).to_rfc3339(),
        "remaining": format_remaining(remaining),
        "remaining_secs": remaining.num_seconds().max(0),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
