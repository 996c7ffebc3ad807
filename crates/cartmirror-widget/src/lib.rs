pub mod clock;
pub mod countdown;
pub mod detect;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod mirror;
pub mod projector;
pub mod reconcile;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{format_remaining, Countdown};
pub use detect::{ChangeDetector, ElementInfo, PageEvent, Trigger};
pub use error::WidgetError;
pub use gateway::{Mutation, MutationGateway, MutationOutcome, MutationPath};
pub use metadata::ProductMetadataCache;
pub use mirror::{
    build_extractor, CartMirror, Dispatched, MirrorSettings, PageProvider, PassResult, SharedPage,
};
pub use projector::{
    CartView, DrawerState, Intent, ItemView, Projector, Region, RenderTarget, Resolved,
};
pub use reconcile::{fetch_metadata, missing_metadata, reconcile};
pub use scheduler::{DueRefresh, PassGuard, PassTicket, RefreshScheduler};
pub use storage::{LocalCartReader, LocalStore, CART_KEY, COUNTDOWN_START_KEY};
