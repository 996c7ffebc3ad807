//! The floating-cart component: wires detection, scheduling, extraction,
//! reconciliation, projection and mutation together.
//!
//! Every refresh recomputes the snapshot from the page; nothing is patched
//! in place. A pass runs in three steps so callers can interleave them:
//! [`CartMirror::begin_pass`] issues a ticket, [`CartMirror::compute`] reads
//! and reconciles without touching shared state, and [`CartMirror::commit`]
//! renders unless a newer pass already has.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use cartmirror_core::{AppConfig, CartSnapshot, ProductCatalog, ProductMetadata, RefreshDelays};
use cartmirror_extract::{CommerceApi, ExtractSettings, Extractor, PageState};
use tokio::sync::mpsc;

use crate::clock::{Clock, SystemClock};
use crate::detect::{ChangeDetector, PageEvent, Trigger};
use crate::gateway::{MutationGateway, MutationOutcome};
use crate::metadata::ProductMetadataCache;
use crate::projector::{CartView, DrawerState, Intent, Projector, RenderTarget, Resolved};
use crate::reconcile::{fetch_metadata, missing_metadata, reconcile};
use crate::scheduler::{PassGuard, PassTicket, RefreshScheduler};
use crate::storage::{LocalCartReader, LocalStore};

/// Supplies the page as it looks right now.
pub trait PageProvider: Send + Sync {
    fn current_page(&self) -> PageState;
}

/// A page held in memory and replaced wholesale by its owner.
#[derive(Debug, Clone, Default)]
pub struct SharedPage {
    inner: Arc<RwLock<PageState>>,
}

impl SharedPage {
    #[must_use]
    pub fn new(page: PageState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(page)),
        }
    }

    pub fn set(&self, page: PageState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = page;
    }
}

impl PageProvider for SharedPage {
    fn current_page(&self) -> PageState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Display and timing settings for a [`CartMirror`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSettings {
    pub currency: String,
    pub currency_label: String,
    pub delays: RefreshDelays,
}

impl MirrorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            currency_label: config.currency_label.clone(),
            delays: config.delays,
        }
    }
}

/// The standard reader chain, plus the local fallback cart when no API is
/// configured.
#[must_use]
pub fn build_extractor(
    catalog: Arc<ProductCatalog>,
    settings: &ExtractSettings,
    api: Option<Arc<dyn CommerceApi>>,
    store: &LocalStore,
) -> Extractor {
    let local_only = api.is_none();
    let extractor = Extractor::standard(catalog, settings, api);
    if local_only {
        extractor.with_reader(Box::new(LocalCartReader::new(store.clone())))
    } else {
        extractor
    }
}

/// Output of [`CartMirror::compute`], waiting to be committed.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub ticket: PassTicket,
    pub snapshot: CartSnapshot,
    /// Metadata fetched during the pass, merged into the cache on commit.
    pub fetched: Vec<ProductMetadata>,
}

/// What [`CartMirror::dispatch`] did with an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A mutation was attempted and a refresh followed.
    Mutated {
        outcome: MutationOutcome,
        view: Option<CartView>,
    },
    Drawer(CartView),
    Navigate(String),
    Ignored(&'static str),
}

pub struct CartMirror {
    extractor: Extractor,
    api: Option<Arc<dyn CommerceApi>>,
    cache: ProductMetadataCache,
    page: Arc<dyn PageProvider>,
    target: Box<dyn RenderTarget>,
    projector: Projector,
    detector: ChangeDetector,
    scheduler: RefreshScheduler,
    guard: PassGuard,
    gateway: MutationGateway,
    clock: Arc<dyn Clock>,
    snapshot: CartSnapshot,
    drawer: DrawerState,
    currency: String,
}

impl CartMirror {
    #[must_use]
    pub fn new(
        extractor: Extractor,
        page: Arc<dyn PageProvider>,
        target: Box<dyn RenderTarget>,
        gateway: MutationGateway,
        settings: &MirrorSettings,
    ) -> Self {
        Self {
            extractor,
            api: None,
            cache: ProductMetadataCache::new(),
            page,
            target,
            projector: Projector::new(settings.currency_label.clone())
                .with_mutation_path(gateway.path()),
            detector: ChangeDetector,
            scheduler: RefreshScheduler::new(settings.delays),
            guard: PassGuard::new(),
            gateway,
            clock: Arc::new(SystemClock::new()),
            snapshot: CartSnapshot::unavailable(),
            drawer: DrawerState::default(),
            currency: settings.currency.clone(),
        }
    }

    /// Uses `api` for product metadata lookups.
    #[must_use]
    pub fn with_api(mut self, api: Arc<dyn CommerceApi>) -> Self {
        self.api = Some(api);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the projector. Its mutation path is reset to the gateway's.
    #[must_use]
    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = projector.with_mutation_path(self.gateway.path());
        self
    }

    /// Seeds the metadata cache.
    #[must_use]
    pub fn with_metadata(mut self, cache: ProductMetadataCache) -> Self {
        self.cache = cache;
        self
    }

    /// The last committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// The view of the last committed snapshot.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.projector.project(&self.snapshot, self.drawer)
    }

    #[must_use]
    pub fn metadata(&self) -> &ProductMetadataCache {
        &self.cache
    }

    /// Deadline of the pending refresh on this mirror's clock.
    #[must_use]
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.scheduler.next_deadline_ms()
    }

    /// Classifies a page event and schedules a refresh if it matters.
    pub fn handle_event(&mut self, event: &PageEvent) -> Option<Trigger> {
        let trigger = self.detector.classify(event)?;
        self.trigger(trigger);
        Some(trigger)
    }

    /// Schedules a refresh for `trigger`. Returns the schedule generation.
    pub fn trigger(&mut self, trigger: Trigger) -> u64 {
        self.scheduler.schedule(trigger, self.clock.now_ms())
    }

    /// Runs the pending refresh if it is due.
    pub async fn tick(&mut self) -> Option<CartView> {
        let due = self.scheduler.take_due(self.clock.now_ms())?;
        tracing::debug!(
            generation = due.generation,
            triggers = due.triggers.len(),
            open_drawer = due.open_drawer,
            "running scheduled refresh"
        );
        let ticket = self.begin_pass();
        let result = self.compute(ticket).await;
        self.settle(result, due.open_drawer)
    }

    /// Runs a full pass now.
    pub async fn refresh(&mut self) -> CartView {
        let ticket = self.begin_pass();
        let result = self.compute(ticket).await;
        // A pass begun here is always the newest, so commit cannot reject it.
        self.commit(result).unwrap_or_else(|| self.view())
    }

    pub fn begin_pass(&mut self) -> PassTicket {
        self.guard.issue()
    }

    /// Extracts and reconciles a fresh snapshot. Reads shared state only.
    pub async fn compute(&self, ticket: PassTicket) -> PassResult {
        let page = self.page.current_page();
        let extracted = self.extractor.extract(&page).await;

        let fetched = match &self.api {
            Some(api) => {
                let wanted = missing_metadata(&extracted, &self.cache);
                fetch_metadata(api.as_ref(), &wanted).await
            }
            None => Vec::new(),
        };
        let snapshot = if fetched.is_empty() {
            reconcile(&extracted, &self.cache, &self.currency)
        } else {
            let mut merged = self.cache.clone();
            for meta in fetched.iter().cloned() {
                merged.insert(meta);
            }
            reconcile(&extracted, &merged, &self.currency)
        };

        PassResult {
            ticket,
            snapshot,
            fetched,
        }
    }

    /// Commits a pass. Returns `None` and keeps the current snapshot when a
    /// newer pass has already rendered.
    pub fn commit(&mut self, result: PassResult) -> Option<CartView> {
        self.settle(result, false)
    }

    /// Commits a pass, opening the drawer with attention only if the pass
    /// is accepted.
    fn settle(&mut self, result: PassResult, open_drawer: bool) -> Option<CartView> {
        for meta in result.fetched {
            self.cache.insert(meta);
        }
        if !self.guard.accept(result.ticket) {
            tracing::debug!(
                generation = result.ticket.generation,
                rendered = self.guard.last_rendered(),
                "discarding stale refresh"
            );
            return None;
        }
        self.snapshot = result.snapshot;
        self.drawer.loaded = true;
        if open_drawer {
            self.drawer.open = true;
            self.drawer.attention = true;
        }
        let view = self.render();
        tracing::debug!(
            source = ?self.snapshot.source,
            quantity = self.snapshot.total_quantity,
            total = %self.snapshot.total_price,
            "cart rendered"
        );
        Some(view)
    }

    fn render(&mut self) -> CartView {
        let view = self.projector.project(&self.snapshot, self.drawer);
        self.target.render(&view);
        self.drawer.attention = false;
        view
    }

    /// Carries out a user intent. Mutations are always followed by a
    /// refresh, whether or not they succeeded.
    pub async fn dispatch(&mut self, intent: &Intent) -> Dispatched {
        match self.projector.resolve(intent, &self.snapshot) {
            Resolved::Mutate(mutation) => {
                let outcome = self.gateway.apply(&mutation).await;
                let ticket = self.begin_pass();
                let result = self.compute(ticket).await;
                let view = self.commit(result);
                Dispatched::Mutated { outcome, view }
            }
            Resolved::SetDrawer { open } => {
                self.drawer.open = open;
                Dispatched::Drawer(self.render())
            }
            Resolved::Navigate { url } => {
                tracing::info!(url, "checkout requested");
                Dispatched::Navigate(url)
            }
            Resolved::Ignored { reason } => {
                tracing::debug!(?intent, reason, "intent ignored");
                Dispatched::Ignored(reason)
            }
        }
    }

    /// Drives the mirror from a stream of page events until the sender is
    /// dropped. Renders once at start, then after every due refresh; a
    /// refresh still pending when the stream closes runs immediately.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) -> CartSnapshot {
        self.refresh().await;
        loop {
            let sleep_for = self
                .scheduler
                .next_deadline_ms()
                .map(|deadline| Duration::from_millis(deadline.saturating_sub(self.clock.now_ms())));

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Some(trigger) = self.handle_event(&event) {
                            tracing::trace!(%trigger, "page event scheduled a refresh");
                        }
                    }
                    None => break,
                },
                () = sleep_or_pending(sleep_for) => {
                    self.tick().await;
                }
            }
        }
        if self.scheduler.is_pending() {
            self.scheduler.cancel();
            self.refresh().await;
        }
        tracing::debug!("event stream closed, mirror stopping");
        self.snapshot
    }
}

async fn sleep_or_pending(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "mirror_test.rs"]
mod tests;
