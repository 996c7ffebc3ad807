use std::sync::Mutex;

use cartmirror_core::{CatalogEntry, ItemSource};
use rust_decimal::Decimal;

use super::*;
use crate::clock::ManualClock;
use crate::gateway::{Mutation, MutationPath};
use crate::projector::Region;
use crate::test_support::FakeCommerce;

#[derive(Clone, Default)]
struct Recorder {
    views: Arc<Mutex<Vec<CartView>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    fn last(&self) -> CartView {
        self.views.lock().unwrap().last().cloned().expect("a render")
    }
}

impl RenderTarget for Recorder {
    fn render(&mut self, view: &CartView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

const TWO_LINES: &str = r#"
    <form id="item-A">
      <input type="hidden" name="id" value="A">
      <h1><a href="/ar/dehn-oud-royal">دهن عود ملكي</a></h1>
      <input name="quantity" value="٢">
      <span class="item-price">٦٣ ر.س</span>
    </form>
    <form id="item-B">
      <input type="hidden" name="id" value="B">
      <h1><a href="/ar/dehn-oud-cambodi">دهن عود كمبودي</a></h1>
      <input name="quantity" value="1">
      <span class="item-price">63</span>
    </form>"#;

const ONE_LINE: &str = r#"
    <form id="item-A">
      <input type="hidden" name="id" value="A">
      <input name="quantity" value="1">
      <span class="item-price">63</span>
    </form>"#;

fn settings() -> MirrorSettings {
    MirrorSettings {
        currency: "SAR".to_string(),
        currency_label: "ر.س".to_string(),
        delays: RefreshDelays::default(),
    }
}

fn extract_settings() -> ExtractSettings {
    ExtractSettings {
        currency: "SAR".to_string(),
        summary_placeholder_title: "عناصر السلة".to_string(),
    }
}

fn catalog() -> Arc<ProductCatalog> {
    Arc::new(ProductCatalog::from_entries(&[CatalogEntry {
        slug: "dehn-oud-royal".to_string(),
        product_id: "1627885403".to_string(),
        name: None,
    }]))
}

struct Harness {
    mirror: CartMirror,
    page: SharedPage,
    clock: ManualClock,
    recorder: Recorder,
    store: LocalStore,
}

fn harness(html: &str) -> Harness {
    let page = SharedPage::new(PageState::from_html(html));
    let clock = ManualClock::new(0);
    let recorder = Recorder::default();
    let store = LocalStore::in_memory();
    let extractor = build_extractor(catalog(), &extract_settings(), None, &store);
    let gateway = MutationGateway::new(None, store.clone(), "SAR");
    let mirror = CartMirror::new(
        extractor,
        Arc::new(page.clone()),
        Box::new(recorder.clone()),
        gateway,
        &settings(),
    )
    .with_clock(Arc::new(clock.clone()));
    Harness {
        mirror,
        page,
        clock,
        recorder,
        store,
    }
}

#[tokio::test]
async fn view_is_loading_before_first_pass() {
    let h = harness(TWO_LINES);
    assert_eq!(h.mirror.view().region, Region::Loading);
    assert_eq!(h.recorder.count(), 0);
}

#[tokio::test]
async fn refresh_renders_mixed_script_cart() {
    let mut h = harness(TWO_LINES);
    let view = h.mirror.refresh().await;

    assert_eq!(view.region, Region::Populated);
    assert_eq!(view.badge_count, 3);
    assert_eq!(view.total_label, "189 ر.س");
    assert_eq!(h.mirror.snapshot().total_price, Decimal::from(189));
    assert_eq!(h.recorder.count(), 1);
}

#[tokio::test]
async fn refresh_is_idempotent_for_unchanged_page() {
    let mut h = harness(TWO_LINES);
    let first = h.mirror.refresh().await;
    let snapshot = h.mirror.snapshot().clone();
    let second = h.mirror.refresh().await;
    assert_eq!(first, second);
    assert_eq!(&snapshot, h.mirror.snapshot());
}

#[tokio::test]
async fn burst_of_events_converges_to_one_render_of_final_page() {
    let mut h = harness(ONE_LINE);
    let event = PageEvent::ChildList {
        added: vec![r#"<form id="item-B"></form>"#.to_string()],
        removed: vec![],
    };

    for step in 0..5 {
        assert_eq!(h.mirror.handle_event(&event), Some(Trigger::StructuralMutation));
        h.clock.advance_ms(100);
        assert!(h.mirror.tick().await.is_none(), "step {step} rendered early");
    }
    h.page.set(PageState::from_html(TWO_LINES));

    // Last event at 400ms, 300ms debounce.
    h.clock.set_ms(699);
    assert!(h.mirror.tick().await.is_none());
    h.clock.set_ms(700);
    let view = h.mirror.tick().await.expect("one refresh after quiet period");

    assert_eq!(view.badge_count, 3);
    assert_eq!(h.recorder.count(), 1);
    assert!(h.mirror.tick().await.is_none());
}

#[tokio::test]
async fn irrelevant_events_schedule_nothing() {
    let mut h = harness(ONE_LINE);
    let event = PageEvent::Platform {
        name: "wishlist::added".to_string(),
    };
    assert_eq!(h.mirror.handle_event(&event), None);
    assert_eq!(h.mirror.next_deadline_ms(), None);
}

#[tokio::test]
async fn stale_pass_is_discarded() {
    let mut h = harness(ONE_LINE);
    let older = h.mirror.begin_pass();
    let older_result = h.mirror.compute(older).await;

    h.page.set(PageState::from_html(TWO_LINES));
    let newer = h.mirror.begin_pass();
    let newer_result = h.mirror.compute(newer).await;

    assert!(h.mirror.commit(newer_result).is_some());
    assert!(h.mirror.commit(older_result).is_none());
    assert_eq!(h.mirror.snapshot().total_quantity, 3);
    assert_eq!(h.recorder.count(), 1);
}

#[tokio::test]
async fn add_trigger_opens_drawer_with_attention_once() {
    let mut h = harness(TWO_LINES);
    h.mirror.trigger(Trigger::ProductAdded);
    h.clock.advance_ms(500);
    let view = h.mirror.tick().await.expect("due");
    assert!(view.drawer_open);
    assert!(view.attention);

    let next = h.mirror.refresh().await;
    assert!(next.drawer_open);
    assert!(!next.attention);
}

#[tokio::test]
async fn rejected_pass_does_not_open_drawer() {
    let mut h = harness(ONE_LINE);
    let older = h.mirror.begin_pass();
    let older_result = h.mirror.compute(older).await;
    let newer = h.mirror.begin_pass();
    let newer_result = h.mirror.compute(newer).await;
    assert!(h.mirror.commit(newer_result).is_some());

    assert!(h.mirror.settle(older_result, true).is_none());
    let view = h.mirror.view();
    assert!(!view.drawer_open);
    assert!(!view.attention);

    let next = h.mirror.refresh().await;
    assert!(!next.attention);
}

#[tokio::test]
async fn page_lines_are_read_only_without_api() {
    let mut h = harness(ONE_LINE);
    let view = h.mirror.refresh().await;
    let item = &view.items[0];
    assert!(!item.increment_enabled && !item.decrement_enabled && !item.delete_enabled);

    let result = h
        .mirror
        .dispatch(&Intent::Increment {
            item_id: "A".to_string(),
        })
        .await;
    assert!(matches!(result, Dispatched::Ignored(_)));
    assert!(matches!(
        h.mirror.dispatch(&Intent::Clear).await,
        Dispatched::Ignored(_)
    ));
    assert_eq!(h.store.cart().unwrap(), None);
}

#[tokio::test]
async fn page_lines_are_editable_with_api() {
    let page = SharedPage::new(PageState::from_html(ONE_LINE));
    let store = LocalStore::in_memory();
    let api: Arc<dyn CommerceApi> = Arc::new(FakeCommerce::default());
    let mut mirror = CartMirror::new(
        build_extractor(catalog(), &extract_settings(), None, &store),
        Arc::new(page),
        Box::new(Recorder::default()),
        MutationGateway::new(Some(api), store, "SAR"),
        &settings(),
    )
    .with_projector(Projector::new("ر.س"));

    let view = mirror.refresh().await;
    assert!(view.items[0].increment_enabled);
}

#[tokio::test]
async fn local_fallback_mutation_refreshes_view() {
    let mut h = harness("<main></main>");
    h.mirror.refresh().await;
    assert_eq!(h.mirror.view().region, Region::Unavailable);

    let outcome = h
        .mirror
        .gateway
        .apply(&Mutation::Add {
            product_id: "1627885403".to_string(),
            quantity: 1,
            unit_price: Some(Decimal::from(63)),
        })
        .await;
    assert_eq!(outcome, MutationOutcome::Applied(MutationPath::Local));
    h.mirror.refresh().await;
    let item_id = h.mirror.snapshot().items[0].item_id.clone();

    let result = h
        .mirror
        .dispatch(&Intent::Increment { item_id })
        .await;
    let Dispatched::Mutated { outcome, view } = result else {
        panic!("expected a mutation, got {result:?}");
    };
    assert!(outcome.is_applied());
    let view = view.expect("refresh after mutation");
    assert_eq!(view.badge_count, 2);
    assert_eq!(view.total_label, "126 ر.س");
    assert_eq!(h.mirror.snapshot().source, Some(ItemSource::LocalFallback));
    assert_eq!(h.store.cart().unwrap().unwrap()[0].quantity, 2);

    let cleared = h.mirror.dispatch(&Intent::Clear).await;
    assert!(matches!(cleared, Dispatched::Mutated { .. }));
    assert_eq!(h.mirror.view().region, Region::Empty);
}

#[tokio::test]
async fn drawer_and_checkout_intents() {
    let mut h = harness(ONE_LINE);
    h.mirror.refresh().await;
    let Dispatched::Drawer(view) = h.mirror.dispatch(&Intent::Open).await else {
        panic!("expected drawer change");
    };
    assert!(view.drawer_open);
    assert!(matches!(
        h.mirror.dispatch(&Intent::Checkout).await,
        Dispatched::Navigate(url) if url == "/ar/cart"
    ));
}

#[tokio::test]
async fn metadata_is_fetched_once_and_cached() {
    let api = Arc::new(FakeCommerce::default().with_product(ProductMetadata {
        product_id: "1627885403".to_string(),
        name: "دهن عود ملكي".to_string(),
        image_url: "https://cdn.example.test/oud.jpg".to_string(),
        ..ProductMetadata::default()
    }));
    let api_dyn: Arc<dyn CommerceApi> = api.clone();
    let mut h = harness(
        r#"<form id="item-A"><a href="/ar/dehn-oud-royal">x</a>
           <input name="quantity" value="1"><b class="item-price">63</b></form>"#,
    );
    h.mirror = h.mirror.with_api(api_dyn);

    h.mirror.refresh().await;
    h.mirror.refresh().await;

    assert_eq!(
        h.mirror.snapshot().items[0].image_url,
        "https://cdn.example.test/oud.jpg"
    );
    assert!(h.mirror.metadata().contains("1627885403"));
    assert_eq!(api.calls(), vec!["product 1627885403"]);
}

#[tokio::test(start_paused = true)]
async fn run_loop_refreshes_after_events_and_drains_on_close() {
    let page = SharedPage::new(PageState::from_html(ONE_LINE));
    let store = LocalStore::in_memory();
    let recorder = Recorder::default();
    let mirror = CartMirror::new(
        build_extractor(catalog(), &extract_settings(), None, &store),
        Arc::new(page.clone()),
        Box::new(recorder.clone()),
        MutationGateway::new(None, store, "SAR"),
        &settings(),
    );

    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(mirror.run(rx));

    page.set(PageState::from_html(TWO_LINES));
    tx.send(PageEvent::FieldChanged {
        name: "quantity".to_string(),
        in_cart_line: true,
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(recorder.last().badge_count, 3);

    page.set(PageState::from_html(ONE_LINE));
    tx.send(PageEvent::AnalyticsPush).await.unwrap();
    drop(tx);

    let snapshot = handle.await.unwrap();
    assert_eq!(snapshot.total_quantity, 1);
}
