use cartmirror_core::ItemSource;
use cartmirror_extract::SUMMARY_ITEM_ID;

use super::*;

fn projector() -> Projector {
    Projector::new("ر.س")
}

fn loaded() -> DrawerState {
    DrawerState {
        loaded: true,
        ..DrawerState::default()
    }
}

fn line(id: &str, quantity: u32, price: i64) -> CartItem {
    CartItem::new(id, quantity, Decimal::from(price), ItemSource::DomForm)
}

fn cart() -> CartSnapshot {
    CartSnapshot::from_items(vec![line("A", 2, 63), line("B", 1, 63)], ItemSource::DomForm)
}

#[test]
fn regions() {
    let p = projector();
    assert_eq!(p.project(&cart(), DrawerState::default()).region, Region::Loading);
    assert_eq!(p.project(&cart(), loaded()).region, Region::Populated);
    assert_eq!(
        p.project(&CartSnapshot::confirmed_empty(ItemSource::CartSummary), loaded())
            .region,
        Region::Empty
    );
    assert_eq!(
        p.project(&CartSnapshot::unavailable(), loaded()).region,
        Region::Unavailable
    );
}

#[test]
fn populated_view_has_badge_and_labels() {
    let view = projector().project(&cart(), loaded());
    assert_eq!(view.badge_count, 3);
    assert!(view.badge_visible);
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].line_total_label, "126 ر.س");
    assert_eq!(view.total_label, "189 ر.س");
    assert_eq!(view.subtotal_label, view.total_label);
}

#[test]
fn empty_view_hides_badge() {
    let view = projector().project(&CartSnapshot::confirmed_empty(ItemSource::DomForm), loaded());
    assert_eq!(view.badge_count, 0);
    assert!(!view.badge_visible);
    assert!(view.items.is_empty());
    assert_eq!(view.total_label, "0 ر.س");
}

#[test]
fn decrement_disabled_at_quantity_one() {
    let view = projector().project(&cart(), loaded());
    assert!(view.items[0].decrement_enabled);
    assert!(!view.items[1].decrement_enabled);
    assert!(view.items[1].increment_enabled);
    assert!(view.items[1].delete_enabled);
}

#[test]
fn summary_line_controls_are_disabled() {
    let mut summary = line(SUMMARY_ITEM_ID, 3, 63);
    summary.source = ItemSource::CartSummary;
    summary.line_total = Some(Decimal::from(189));
    let snapshot = CartSnapshot::from_items(vec![summary], ItemSource::CartSummary);

    let view = projector().project(&snapshot, loaded());
    let item = &view.items[0];
    assert!(!item.decrement_enabled && !item.increment_enabled && !item.delete_enabled);
    assert_eq!(
        projector().resolve(
            &Intent::Delete {
                item_id: SUMMARY_ITEM_ID.to_string()
            },
            &snapshot
        ),
        Resolved::Ignored {
            reason: "line cannot be edited on this mutation path"
        }
    );
}

#[test]
fn form_line_with_summary_like_id_stays_editable() {
    let snapshot = CartSnapshot::from_items(vec![line(SUMMARY_ITEM_ID, 2, 63)], ItemSource::DomForm);
    let view = projector().project(&snapshot, loaded());
    let item = &view.items[0];
    assert!(item.decrement_enabled && item.increment_enabled && item.delete_enabled);
}

#[test]
fn local_path_disables_controls_on_page_lines() {
    let p = projector().with_mutation_path(MutationPath::Local);
    let view = p.project(&cart(), loaded());
    assert!(view
        .items
        .iter()
        .all(|i| !i.decrement_enabled && !i.increment_enabled && !i.delete_enabled));
    assert!(matches!(
        p.resolve(&Intent::Increment { item_id: "A".into() }, &cart()),
        Resolved::Ignored { .. }
    ));
    assert!(matches!(
        p.resolve(&Intent::Clear, &cart()),
        Resolved::Ignored { .. }
    ));
}

#[test]
fn local_path_edits_stored_lines() {
    let p = projector().with_mutation_path(MutationPath::Local);
    let stored = CartItem::new("L1", 2, Decimal::from(63), ItemSource::LocalFallback);
    let snapshot = CartSnapshot::from_items(vec![stored], ItemSource::LocalFallback);

    let view = p.project(&snapshot, loaded());
    assert!(view.items[0].decrement_enabled && view.items[0].delete_enabled);
    assert_eq!(
        p.resolve(&Intent::Decrement { item_id: "L1".into() }, &snapshot),
        Resolved::Mutate(Mutation::SetQuantity {
            item_id: "L1".into(),
            quantity: 1
        })
    );
    assert_eq!(
        p.resolve(&Intent::Clear, &snapshot),
        Resolved::Mutate(Mutation::Clear)
    );
}

#[test]
fn amounts_are_rounded_and_trimmed() {
    let p = projector();
    assert_eq!(p.format_amount(Decimal::new(6300, 2)), "63 ر.س");
    assert_eq!(p.format_amount(Decimal::new(333_333, 4)), "33.33 ر.س");
    assert_eq!(Projector::new("").format_amount(Decimal::from(5)), "5");
}

#[test]
fn decrement_never_goes_below_one() {
    let p = projector();
    let snapshot = cart();
    assert_eq!(
        p.resolve(&Intent::Decrement { item_id: "A".into() }, &snapshot),
        Resolved::Mutate(Mutation::SetQuantity {
            item_id: "A".into(),
            quantity: 1
        })
    );
    assert!(matches!(
        p.resolve(&Intent::Decrement { item_id: "B".into() }, &snapshot),
        Resolved::Ignored { .. }
    ));
}

#[test]
fn increment_delete_clear() {
    let p = projector();
    let snapshot = cart();
    assert_eq!(
        p.resolve(&Intent::Increment { item_id: "B".into() }, &snapshot),
        Resolved::Mutate(Mutation::SetQuantity {
            item_id: "B".into(),
            quantity: 2
        })
    );
    assert_eq!(
        p.resolve(&Intent::Delete { item_id: "A".into() }, &snapshot),
        Resolved::Mutate(Mutation::Delete { item_id: "A".into() })
    );
    assert_eq!(
        p.resolve(&Intent::Clear, &snapshot),
        Resolved::Mutate(Mutation::Clear)
    );
    assert!(matches!(
        p.resolve(&Intent::Clear, &CartSnapshot::unavailable()),
        Resolved::Ignored { .. }
    ));
}

#[test]
fn unknown_item_is_ignored() {
    assert_eq!(
        projector().resolve(&Intent::Increment { item_id: "Z".into() }, &cart()),
        Resolved::Ignored {
            reason: "unknown item"
        }
    );
}

#[test]
fn drawer_and_checkout_intents() {
    let p = projector().with_checkout_url("/en/cart");
    let snapshot = cart();
    assert_eq!(p.resolve(&Intent::Open, &snapshot), Resolved::SetDrawer { open: true });
    assert_eq!(p.resolve(&Intent::Close, &snapshot), Resolved::SetDrawer { open: false });
    assert_eq!(
        p.resolve(&Intent::Checkout, &snapshot),
        Resolved::Navigate {
            url: "/en/cart".to_string()
        }
    );
}

#[test]
fn projection_does_not_touch_snapshot() {
    let snapshot = cart();
    let before = snapshot.clone();
    let _ = projector().project(&snapshot, loaded());
    let _ = projector().resolve(&Intent::Clear, &snapshot);
    assert_eq!(snapshot, before);
}
