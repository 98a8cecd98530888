use super::*;
use crate::{CoverError, assets::images::ImageRef};

#[test]
fn updates_bump_revision_only_on_change() {
    let store = ConfigStore::default();
    assert_eq!(store.revision(), 0);
    assert_eq!(store.update(FieldUpdate::Title("A".into())).unwrap(), 1);
    assert_eq!(store.update(FieldUpdate::Title("A".into())).unwrap(), 1);
    assert_eq!(store.config().title, "A");
}

#[test]
fn invalid_update_is_rejected_without_side_effects() {
    let store = ConfigStore::default();
    let err = store
        .update_many([
            FieldUpdate::Title("B".into()),
            FieldUpdate::FontSizePx(-3.0),
        ])
        .unwrap_err();
    assert!(matches!(err, CoverError::Validation(_)));
    assert_eq!(store.revision(), 0);
    assert_eq!(store.config(), Configuration::default());
}

#[test]
fn subscribers_observe_new_revisions() {
    let store = ConfigStore::default();
    let mut rx = store.subscribe();
    assert!(!rx.has_changed().unwrap());
    store.update(FieldUpdate::BlurAmount(4.0)).unwrap();
    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.revision, 1);
    assert_eq!(seen.value.blur_amount, 4.0);
}

#[test]
fn restore_writes_the_whole_snapshot_back() {
    let store = ConfigStore::default();
    store
        .update_many([
            FieldUpdate::BackgroundImage(Some(ImageRef::from_u64(9))),
            FieldUpdate::BlurAmount(10.0),
            FieldUpdate::BrightnessPercent(50.0),
        ])
        .unwrap();
    let snap = store.snapshot_for_export();

    store
        .update_many([
            FieldUpdate::BackgroundImage(Some(ImageRef::from_u64(10))),
            FieldUpdate::BlurAmount(0.0),
            FieldUpdate::BrightnessPercent(100.0),
        ])
        .unwrap();
    let rev = store.restore(snap);
    assert_eq!(rev, 3);
    assert_eq!(store.snapshot_for_export(), snap);
    assert_eq!(store.restore(snap), 3);
}

#[test]
fn constructor_validates() {
    let bad = Configuration {
        font_size_px: 0.0,
        ..Configuration::default()
    };
    assert!(ConfigStore::new(bad).is_err());
    let store = ConfigStore::new(Configuration::default()).unwrap();
    assert_eq!(store.current().revision, 0);
}
