//! Ordering Persistence Tests
//!
//! Tests for:
//! - JSON round trip of the five ordering tables
//! - Pruning of unregistered, malformed and duplicate identities
//! - Parse errors
//! - Rank of unlisted kinds and registration on lookup
//! - Version changes on mutation

mod common;

use myth_postfx::effects::{BoxBlur, Compression, Dither, GaussianBlur, InvertColors, Outline};
use myth_postfx::{
    EffectInfo, EffectKind, EffectOrdering, EffectRegistry, InjectionPoint, OrderingTable,
    PersistedOrdering, PostFxError,
};

fn builtin_ordering() -> EffectOrdering {
    let mut ordering = EffectOrdering::new();
    *ordering.table_mut(InjectionPoint::AfterPostProcessing) =
        OrderingTable::from_kinds([Dither::KIND, BoxBlur::KIND, Outline::KIND]);
    *ordering.table_mut(InjectionPoint::AfterRendering) =
        OrderingTable::from_kinds([Compression::KIND]);
    ordering
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn json_round_trip_preserves_every_table() -> anyhow::Result<()> {
    common::init_logging();
    let registry = EffectRegistry::with_builtin_effects();
    let ordering = builtin_ordering();

    let json = ordering.to_json()?;
    let restored = EffectOrdering::from_json(&json, &registry)?;

    assert_eq!(restored, ordering);
    assert_eq!(
        restored.table(InjectionPoint::AfterPostProcessing).position(Outline::KIND),
        2
    );
    Ok(())
}

#[test]
fn persisted_lists_use_identity_strings() {
    let persisted = builtin_ordering().to_persisted();
    assert_eq!(persisted.after_post_processing, vec!["dither", "box_blur", "outline"]);
    assert_eq!(persisted.after_rendering, vec!["compression"]);
    assert!(persisted.before_skybox.is_empty());
}

#[test]
fn missing_lists_default_to_empty() {
    let registry = EffectRegistry::with_builtin_effects();
    let ordering =
        EffectOrdering::from_json(r#"{ "after_rendering": ["compression"] }"#, &registry).unwrap();

    assert_eq!(ordering.table(InjectionPoint::AfterRendering).entries(), &[Compression::KIND]);
    for point in [
        InjectionPoint::BeforeSkybox,
        InjectionPoint::BeforeTransparents,
        InjectionPoint::BeforePostProcessing,
        InjectionPoint::AfterPostProcessing,
    ] {
        assert!(ordering.table(point).is_empty());
    }
}

#[test]
fn invalid_json_is_an_ordering_error() {
    let registry = EffectRegistry::with_builtin_effects();
    let result = EffectOrdering::from_json("{ after_rendering: [", &registry);
    assert!(matches!(result, Err(PostFxError::Ordering(_))));
}

// ============================================================================
// Pruning
// ============================================================================

#[test]
fn unregistered_kinds_are_pruned_and_gaps_close() -> anyhow::Result<()> {
    common::init_logging();
    let mut registry = EffectRegistry::with_builtin_effects();
    let json = builtin_ordering().to_json()?;

    assert!(registry.unregister(BoxBlur::KIND));
    let ordering = EffectOrdering::from_json(&json, &registry)?;
    let table = ordering.table(InjectionPoint::AfterPostProcessing);

    assert_eq!(table.entries(), &[Dither::KIND, Outline::KIND]);
    assert_eq!(table.position(Outline::KIND), 1);
    Ok(())
}

#[test]
fn malformed_and_duplicate_entries_are_dropped() {
    common::init_logging();
    let registry = EffectRegistry::with_builtin_effects();
    let mut persisted = PersistedOrdering::default();
    persisted.after_post_processing = vec![
        "invert_colors".to_owned(),
        "Not An Identity".to_owned(),
        String::new(),
        "gaussian_blur".to_owned(),
        "invert_colors".to_owned(),
        "no_such_effect".to_owned(),
    ];

    let ordering = EffectOrdering::from_persisted(&persisted, &registry);
    assert_eq!(
        ordering.table(InjectionPoint::AfterPostProcessing).entries(),
        &[InvertColors::KIND, GaussianBlur::KIND]
    );
}

#[test]
fn custom_registered_effects_survive_reload() {
    let custom = EffectKind::new("studio.vignette");
    let mut registry = EffectRegistry::with_builtin_effects();
    assert!(registry.register(EffectInfo::new(
        custom,
        "Vignette",
        InjectionPoint::AfterPostProcessing
    )));

    let mut ordering = EffectOrdering::new();
    ordering
        .table_mut(InjectionPoint::AfterPostProcessing)
        .add_if_missing(custom);
    let json = ordering.to_json().unwrap();

    let restored = EffectOrdering::from_json(&json, &registry).unwrap();
    assert!(restored.table(InjectionPoint::AfterPostProcessing).contains(custom));
}

// ============================================================================
// Ranks
// ============================================================================

#[test]
fn unlisted_kinds_rank_as_the_last_entry() {
    let table = OrderingTable::from_kinds([Dither::KIND, BoxBlur::KIND, Outline::KIND]);
    assert_eq!(table.position(Compression::KIND), 2);
    assert_eq!(OrderingTable::new().position(Compression::KIND), 0);
}

#[test]
fn position_or_register_appends() {
    let mut table = OrderingTable::from_kinds([Dither::KIND]);
    assert_eq!(table.position_or_register(Outline::KIND), 1);
    assert_eq!(table.position_or_register(Dither::KIND), 0);
    assert_eq!(table.len(), 2);
}

#[test]
fn version_tracks_content() {
    let mut table = OrderingTable::from_kinds([Dither::KIND, BoxBlur::KIND]);
    let original = table.version();

    assert!(table.move_entry(1, 0));
    assert_ne!(table.version(), original);

    assert!(table.move_entry(1, 0));
    assert_eq!(table.version(), original);

    assert!(!table.move_entry(0, 5));
    assert_eq!(table.version(), original);

    assert!(table.remove(BoxBlur::KIND));
    assert_ne!(table.version(), original);
}
