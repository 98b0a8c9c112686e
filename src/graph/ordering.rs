//! Effect Ordering
//!
//! An [`OrderingTable`] is the user-editable priority list of one injection
//! point: an effect's position in the table is its rank in the chain.
//! [`EffectOrdering`] holds the five tables and converts them to and from the
//! persisted form ([`PersistedOrdering`]), which stores plain identity
//! strings.
//!
//! # Versioning
//!
//! Every mutation recomputes [`OrderingTable::version`], an xxh3 hash of the
//! entry sequence. Schedulers cache their sorted effect order and compare
//! versions to decide whether the cache is stale, so reordering by hand and
//! restoring the original order produces the original version again.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::effect::EffectKind;
use crate::effect::registry::EffectRegistry;
use crate::errors::{PostFxError, Result};
use crate::graph::stage::InjectionPoint;

// ─── Ordering Table ───────────────────────────────────────────────────────────

/// Priority list of the effects of one injection point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingTable {
    entries: Vec<EffectKind>,
    version: u64,
}

impl Default for OrderingTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            version: hash_entries(&[]),
        }
    }
}

impl OrderingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `kinds`, keeping the first occurrence of duplicates.
    #[must_use]
    pub fn from_kinds(kinds: impl IntoIterator<Item = EffectKind>) -> Self {
        let mut entries: Vec<EffectKind> = Vec::new();
        for kind in kinds {
            if !entries.contains(&kind) {
                entries.push(kind);
            }
        }
        let version = hash_entries(&entries);
        Self { entries, version }
    }

    /// Appends `kind` unless it is already listed. Returns `true` if appended.
    pub fn add_if_missing(&mut self, kind: EffectKind) -> bool {
        if self.entries.contains(&kind) {
            return false;
        }
        self.entries.push(kind);
        self.touch();
        true
    }

    /// Rank of `kind`.
    ///
    /// Unlisted kinds rank as the last entry (`len - 1`, or `0` for an empty
    /// table) and therefore run after every listed kind except possibly the
    /// last one, with which they tie.
    #[must_use]
    pub fn position(&self, kind: EffectKind) -> usize {
        self.index_of(kind)
            .unwrap_or_else(|| self.entries.len().saturating_sub(1))
    }

    /// Rank of `kind`, appending it first if it is not listed.
    pub fn position_or_register(&mut self, kind: EffectKind) -> usize {
        self.add_if_missing(kind);
        self.position(kind)
    }

    #[must_use]
    pub fn index_of(&self, kind: EffectKind) -> Option<usize> {
        self.entries.iter().position(|entry| *entry == kind)
    }

    #[must_use]
    pub fn contains(&self, kind: EffectKind) -> bool {
        self.entries.contains(&kind)
    }

    /// Moves the entry at `from` to index `to`, shifting the entries in
    /// between. Returns `false` if either index is out of range.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        if from != to {
            let kind = self.entries.remove(from);
            self.entries.insert(to, kind);
            self.touch();
        }
        true
    }

    /// Removes `kind`. Later entries move up by one.
    pub fn remove(&mut self, kind: EffectKind) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        self.entries.remove(index);
        self.touch();
        true
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.touch();
        }
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[EffectKind] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content hash of the entry sequence.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = hash_entries(&self.entries);
    }
}

fn hash_entries(entries: &[EffectKind]) -> u64 {
    let mut hasher = Xxh3::new();
    for kind in entries {
        hasher.update(kind.as_str().as_bytes());
        hasher.update(&[0]);
    }
    hasher.digest()
}

// ─── Persisted Form ───────────────────────────────────────────────────────────

/// Serialized ordering: one identity list per injection point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedOrdering {
    pub before_skybox: Vec<String>,
    pub before_transparents: Vec<String>,
    pub before_post_processing: Vec<String>,
    pub after_post_processing: Vec<String>,
    pub after_rendering: Vec<String>,
}

impl PersistedOrdering {
    #[must_use]
    pub fn list(&self, point: InjectionPoint) -> &[String] {
        match point {
            InjectionPoint::BeforeSkybox => &self.before_skybox,
            InjectionPoint::BeforeTransparents => &self.before_transparents,
            InjectionPoint::BeforePostProcessing => &self.before_post_processing,
            InjectionPoint::AfterPostProcessing => &self.after_post_processing,
            InjectionPoint::AfterRendering => &self.after_rendering,
        }
    }

    pub fn list_mut(&mut self, point: InjectionPoint) -> &mut Vec<String> {
        match point {
            InjectionPoint::BeforeSkybox => &mut self.before_skybox,
            InjectionPoint::BeforeTransparents => &mut self.before_transparents,
            InjectionPoint::BeforePostProcessing => &mut self.before_post_processing,
            InjectionPoint::AfterPostProcessing => &mut self.after_post_processing,
            InjectionPoint::AfterRendering => &mut self.after_rendering,
        }
    }
}

// ─── Effect Ordering ──────────────────────────────────────────────────────────

/// The five ordering tables, indexed by [`InjectionPoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectOrdering {
    tables: [OrderingTable; InjectionPoint::COUNT],
}

impl EffectOrdering {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn table(&self, point: InjectionPoint) -> &OrderingTable {
        &self.tables[point.index()]
    }

    #[inline]
    pub fn table_mut(&mut self, point: InjectionPoint) -> &mut OrderingTable {
        &mut self.tables[point.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (InjectionPoint, &OrderingTable)> {
        InjectionPoint::ALL.into_iter().zip(self.tables.iter())
    }

    /// Resolves a persisted ordering against `registry`.
    ///
    /// Malformed, unknown and duplicate identities are dropped with a
    /// warning; the remaining entries keep their relative order.
    #[must_use]
    pub fn from_persisted(persisted: &PersistedOrdering, registry: &EffectRegistry) -> Self {
        let mut ordering = Self::default();
        for point in InjectionPoint::ALL {
            let mut kinds = Vec::new();
            for tag in persisted.list(point) {
                if !EffectKind::is_valid_tag(tag) {
                    log::warn!("Dropping malformed effect identity '{tag}' from {} ordering", point.name());
                    continue;
                }
                let Some(kind) = registry.resolve(tag) else {
                    log::warn!("Dropping unknown effect '{tag}' from {} ordering", point.name());
                    continue;
                };
                if kinds.contains(&kind) {
                    log::warn!("Dropping duplicate effect '{tag}' from {} ordering", point.name());
                    continue;
                }
                kinds.push(kind);
            }
            ordering.tables[point.index()] = OrderingTable::from_kinds(kinds);
        }
        ordering
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedOrdering {
        let mut persisted = PersistedOrdering::default();
        for (point, table) in self.iter() {
            *persisted.list_mut(point) = table
                .entries()
                .iter()
                .map(|kind| kind.as_str().to_owned())
                .collect();
        }
        persisted
    }

    /// Parses a JSON document produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str, registry: &EffectRegistry) -> Result<Self> {
        let persisted: PersistedOrdering =
            serde_json::from_str(json).map_err(PostFxError::Ordering)?;
        Ok(Self::from_persisted(&persisted, registry))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_persisted()).map_err(PostFxError::Ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EffectKind = EffectKind::new("a");
    const B: EffectKind = EffectKind::new("b");
    const C: EffectKind = EffectKind::new("c");
    const D: EffectKind = EffectKind::new("d");

    #[test]
    fn add_if_missing_is_idempotent() {
        let mut table = OrderingTable::new();
        assert!(table.add_if_missing(A));
        let version = table.version();
        assert!(!table.add_if_missing(A));
        assert_eq!(table.version(), version);
        assert_eq!(table.entries(), &[A]);
    }

    #[test]
    fn unknown_kind_ranks_last() {
        let table = OrderingTable::from_kinds([A, B, C]);
        assert_eq!(table.position(D), 2);
        assert_eq!(OrderingTable::new().position(D), 0);
    }

    #[test]
    fn position_or_register_appends() {
        let mut table = OrderingTable::from_kinds([A, B, C]);
        assert_eq!(table.position_or_register(D), 3);
        assert_eq!(table.position(D), 3);
        assert_eq!(table.position_or_register(A), 0);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn move_entry_shifts_neighbours() {
        let mut table = OrderingTable::from_kinds([A, B, C, D]);
        let before = table.version();
        assert!(table.move_entry(3, 1));
        assert_eq!(table.entries(), &[A, D, B, C]);
        assert_ne!(table.version(), before);
        assert!(!table.move_entry(0, 4));

        assert!(table.move_entry(1, 3));
        assert_eq!(table.version(), before);
    }

    #[test]
    fn remove_closes_gap() {
        let mut table = OrderingTable::from_kinds([A, B, C]);
        assert!(table.remove(B));
        assert!(!table.remove(B));
        assert_eq!(table.position(C), 1);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.version(), OrderingTable::new().version());
    }

    #[test]
    fn persisted_lists_default_to_empty() {
        let persisted: PersistedOrdering =
            serde_json::from_str(r#"{ "after_rendering": ["x"] }"#).unwrap();
        assert!(persisted.before_skybox.is_empty());
        assert_eq!(persisted.list(InjectionPoint::AfterRendering), &["x".to_owned()]);
    }
}
