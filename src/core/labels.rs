//! Label store: the human judgments the robot classifies with.
//!
//! Each item kind keeps the ordered list of categories a human pressed for
//! it. Drawing from a kind picks uniformly over that multiset, so a category
//! submitted twice as often comes up twice as often.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::catalog::{Category, ItemKind};
use crate::error::{Result, SortError};

/// Per-kind multiset of submitted category labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStore {
    labels: BTreeMap<ItemKind, Vec<Category>>,
}

impl LabelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation.
    pub fn append(&mut self, kind: ItemKind, category: Category) {
        self.labels.entry(kind).or_default().push(category);
    }

    /// Labels submitted for a kind, in submission order.
    pub fn labels(&self, kind: ItemKind) -> &[Category] {
        self.labels.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of observations for a kind.
    pub fn count(&self, kind: ItemKind) -> usize {
        self.labels(kind).len()
    }

    /// Number of observations across all kinds.
    pub fn total(&self) -> usize {
        self.labels.values().map(Vec::len).sum()
    }

    /// Frequency counts for a kind.
    pub fn distribution(&self, kind: ItemKind) -> CategoryDistribution {
        CategoryDistribution::from_labels(self.labels(kind))
    }

    /// Draw a category for a kind.
    ///
    /// Fails with `EmptyDistribution` when nothing was ever submitted for the
    /// kind, which means training did not cover the catalog.
    pub fn draw(&self, kind: ItemKind, rng: &mut impl Rng) -> Result<Category> {
        self.distribution(kind)
            .sample(rng)
            .ok_or_else(|| SortError::empty_distribution(kind))
    }

    /// True iff every catalog kind has at least `required_per_kind` observations.
    pub fn is_complete(&self, required_per_kind: usize) -> bool {
        ItemKind::ALL
            .iter()
            .all(|kind| self.count(*kind) >= required_per_kind)
    }

    /// Kinds that have no observations at all.
    pub fn missing_kinds(&self) -> Vec<ItemKind> {
        ItemKind::ALL
            .into_iter()
            .filter(|kind| self.count(*kind) == 0)
            .collect()
    }

    /// Drop every observation.
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Export the store in its persisted form.
    pub fn to_snapshot(&self) -> LabelSnapshot {
        let entries = self
            .labels
            .iter()
            .map(|(kind, categories)| {
                (
                    kind.as_str().to_string(),
                    categories.iter().map(|c| c.as_str().to_string()).collect(),
                )
            })
            .collect();
        LabelSnapshot(entries)
    }

    /// Rebuild a store from a snapshot.
    ///
    /// The snapshot must name only known kinds and categories and must cover
    /// every catalog kind with at least one observation; anything else is a
    /// `CorruptSnapshot`.
    pub fn from_snapshot(snapshot: &LabelSnapshot) -> Result<Self> {
        let mut store = LabelStore::new();

        for (kind_name, category_names) in &snapshot.0 {
            let kind: ItemKind = kind_name.parse().map_err(SortError::corrupt_snapshot)?;
            for name in category_names {
                let category: Category = name.parse().map_err(SortError::corrupt_snapshot)?;
                store.append(kind, category);
            }
        }

        let missing = store.missing_kinds();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
            return Err(SortError::corrupt_snapshot(format!(
                "no labels for {}",
                names.join(", ")
            )));
        }

        Ok(store)
    }
}

/// Persisted form of a [`LabelStore`].
///
/// A JSON object from kind name to the ordered list of category names. Kept
/// stringly typed so that unknown names reach [`LabelStore::from_snapshot`]
/// and are rejected there rather than failing inside the storage layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSnapshot(pub BTreeMap<String, Vec<String>>);

impl LabelSnapshot {
    /// Number of kinds present in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Categorical distribution built from label frequency counts.
///
/// Sampling picks an index uniformly in `[0, total)` and walks the counts in
/// category order, which is the same distribution as a uniform pick over the
/// raw label list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDistribution {
    counts: [u32; 3],
}

impl CategoryDistribution {
    /// Count the labels.
    pub fn from_labels(labels: &[Category]) -> Self {
        let mut counts = [0u32; 3];
        for category in labels {
            counts[category.index()] += 1;
        }
        Self { counts }
    }

    /// Observations for one category.
    pub fn count(&self, category: Category) -> u32 {
        self.counts[category.index()]
    }

    /// Total observations.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Probability of drawing `category`, or 0.0 when empty.
    pub fn probability(&self, category: Category) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(category) as f64 / total as f64
    }

    /// The category drawn most often, ties resolved in category order.
    pub fn mode(&self) -> Option<Category> {
        if self.total() == 0 {
            return None;
        }
        let mut best = Category::ALL[0];
        for category in Category::ALL {
            if self.count(category) > self.count(best) {
                best = category;
            }
        }
        Some(best)
    }

    /// Sample a category, or `None` when there are no observations.
    pub fn sample(&self, rng: &mut impl Rng) -> Option<Category> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut threshold = rng.random_range(0..total);
        for category in Category::ALL {
            let weight = self.count(category);
            if threshold < weight {
                return Some(category);
            }
            threshold -= weight;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trained_store() -> LabelStore {
        let mut store = LabelStore::new();
        for kind in ItemKind::ALL {
            store.append(kind, kind.ground_truth());
        }
        store
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = LabelStore::new();
        assert_eq!(store.total(), 0);
        assert_eq!(store.missing_kinds(), ItemKind::ALL.to_vec());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut store = LabelStore::new();
        store.append(ItemKind::Note, Category::Paper);
        store.append(ItemKind::Note, Category::Metal);
        store.append(ItemKind::Note, Category::Paper);

        assert_eq!(
            store.labels(ItemKind::Note),
            &[Category::Paper, Category::Metal, Category::Paper]
        );
        assert_eq!(store.count(ItemKind::Note), 3);
        assert_eq!(store.count(ItemKind::SodaCan), 0);
    }

    #[test]
    fn test_draw_empty_fails() {
        let store = LabelStore::new();
        let mut rng = StdRng::seed_from_u64(1);

        let err = store.draw(ItemKind::SodaCan, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SortError::EmptyDistribution {
                kind: ItemKind::SodaCan
            }
        ));
    }

    #[test]
    fn test_draw_single_label_is_deterministic() {
        let store = trained_store();
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..20 {
            assert_eq!(
                store.draw(ItemKind::WaterBottle, &mut rng).unwrap(),
                Category::Plastic
            );
        }
    }

    #[test]
    fn test_is_complete() {
        let mut store = LabelStore::new();
        assert!(!store.is_complete(1));
        assert!(store.is_complete(0));

        store.append(ItemKind::SodaCan, Category::Metal);
        store.append(ItemKind::Note, Category::Paper);
        assert!(!store.is_complete(1));

        store.append(ItemKind::WaterBottle, Category::Plastic);
        assert!(store.is_complete(1));
        assert!(!store.is_complete(2));
    }

    #[test]
    fn test_clear() {
        let mut store = trained_store();
        store.clear();
        assert_eq!(store.total(), 0);
    }

    #[test]
    fn test_draw_converges_to_label_frequencies() {
        // 6 metal, 3 paper, 1 plastic
        let mut store = LabelStore::new();
        for _ in 0..6 {
            store.append(ItemKind::SodaCan, Category::Metal);
        }
        for _ in 0..3 {
            store.append(ItemKind::SodaCan, Category::Paper);
        }
        store.append(ItemKind::SodaCan, Category::Plastic);

        let draws = 3000u32;
        let mut rng = StdRng::seed_from_u64(2024);
        let mut observed = [0u32; 3];
        for _ in 0..draws {
            let category = store.draw(ItemKind::SodaCan, &mut rng).unwrap();
            observed[category.index()] += 1;
        }

        let expected = [0.6, 0.3, 0.1].map(|p| p * draws as f64);
        let chi_square: f64 = observed
            .iter()
            .zip(expected.iter())
            .map(|(o, e)| (*o as f64 - e).powi(2) / e)
            .sum();

        // Two degrees of freedom; 20.0 is far past the 0.1% critical value.
        assert!(chi_square < 20.0, "chi-square {} too large", chi_square);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut store = trained_store();
        store.append(ItemKind::Note, Category::Plastic);

        let snapshot = store.to_snapshot();
        let restored = LabelStore::from_snapshot(&snapshot).unwrap();

        assert_eq!(restored, store);
        assert_eq!(
            restored.labels(ItemKind::Note),
            &[Category::Paper, Category::Plastic]
        );
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = trained_store().to_snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["sodaCan"], serde_json::json!(["metal"]));
        assert_eq!(json["note"], serde_json::json!(["paper"]));
        assert_eq!(json["waterBottle"], serde_json::json!(["plastic"]));
    }

    #[test]
    fn test_snapshot_missing_kind_is_corrupt() {
        let json = r#"{"sodaCan": ["metal"], "note": ["paper"]}"#;
        let snapshot: LabelSnapshot = serde_json::from_str(json).unwrap();

        let err = LabelStore::from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, SortError::CorruptSnapshot { .. }));
        assert!(err.to_string().contains("waterBottle"));
    }

    #[test]
    fn test_snapshot_empty_kind_is_corrupt() {
        let json = r#"{"sodaCan": ["metal"], "note": ["paper"], "waterBottle": []}"#;
        let snapshot: LabelSnapshot = serde_json::from_str(json).unwrap();

        assert!(matches!(
            LabelStore::from_snapshot(&snapshot),
            Err(SortError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_snapshot_unknown_names_are_corrupt() {
        let json = r#"{"sodaCan": ["glass"], "note": ["paper"], "waterBottle": ["plastic"]}"#;
        let snapshot: LabelSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            LabelStore::from_snapshot(&snapshot),
            Err(SortError::CorruptSnapshot { .. })
        ));

        let json = r#"{"jar": ["metal"], "sodaCan": ["metal"], "note": ["paper"], "waterBottle": ["plastic"]}"#;
        let snapshot: LabelSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            LabelStore::from_snapshot(&snapshot),
            Err(SortError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_distribution_probability_and_mode() {
        let dist = CategoryDistribution::from_labels(&[
            Category::Paper,
            Category::Paper,
            Category::Metal,
            Category::Paper,
        ]);

        assert_eq!(dist.total(), 4);
        assert!((dist.probability(Category::Paper) - 0.75).abs() < f64::EPSILON);
        assert!((dist.probability(Category::Plastic)).abs() < f64::EPSILON);
        assert_eq!(dist.mode(), Some(Category::Paper));
        assert_eq!(CategoryDistribution::default().mode(), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_category() -> impl Strategy<Value = Category> {
            prop_oneof![
                Just(Category::Metal),
                Just(Category::Paper),
                Just(Category::Plastic),
            ]
        }

        proptest! {
            // Property: a draw is always one of the submitted labels
            #[test]
            fn prop_draw_stays_within_submitted_labels(
                labels in proptest::collection::vec(arb_category(), 1..30),
                seed in any::<u64>(),
            ) {
                let mut store = LabelStore::new();
                for category in &labels {
                    store.append(ItemKind::Note, *category);
                }

                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..10 {
                    let drawn = store.draw(ItemKind::Note, &mut rng).unwrap();
                    prop_assert!(labels.contains(&drawn));
                }
            }

            // Property: distribution counts add up to the number of labels
            #[test]
            fn prop_distribution_total_matches_labels(
                labels in proptest::collection::vec(arb_category(), 0..50),
            ) {
                let dist = CategoryDistribution::from_labels(&labels);
                prop_assert_eq!(dist.total() as usize, labels.len());
            }
        }
    }
}
