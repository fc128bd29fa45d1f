//! Strength thresholds and formulas for typed relationships.
//!
//! Every relationship kind carries a band of three thresholds (minimum,
//! strong, very strong). Strength formulas map raw signals (sequence
//! distance, cosine similarity, keyword overlap) into `[0, 1]`, and an
//! edge is only created when the strength clears the kind's minimum.

use std::collections::HashMap;

use outline_store::RelationKind;
use serde::{Deserialize, Serialize};

/// Threshold band for one relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub min_strength: f32,
    pub strong: f32,
    pub very_strong: f32,
    /// Per-step strength loss for distance-decayed kinds (sibling).
    pub decay_factor: Option<f32>,
}

impl ThresholdProfile {
    const fn new(min_strength: f32, strong: f32, very_strong: f32) -> Self {
        Self { min_strength, strong, very_strong, decay_factor: None }
    }

    const fn with_decay(min_strength: f32, strong: f32, very_strong: f32, decay: f32) -> Self {
        Self { min_strength, strong, very_strong, decay_factor: Some(decay) }
    }
}

/// Corpus-level similarity statistics used for threshold recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    pub avg_similarity: f32,
    pub similarity_std: f32,
}

/// Per-kind threshold bands, with the tuned defaults for markdown
/// section corpora.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    profiles: [ThresholdProfile; 6],
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            // Indexed by RelationKind::ALL order.
            profiles: [
                ThresholdProfile::new(1.0, 1.0, 1.0),
                ThresholdProfile::with_decay(0.3, 0.6, 0.8, 0.1),
                ThresholdProfile::new(0.7, 0.8, 0.9),
                ThresholdProfile::new(0.3, 0.5, 0.7),
                ThresholdProfile::new(0.5, 0.7, 0.9),
                ThresholdProfile::new(0.4, 0.6, 0.8),
            ],
        }
    }
}

impl ThresholdTable {
    #[must_use]
    pub fn get(&self, kind: RelationKind) -> ThresholdProfile {
        self.profiles[kind as usize]
    }

    /// An edge is worth storing when its strength clears the kind's
    /// minimum.
    #[must_use]
    pub fn should_create(&self, kind: RelationKind, strength: f32) -> bool {
        strength >= self.get(kind).min_strength
    }

    /// Qualitative label for a strength under this table's bands.
    #[must_use]
    pub fn quality_label(&self, kind: RelationKind, strength: f32) -> &'static str {
        let profile = self.get(kind);
        if strength < profile.min_strength {
            "none"
        } else if strength < profile.strong {
            "weak"
        } else if strength < profile.very_strong {
            "strong"
        } else {
            "very_strong"
        }
    }

    /// Scale a kind's band for corpus shape: dense collections raise
    /// thresholds to cut noise, domain-specific content lowers them.
    /// Both signals are expected in `[0, 1]`.
    #[must_use]
    pub fn adaptive(
        &self,
        kind: RelationKind,
        document_density: f32,
        domain_specificity: f32,
    ) -> ThresholdProfile {
        let base = self.get(kind);
        let factor = (1.0 + document_density * 0.2) * (1.0 - domain_specificity * 0.1);
        ThresholdProfile {
            min_strength: (base.min_strength * factor).min(0.95),
            strong: (base.strong * factor).min(0.95),
            very_strong: (base.very_strong * factor).min(0.98),
            decay_factor: base.decay_factor,
        }
    }

    /// Recalibrate the whole table from observed corpus similarity.
    ///
    /// The semantic band is re-anchored at one standard deviation above
    /// the mean; every other kind is scaled up when the corpus mean
    /// exceeds 0.6 (a corpus where everything looks alike needs higher
    /// bars).
    #[must_use]
    pub fn optimized_for_corpus(&self, stats: &CorpusStats) -> Self {
        let adjustment = if stats.avg_similarity > 0.6 {
            1.0 + (stats.avg_similarity - 0.6) * 0.5
        } else {
            1.0
        };

        let mut profiles = self.profiles;
        for (kind, profile) in RelationKind::ALL.iter().zip(profiles.iter_mut()) {
            if *kind == RelationKind::Semantic {
                let min_strength = (stats.avg_similarity + stats.similarity_std).min(0.9);
                *profile = ThresholdProfile {
                    min_strength,
                    strong: (min_strength + 0.1).min(0.95),
                    very_strong: (min_strength + 0.2).min(0.98),
                    decay_factor: profile.decay_factor,
                };
            } else {
                *profile = ThresholdProfile {
                    min_strength: (profile.min_strength * adjustment).min(0.95),
                    strong: (profile.strong * adjustment).min(0.95),
                    very_strong: (profile.very_strong * adjustment).min(0.98),
                    decay_factor: profile.decay_factor,
                };
            }
        }
        Self { profiles }
    }

    /// Sibling strength decays with sequence distance; nodes at
    /// different levels are never siblings.
    #[must_use]
    pub fn sibling_strength(&self, level_distance: u8, sequence_distance: usize) -> f32 {
        let profile = self.get(RelationKind::Sibling);
        if level_distance != 0 {
            return 0.0;
        }
        let decay = profile.decay_factor.unwrap_or(0.0) * sequence_distance as f32;
        (profile.very_strong - decay).max(profile.min_strength)
    }

    /// Logistic rescale of cosine similarity into the semantic band.
    /// Below the minimum the strength is zero; at the minimum the curve
    /// starts near the band floor and saturates toward 1.
    #[must_use]
    pub fn semantic_strength(&self, cosine_similarity: f32) -> f32 {
        let profile = self.get(RelationKind::Semantic);
        if cosine_similarity < profile.min_strength {
            return 0.0;
        }
        let x = (cosine_similarity - profile.min_strength) / (1.0 - profile.min_strength);
        let scaled = 1.0 / (1.0 + (-6.0 * (x - 0.5)).exp());
        (profile.min_strength + scaled * (1.0 - profile.min_strength)).min(1.0)
    }

    /// Keyword strength blends plain and importance-weighted overlap
    /// as `0.3·overlap + 0.7·weighted`. Below the minimum the strength
    /// is zero; above it the combined score is used as-is.
    #[must_use]
    pub fn keyword_strength(&self, keyword_overlap: f32, weighted_overlap: f32) -> f32 {
        let profile = self.get(RelationKind::KeywordBased);
        let combined = 0.3 * keyword_overlap + 0.7 * weighted_overlap;
        if combined < profile.min_strength {
            return 0.0;
        }
        combined.min(1.0)
    }
}

/// Weight of each kind when aggregating strengths across types.
#[must_use]
pub fn kind_weight(kind: RelationKind) -> f32 {
    match kind {
        RelationKind::ParentChild => 1.0,
        RelationKind::Semantic => 0.8,
        RelationKind::CrossReference => 0.7,
        RelationKind::KeywordBased => 0.6,
        RelationKind::Sibling => 0.5,
        RelationKind::Implicit => 0.4,
    }
}

/// Weighted average of per-kind strengths; empty input scores zero.
#[must_use]
pub fn combined_strength(strengths: &HashMap<RelationKind, f32>) -> f32 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (kind, strength) in strengths {
        let weight = kind_weight(*kind);
        weighted_sum += strength * weight;
        total_weight += weight;
    }
    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_table_matches_the_tuned_bands() {
        let table = ThresholdTable::default();
        assert_eq!(table.get(RelationKind::ParentChild).min_strength, 1.0);
        assert_eq!(table.get(RelationKind::Sibling).decay_factor, Some(0.1));
        assert_eq!(table.get(RelationKind::Semantic).min_strength, 0.7);
        assert_eq!(table.get(RelationKind::KeywordBased).strong, 0.5);
        assert_eq!(table.get(RelationKind::CrossReference).very_strong, 0.9);
        assert_eq!(table.get(RelationKind::Implicit).min_strength, 0.4);
    }

    #[test]
    fn adjacent_siblings_score_the_band_ceiling() {
        let table = ThresholdTable::default();
        assert!((table.sibling_strength(0, 1) - 0.7).abs() < 1e-6);
        assert_eq!(table.sibling_strength(0, 0), 0.8);
    }

    #[test]
    fn distant_siblings_floor_at_the_minimum() {
        let table = ThresholdTable::default();
        // 0.8 - 0.1 * 9 would be below the floor.
        assert_eq!(table.sibling_strength(0, 9), 0.3);
        assert_eq!(table.sibling_strength(0, 100), 0.3);
    }

    #[test]
    fn cross_level_pairs_are_never_siblings() {
        let table = ThresholdTable::default();
        assert_eq!(table.sibling_strength(1, 1), 0.0);
        assert_eq!(table.sibling_strength(3, 0), 0.0);
    }

    #[test]
    fn semantic_strength_is_zero_below_the_minimum() {
        let table = ThresholdTable::default();
        assert_eq!(table.semantic_strength(0.69), 0.0);
        assert_eq!(table.semantic_strength(0.0), 0.0);
    }

    #[test]
    fn semantic_strength_grows_monotonically_above_the_minimum() {
        let table = ThresholdTable::default();
        let low = table.semantic_strength(0.7);
        let mid = table.semantic_strength(0.85);
        let high = table.semantic_strength(1.0);

        // The logistic floor at the minimum similarity sits just above
        // the band minimum.
        assert!(low > 0.7 && low < 0.72);
        assert!(mid > low);
        assert!(high > mid);
        assert!(high <= 1.0);
    }

    #[test]
    fn semantic_midpoint_maps_to_the_band_center() {
        let table = ThresholdTable::default();
        // x = 0.5 puts the logistic at exactly one half.
        let mid = table.semantic_strength(0.85);
        assert!((mid - 0.85).abs() < 1e-6);
    }

    #[test]
    fn keyword_strength_passes_the_combined_score_through() {
        let table = ThresholdTable::default();
        // combined = 0.3*0.5 + 0.7*0.5 = 0.5, above the 0.3 minimum.
        assert!((table.keyword_strength(0.5, 0.5) - 0.5).abs() < 1e-6);
        // combined = 0.3*1.0 + 0.7*0.8 = 0.86.
        assert!((table.keyword_strength(1.0, 0.8) - 0.86).abs() < 1e-6);
    }

    #[test]
    fn keyword_strength_below_minimum_is_zero() {
        let table = ThresholdTable::default();
        assert_eq!(table.keyword_strength(0.2, 0.2), 0.0);
        assert_eq!(table.keyword_strength(0.0, 0.0), 0.0);
    }

    #[test]
    fn creation_gate_compares_against_the_kind_minimum() {
        let table = ThresholdTable::default();
        assert!(table.should_create(RelationKind::Sibling, 0.3));
        assert!(!table.should_create(RelationKind::Sibling, 0.29));
        assert!(table.should_create(RelationKind::ParentChild, 1.0));
        assert!(!table.should_create(RelationKind::Semantic, 0.69));
    }

    #[test]
    fn quality_labels_follow_the_band_boundaries() {
        let table = ThresholdTable::default();
        assert_eq!(table.quality_label(RelationKind::Sibling, 0.2), "none");
        assert_eq!(table.quality_label(RelationKind::Sibling, 0.4), "weak");
        assert_eq!(table.quality_label(RelationKind::Sibling, 0.7), "strong");
        assert_eq!(table.quality_label(RelationKind::Sibling, 0.9), "very_strong");
    }

    #[test]
    fn adaptive_scaling_raises_for_density_and_lowers_for_domain() {
        let table = ThresholdTable::default();
        let dense = table.adaptive(RelationKind::Semantic, 1.0, 0.0);
        assert!((dense.min_strength - 0.84).abs() < 1e-6);
        assert!((dense.strong - 0.95).abs() < 1e-6);

        let specific = table.adaptive(RelationKind::Semantic, 0.0, 1.0);
        assert!((specific.min_strength - 0.63).abs() < 1e-6);
    }

    #[test]
    fn adaptive_scaling_caps_at_the_ceilings() {
        let table = ThresholdTable::default();
        let adapted = table.adaptive(RelationKind::ParentChild, 1.0, 0.0);
        assert_eq!(adapted.min_strength, 0.95);
        assert_eq!(adapted.strong, 0.95);
        assert_eq!(adapted.very_strong, 0.98);
    }

    #[test]
    fn corpus_optimization_reanchors_the_semantic_band() {
        let table = ThresholdTable::default();
        let stats = CorpusStats { avg_similarity: 0.65, similarity_std: 0.15 };
        let optimized = table.optimized_for_corpus(&stats);

        let semantic = optimized.get(RelationKind::Semantic);
        assert!((semantic.min_strength - 0.8).abs() < 1e-6);
        assert!((semantic.strong - 0.9).abs() < 1e-6);
        assert!((semantic.very_strong - 0.98).abs() < 1e-5);

        // avg 0.65 > 0.6 scales the rest by 1.025.
        let sibling = optimized.get(RelationKind::Sibling);
        assert!((sibling.min_strength - 0.3075).abs() < 1e-6);
        assert_eq!(sibling.decay_factor, Some(0.1));
    }

    #[test]
    fn corpus_optimization_leaves_low_similarity_corpora_alone() {
        let table = ThresholdTable::default();
        let stats = CorpusStats { avg_similarity: 0.5, similarity_std: 0.1 };
        let optimized = table.optimized_for_corpus(&stats);

        let sibling = optimized.get(RelationKind::Sibling);
        assert_eq!(sibling.min_strength, 0.3);
        let semantic = optimized.get(RelationKind::Semantic);
        assert!((semantic.min_strength - 0.6).abs() < 1e-6);
    }

    #[test]
    fn combined_strength_is_a_weighted_average() {
        let strengths: HashMap<RelationKind, f32> = [
            (RelationKind::ParentChild, 1.0),
            (RelationKind::Sibling, 0.5),
        ]
        .into_iter()
        .collect();
        // (1.0*1.0 + 0.5*0.5) / (1.0 + 0.5) = 1.25 / 1.5
        let combined = combined_strength(&strengths);
        assert!((combined - 1.25 / 1.5).abs() < 1e-6);
    }

    #[test]
    fn combined_strength_of_nothing_is_zero() {
        assert_eq!(combined_strength(&HashMap::new()), 0.0);
    }
}
