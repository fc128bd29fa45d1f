use std::cmp::Ordering;

use crate::hybrid::ScoredResult;

/// Stock weight of the diversity signal when reordering ranked results,
/// for callers enabling [`crate::HybridSearch::with_diversity`].
pub const DEFAULT_DIVERSITY_FACTOR: f32 = 0.3;

/// Sort results by relevance, best first.
pub(crate) fn sort_by_relevance(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
    });
}

/// Reorder `results` so near-duplicates do not crowd the top.
///
/// The best result keeps its rank. Every following slot is filled
/// greedily with the remaining result whose blend of relevance and
/// difference from the results already picked is highest. Difference
/// counts 0.5 for another document, 0.3 for another heading level and
/// 0.2 for another match type, summed over the picked results.
pub(crate) fn diversify(results: Vec<ScoredResult>, diversity_factor: f32) -> Vec<ScoredResult> {
    if results.len() <= 1 {
        return results;
    }

    let mut remaining = results;
    let mut picked = Vec::with_capacity(remaining.len());
    picked.push(remaining.remove(0));

    while !remaining.is_empty() {
        let mut best_score = -1.0_f32;
        let mut best_index = 0;

        for (i, candidate) in remaining.iter().enumerate() {
            let diversity: f32 = picked
                .iter()
                .map(|selected| difference(candidate, selected))
                .sum();
            let combined =
                candidate.relevance * (1.0 - diversity_factor) + diversity * diversity_factor;
            if combined > best_score {
                best_score = combined;
                best_index = i;
            }
        }

        picked.push(remaining.remove(best_index));
    }

    picked
}

fn difference(candidate: &ScoredResult, selected: &ScoredResult) -> f32 {
    let mut score = 0.0;
    if candidate.document_id != selected.document_id {
        score += 0.5;
    }
    if candidate.level != selected.level {
        score += 0.3;
    }
    if candidate.match_type != selected.match_type {
        score += 0.2;
    }
    score
}
