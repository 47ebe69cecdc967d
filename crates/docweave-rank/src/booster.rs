//! Promotion booster: raw similarity to ranking score via promotion tier.

use docweave_core::{PromotionTier, ScoredDocument};
use tracing::debug;

use crate::types::BoostedResult;

/// Multiplier applied to important-tier scores. Boosted scores may exceed
/// the nominal similarity range; they are only used for ordering.
pub const IMPORTANT_MULTIPLIER: f64 = 1.5;

/// Stateless tier scoring.
pub struct PromotionBooster;

impl PromotionBooster {
    /// Ranking score for `raw` at `tier`.
    ///
    /// Negative and NaN scores count as zero. Critical documents are not
    /// inflated: they reach the context through [`Self::mandatory_critical`].
    pub fn boost(raw: f64, tier: PromotionTier) -> f64 {
        let raw = clamp(raw);
        match tier {
            PromotionTier::Standard | PromotionTier::Critical => raw,
            PromotionTier::Important => raw * IMPORTANT_MULTIPLIER,
        }
    }

    /// Boost every candidate and sort by boosted score, highest first.
    /// Equal scores keep their input order.
    pub fn apply_and_sort(results: &[ScoredDocument]) -> Vec<BoostedResult> {
        let mut boosted: Vec<BoostedResult> = results
            .iter()
            .map(|r| BoostedResult {
                document: r.document.clone(),
                raw_score: r.raw_score,
                boosted_score: Self::boost(r.raw_score, r.tier()),
            })
            .collect();

        boosted.sort_by(|a, b| {
            b.boosted_score
                .partial_cmp(&a.boosted_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        boosted
    }

    /// Critical candidates whose raw score reaches `min_relevance`, in input
    /// order. Neither clamping nor boosting applies here, so a negative or
    /// NaN raw score never meets a floor it is below.
    pub fn mandatory_critical(candidates: &[ScoredDocument], min_relevance: f64) -> Vec<ScoredDocument> {
        let mandatory: Vec<ScoredDocument> = candidates
            .iter()
            .filter(|c| c.tier() == PromotionTier::Critical && c.raw_score >= min_relevance)
            .cloned()
            .collect();
        debug!(
            "{} of {} candidates are mandatory at floor {}",
            mandatory.len(),
            candidates.len(),
            min_relevance
        );
        mandatory
    }
}

fn clamp(raw: f64) -> f64 {
    if raw.is_nan() || raw < 0.0 {
        0.0
    } else {
        raw
    }
}
