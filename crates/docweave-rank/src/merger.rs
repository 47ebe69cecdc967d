//! Result merger: mandatory documents first, then boosted results.

use std::collections::HashSet;

use docweave_core::ScoredDocument;
use tracing::debug;

use crate::booster::PromotionBooster;
use crate::types::{BoostedResult, ContextEntry};

pub struct ResultMerger;

impl ResultMerger {
    /// Build the ordered context list.
    ///
    /// Mandatory documents take the earliest slots in the given order, even
    /// when outscored; boosted results fill the rest in sorted order. Each id
    /// appears once and the list never exceeds `max_results`.
    pub fn merge(
        mandatory: &[ScoredDocument],
        boosted: &[BoostedResult],
        max_results: usize,
    ) -> Vec<ContextEntry> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entries = Vec::with_capacity(max_results.min(mandatory.len() + boosted.len()));

        for doc in mandatory {
            if entries.len() >= max_results {
                break;
            }
            if seen.insert(doc.id()) {
                entries.push(ContextEntry {
                    document: doc.document.clone(),
                    raw_score: doc.raw_score,
                    boosted_score: PromotionBooster::boost(doc.raw_score, doc.tier()),
                    mandatory: true,
                });
            }
        }
        let pinned = entries.len();

        for result in boosted {
            if entries.len() >= max_results {
                break;
            }
            if seen.insert(result.id()) {
                entries.push(ContextEntry {
                    document: result.document.clone(),
                    raw_score: result.raw_score,
                    boosted_score: result.boosted_score,
                    mandatory: false,
                });
            }
        }

        debug!(
            "Merged context: {} mandatory + {} ranked (cap {})",
            pinned,
            entries.len() - pinned,
            max_results
        );
        entries
    }
}
