//! Ranking types.

use docweave_core::{DocumentRef, PromotionTier};
use serde::Serialize;

/// A candidate after tier boosting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostedResult {
    pub document: DocumentRef,
    pub raw_score: f64,
    pub boosted_score: f64,
}

impl BoostedResult {
    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn tier(&self) -> PromotionTier {
        self.document.tier
    }
}

/// One slot of the ordered context list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub document: DocumentRef,
    pub raw_score: f64,
    pub boosted_score: f64,
    /// Placed by mandatory surfacing rather than by rank.
    pub mandatory: bool,
}

impl ContextEntry {
    pub fn id(&self) -> &str {
        &self.document.id
    }
}
