//! Docweave Rank: promotion-tier scoring and the final context ordering.
//!
//! [`PromotionBooster`] turns raw similarity into a ranking score and picks
//! out critical documents that must be surfaced; [`ResultMerger`] lays the
//! two lists out as one deduplicated, size-capped context list.

pub mod booster;
pub mod merger;
pub mod types;

pub use booster::{PromotionBooster, IMPORTANT_MULTIPLIER};
pub use merger::ResultMerger;
pub use types::*;
