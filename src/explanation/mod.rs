//! Human-readable rationale for ranked items
//!
//! Reasons are generated from the same score breakdown that produced the score, so the
//! text can never disagree with the number.

pub mod crop_rationale;
pub mod disease_rationale;

pub use crop_rationale::{crop_detail, generate_crop_reasons, FALLBACK_CROP_REASON};
pub use disease_rationale::{disease_detail, generate_disease_reasons, resistant_variety_suggestions};

/// Maximum reasons attached to one item
pub const MAX_REASONS: usize = 3;
