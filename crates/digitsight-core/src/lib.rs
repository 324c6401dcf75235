//! Digitsight Core
//!
//! Core types and utilities shared across Digitsight components.
//!
//! This crate provides:
//! - The canonical image-ingress step (decode + RGB coercion)
//! - The `DigitScores` probability distribution and its wire format
//! - Error types and result handling

pub mod error;
pub mod ingress;
pub mod scores;

pub use error::{Error, Result};
pub use ingress::{decode_image, image_from_luma, image_from_rgb, to_rgb};
pub use scores::{round3, DigitScores, DIGIT_LABELS};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::ingress::{decode_image, to_rgb};
    pub use crate::scores::{DigitScores, DIGIT_LABELS};
}
