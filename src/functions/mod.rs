//! Ready-made `f64` vocabulary: conventional arithmetic, comparisons,
//! elementary math functions, an `if` branch and the `pi`/`e` constants.
//!
//! Everything here goes through the public [`Dictionary`] API, so it doubles
//! as a reference for registering custom vocabularies.

use crate::expr::{Builder, Dictionary};

pub mod arithmetic;
pub mod math;

/// Builds the default `f64` dictionary.
pub fn default_dictionary() -> Dictionary<f64> {
    let mut dictionary = Dictionary::new(|v| Ok(-v), |a, b| Ok(a * b));
    arithmetic::register(&mut dictionary).expect("default arithmetic vocabulary is valid");
    math::register(&mut dictionary).expect("default math vocabulary is valid");
    dictionary
}

/// Builds a ready-to-use `f64` builder over [`default_dictionary`] with the
/// standard numeric operand codec.
pub fn default_builder() -> Builder<f64> {
    Builder::new(
        default_dictionary(),
        |text| text.parse::<f64>().map_err(|e| e.to_string()),
        |value: &f64| value.to_string(),
    )
}
