//! Class-score types for digit classification

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Fixed index -> label table: index `i` maps to the label string of `i`.
pub const DIGIT_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// A probability distribution over the ten digit classes.
///
/// Probabilities are rounded to 3 decimal places at construction and
/// serialize as a JSON object with keys "0".."9" in ascending order,
/// matching the wire format of the `/infer/` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitScores([f32; 10]);

impl DigitScores {
    /// Build scores from an already-normalized probability vector.
    ///
    /// Each value is rounded to 3 decimals; the inputs are expected to
    /// sum to 1.0 before rounding.
    pub fn from_probabilities(probs: [f32; 10]) -> Self {
        let mut rounded = [0.0f32; 10];
        for (out, p) in rounded.iter_mut().zip(probs.iter()) {
            *out = round3(*p);
        }
        Self(rounded)
    }

    /// Probability for a single digit class.
    pub fn get(&self, digit: usize) -> Option<f32> {
        self.0.get(digit).copied()
    }

    /// The label with the highest probability and its score.
    pub fn top(&self) -> (&'static str, f32) {
        let mut best = 0;
        for i in 1..self.0.len() {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        (DIGIT_LABELS[best], self.0[best])
    }

    /// Iterate over (label, probability) pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        DIGIT_LABELS.iter().copied().zip(self.0.iter().copied())
    }

    /// Sum of all ten probabilities (1.0 up to rounding error).
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

impl Serialize for DigitScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(10))?;
        for (label, prob) in self.iter() {
            map.serialize_entry(label, &prob)?;
        }
        map.end()
    }
}

/// Round a probability to 3 decimal places.
pub fn round3(p: f32) -> f32 {
    (p * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_three_decimals() {
        let scores = DigitScores::from_probabilities([
            0.123_456, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.876_544,
        ]);
        assert_eq!(scores.get(0), Some(0.123));
        assert_eq!(scores.get(9), Some(0.877));
    }

    #[test]
    fn serializes_keys_in_ascending_order() {
        let scores = DigitScores::from_probabilities([0.1; 10]);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"0":0.1,"1":0.1,"2":0.1,"3":0.1,"4":0.1,"5":0.1,"6":0.1,"7":0.1,"8":0.1,"9":0.1}"#
        );
    }

    #[test]
    fn uniform_distribution_sums_to_one() {
        let scores = DigitScores::from_probabilities([0.1; 10]);
        assert!((scores.sum() - 1.0).abs() < 0.01);
    }

    #[test]
    fn top_picks_highest_probability() {
        let mut probs = [0.05; 10];
        probs[7] = 0.55;
        let scores = DigitScores::from_probabilities(probs);
        assert_eq!(scores.top(), ("7", 0.55));
    }
}
