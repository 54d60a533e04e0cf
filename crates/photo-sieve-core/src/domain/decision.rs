//! Threshold decision rule.

use serde::{Deserialize, Serialize};

use super::Score;

/// Which side of the threshold counts as detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Detected when `score >= threshold`.
    #[default]
    AtOrAbove,
    /// Detected when `score <= threshold`.
    AtOrBelow,
}

impl Polarity {
    /// Parses the configuration spelling (`above` or `below`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "above" => Some(Self::AtOrAbove),
            "below" => Some(Self::AtOrBelow),
            _ => None,
        }
    }
}

/// Decides whether a score counts as a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRule {
    /// Decision threshold in `[0, 1]`.
    pub threshold: f32,
    /// Comparison direction.
    pub polarity: Polarity,
}

impl Default for DecisionRule {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            polarity: Polarity::default(),
        }
    }
}

impl DecisionRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(threshold: f32, polarity: Polarity) -> Self {
        Self {
            threshold,
            polarity,
        }
    }

    /// Returns true when `score` is on the detected side of the threshold.
    #[must_use]
    pub fn is_detected(&self, score: Score) -> bool {
        match self.polarity {
            Polarity::AtOrAbove => score.value() >= self.threshold,
            Polarity::AtOrBelow => score.value() <= self.threshold,
        }
    }
}
