//! Model output types.

use serde::{Deserialize, Serialize};

/// Predicted direction of the next bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down = 0,
    Up = 1,
}

impl Direction {
    pub fn from_label(label: u8) -> Self {
        if label == 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    pub fn label(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }
}

/// A class prediction with its probability.
///
/// `confidence` is the larger of the two class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: f64,
    /// `[p(down), p(up)]`
    pub probabilities: [f64; 2],
}

impl Prediction {
    /// Build from class probabilities. Ties resolve to `Down`.
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        let direction = if probabilities[1] > probabilities[0] {
            Direction::Up
        } else {
            Direction::Down
        };
        Self {
            direction,
            confidence: probabilities[direction.index()],
            probabilities,
        }
    }

    /// Build with an explicit direction and confidence; the other class gets the complement.
    pub fn new(direction: Direction, confidence: f64) -> Self {
        let mut probabilities = [1.0 - confidence; 2];
        probabilities[direction.index()] = confidence;
        Self {
            direction,
            confidence,
            probabilities,
        }
    }

    pub fn signal(&self) -> Signal {
        match self.direction {
            Direction::Up => Signal::Buy,
            Direction::Down => Signal::Sell,
        }
    }
}

/// Human-facing recommendation derived from a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}
