//! Stick Classifier
//!
//! Turns the left-stick trajectory into a movement style. A quick
//! direction → neutral → same direction flick is a dash; anything else
//! with a deflection is a run.
//!
//! ```text
//! newest last:
//!   R S S S R    == DASH
//!   L S S S S    == STATIONARY (newest at rest)
//!   L S S S R    == RUN        (direction changed)
//!   L L L L L    == RUN
//!   S            == STATIONARY
//! ```

use std::collections::VecDeque;

use crate::core::movement::MovementStyle;
use crate::core::vec2::Vec2;
use crate::TICK_RATE;

#[inline]
fn at_rest(sample: &Vec2) -> bool {
    sample.x.round() == 0.0
}

/// Rolling stick history with drop-oldest retention.
#[derive(Clone, Debug)]
pub struct StickClassifier {
    samples: VecDeque<Vec2>,
    capacity: usize,
}

impl Default for StickClassifier {
    fn default() -> Self {
        Self::new(TICK_RATE as usize)
    }
}

impl StickClassifier {
    /// Create a classifier retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sample and classify the trajectory ending with it.
    pub fn push(&mut self, sample: Vec2) -> MovementStyle {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Self::classify(self.samples.make_contiguous())
    }

    /// Forget all samples (e.g. on disconnect).
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no samples are retained.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Classify a history, oldest first, newest last.
    pub fn classify(history: &[Vec2]) -> MovementStyle {
        let Some((newest, earlier)) = history.split_last() else {
            return MovementStyle::Stationary;
        };
        if at_rest(newest) {
            return MovementStyle::Stationary;
        }

        let Some((previous, before_rest)) = earlier.split_last() else {
            return MovementStyle::Run;
        };
        if !at_rest(previous) {
            return MovementStyle::Run;
        }

        // Neutral just before a deflection: look for the last deflection
        // that preceded the neutral stretch.
        let heading_right = newest.x > 0.0;
        match before_rest.iter().rev().find(|s| !at_rest(s)) {
            Some(sample) if (sample.x > 0.0) == heading_right => MovementStyle::Dash,
            _ => MovementStyle::Run,
        }
    }
}
