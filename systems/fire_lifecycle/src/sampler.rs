//! Rejection sampling of collision-free points.

use firebot_core::{ObstacleField, Position};
use rand::Rng;

/// Attempts made before giving up on finding a free point.
pub const DEFAULT_SAMPLE_TRIES: u32 = 500;

/// Point returned when sampling gives up.
pub const FALLBACK_POINT: Position = Position::new(50.0, 50.0);

/// Draws uniformly distributed points inside the navigable interior until one
/// is not blocked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreePointSampler {
    max_tries: u32,
    fallback: Position,
}

impl FreePointSampler {
    /// Creates a sampler with the provided retry budget and fallback point.
    #[must_use]
    pub const fn new(max_tries: u32, fallback: Position) -> Self {
        Self {
            max_tries,
            fallback,
        }
    }

    /// Returns a free point, or the fallback once the retry budget is spent.
    pub fn sample<R>(&self, rng: &mut R, field: &ObstacleField) -> Position
    where
        R: Rng + ?Sized,
    {
        let interior = field.interior();
        if !interior.is_finite() {
            return self.fallback;
        }
        for _ in 0..self.max_tries {
            let candidate = Position::new(
                rng.gen_range(interior.x()..=interior.right()),
                rng.gen_range(interior.y()..=interior.bottom()),
            );
            if !field.is_blocked(candidate) {
                return candidate;
            }
        }

        self.fallback
    }
}

impl Default for FreePointSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_TRIES, FALLBACK_POINT)
    }
}
