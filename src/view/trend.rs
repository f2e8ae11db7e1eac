//! Synthetic score trend for the detail view
//!
//! The backend has no history, so the detail chart shows a decorative
//! oscillation around the current score. Every call draws fresh noise.

use rand::Rng;
use serde::Serialize;

/// Number of points in a synthesized trend
pub const TREND_POINTS: usize = 10;

/// Lowest value a trend point may take
pub const TREND_FLOOR: i64 = 5;

/// One point of the trend line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: String,
    pub score: i64,
}

/// Synthesize a trend around `seed_score` using the thread-local RNG
pub fn synthesize(seed_score: f64) -> Vec<TrendPoint> {
    synthesize_with(seed_score, &mut rand::thread_rng())
}

/// Synthesize a trend with a caller-supplied RNG
///
/// Point `i` is `max(5, round(seed + 5*sin(i) + U(0,3) - 1.5))`,
/// labeled `T1` through `T10`.
pub fn synthesize_with<R: Rng + ?Sized>(seed_score: f64, rng: &mut R) -> Vec<TrendPoint> {
    (0..TREND_POINTS)
        .map(|i| {
            let noise: f64 = rng.gen_range(0.0..3.0);
            let value = (seed_score + 5.0 * (i as f64).sin() + noise - 1.5).round();
            TrendPoint {
                time: format!("T{}", i + 1),
                score: (value as i64).max(TREND_FLOOR),
            }
        })
        .collect()
}
