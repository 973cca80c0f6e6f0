//! Scoring helpers shared by the scorer and the trending ranker

use chrono::Duration;
use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Registrations this recent count at full weight
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Registrations at least this old count for nothing
pub const DEFAULT_CUTOFF_DAYS: i64 = 60;

/// Scores are rounded to this many decimal places before comparison
const SCORE_PRECISION: f64 = 1_000.0;

/// Linear decay between a full-weight window and a zero-weight cutoff.
///
/// ```text
/// weight(age) = 1                                   age <= window
///             = (cutoff - age) / (cutoff - window)  window < age < cutoff
///             = 0                                   age >= cutoff
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayPolicy {
    window: Duration,
    cutoff: Duration,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            cutoff: Duration::days(DEFAULT_CUTOFF_DAYS),
        }
    }
}

impl DecayPolicy {
    pub fn new(window: Duration, cutoff: Duration) -> Result<Self> {
        if window < Duration::zero() {
            return Err(Error::InvalidConfig {
                key: "TRENDING_WINDOW_DAYS",
                message: "window must not be negative".into(),
            });
        }
        if cutoff <= window {
            return Err(Error::InvalidConfig {
                key: "TRENDING_CUTOFF_DAYS",
                message: format!(
                    "cutoff ({} days) must be larger than the window ({} days)",
                    cutoff.num_days(),
                    window.num_days()
                )
                .into(),
            });
        }
        Ok(Self { window, cutoff })
    }

    pub fn from_days(window_days: i64, cutoff_days: i64) -> Result<Self> {
        let window = days_in_range("TRENDING_WINDOW_DAYS", window_days)?;
        let cutoff = days_in_range("TRENDING_CUTOFF_DAYS", cutoff_days)?;
        Self::new(window, cutoff)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn cutoff(&self) -> Duration {
        self.cutoff
    }

    /// Weight of a registration of the given age. Future timestamps count as brand new.
    pub fn recency_weight(&self, age: Duration) -> f64 {
        if age <= self.window {
            return 1.0;
        }
        if age >= self.cutoff {
            return 0.0;
        }
        let remaining = (self.cutoff - age).num_seconds() as f64;
        let span = (self.cutoff - self.window).num_seconds() as f64;
        (remaining / span).clamp(0.0, 1.0)
    }

    pub fn is_recent(&self, age: Duration) -> bool {
        age <= self.window
    }
}

fn days_in_range(key: &'static str, days: i64) -> Result<Duration> {
    Duration::try_days(days).ok_or_else(|| Error::InvalidConfig {
        key,
        message: format!("{} days is out of range", days).into(),
    })
}

/// Round a score so that equal contributions compare equal
pub fn round_score(score: f64) -> f64 {
    (score * SCORE_PRECISION).round() / SCORE_PRECISION
}

/// Descending order on scores
pub fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
