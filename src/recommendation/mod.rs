//! Recommendation Module
//!
//! Ranks portal events for athletes and surfaces trending events.
//!
//! ## Architecture
//!
//! 1. **Model** - Event, sport, registration and athlete shapes
//! 2. **Profile** - Normalize request profiles into fully-populated records
//! 3. **Engine** - Score and rank events for one athlete
//! 4. **Trending** - Rank events by decayed registration volume
//! 5. **Stats** - Registration aggregates for the dashboard
//!
//! Everything here is synchronous and side-effect free: inputs are immutable
//! snapshots, outputs are freshly allocated ordered lists. Callers own I/O,
//! caching and the clock.
//!
//! ## Algorithm Overview
//!
//! Athlete recommendations are additive:
//! - Sport affinity: 10 per matched sport, capped at 20
//! - Category match within a matched sport: 5
//! - Upcoming (vs ongoing) among matched events: 1
//! - Everything else eligible: baseline 0, soonest first
//!
//! Trending sums registration weights: full weight for 30 days, linear decay to
//! zero at 60 days.

pub mod engine;
pub mod metrics;
pub mod model;
pub mod profile;
pub mod scoring;
pub mod stats;
pub mod trending;

use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub use engine::{RecommendationEngine, RecommendationReason, ScoringWeights};
pub use model::{AthleteProfile, Event, EventStatus, RecommendationResult, RegistrationRecord, Sport};
pub use scoring::DecayPolicy;
pub use stats::{registration_stats, RegistrationStats};
pub use trending::TrendingRanker;

use crate::error::Result;

/// Rank events for an athlete with the default weights
pub fn recommend_events(
    athlete: &AthleteProfile,
    events: &[Event],
    excluded_event_ids: &HashSet<String>,
) -> Result<Vec<RecommendationResult>> {
    RecommendationEngine::default().recommend_events(athlete, events, excluded_event_ids)
}

/// Rank trending events as of `as_of` with the default decay policy
pub fn get_trending_events(
    events: &[Event],
    registrations: &[RegistrationRecord],
    as_of: DateTime<Utc>,
) -> Vec<RecommendationResult> {
    TrendingRanker::default().rank(events, registrations, as_of)
}
