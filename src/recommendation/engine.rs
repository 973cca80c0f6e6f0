//! Recommendation Engine
//!
//! Ranks catalog events for one athlete. Scoring is additive:
//! - Baseline: every eligible event starts here
//! - Sport affinity: fixed bonus per offered sport the athlete plays, capped
//! - Category: bonus when a matched sport offers the athlete's category
//! - Registrability: upcoming events edge out ongoing ones among matched events
//!
//! Unmatched events keep the bare baseline so an athlete without declared sports
//! still gets the full eligible list, soonest first.

use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;

use super::model::{AthleteProfile, Event, EventStatus, RecommendationResult, Sport};
use super::profile::NormalizedProfile;
use super::scoring::{by_score_desc, round_score};
use crate::error::Result;

/// Recommendation weights (can be tuned)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub baseline: f64,
    pub sport_match: f64,
    pub max_affinity: f64,
    pub category_match: f64,
    pub upcoming: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            baseline: 0.0,
            sport_match: 10.0,  // per matched sport
            max_affinity: 20.0, // two matched sports saturate
            category_match: 5.0,
            upcoming: 1.0,
        }
    }
}

/// Why this event was recommended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationReason {
    /// Event offers sports the athlete plays
    SportMatch {
        sports: Vec<String>,
        category: Option<String>,
    },
    /// No affinity, but the event is open for registration
    OpenEvent { status: EventStatus },
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationReason::SportMatch { sports, category } => {
                write!(f, "Matches your sport: {}", sports.join(", "))?;
                if let Some(category) = category {
                    write!(f, " (category {})", category)?;
                }
                Ok(())
            }
            RecommendationReason::OpenEvent { status } => match status {
                EventStatus::Ongoing => write!(f, "Ongoing event open for registration"),
                _ => write!(f, "Upcoming event open for registration"),
            },
        }
    }
}

/// Score of a single event before it is turned into a result
#[derive(Debug, Clone)]
struct ScoredEvent<'a> {
    event: &'a Event,
    score: f64,
    reason: RecommendationReason,
}

/// Main recommendation engine
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    weights: ScoringWeights,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank `events` for `athlete`, skipping completed events and everything in `excluded`.
    ///
    /// Returns an owned, ordered list: score descending, then start date ascending,
    /// then event id. An id listed twice is scored once, from its first eligible entry.
    /// Fails only if the athlete id is missing.
    pub fn recommend_events(
        &self,
        athlete: &AthleteProfile,
        events: &[Event],
        excluded: &HashSet<String>,
    ) -> Result<Vec<RecommendationResult>> {
        let profile = NormalizedProfile::from_profile(athlete)?;
        let weights = &self.weights;

        let mut seen = HashSet::with_capacity(events.len());
        let candidates: Vec<&Event> = events
            .iter()
            .filter(|event| event.status.is_eligible() && !excluded.contains(&event.id))
            .filter(|event| seen.insert(event.id.as_str()))
            .collect();

        let mut scored: Vec<ScoredEvent<'_>> = candidates
            .par_iter()
            .map(|&event| Self::score_event(weights, &profile, event))
            .collect();

        scored.sort_by(|a, b| {
            by_score_desc(a.score, b.score)
                .then_with(|| a.event.start_date.cmp(&b.event.start_date))
                .then_with(|| a.event.id.cmp(&b.event.id))
        });

        Ok(scored
            .into_iter()
            .map(|s| RecommendationResult {
                event: s.event.clone(),
                score: s.score,
                reason: s.reason.to_string(),
            })
            .collect())
    }

    // ---- Scoring helpers (pure functions) ----

    fn score_event<'a>(
        weights: &ScoringWeights,
        profile: &NormalizedProfile,
        event: &'a Event,
    ) -> ScoredEvent<'a> {
        // Affinity counts athlete sports, not offered entries: one sport listed
        // twice under different ids still matches once.
        let mut matched_keys: Vec<&str> = Vec::new();
        let mut matched_names: Vec<String> = Vec::new();
        let mut matched: Vec<&Sport> = Vec::new();
        for sport in &event.sports {
            let Some(key) = profile
                .sport_key(&sport.name)
                .or_else(|| profile.sport_key(&sport.id))
            else {
                continue;
            };
            if !matched_keys.contains(&key) {
                matched_keys.push(key);
                matched_names.push(sport.name.clone());
            }
            matched.push(sport);
        }

        if matched.is_empty() {
            return ScoredEvent {
                event,
                score: round_score(weights.baseline),
                reason: RecommendationReason::OpenEvent {
                    status: event.status,
                },
            };
        }

        let mut score =
            weights.baseline + Self::compute_affinity_bonus(weights, matched_keys.len());

        let category = matched
            .iter()
            .flat_map(|sport| sport.categories.iter())
            .find(|c| profile.in_category(c))
            .cloned();
        if category.is_some() {
            score += weights.category_match;
        }

        if event.status == EventStatus::Upcoming {
            score += weights.upcoming;
        }

        ScoredEvent {
            event,
            score: round_score(score),
            reason: RecommendationReason::SportMatch {
                sports: matched_names,
                category,
            },
        }
    }

    fn compute_affinity_bonus(weights: &ScoringWeights, matches: usize) -> f64 {
        (matches as f64 * weights.sport_match).min(weights.max_affinity)
    }
}
