//! Trending Ranker
//!
//! Ranks open events by registration momentum: every registration contributes its
//! recency weight (see [`DecayPolicy`]) to its event. Events without any weighted
//! signal are left out entirely.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use super::model::{Event, RecommendationResult, RegistrationRecord};
use super::scoring::{by_score_desc, round_score, DecayPolicy};

/// Per-event registration tally
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    weighted: f64,
    total: usize,
    recent: usize,
}

/// Why this event is trending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingReason {
    pub recent: usize,
    pub total: usize,
    pub window_days: i64,
}

impl fmt::Display for TrendingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recent == 0 {
            return write!(
                f,
                "{} sign-up{}, none in the last {} days",
                self.total,
                plural(self.total),
                self.window_days
            );
        }
        write!(
            f,
            "{} sign-up{} in the last {} days",
            self.recent,
            plural(self.recent),
            self.window_days
        )?;
        if self.total > self.recent {
            write!(f, " ({} total)", self.total)?;
        }
        Ok(())
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrendingRanker {
    policy: DecayPolicy,
}

impl TrendingRanker {
    pub fn new(policy: DecayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    /// Rank upcoming and ongoing events by decayed registration volume as of `as_of`.
    ///
    /// Registrations pointing at unknown or completed events are ignored. Ties fall back
    /// to raw registration count, then start date, then event id.
    pub fn rank(
        &self,
        events: &[Event],
        registrations: &[RegistrationRecord],
        as_of: DateTime<Utc>,
    ) -> Vec<RecommendationResult> {
        let mut eligible: HashMap<&str, &Event> = HashMap::with_capacity(events.len());
        for event in events.iter().filter(|e| e.status.is_eligible()) {
            eligible.entry(event.id.as_str()).or_insert(event);
        }

        let mut tallies: HashMap<&str, Tally> = HashMap::new();
        for registration in registrations {
            let Some((&event_id, _)) = eligible.get_key_value(registration.event_id.as_str())
            else {
                continue;
            };
            let age = as_of - registration.registered_at;
            let tally = tallies.entry(event_id).or_default();
            tally.weighted += self.policy.recency_weight(age);
            tally.total += 1;
            if self.policy.is_recent(age) {
                tally.recent += 1;
            }
        }

        let mut ranked: Vec<(&Event, f64, Tally)> = tallies
            .into_iter()
            .filter_map(|(event_id, tally)| {
                let score = round_score(tally.weighted);
                (score > 0.0).then(|| (eligible[event_id], score, tally))
            })
            .collect();

        ranked.sort_by(|(ea, sa, ta), (eb, sb, tb)| {
            by_score_desc(*sa, *sb)
                .then_with(|| tb.total.cmp(&ta.total))
                .then_with(|| ea.start_date.cmp(&eb.start_date))
                .then_with(|| ea.id.cmp(&eb.id))
        });

        let window_days = self.policy.window().num_days();
        ranked
            .into_iter()
            .map(|(event, score, tally)| RecommendationResult {
                event: event.clone(),
                score,
                reason: TrendingReason {
                    recent: tally.recent,
                    total: tally.total,
                    window_days,
                }
                .to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::model::EventStatus;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn event(id: &str, status: EventStatus) -> Event {
        let start = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        Event {
            id: id.to_string(),
            name: id.to_string(),
            start_date: start,
            end_date: start,
            status,
            location: None,
            sports: vec![],
        }
    }

    fn regs(event_id: &str, n: usize, days_ago: i64) -> Vec<RegistrationRecord> {
        (0..n)
            .map(|i| {
                RegistrationRecord::new(
                    format!("{}-{}-{}", event_id, days_ago, i),
                    event_id,
                    now() - Duration::days(days_ago),
                )
            })
            .collect()
    }

    #[test]
    fn test_partially_decayed_registrations_count() {
        let ranker = TrendingRanker::default();
        let events = vec![event("evt-1", EventStatus::Upcoming)];
        let registrations = regs("evt-1", 2, 45);

        let results = ranker.rank(&events, &registrations, now());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].reason, "2 sign-ups, none in the last 30 days");
    }

    #[test]
    fn test_tie_broken_by_raw_count() {
        let ranker = TrendingRanker::default();
        let events = vec![
            event("evt-a", EventStatus::Upcoming),
            event("evt-b", EventStatus::Ongoing),
        ];
        let mut registrations = regs("evt-a", 3, 1);
        registrations.extend(regs("evt-b", 3, 2));
        registrations.extend(regs("evt-b", 4, 90));

        let results = ranker.rank(&events, &registrations, now());
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].event.id, "evt-b");
        assert_eq!(results[0].reason, "3 sign-ups in the last 30 days (7 total)");
    }

    #[test]
    fn test_dangling_and_completed_are_ignored() {
        let ranker = TrendingRanker::default();
        let events = vec![
            event("evt-open", EventStatus::Upcoming),
            event("evt-done", EventStatus::Completed),
        ];
        let mut registrations = regs("evt-open", 1, 0);
        registrations.extend(regs("evt-done", 50, 0));
        registrations.extend(regs("evt-ghost", 50, 0));

        let results = ranker.rank(&events, &registrations, now());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event.id, "evt-open");
        assert_eq!(results[0].reason, "1 sign-up in the last 30 days");
    }

    #[test]
    fn test_custom_policy_window() {
        let ranker = TrendingRanker::new(DecayPolicy::from_days(7, 14).unwrap());
        let events = vec![event("evt-1", EventStatus::Upcoming)];
        let registrations = regs("evt-1", 4, 20);

        assert!(ranker.rank(&events, &registrations, now()).is_empty());
    }
}
