//! Registration statistics for the admin dashboard

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::model::{Event, EventStatus, RegistrationRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationCount {
    pub event_id: String,
    pub event_name: String,
    pub status: EventStatus,
    pub registrations: usize,
    pub recent_registrations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total_events: usize,
    pub events_by_status: BTreeMap<EventStatus, usize>,
    pub total_registrations: usize,
    pub recent_registrations: usize,
    /// Registrations whose event id is not in the catalog
    pub dangling_registrations: usize,
    pub window_days: i64,
    /// Busiest events first
    pub per_event: Vec<EventRegistrationCount>,
}

/// Aggregate registration counts as of `as_of`; "recent" means no older than `window`.
pub fn registration_stats(
    events: &[Event],
    registrations: &[RegistrationRecord],
    as_of: DateTime<Utc>,
    window: Duration,
) -> RegistrationStats {
    let mut events_by_status = BTreeMap::new();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::with_capacity(events.len());
    for event in events {
        *events_by_status.entry(event.status).or_insert(0) += 1;
        counts.entry(event.id.as_str()).or_insert((0, 0));
    }

    let mut recent_registrations = 0;
    let mut dangling_registrations = 0;
    for registration in registrations {
        let recent = as_of - registration.registered_at <= window;
        if recent {
            recent_registrations += 1;
        }
        match counts.get_mut(registration.event_id.as_str()) {
            Some((total, recent_total)) => {
                *total += 1;
                if recent {
                    *recent_total += 1;
                }
            }
            None => dangling_registrations += 1,
        }
    }

    let mut seen = HashSet::new();
    let mut per_event: Vec<EventRegistrationCount> = events
        .iter()
        .filter(|event| seen.insert(event.id.as_str()))
        .map(|event| {
            let (total, recent) = counts.get(event.id.as_str()).copied().unwrap_or_default();
            EventRegistrationCount {
                event_id: event.id.clone(),
                event_name: event.name.clone(),
                status: event.status,
                registrations: total,
                recent_registrations: recent,
            }
        })
        .collect();
    per_event.sort_by(|a, b| {
        b.registrations
            .cmp(&a.registrations)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });

    RegistrationStats {
        total_events: events.len(),
        events_by_status,
        total_registrations: registrations.len(),
        recent_registrations,
        dangling_registrations,
        window_days: window.num_days(),
        per_event,
    }
}
