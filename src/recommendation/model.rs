//! Entity shapes shared by the scorer and the ranker
//!
//! These mirror the records the portal stores: events with their sports, registrations,
//! and the athlete profile a recommendation request carries. All of them are treated as
//! read-only snapshots by the scoring code.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl EventStatus {
    /// Completed events can be neither recommended nor trending
    pub fn is_eligible(self) -> bool {
        !matches!(self, EventStatus::Completed)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Upcoming => write!(f, "upcoming"),
            EventStatus::Ongoing => write!(f, "ongoing"),
            EventStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A sport offered within an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sport {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An event in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub sports: Vec<Sport>,
}

/// Athlete signals supplied with a recommendation request.
///
/// Every field is optional on the wire; `id` is checked when the profile is normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfile {
    pub id: Option<String>,
    pub sport: Option<String>,
    pub sports: Option<Vec<String>>,
    pub category: Option<String>,
}

impl AthleteProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }

    pub fn with_sports<I, S>(mut self, sports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sports = Some(sports.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A stored registration. Only `event_id` and `registered_at` feed the ranking;
/// the remaining form fields ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: String,
    pub event_id: String,
    #[serde(alias = "timestamp", alias = "createdAt")]
    pub registered_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistrationRecord {
    pub fn new(
        id: impl Into<String>,
        event_id: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            event_id: event_id.into(),
            registered_at,
            extra: Map::new(),
        }
    }
}

/// One ranked entry produced by the scorer or the ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub event: Event,
    pub score: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_from_portal_json() {
        let json = r#"{
            "id": "evt-1",
            "name": "Spring Games",
            "startDate": "2026-04-01",
            "endDate": "2026-04-03",
            "status": "upcoming",
            "sports": [{"id": "sp-1", "name": "athletics", "categories": ["U18"], "status": "open"}]
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(event.location, None);
        assert_eq!(event.sports[0].categories, vec!["U18".to_string()]);
    }

    #[test]
    fn test_registration_keeps_unknown_fields() {
        let json = r#"{
            "id": "reg-1",
            "eventId": "evt-1",
            "timestamp": "2026-03-01T10:00:00Z",
            "firstName": "Ada",
            "club": "Harriers"
        }"#;

        let reg: RegistrationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(reg.event_id, "evt-1");
        assert_eq!(reg.extra.get("club"), Some(&Value::from("Harriers")));
    }

    #[test]
    fn test_completed_is_not_eligible() {
        assert!(EventStatus::Upcoming.is_eligible());
        assert!(EventStatus::Ongoing.is_eligible());
        assert!(!EventStatus::Completed.is_eligible());
    }
}
