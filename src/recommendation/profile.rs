//! Athlete Profile Normalization
//!
//! Collapses the loosely-populated request profile into a fully-populated record once,
//! so the scorer never has to juggle optional fields. Sport and category keys are
//! trimmed and lower-cased; matching against the catalog happens on these keys.

use serde::Serialize;

use super::model::AthleteProfile;
use crate::error::{Error, Result};

/// Profile with every affinity signal resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedProfile {
    pub athlete_id: String,
    /// Primary sport first, then the declared list, without duplicates
    pub sports: Vec<String>,
    pub category: Option<String>,
}

impl NormalizedProfile {
    /// Fails only when the athlete id is absent or blank.
    pub fn from_profile(profile: &AthleteProfile) -> Result<Self> {
        let athlete_id = profile
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_input("athleteId", "athlete id is required"))?
            .to_string();

        let mut sports: Vec<String> = Vec::new();
        let declared = profile
            .sport
            .iter()
            .chain(profile.sports.iter().flatten());
        for sport in declared {
            if let Some(key) = normalize_key(sport) {
                if !sports.contains(&key) {
                    sports.push(key);
                }
            }
        }

        Ok(Self {
            athlete_id,
            sports,
            category: profile.category.as_deref().and_then(normalize_key),
        })
    }

    pub fn has_affinity(&self) -> bool {
        !self.sports.is_empty()
    }

    /// True when `candidate` (a sport name or id) names one of the athlete's sports
    pub fn plays(&self, candidate: &str) -> bool {
        self.sport_key(candidate).is_some()
    }

    /// The athlete's own key for `candidate`, if they play it
    pub fn sport_key(&self, candidate: &str) -> Option<&str> {
        let key = normalize_key(candidate)?;
        self.sports
            .iter()
            .find(|own| **own == key)
            .map(String::as_str)
    }

    /// True when `candidate` is the athlete's category
    pub fn in_category(&self, candidate: &str) -> bool {
        match (&self.category, normalize_key(candidate)) {
            (Some(own), Some(key)) => *own == key,
            _ => false,
        }
    }
}

/// Matching key for sport names, ids and categories; blank input has no key
pub fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
