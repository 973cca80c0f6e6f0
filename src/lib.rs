//! RegPortal library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod recommendation;
pub mod updater;

// Re-export commonly used types
pub use catalog::{Catalog, Snapshot};
pub use config::Config;
pub use error::{Error, Result};
pub use recommendation::{
    get_trending_events, recommend_events, AthleteProfile, Event, EventStatus,
    RecommendationResult, RegistrationRecord, Sport,
};
