//! Error types for PetalSonic occlusion
//!
//! Only the management API (registration, profile updates, channel delivery)
//! can fail. Occlusion computation itself always yields an
//! [`OcclusionResult`](crate::OcclusionResult).

use crate::registry::SourceId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcclusionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source capacity exceeded (max {max_sources} sources)")]
    CapacityExceeded { max_sources: usize },

    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    #[error("Channel error: {0}")]
    Channel(String),
}

pub type Result<T> = std::result::Result<T, OcclusionError>;
