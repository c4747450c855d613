//! Error types for Bookrun.

use thiserror::Error;

/// Top-level error type for Bookrun operations.
#[derive(Debug, Error)]
pub enum BookrunError {
    /// Tuning/configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Zone management errors
    #[error("Zone error: {0}")]
    Zone(#[from] ZoneError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid tuning values. Raised at load time, never during a frame.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A min/max range is inverted
    #[error("{field}: range min {min} exceeds max {max}")]
    InvalidRange {
        /// Offending field
        field: &'static str,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// A value that must be strictly positive is not
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// A probability is outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// The camera viewport has zero width
    #[error("camera viewport width must be non-zero")]
    ZeroViewport,

    /// TOML parse failure
    #[error("failed to parse tuning: {0}")]
    Parse(String),
}

/// Zone-level errors.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// No NPC with this ID in the zone
    #[error("NPC not found: {0:?}")]
    NpcNotFound(crate::EntityId),

    /// Zone has been deactivated
    #[error("zone is inactive")]
    Inactive,
}

/// Result type alias for Bookrun operations.
pub type BookrunResult<T> = Result<T, BookrunError>;

/// Result type alias for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;
