use thiserror::Error;

/// Errors from the climate data aggregator
#[derive(Debug, Error)]
pub enum ClimateError {
    /// Transport failure, timeout, or a non-success HTTP status
    #[error("NASA POWER request failed: {0}")]
    Fetch(String),

    /// Response body was not the expected JSON shape
    #[error("Failed to parse NASA POWER response: {0}")]
    Parse(String),

    /// The caller cancelled the request before it completed
    #[error("NASA POWER request was cancelled")]
    Cancelled,
}

/// Errors from the geocoding collaborator
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding failed for \"{place}\". Reason: no matching location")]
    NotFound { place: String },

    #[error("Geocoding failed for \"{place}\". Reason: {reason}")]
    Failed { place: String, reason: String },

    /// The HTTP client could not be built, before any place was looked up
    #[error("Geocoding is unavailable: could not build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),
}
