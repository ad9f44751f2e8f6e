use thiserror::Error;

/// Failure reported by a [`GeolocationProvider`](crate::location::GeolocationProvider).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeolocationError {
    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

/// Why a catalog query produced no usable result.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        DiscoveryError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Parse(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing catalog credential: set {0} in the environment or .env")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
