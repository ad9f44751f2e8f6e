//! User location resolution for the Encore event map.
//!
//! [`PositionResolver`] asks a [`GeolocationProvider`] for one reading and
//! substitutes a configured fallback position when no provider exists or the
//! reading fails. The result is an [`AcquisitionState`] whose `degraded` flag
//! tells the UI that the map is centred on the fallback rather than the user.

use crate::error::GeolocationError;
use crate::models::Position;
use async_trait::async_trait;
use ipgeolocate::{Locator, Service};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Central London, used when no genuine reading is available.
pub const DEFAULT_FALLBACK: Position = Position::new(51.5074, -0.1278);

/// Hints passed with every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached reading the provider may return; zero forces a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
        }
    }
}

/// A source of single position readings.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Position, GeolocationError>;
}

/// Outcome of one acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionState {
    pub position: Option<Position>,
    pub loading: bool,
    pub degraded: bool,
    pub failure_reason: Option<String>,
}

impl AcquisitionState {
    pub fn pending() -> Self {
        Self {
            position: None,
            loading: true,
            degraded: false,
            failure_reason: None,
        }
    }

    pub fn located(position: Position) -> Self {
        Self {
            position: Some(position),
            loading: false,
            degraded: false,
            failure_reason: None,
        }
    }

    pub fn fallback(position: Position, reason: impl Into<String>) -> Self {
        Self {
            position: Some(position),
            loading: false,
            degraded: true,
            failure_reason: Some(reason.into()),
        }
    }
}

pub struct PositionResolver {
    provider: Option<Arc<dyn GeolocationProvider>>,
    fallback: Position,
    options: PositionOptions,
}

impl PositionResolver {
    /// `provider: None` models a platform without geolocation.
    pub fn new(provider: Option<Arc<dyn GeolocationProvider>>, fallback: Position) -> Self {
        Self {
            provider,
            fallback,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fallback(&self) -> Position {
        self.fallback
    }

    /// Requests one reading. Never fails: every error path yields the fallback
    /// position with `degraded` set. The provider is called at most once and
    /// is abandoned once `options.timeout` elapses.
    pub async fn resolve(&self) -> AcquisitionState {
        let Some(provider) = self.provider.as_ref() else {
            warn!(
                "No geolocation provider available. Using fallback {}.",
                self.fallback
            );
            return AcquisitionState::fallback(self.fallback, GeolocationError::Unsupported.to_string());
        };

        let reading = tokio::time::timeout(self.options.timeout, provider.current_position(&self.options))
            .await
            .unwrap_or_else(|_| Err(GeolocationError::Timeout(self.options.timeout.as_millis() as u64)));

        match reading {
            Ok(position) => {
                info!("Geolocation successful - ({}, {})", position.latitude, position.longitude);
                AcquisitionState::located(position)
            }
            Err(e) => {
                error!("Geolocation error: {}. Using fallback {}.", e, self.fallback);
                AcquisitionState::fallback(self.fallback, e.to_string())
            }
        }
    }
}

/// IP geolocation via ip-api.com. Accuracy is city level at best, so the
/// `high_accuracy` hint cannot be honoured; nothing is cached between calls.
pub struct IpGeolocator {
    ip: String,
}

impl IpGeolocator {
    /// An empty `ip` asks the service to locate the caller's own address.
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeolocationError> {
        let loc = Locator::get(&self.ip, Service::IpApi)
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        let latitude = loc.latitude.parse::<f64>();
        let longitude = loc.longitude.parse::<f64>();
        match (latitude, longitude) {
            (Ok(lat), Ok(lon)) if Position::new(lat, lon).is_valid() => Ok(Position::new(lat, lon)),
            _ => Err(GeolocationError::Unavailable(format!(
                "service returned unusable coordinates ({}, {})",
                loc.latitude, loc.longitude
            ))),
        }
    }
}

/// Always reports the configured position.
pub struct ManualGeolocator {
    position: Position,
}

impl ManualGeolocator {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for ManualGeolocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeolocationError> {
        Ok(self.position)
    }
}
