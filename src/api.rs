use crate::config::{ApiKey, CatalogConfig};
use crate::error::{ConfigError, DiscoveryError};
use crate::models::{CatalogResponse, Event, Position};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

/// Anything that can list events around a position.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, position: Position) -> Result<Vec<Event>, DiscoveryError>;
}

/// Fixed parameters of a catalog search, minus the position.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub radius: u32,
    pub unit: String,
    pub classification: String,
}

impl From<&CatalogConfig> for CatalogQuery {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            radius: config.radius,
            unit: config.unit.clone(),
            classification: config.classification.clone(),
        }
    }
}

impl CatalogQuery {
    /// Query string for a search centred on `position`, soonest events first.
    pub fn params(&self, api_key: &ApiKey, position: Position) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", api_key.expose().to_string()),
            ("latlong", position.to_string()),
            ("radius", self.radius.to_string()),
            ("unit", self.unit.clone()),
            ("classificationName", self.classification.clone()),
            ("sort", "date,asc".to_string()),
        ]
    }
}

pub struct DiscoveryClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    query: CatalogQuery,
}

impl DiscoveryClient {
    pub fn new(config: &CatalogConfig, api_key: ApiKey) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            query: CatalogQuery::from(config),
        })
    }

    /// Searches the catalog around `position`, reporting why nothing came back.
    pub async fn try_discover(&self, position: Position) -> Result<Vec<Event>, DiscoveryError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&self.query.params(&self.api_key, position))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let response: CatalogResponse = serde_json::from_str(&body)?;
        let events = response.into_events();
        info!(%position, count = events.len(), "Fetched nearby events");
        Ok(events)
    }

    /// Like [`try_discover`](Self::try_discover) but fails closed: any error is
    /// logged and reported as an empty list.
    pub async fn discover(&self, position: Position) -> Vec<Event> {
        match self.try_discover(position).await {
            Ok(events) => events,
            Err(e) => {
                error!("Error fetching events from catalog: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl EventSource for DiscoveryClient {
    async fn fetch_events(&self, position: Position) -> Result<Vec<Event>, DiscoveryError> {
        self.try_discover(position).await
    }
}
