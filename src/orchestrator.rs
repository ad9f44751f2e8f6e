//! Drives the location → discovery pipeline and owns the state the UI reads.
//!
//! The [`Orchestrator`] starts the [`PositionResolver`], and each time a new
//! distinct position is resolved it queries the [`EventSource`] for that
//! position. Both run as spawned tasks that post [`AppEvent`]s back to the
//! main loop, which hands them to [`Orchestrator::handle`]. All state lives
//! in one [`Snapshot`], republished on every change through a
//! `tokio::sync::watch` channel.

use crate::api::EventSource;
use crate::error::DiscoveryError;
use crate::events::AppEvent;
use crate::location::{AcquisitionState, PositionResolver};
use crate::models::{Event, Position};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub position: Option<Position>,
    pub acquisition_loading: bool,
    /// The position is the fallback, not a genuine reading.
    pub acquisition_degraded: bool,
    pub failure_reason: Option<String>,
    pub events: Vec<Event>,
    pub discovery_loading: bool,
    /// Set when the latest query failed; `events` then still holds the
    /// previous result.
    pub discovery_error: Option<String>,
    pub last_discovery: Option<DateTime<Local>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            position: None,
            acquisition_loading: true,
            acquisition_degraded: false,
            failure_reason: None,
            events: Vec::new(),
            discovery_loading: false,
            discovery_error: None,
            last_discovery: None,
        }
    }
}

pub struct Orchestrator {
    resolver: Arc<PositionResolver>,
    source: Arc<dyn EventSource>,
    tx: mpsc::UnboundedSender<AppEvent>,
    snapshot: Snapshot,
    publisher: watch::Sender<Snapshot>,
    resolving: bool,
    // Id of the most recently issued query; only its result is applied.
    latest_query: u64,
}

impl Orchestrator {
    pub fn new(
        resolver: Arc<PositionResolver>,
        source: Arc<dyn EventSource>,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let snapshot = Snapshot::default();
        let (publisher, _) = watch::channel(snapshot.clone());
        Self {
            resolver,
            source,
            tx,
            snapshot,
            publisher,
            resolving: false,
            latest_query: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    /// Runs the resolver once. Does nothing while a resolution is outstanding.
    pub fn start(&mut self) {
        if self.resolving {
            return;
        }
        self.resolving = true;
        self.snapshot.acquisition_loading = true;
        self.publish();

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let state = resolver.resolve().await;
            let _ = tx.send(AppEvent::PositionResolved(state));
        });
    }

    /// Re-initializes acquisition. The current position and events stay
    /// visible until a new position arrives.
    pub fn relocate(&mut self) {
        if self.resolving {
            return;
        }
        info!("Relocating");
        self.snapshot.acquisition_degraded = false;
        self.snapshot.failure_reason = None;
        self.start();
    }

    /// Applies a background result. Input and ticks are ignored.
    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::PositionResolved(state) => self.on_position_resolved(state),
            AppEvent::EventsDiscovered {
                origin,
                query,
                result,
            } => self.on_events_discovered(origin, query, result),
            AppEvent::Tick | AppEvent::Input(_) => {}
        }
    }

    fn on_position_resolved(&mut self, state: AcquisitionState) {
        self.resolving = false;
        self.snapshot.acquisition_loading = state.loading;
        self.snapshot.acquisition_degraded = state.degraded;
        self.snapshot.failure_reason = state.failure_reason;

        if let Some(position) = state.position {
            if self.snapshot.position == Some(position) {
                info!(%position, "Position unchanged, keeping current events");
            } else {
                self.snapshot.position = Some(position);
                self.discover(position);
            }
        }
        self.publish();
    }

    fn discover(&mut self, position: Position) {
        self.latest_query += 1;
        let query = self.latest_query;
        self.snapshot.discovery_loading = true;

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_events(position).await;
            let _ = tx.send(AppEvent::EventsDiscovered {
                origin: position,
                query,
                result,
            });
        });
    }

    fn on_events_discovered(
        &mut self,
        origin: Position,
        query: u64,
        result: Result<Vec<Event>, DiscoveryError>,
    ) {
        if query != self.latest_query || self.snapshot.position != Some(origin) {
            warn!(%origin, query, "Discarding events for a superseded position");
            return;
        }

        self.snapshot.discovery_loading = false;
        match result {
            Ok(events) => {
                self.snapshot.events = events;
                self.snapshot.discovery_error = None;
                self.snapshot.last_discovery = Some(Local::now());
            }
            Err(e) => {
                error!("Failed to load events: {}", e);
                self.snapshot.discovery_error = Some(e.to_string());
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot.clone());
    }
}
