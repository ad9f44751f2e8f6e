//! Event types and the main event loop driver for the Encore TUI.
//!
//! This module defines the [`AppEvent`] enum (keyboard input, ticks and the
//! results of background location and catalog work) and the [`EventHandler`],
//! which runs a background task that polls crossterm for key events and emits
//! periodic [`AppEvent::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; the [`Orchestrator`](crate::orchestrator::Orchestrator)
//! posts its results through a clone of [`EventHandler::tx`].

use crate::error::DiscoveryError;
use crate::location::AcquisitionState;
use crate::models::{Event, Position};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick used for UI refresh.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// The position resolver settled.
    PositionResolved(AcquisitionState),
    /// A catalog query settled.
    EventsDiscovered {
        /// Position the query was issued for; results for any other
        /// position are stale.
        origin: Position,
        /// Sequence number assigned when the query was issued.
        query: u64,
        result: Result<Vec<Event>, DiscoveryError>,
    },
}

/// Multiplexes terminal input, ticks and background results into a single
/// event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and given to other tasks, while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop.
pub struct EventHandler {
    /// Sender for posting events from background tasks.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task polls crossterm with a timeout of `tick_rate_ms`;
    /// when a key is pressed it sends [`AppEvent::Input`], and when the tick
    /// interval elapses it sends [`AppEvent::Tick`]. It stops when the
    /// terminal can no longer be read or the receiver is dropped.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(AppEvent::Input(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}
