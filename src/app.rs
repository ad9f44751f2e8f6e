use crate::map::{MapView, MAX_ZOOM, MIN_ZOOM};
use crate::models::Event;
use crate::orchestrator::{Orchestrator, Snapshot};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct App {
    pub orchestrator: Orchestrator,
    pub selected_index: usize,
    pub zoom: u8,
    pub tick_count: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(orchestrator: Orchestrator, zoom: u8) -> Self {
        Self {
            orchestrator,
            selected_index: 0,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            tick_count: 0,
            should_quit: false,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.orchestrator.snapshot()
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.snapshot().events.get(self.selected_index)
    }

    /// `None` until a position is known; nothing is drawn on the map before.
    pub fn map_view(&self) -> Option<MapView> {
        let snap = self.snapshot();
        snap.position
            .map(|center| MapView::new(center, self.zoom, &snap.events))
    }

    pub fn on_tick(&mut self) {
        self.tick_count += 1;

        // The event list is replaced wholesale, so keep the selection in range.
        let len = self.snapshot().events.len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Prevent navigation while the first position is still being acquired
        if self.snapshot().position.is_none() {
            if let KeyCode::Char('q') = key.code {
                self.should_quit = true;
            }
            return;
        }

        let count = self.snapshot().events.len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 {
                    self.selected_index = (self.selected_index + 1) % count;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if count > 0 {
                    self.selected_index = self.selected_index.checked_sub(1).unwrap_or(count - 1);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom = (self.zoom + 1).min(MAX_ZOOM),
            KeyCode::Char('-') => self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM),
            KeyCode::Char('r') => self.orchestrator.relocate(),
            _ => {}
        }
    }
}
