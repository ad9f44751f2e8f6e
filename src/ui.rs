//! TUI rendering for the Encore TUI
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the location-acquiring screen, the event sidebar, the canvas map and the
//! status overlays driven by the orchestrator snapshot.

use crate::app::App;
use crate::map::{MapView, MarkerKind};
use crate::orchestrator::Snapshot;
use ratatui::{
    prelude::*,
    widgets::{canvas::*, *}, // Imports Points, Circle, Map, etc.
};

use ratatui::text::Line;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Renders one frame of the TUI based on current application state.
///
/// Until the first position is known only the acquiring screen is drawn;
/// afterwards the map screen, with a "Relocating..." hint while a new
/// resolution runs.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state (snapshot, selection, zoom).
pub fn render(f: &mut Frame, app: &App) {
    match app.map_view() {
        Some(view) => render_map_screen(f, app, &view),
        None => render_acquiring_screen(f, app),
    }
}

/// Map screen: event sidebar (30%) + main area (70%).
///
/// The main area stacks a status bar, the canvas map and the details of the
/// selected event.
fn render_map_screen(f: &mut Frame, app: &App, view: &MapView) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(f.size());

    draw_event_sidebar(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(8),
        ])
        .split(chunks[1]);

    draw_status(f, app, main_chunks[0]);
    draw_map(f, app, view, main_chunks[1]);
    draw_details(f, app, main_chunks[2]);
}

fn draw_event_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .snapshot()
        .events
        .iter()
        .enumerate()
        .map(|(i, ev)| {
            let style = if i == app.selected_index {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(format!(" {}", ev.name), style)))
        })
        .collect();

    let title = format!(" Events Nearby ({}) ", items.len());
    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let snap = app.snapshot();
    let mut lines = vec![status_line(snap, app.zoom)];

    if snap.acquisition_loading {
        lines.push(Line::from(Span::styled(
            format!(" {} Relocating...", SPINNER[app.tick_count % SPINNER.len()]),
            Style::default().fg(Color::Cyan),
        )));
    } else if snap.acquisition_degraded {
        lines.push(Line::from(Span::styled(
            " Could not fetch your precise location. Approximate location in use.",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )));
    }

    if snap.discovery_loading {
        lines.push(Line::from(Span::styled(
            format!(" {} Loading nearby events...", SPINNER[app.tick_count % SPINNER.len()]),
            Style::default().fg(Color::White).bg(Color::Blue),
        )));
    } else if let Some(ref err) = snap.discovery_error {
        lines.push(Line::from(Span::styled(
            format!(" Events unavailable: {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(p, area);
}

fn status_line(snap: &Snapshot, zoom: u8) -> Line<'static> {
    let position = snap
        .position
        .map(|p| format!("{:.4}, {:.4}", p.latitude, p.longitude))
        .unwrap_or_else(|| "---".to_string());
    let updated = snap
        .last_discovery
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    Line::from(vec![
        Span::styled("  BASE: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(position, Style::default().fg(Color::Magenta)),
        Span::raw("  │  "),
        Span::styled("ZOOM: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(zoom.to_string()),
        Span::raw("  │  "),
        Span::styled("UPDATED: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(updated, Style::default().fg(Color::Green)),
    ])
}

fn draw_map(f: &mut Frame, app: &App, view: &MapView, area: Rect) {
    let center = view.center;
    let [x_min, x_max] = view.x_bounds();
    let [y_min, y_max] = view.y_bounds();

    let canvas = Canvas::default()
        .block(Block::bordered().title(" Map "))
        .marker(symbols::Marker::Braille)
        .x_bounds([x_min, x_max])
        .y_bounds([y_min, y_max])
        .paint(|ctx| {
            // Landmass Outlines
            ctx.draw(&Map {
                color: Color::Rgb(50, 50, 50),
                resolution: MapResolution::High,
            });

            for (i, marker) in view.visible_event_markers() {
                let MarkerKind::Event { ref name, .. } = marker.kind else {
                    continue;
                };
                let (x, y) = (marker.position.longitude, marker.position.latitude);
                if i == app.selected_index {
                    ctx.print(
                        x,
                        y,
                        Line::from(vec![
                            Span::styled(
                                " ♪ ",
                                Style::default()
                                    .fg(Color::Yellow)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!(" {} ", name),
                                Style::default().fg(Color::Black).bg(Color::Yellow),
                            ),
                        ]),
                    );
                } else {
                    ctx.print(x, y, Line::from(Span::styled("♪", Style::default().fg(Color::LightMagenta))));
                }
            }

            // You are here.
            ctx.print(
                center.longitude,
                center.latitude,
                Line::from(Span::styled(" ⌖ ", Style::default().fg(Color::Cyan))),
            );
        });

    f.render_widget(canvas, area);
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Event ")
        .borders(Borders::ALL)
        .padding(Padding::new(2, 2, 0, 0));

    let Some(ev) = app.selected_event() else {
        let snap = app.snapshot();
        let msg = if snap.discovery_loading {
            "Searching..."
        } else if snap.discovery_error.is_some() {
            "The event catalog could not be reached."
        } else {
            "No events found nearby."
        };
        let p = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    };

    let image = if ev.image_url.is_empty() {
        "none"
    } else {
        ev.image_url.as_str()
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let details = vec![
        Line::from(Span::styled(ev.name.as_str(), bold.fg(Color::Yellow))),
        Line::from(vec![Span::styled("Tickets:  ", bold), Span::raw(ev.url.as_str())]),
        Line::from(vec![Span::styled("Image:    ", bold), Span::raw(image)]),
        Line::from(vec![
            Span::styled("Venue:    ", bold),
            Span::raw(format!("{:.4}, {:.4}", ev.location.lat, ev.location.lng)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " ↑/↓ select   +/- zoom   r relocate   q quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let p = Paragraph::new(details).block(block).wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

/// Shown while the first position is being acquired; no map yet.
fn render_acquiring_screen(f: &mut Frame, app: &App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(1) / 2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let msg = Paragraph::new(format!(
        "{} Fetching your location...",
        SPINNER[app.tick_count % SPINNER.len()]
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::White));
    f.render_widget(msg, chunks[1]);
}
