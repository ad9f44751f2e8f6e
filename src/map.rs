use crate::models::{Event, Position};

pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    User,
    Event {
        name: String,
        image_url: String,
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Position,
    pub kind: MarkerKind,
}

/// What the map surface draws: a center, a zoom level and ordered markers,
/// the user first.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Position,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapView {
    pub fn new(center: Position, zoom: u8, events: &[Event]) -> Self {
        let mut markers = Vec::with_capacity(events.len() + 1);
        markers.push(Marker {
            position: center,
            kind: MarkerKind::User,
        });
        markers.extend(events.iter().map(|e| Marker {
            position: e.position(),
            kind: MarkerKind::Event {
                name: e.name.clone(),
                image_url: e.image_url.clone(),
                url: e.url.clone(),
            },
        }));

        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            markers,
        }
    }

    /// Longitude degrees covered at this zoom (one web-map tile width).
    pub fn span_degrees(&self) -> f64 {
        360.0 / 2f64.powi(self.zoom as i32)
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.span_degrees() / 2.0;
        [self.center.longitude - half, self.center.longitude + half]
    }

    // Latitude span shrinks with cos(lat) so both axes cover similar ground.
    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.span_degrees() / 2.0 * self.center.latitude.to_radians().cos().max(0.1);
        [self.center.latitude - half, self.center.latitude + half]
    }

    pub fn contains(&self, position: Position) -> bool {
        let [x0, x1] = self.x_bounds();
        let [y0, y1] = self.y_bounds();
        (x0..=x1).contains(&position.longitude) && (y0..=y1).contains(&position.latitude)
    }

    pub fn event_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers
            .iter()
            .filter(|m| matches!(m.kind, MarkerKind::Event { .. }))
    }

    /// Event markers inside the bounds, paired with their index in the event list.
    pub fn visible_event_markers(&self) -> impl Iterator<Item = (usize, &Marker)> {
        self.event_markers()
            .enumerate()
            .filter(|(_, m)| self.contains(m.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventLocation;

    fn event(id: &str, lat: f64, lng: f64) -> Event {
        Event {
            id: id.into(),
            name: id.to_uppercase(),
            url: format!("https://tickets.example/{id}"),
            image_url: String::new(),
            location: EventLocation { lat, lng },
        }
    }

    #[test]
    fn user_marker_comes_first_then_events_in_order() {
        let center = Position::new(51.5074, -0.1278);
        let view = MapView::new(center, 10, &[event("a", 51.51, -0.12), event("b", 51.49, -0.13)]);
        assert_eq!(view.markers.len(), 3);
        assert_eq!(view.markers[0].kind, MarkerKind::User);
        assert_eq!(view.markers[0].position, center);
        let names: Vec<&str> = view
            .event_markers()
            .map(|m| match &m.kind {
                MarkerKind::Event { name, .. } => name.as_str(),
                MarkerKind::User => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn zoom_controls_span() {
        let center = Position::new(0.0, 0.0);
        let view = MapView::new(center, 10, &[]);
        assert!((view.span_degrees() - 0.3515625).abs() < 1e-12);
        assert_eq!(view.x_bounds(), [-0.17578125, 0.17578125]);
        assert!(view.contains(Position::new(0.1, 0.1)));
        assert!(!view.contains(Position::new(0.5, 0.0)));

        let wide = MapView::new(center, 0, &[]);
        assert_eq!(wide.span_degrees(), 360.0 / 8.0);
        assert_eq!(wide.zoom, MIN_ZOOM);
        assert_eq!(MapView::new(center, 30, &[]).zoom, MAX_ZOOM);
    }

    #[test]
    fn off_canvas_events_are_not_visible() {
        let center = Position::new(0.0, 0.0);
        let view = MapView::new(
            center,
            10,
            &[event("in", 0.1, 0.1), event("far", 5.0, 5.0), event("edge", 0.0, 0.17)],
        );
        let visible: Vec<usize> = view.visible_event_markers().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![0, 2]);
    }
}
