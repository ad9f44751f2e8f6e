use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// A point on the Earth's surface in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when both coordinates are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// Catalog `latlong` format.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub lat: f64,
    pub lng: f64,
}

/// A catalog listing reduced to what the map needs. Always plottable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Empty when the listing carries no image.
    pub image_url: String,
    pub location: EventLocation,
}

impl Event {
    pub fn position(&self) -> Position {
        Position::new(self.location.lat, self.location.lng)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(rename = "_embedded", default, deserialize_with = "lenient")]
    pub embedded: Option<EmbeddedEvents>,
}

/// Records are kept as raw JSON so one malformed listing cannot fail the page.
#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedEvents {
    #[serde(default, deserialize_with = "lenient")]
    pub events: Option<Vec<Value>>,
}

/// Wrong-typed fields read as absent; only the venue location decides
/// whether a listing survives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub images: Option<Vec<Value>>,
    #[serde(rename = "_embedded", default, deserialize_with = "lenient")]
    pub embedded: Option<RawEventEmbedded>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEventEmbedded {
    #[serde(default, deserialize_with = "lenient")]
    pub venues: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVenue {
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
}

/// The catalog sends coordinates as numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Numeric ids are kept as their decimal text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl CatalogResponse {
    /// Normalizes every listing, dropping the ones that cannot be plotted.
    /// Relative order of the survivors is preserved.
    pub fn into_events(self) -> Vec<Event> {
        self.embedded
            .and_then(|e| e.events)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawCatalogEvent>(value) {
                Ok(raw) => raw.normalize(),
                Err(e) => {
                    debug!("Skipping catalog record that is not an object: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl RawCatalogEvent {
    /// Returns `None` when the first venue has no parseable location.
    pub fn normalize(self) -> Option<Event> {
        let location = self
            .embedded
            .and_then(|e| e.venues)
            .and_then(|venues| venues.into_iter().next())
            .and_then(|venue| serde_json::from_value::<RawVenue>(venue).ok())
            .and_then(|venue| venue.location);

        let (lat, lng) = match location {
            Some(RawLocation {
                latitude: Some(lat),
                longitude: Some(lng),
            }) => match (parse_coordinate(&lat), parse_coordinate(&lng)) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => {
                    debug!(id = ?self.id, "Dropping event with non-numeric venue location");
                    return None;
                }
            },
            _ => {
                debug!(id = ?self.id, "Dropping event without venue location");
                return None;
            }
        };

        let image_url = self
            .images
            .and_then(|images| images.into_iter().next())
            .and_then(|image| serde_json::from_value::<RawImage>(image).ok())
            .and_then(|image| image.url)
            .unwrap_or_default();

        Some(Event {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            image_url,
            location: EventLocation { lat, lng },
        })
    }
}

/// Numeric strings are read up to the first character that cannot continue
/// a number, so `"12.3abc"` is 12.3. JSON numbers are taken as is. NaN and
/// infinities are rejected.
fn parse_coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => {
            let prefix = numeric_prefix(s.trim());
            if prefix.is_empty() {
                None
            } else {
                prefix.parse::<f64>().ok()
            }
        }
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Longest leading `[+-]digits[.digits][e[+-]digits]` run; empty when no
/// mantissa digit is present.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> CatalogResponse {
        serde_json::from_value(value).unwrap()
    }

    fn listing(id: &str, lat: Value, lng: Value) -> Value {
        json!({
            "id": id,
            "name": format!("Show {id}"),
            "url": format!("https://tickets.example/{id}"),
            "images": [{ "url": format!("https://img.example/{id}.jpg") }],
            "_embedded": { "venues": [{ "location": { "latitude": lat, "longitude": lng } }] }
        })
    }

    #[test]
    fn keeps_only_events_with_venue_location() {
        let body = json!({
            "_embedded": {
                "events": [
                    listing("a", json!("51.5033"), json!("-0.1195")),
                    {
                        "id": "b",
                        "name": "No venue",
                        "url": "https://tickets.example/b",
                        "images": []
                    }
                ]
            }
        });

        let events = response(body).into_events();
        assert_eq!(
            events,
            vec![Event {
                id: "a".into(),
                name: "Show a".into(),
                url: "https://tickets.example/a".into(),
                image_url: "https://img.example/a.jpg".into(),
                location: EventLocation {
                    lat: 51.5033,
                    lng: -0.1195
                },
            }]
        );
    }

    #[test]
    fn missing_images_give_empty_image_url() {
        let mut raw = listing("a", json!("1.0"), json!("2.0"));
        raw["images"] = json!([]);
        let events = response(json!({ "_embedded": { "events": [raw] } })).into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].image_url, "");

        let mut raw = listing("b", json!("1.0"), json!("2.0"));
        raw.as_object_mut().unwrap().remove("images");
        let events = response(json!({ "_embedded": { "events": [raw] } })).into_events();
        assert_eq!(events[0].image_url, "");
    }

    #[test]
    fn drops_non_numeric_coordinates() {
        let body = json!({
            "_embedded": {
                "events": [
                    listing("nan-text", json!("not-a-number"), json!("12.3")),
                    listing("nan", json!("NaN"), json!("12.3")),
                    listing("inf", json!("1.0"), json!("inf")),
                    listing("empty", json!(""), json!("12.3")),
                    listing("null", Value::Null, json!("12.3")),
                    listing("sign-only", json!("-"), json!("12.3")),
                    listing("dot-only", json!("."), json!("12.3")),
                    listing("huge", json!("1e400"), json!("12.3")),
                    listing("bool", json!(true), json!("12.3")),
                ]
            }
        });
        assert!(response(body).into_events().is_empty());
    }

    #[test]
    fn reads_leading_number_of_coordinate_text() {
        let body = json!({
            "_embedded": {
                "events": [
                    listing("trailing", json!("12.3abc"), json!("-0.12abc")),
                    listing("padded", json!(" 51.5 "), json!("+0.5")),
                    listing("exponent", json!("1.5e1x"), json!("2e")),
                    listing("bare-dot", json!(".5"), json!("5.")),
                ]
            }
        });
        let positions: Vec<Position> = response(body)
            .into_events()
            .iter()
            .map(Event::position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Position::new(12.3, -0.12),
                Position::new(51.5, 0.5),
                Position::new(15.0, 2.0),
                Position::new(0.5, 5.0),
            ]
        );
    }

    #[test]
    fn only_first_venue_is_consulted() {
        let mut raw = listing("a", json!("1.0"), json!("2.0"));
        raw["_embedded"]["venues"] = json!([
            {},
            { "location": { "latitude": "1.0", "longitude": "2.0" } }
        ]);
        assert!(response(json!({ "_embedded": { "events": [raw] } }))
            .into_events()
            .is_empty());
    }

    #[test]
    fn accepts_numeric_json_coordinates() {
        let raw = listing("a", json!(40.75), json!(-73.99));
        let events = response(json!({ "_embedded": { "events": [raw] } })).into_events();
        assert_eq!(events[0].position(), Position::new(40.75, -73.99));
    }

    #[test]
    fn preserves_order_of_surviving_events() {
        let body = json!({
            "_embedded": {
                "events": [
                    listing("1", json!("1.0"), json!("1.0")),
                    listing("2", json!("bad"), json!("1.0")),
                    listing("3", json!("3.0"), json!("3.0")),
                    { "id": "4", "images": "not-a-list" },
                    listing("5", json!("5.0"), json!("5.0")),
                    "not-a-record",
                ]
            }
        });
        let ids: Vec<String> = response(body).into_events().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["1", "3", "5"]);
    }

    #[test]
    fn odd_fields_do_not_drop_a_plottable_event() {
        let mut object_images = listing("obj", json!("51.5"), json!("-0.12"));
        object_images["images"] = json!({ "url": "x" });

        let mut numeric_id = listing("ignored", json!("1.0"), json!("2.0"));
        numeric_id["id"] = json!(42);
        numeric_id["name"] = json!(["not", "a", "name"]);
        numeric_id["images"] = json!([{ "url": null }, { "url": "https://img.example/2.jpg" }]);

        let mut odd_later_venue = listing("venue", json!("3.0"), json!("4.0"));
        odd_later_venue["_embedded"]["venues"]
            .as_array_mut()
            .unwrap()
            .push(json!("junk"));

        let body = json!({ "_embedded": { "events": [object_images, numeric_id, odd_later_venue] } });
        let events = response(body).into_events();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, "obj");
        assert_eq!(events[0].image_url, "");
        assert_eq!(events[0].position(), Position::new(51.5, -0.12));
        assert_eq!(events[1].id, "42");
        assert_eq!(events[1].name, "");
        assert_eq!(events[1].image_url, "");
        assert_eq!(events[2].position(), Position::new(3.0, 4.0));
    }

    #[test]
    fn wrong_typed_event_collection_is_empty() {
        assert!(response(json!({ "_embedded": { "events": "none" } }))
            .into_events()
            .is_empty());
        assert!(response(json!({ "_embedded": [] })).into_events().is_empty());
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let body = json!({
            "_embedded": {
                "events": [
                    listing("x", json!("10.5"), json!("20.25")),
                    listing("y", json!("-33.8"), json!("151.2")),
                ]
            }
        });
        let first = response(body.clone()).into_events();
        let second = response(body).into_events();
        assert_eq!(first, second);
        assert!(first
            .iter()
            .all(|e| e.location.lat.is_finite() && e.location.lng.is_finite()));
    }

    #[test]
    fn absent_embedded_collection_is_empty() {
        assert!(response(json!({ "page": { "totalElements": 0 } }))
            .into_events()
            .is_empty());
        assert!(response(json!({ "_embedded": {} })).into_events().is_empty());
    }

    #[test]
    fn position_formats_as_latlong() {
        assert_eq!(Position::new(51.5074, -0.1278).to_string(), "51.5074,-0.1278");
        assert!(Position::new(51.5074, -0.1278).is_valid());
        assert!(!Position::new(91.0, 0.0).is_valid());
        assert!(!Position::new(0.0, f64::NAN).is_valid());
    }
}
