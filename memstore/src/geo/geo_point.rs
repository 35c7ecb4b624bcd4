use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::fmt::Display;

/// A geographic point in degrees.
///
/// Coordinates are validated on construction: latitude must lie in
/// [-90, 90], longitude in [-180, 180], and neither may be NaN.
///
/// ## Example
///
/// ```rust,ignore
/// use memstore::geo::GeoPoint;
///
/// let liverpool = GeoPoint::new(53.4084, -2.9916)?;
/// let same = GeoPoint::parse(&Value::from("53.4084, -2.9916"))?;
/// assert_eq!(liverpool, same);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Creates a new GeoPoint with validated coordinates.
    ///
    /// # Errors
    /// Returns `InvalidGeoPoint` if a coordinate is NaN or out of range.
    pub fn new(lat: f64, lng: f64) -> StoreResult<Self> {
        Self::validate_coordinates(lat, lng)?;
        Ok(GeoPoint { lat, lng })
    }

    /// Builds a point from any of the accepted input shapes:
    /// - an array `[lat, lng]`
    /// - an object `{lat, lng}`
    /// - a string, either JSON for one of the shapes above or `"lat,lng"`
    ///
    /// Numeric strings are accepted for either coordinate.
    pub fn parse(input: &Value) -> StoreResult<Self> {
        match input {
            Value::Array(items) => {
                if items.len() != 2 {
                    return Err(invalid_point(&format!(
                        "expected [lat, lng], found {} coordinates",
                        items.len()
                    )));
                }
                GeoPoint::new(coordinate(&items[0], "lat")?, coordinate(&items[1], "lng")?)
            }
            Value::Document(doc) => {
                let lat = doc.get("lat").ok_or_else(|| invalid_point("lat is missing"))?;
                let lng = doc.get("lng").ok_or_else(|| invalid_point("lng is missing"))?;
                GeoPoint::new(coordinate(lat, "lat")?, coordinate(lng, "lng")?)
            }
            Value::String(text) => {
                let text = text.trim();
                if text.starts_with('{') || text.starts_with('[') {
                    let json: serde_json::Value = serde_json::from_str(text).map_err(|err| {
                        invalid_point(&format!("malformed JSON point '{}': {}", text, err))
                    })?;
                    return GeoPoint::parse(&Value::from(json));
                }

                let parts: Vec<&str> = text.split(',').map(str::trim).collect();
                if parts.len() != 2 {
                    return Err(invalid_point(&format!("expected 'lat,lng', found '{}'", text)));
                }
                GeoPoint::new(
                    coordinate(&Value::from(parts[0]), "lat")?,
                    coordinate(&Value::from(parts[1]), "lng")?,
                )
            }
            other => Err(invalid_point(&format!(
                "a point cannot be built from {} value {}",
                other.type_name(),
                other
            ))),
        }
    }

    fn validate_coordinates(lat: f64, lng: f64) -> StoreResult<()> {
        if lat.is_nan() || lng.is_nan() {
            return Err(invalid_point("coordinates must be numbers"));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid_point(&format!(
                "lat must be between -90 and 90 degrees, got: {}",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(invalid_point(&format!(
                "lng must be between -180 and 180 degrees, got: {}",
                lng
            )));
        }
        Ok(())
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Reads a stored location: a nested document holding numeric `lat`
    /// and `lng`. Returns `None` for anything else.
    pub(crate) fn from_stored(value: &Value) -> Option<GeoPoint> {
        let doc = value.as_document()?;
        let lat = doc.get("lat").and_then(Value::as_f64)?;
        let lng = doc.get("lng").and_then(Value::as_f64)?;
        Some(GeoPoint { lat, lng })
    }

    pub fn to_value(&self) -> Value {
        let mut doc = crate::collection::Document::new();
        // plain keys never fail
        let _ = doc.put("lat", self.lat);
        let _ = doc.put("lng", self.lng);
        Value::Document(doc)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeoPoint(lat={}, lng={})", self.lat, self.lng)
    }
}

impl From<GeoPoint> for Value {
    fn from(point: GeoPoint) -> Self {
        point.to_value()
    }
}

fn coordinate(value: &Value, name: &str) -> StoreResult<f64> {
    match value {
        Value::I64(_) | Value::F64(_) => value
            .as_f64()
            .ok_or_else(|| invalid_point(&format!("{} is not a number", name))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_point(&format!("{} '{}' is not a number", name, s))),
        other => Err(invalid_point(&format!("{} {} is not a number", name, other))),
    }
}

fn invalid_point(reason: &str) -> StoreError {
    log::error!("Invalid geo point: {}", reason);
    StoreError::new(&format!("Invalid geo point: {}", reason), ErrorKind::InvalidGeoPoint)
}
