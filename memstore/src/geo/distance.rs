use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::geo::GeoPoint;
use std::fmt::Display;

const DEG2RAD: f64 = 0.01745329252;

/// Unit a great-circle distance is expressed in.
///
/// Every unit is a linear rescaling of the angular distance, so each one
/// carries the earth radius measured in that unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
    Meters,
    Feet,
    Radians,
    Degrees,
}

impl DistanceUnit {
    /// Parses a unit name as it appears in a near clause.
    pub fn parse(name: &str) -> StoreResult<DistanceUnit> {
        match name.trim().to_ascii_lowercase().as_str() {
            "miles" => Ok(DistanceUnit::Miles),
            "kilometers" => Ok(DistanceUnit::Kilometers),
            "meters" => Ok(DistanceUnit::Meters),
            "feet" => Ok(DistanceUnit::Feet),
            "radians" => Ok(DistanceUnit::Radians),
            "degrees" => Ok(DistanceUnit::Degrees),
            _ => {
                log::error!("Unknown distance unit '{}'", name);
                Err(StoreError::new(
                    &format!("Unknown distance unit '{}'", name),
                    ErrorKind::FilterError,
                ))
            }
        }
    }

    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnit::Miles => 3958.75,
            DistanceUnit::Kilometers => 6370.99056,
            DistanceUnit::Meters => 6370990.56,
            DistanceUnit::Feet => 20902200.0,
            DistanceUnit::Radians => 1.0,
            DistanceUnit::Degrees => 57.29577951308,
        }
    }
}

impl Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DistanceUnit::Miles => "miles",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Meters => "meters",
            DistanceUnit::Feet => "feet",
            DistanceUnit::Radians => "radians",
            DistanceUnit::Degrees => "degrees",
        };
        write!(f, "{}", name)
    }
}

/// Great-circle distance between two points using the haversine formula.
pub fn distance(a: &GeoPoint, b: &GeoPoint, unit: DistanceUnit) -> f64 {
    let lat1 = a.lat() * DEG2RAD;
    let lat2 = b.lat() * DEG2RAD;
    let delta_lat = (b.lat() - a.lat()) * DEG2RAD;
    let delta_lng = (b.lng() - a.lng()) * DEG2RAD;

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    c * unit.earth_radius()
}
