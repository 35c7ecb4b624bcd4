//! Geographic proximity queries.
//!
//! A where clause may carry one near clause on a location field. The query
//! pipeline extracts it with [extract_near], then [apply_near] drops
//! documents outside the distance bounds and orders the rest nearest first.
//!
//! Locations are stored as nested documents `{lat, lng}`; the target point
//! of a near clause accepts any shape [GeoPoint::parse] understands.

mod distance;
mod geo_point;
mod near;

pub use distance::*;
pub use geo_point::*;
pub use near::*;
