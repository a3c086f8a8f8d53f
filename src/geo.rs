//! Small geodesy helpers: a latitude/longitude point, great-circle
//! distance, and the meters-to-feet conversion used by the step counter.

/// Mean Earth radius, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const FEET_PER_METER: f64 = 3.280_839_895;

/// A point on the Earth's surface, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Straight-line (great-circle) distance to `other`, in meters,
    /// via the haversine formula. Always non-negative.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_M * c
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Converts a distance in meters to feet.
pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}
