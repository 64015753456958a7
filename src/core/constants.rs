//! Physical constants and system parameters

/// Mean Earth radius used by the haversine distance (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Valid latitude range in degrees
pub const LAT_RANGE_DEG: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range in degrees
pub const LNG_RANGE_DEG: (f64, f64) = (-180.0, 180.0);

/// Lower bound applied to the base-point radius on the rebuild paths (meters)
pub const REBUILD_RADIUS_FLOOR_M: f64 = 50.0;

/// Semi-major axis of the Krasovsky 1940 ellipsoid used by GCJ-02 (meters)
pub const GCJ02_SEMI_MAJOR_M: f64 = 6_378_245.0;

/// First eccentricity squared of the Krasovsky 1940 ellipsoid
pub const GCJ02_ECCENTRICITY_SQ: f64 = 0.006_693_421_622_965_943_23;

/// Bounding box outside which the GCJ-02 transform is bypassed:
/// (lng_min, lng_max, lat_min, lat_max)
pub const GCJ02_BBOX: (f64, f64, f64, f64) = (72.004, 137.8347, 0.8293, 55.8271);
