//! Great-circle math on a spherical Earth.
//!
//! Pure functions, no state. All coordinates are WGS84 degrees.

use crate::model::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing (forward azimuth) from `a` to `b` in degrees [0, 360).
///
/// Returns 0 when the points coincide.
pub fn initial_bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    if y == 0.0 && x == 0.0 {
        return 0.0;
    }

    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    if bearing >= 360.0 { 0.0 } else { bearing }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn same_point_is_zero() {
        let p = pt(52.056_744_93, 1.279_863_81);
        assert!(distance_meters(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (pt(52.0567, 1.2798), pt(52.0607, 1.2813)),
            (pt(-33.86, 151.21), pt(51.50, -0.12)),
            (pt(0.0, 179.9), pt(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            assert!((ab - ba).abs() < 1e-6, "{ab} != {ba}");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn known_distance() {
        // Vienna to Bratislava, ~55 km.
        let dist = distance_meters(pt(48.2082, 16.3738), pt(48.1486, 17.1077));
        assert!(
            dist > 50_000.0 && dist < 60_000.0,
            "Expected ~55 km, got {dist:.0} m"
        );
    }

    #[test]
    fn one_degree_of_latitude() {
        // 2πR / 360
        let dist = distance_meters(pt(0.0, 0.0), pt(1.0, 0.0));
        assert!((dist - 111_194.9).abs() < 1.0, "got {dist}");
    }

    #[test]
    fn cardinal_bearings() {
        let origin = pt(0.0, 0.0);
        assert!((initial_bearing_degrees(origin, pt(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, pt(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, pt(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, pt(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_is_always_in_range() {
        let points = [pt(52.0, 1.0), pt(52.0, 0.999_999), pt(-10.0, 170.0), pt(60.0, -170.0)];
        for a in points {
            for b in points {
                let brg = initial_bearing_degrees(a, b);
                assert!((0.0..360.0).contains(&brg), "{brg}");
            }
        }
    }

    #[test]
    fn bearing_to_self_is_zero() {
        let p = pt(52.0579, 1.28);
        assert_eq!(initial_bearing_degrees(p, p), 0.0);
    }
}
