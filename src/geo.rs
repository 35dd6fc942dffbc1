// src/geo.rs
//! Great-circle distance over the WGS84 sphere. Every other component
//! (store radius query, aggregation radius filter) goes through this.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in km between `(lat, lon)` degree pairs `a` and `b`,
/// via the haversine formula.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1r = lat1.to_radians();
    let lat2r = lat2.to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn zero_distance_to_self() {
        let p = (40.0, -75.0);
        assert!(haversine_km(p, p).abs() < EPS);
    }

    #[test]
    fn symmetric() {
        let a = (40.7128, -74.0060); // NYC
        let b = (51.5074, -0.1278); // London
        let d1 = haversine_km(a, b);
        let d2 = haversine_km(b, a);
        assert!((d1 - d2).abs() < EPS);
    }

    #[test]
    fn one_degree_of_latitude() {
        // 1 degree of latitude is ~111.19 km on a 6371 km sphere.
        let d = haversine_km((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn known_city_pair() {
        // NYC -> London, ~5570 km.
        let d = haversine_km((40.7128, -74.0060), (51.5074, -0.1278));
        assert!((d - 5570.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn triangle_inequality() {
        let a = (40.0, -75.0);
        let b = (41.0, -74.0);
        let c = (39.5, -76.5);
        let ab = haversine_km(a, b);
        let bc = haversine_km(b, c);
        let ac = haversine_km(a, c);
        assert!(ac <= ab + bc + 1e-6);
    }
}
