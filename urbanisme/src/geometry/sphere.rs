//! Calculs sur la sphère terrestre (coordonnées géographiques en degrés)
//!
//! Les coordonnées suivent l'ordre GeoJSON: `x` = longitude, `y` = latitude.

use geo::Coord;

/// Rayon terrestre moyen utilisé par la formule de haversine, en mètres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance orthodromique (haversine) entre deux points, en mètres
pub fn haversine_distance(a: Coord, b: Coord) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlat = (b.y - a.y).to_radians();
    let dlon = (b.x - a.x).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Azimut initial de `from` vers `to`, en degrés dans ]-180, 180]
///
/// 0 = nord, 90 = est, 180 = sud, -90 = ouest.
pub fn bearing(from: Coord, to: Coord) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let dlon = (to.x - from.x).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees()
}

/// Décalage local (est, nord) en mètres de `p` par rapport à `origin`
///
/// Approximation équirectangulaire, valable à l'échelle d'une parcelle.
pub fn local_offset(origin: Coord, p: Coord) -> (f64, f64) {
    let k = EARTH_RADIUS_M.to_radians();
    let east = (p.x - origin.x) * k * origin.y.to_radians().cos();
    let north = (p.y - origin.y) * k;
    (east, north)
}

/// Vecteur unitaire (est, nord) correspondant à un azimut en degrés
pub fn bearing_vector(bearing_deg: f64) -> (f64, f64) {
    let (sin, cos) = bearing_deg.to_radians().sin_cos();
    (sin, cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lon: f64, lat: f64) -> Coord {
        Coord { x: lon, y: lat }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let d = haversine_distance(c(2.35, 48.0), c(2.35, 49.0));
        assert!((d - expected).abs() < 1e-6, "d={}", d);
    }

    #[test]
    fn test_short_distance_matches_reference() {
        // Deux points à ~100 m dans Grenoble, valeur de référence haversine
        let a = c(5.7245, 45.1885);
        let b = c(5.7245, 45.1894);
        let expected = 0.0009_f64.to_radians() * EARTH_RADIUS_M;
        let d = haversine_distance(a, b);
        assert!((d - expected).abs() / expected < 1e-3, "d={}", d);
    }

    #[test]
    fn test_symmetric_and_zero() {
        let a = c(2.35, 48.85);
        let b = c(2.36, 48.86);
        assert_eq!(haversine_distance(a, a), 0.0);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = c(0.0, 0.0);
        assert!((bearing(origin, c(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, c(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, c(0.0, -1.0)).abs() - 180.0).abs() < 1e-9);
        assert!((bearing(origin, c(-1.0, 0.0)) + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_offset() {
        let origin = c(5.0, 45.0);
        let (east, north) = local_offset(origin, c(5.0, 45.001));
        assert!(east.abs() < 1e-9);
        assert!((north - 111.19).abs() < 0.01, "north={}", north);

        let (east, _) = local_offset(origin, c(5.001, 45.0));
        assert!((east - 111.19 * 45.0_f64.to_radians().cos()).abs() < 0.01);
    }

    #[test]
    fn test_bearing_vector() {
        let (e, n) = bearing_vector(90.0);
        assert!((e - 1.0).abs() < 1e-12);
        assert!(n.abs() < 1e-12);
    }
}
