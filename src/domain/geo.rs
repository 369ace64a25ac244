//! Haversine great-circle distance

use crate::domain::constants::matching::EARTH_RADIUS_METERS;

/// Distance in meters between two WGS84 coordinate pairs.
///
/// Haversine is accurate to well under a meter at the scale of the fuzzy
/// match radius, which is all the pipeline needs.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert!(haversine_meters(33.5, 126.5, 33.5, 126.5) < f64::EPSILON);
    }

    #[test]
    fn known_distance_between_city_halls() {
        // 제주시청 to 서귀포시청, roughly 28.5 km
        let d = haversine_meters(33.4996, 126.5312, 33.2541, 126.5601);
        assert!((27_000.0..30_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn short_distances_are_meter_scale() {
        // ~111 m per 0.001 degree of latitude
        let d = haversine_meters(33.5000, 126.5000, 33.5010, 126.5000);
        assert!((100.0..125.0).contains(&d), "got {d}");
    }
}
