//! Geospatial ranking — haversine distance and nearest-store selection.
//!
//! Pure functions over borrowed data. Ranking produces fresh
//! [`RankedStore`] records; the caller's store list is never touched, so
//! a shared catalog can be ranked concurrently from many requests.

use shopclerk_core::{GeoError, GeoPoint, RankedStore, Store};
use tracing::debug;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance between two points, in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lng - a.lng).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Rank `stores` by distance from `origin`, nearest first.
///
/// Returns at most `max_results` entries, each a new [`RankedStore`] with
/// the distance truncated to whole meters. Ties keep the input order
/// (stable sort). Fails with [`GeoError::InvalidCoordinate`] when the
/// origin or any store coordinate is non-finite or out of range — the
/// caller decides whether to drop the store context or surface the error.
pub fn nearest(
    origin: GeoPoint,
    stores: &[Store],
    max_results: usize,
) -> Result<Vec<RankedStore>, GeoError> {
    if !origin.is_valid() {
        return Err(GeoError::InvalidCoordinate {
            lat: origin.lat,
            lng: origin.lng,
        });
    }

    let mut ranked = Vec::with_capacity(stores.len());
    for store in stores {
        let point = GeoPoint::new(store.lat, store.lng);
        if !point.is_valid() {
            return Err(GeoError::InvalidCoordinate {
                lat: store.lat,
                lng: store.lng,
            });
        }
        ranked.push(RankedStore {
            store: store.clone(),
            distance_m: haversine_m(origin, point) as u64,
        });
    }

    ranked.sort_by_key(|r| r.distance_m);
    ranked.truncate(max_results);

    debug!(
        candidates = stores.len(),
        returned = ranked.len(),
        "ranked stores by distance"
    );

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(name: &str, lat: f64, lng: f64) -> Store {
        Store {
            name: name.into(),
            lat,
            lng,
            promos: vec![],
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(51.5074, -0.1278);
        let ab = haversine_m(a, b);
        let ba = haversine_m(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        // ~111.19 km per degree at the equator.
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn colocated_store_ranks_first_with_zero_distance() {
        let stores = vec![store("X", 0.0, 0.0), store("Y", 0.0, 1.0)];
        let ranked = nearest(GeoPoint::new(0.0, 0.0), &stores, 1).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].store.name, "X");
        assert_eq!(ranked[0].distance_m, 0);
    }

    #[test]
    fn sorted_ascending_by_distance() {
        let stores = vec![
            store("far", 0.0, 2.0),
            store("near", 0.0, 0.1),
            store("mid", 0.0, 1.0),
        ];
        let ranked = nearest(GeoPoint::new(0.0, 0.0), &stores, 10).unwrap();
        let names: Vec<_> = ranked.iter().map(|r| r.store.name.as_str()).collect();
        assert_eq!(names, ["near", "mid", "far"]);
        assert!(ranked.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
    }

    #[test]
    fn returns_at_most_max_results() {
        let stores: Vec<_> = (0..5).map(|i| store(&format!("s{i}"), 0.0, i as f64)).collect();
        assert_eq!(nearest(GeoPoint::new(0.0, 0.0), &stores, 3).unwrap().len(), 3);
        assert_eq!(nearest(GeoPoint::new(0.0, 0.0), &stores, 10).unwrap().len(), 5);
    }

    #[test]
    fn ties_keep_input_order() {
        // Equidistant east and west of the origin.
        let stores = vec![store("east", 0.0, 1.0), store("west", 0.0, -1.0)];
        let ranked = nearest(GeoPoint::new(0.0, 0.0), &stores, 2).unwrap();
        assert_eq!(ranked[0].store.name, "east");
        assert_eq!(ranked[1].store.name, "west");
    }

    #[test]
    fn caller_slice_untouched() {
        let stores = vec![store("X", 0.0, 0.0), store("Y", 0.0, 1.0)];
        let before = snapshot(&stores);
        let _ = nearest(GeoPoint::new(10.0, 10.0), &stores, 2).unwrap();
        assert_eq!(snapshot(&stores), before);
    }

    fn snapshot(stores: &[Store]) -> String {
        stores
            .iter()
            .map(|s| format!("{}|{}|{}|{}", s.name, s.lat, s.lng, s.promos.len()))
            .collect::<Vec<_>>()
            .join(";")
    }

    #[test]
    fn invalid_origin_rejected() {
        let stores = vec![store("X", 0.0, 0.0)];
        assert!(matches!(
            nearest(GeoPoint::new(91.0, 0.0), &stores, 1),
            Err(GeoError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            nearest(GeoPoint::new(f64::NAN, 0.0), &stores, 1),
            Err(GeoError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn invalid_store_coordinate_rejected() {
        let stores = vec![store("bad", 0.0, 200.0)];
        assert!(matches!(
            nearest(GeoPoint::new(0.0, 0.0), &stores, 1),
            Err(GeoError::InvalidCoordinate { lng, .. }) if lng == 200.0
        ));
    }

    #[test]
    fn empty_store_list_yields_empty_ranking() {
        let ranked = nearest(GeoPoint::new(0.0, 0.0), &[], 3).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn distance_truncated_to_whole_meters() {
        let stores = vec![store("X", 0.0, 0.00001)];
        let ranked = nearest(GeoPoint::new(0.0, 0.0), &stores, 1).unwrap();
        // ~1.11 m — truncation, not rounding.
        assert_eq!(ranked[0].distance_m, 1);
    }
}
