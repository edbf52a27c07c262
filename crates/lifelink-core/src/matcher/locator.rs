//! Candidate location: radius policy plus the proximity query.

use std::cmp::Ordering;

use crate::config::MatchConfig;
use crate::models::{BloodType, CandidateRecord, GeoPoint, ProximityQuery};

use super::{DonorStore, MatchError, MatchResult};

/// Optional attribute filters applied alongside the hard filters.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilters {
    /// Case-insensitive donor name substring
    pub name: Option<String>,
}

/// Finds eligible donors near a patient.
#[derive(Debug, Clone, Copy)]
pub struct CandidateLocator {
    default_radius_m: f64,
    max_radius_m: f64,
}

impl CandidateLocator {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            default_radius_m: config.default_radius_km * 1000.0,
            max_radius_m: config.max_radius_km * 1000.0,
        }
    }

    /// Search radius in meters for a requested radius in km.
    ///
    /// Missing, zero, negative or non-finite requests fall back to the default;
    /// anything larger than the maximum is clamped to it.
    pub fn effective_radius_m(&self, radius_km: Option<f64>) -> f64 {
        match radius_km {
            Some(km) if km.is_finite() && km > 0.0 => (km * 1000.0).min(self.max_radius_m),
            _ => self.default_radius_m.min(self.max_radius_m),
        }
    }

    /// Query the store for eligible donors within `radius_m` of `origin`.
    ///
    /// Hard filters are re-checked on whatever the store returns. Results are
    /// ordered by distance ascending, ties by donor id.
    pub fn find_candidates(
        &self,
        store: &dyn DonorStore,
        origin: GeoPoint,
        radius_m: f64,
        eligible_types: &[BloodType],
        filters: &CandidateFilters,
    ) -> MatchResult<Vec<CandidateRecord>> {
        if !origin.is_valid() {
            return Err(MatchError::InvalidLocation {
                longitude: origin.longitude,
                latitude: origin.latitude,
            });
        }

        let radius_m = radius_m.min(self.max_radius_m);
        let query = ProximityQuery {
            origin,
            radius_m,
            blood_types: eligible_types.to_vec(),
            name: filters.name.clone().filter(|n| !n.trim().is_empty()),
        };

        let mut candidates = store.find_nearby(&query)?;
        candidates.retain(|c| c.donor.is_eligible() && c.distance_meters <= radius_m);
        candidates.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.donor.id.cmp(&b.donor.id))
        });

        tracing::debug!(
            radius_m,
            types = eligible_types.len(),
            found = candidates.len(),
            "Located candidates"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbResult};
    use crate::models::{Donor, EARTH_RADIUS_M};
    use std::sync::Mutex;

    const ORIGIN: GeoPoint = GeoPoint {
        longitude: 77.59,
        latitude: 12.97,
    };

    fn locator() -> CandidateLocator {
        CandidateLocator::new(&MatchConfig::default())
    }

    fn eligible_donor(name: &str, km_north: f64) -> Donor {
        let lat = ORIGIN.latitude + (km_north * 1000.0 / EARTH_RADIUS_M).to_degrees();
        let mut d = Donor::new(
            name,
            format!("{}@example.com", name.to_lowercase()),
            BloodType::ONeg,
            GeoPoint::new(ORIGIN.longitude, lat),
        );
        d.verified = true;
        d.otp_verified = true;
        d
    }

    /// Store that returns a fixed, unsorted list and records the query it saw.
    struct FixedStore {
        records: Vec<CandidateRecord>,
        seen: Mutex<Option<ProximityQuery>>,
    }

    impl DonorStore for FixedStore {
        fn find_nearby(&self, query: &ProximityQuery) -> DbResult<Vec<CandidateRecord>> {
            *self.seen.lock().unwrap() = Some(query.clone());
            Ok(self.records.clone())
        }
    }

    #[test]
    fn test_effective_radius() {
        let locator = locator();
        assert_eq!(locator.effective_radius_m(None), 50_000.0);
        assert_eq!(locator.effective_radius_m(Some(20.0)), 20_000.0);
        assert_eq!(locator.effective_radius_m(Some(10_000.0)), 200_000.0);
        assert_eq!(locator.effective_radius_m(Some(0.0)), 50_000.0);
        assert_eq!(locator.effective_radius_m(Some(-5.0)), 50_000.0);
        assert_eq!(locator.effective_radius_m(Some(f64::NAN)), 50_000.0);
    }

    #[test]
    fn test_invalid_origin_rejected_before_query() {
        let store = FixedStore {
            records: vec![],
            seen: Mutex::new(None),
        };
        let result = locator().find_candidates(
            &store,
            GeoPoint::new(181.0, 0.0),
            10_000.0,
            &[BloodType::ONeg],
            &CandidateFilters::default(),
        );
        assert!(matches!(result, Err(MatchError::InvalidLocation { .. })));
        assert!(store.seen.lock().unwrap().is_none());
    }

    #[test]
    fn test_orders_store_results_and_clamps_radius() {
        let store = FixedStore {
            records: vec![
                CandidateRecord { donor: eligible_donor("c", 3.0), distance_meters: 3_000.0 },
                CandidateRecord { donor: eligible_donor("a", 1.0), distance_meters: 1_000.0 },
                CandidateRecord { donor: eligible_donor("b", 1.0), distance_meters: 1_000.0 },
            ],
            seen: Mutex::new(None),
        };

        let found = locator()
            .find_candidates(
                &store,
                ORIGIN,
                1_000_000.0,
                &[BloodType::ONeg],
                &CandidateFilters { name: Some("  ".into()) },
            )
            .unwrap();

        let distances: Vec<f64> = found.iter().map(|c| c.distance_meters).collect();
        assert_eq!(distances, vec![1_000.0, 1_000.0, 3_000.0]);
        assert!(found[0].donor.id < found[1].donor.id);

        let seen = store.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.radius_m, 200_000.0);
        assert!(seen.name.is_none());
    }

    #[test]
    fn test_drops_ineligible_store_results() {
        let mut away = eligible_donor("away", 1.0);
        away.availability = false;
        let mut unverified = eligible_donor("unverified", 1.0);
        unverified.otp_verified = false;
        let store = FixedStore {
            records: vec![
                CandidateRecord { donor: away, distance_meters: 1_000.0 },
                CandidateRecord { donor: unverified, distance_meters: 1_000.0 },
                CandidateRecord { donor: eligible_donor("ready", 2.0), distance_meters: 2_000.0 },
            ],
            seen: Mutex::new(None),
        };

        let found = locator()
            .find_candidates(&store, ORIGIN, 10_000.0, &[BloodType::ONeg], &CandidateFilters::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].donor.name, "ready");
    }

    #[test]
    fn test_against_sqlite_store() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_donor(&eligible_donor("Near", 2.0)).unwrap();
        db.upsert_donor(&eligible_donor("Beyond", 30.0)).unwrap();
        let store = Mutex::new(db);

        let locator = locator();
        let radius = locator.effective_radius_m(Some(20.0));
        let found = locator
            .find_candidates(&store, ORIGIN, radius, &[BloodType::ONeg], &CandidateFilters::default())
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].donor.name, "Near");
    }
}
