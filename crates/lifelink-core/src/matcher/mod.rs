//! Donor matching engine.
//!
//! Pipeline: Patient lookup → Compatibility → Candidate location → Scoring → Ranking
//!
//! Store reads are blocking and run on tokio's blocking pool. The per-donor
//! history reads fan out concurrently and are gathered before ranking; the
//! final order depends only on scores, distances and ids, never on the order
//! reads complete in.

mod compatibility;
mod locator;
mod ranker;
mod scorer;
mod store;

pub use compatibility::*;
pub use locator::*;
pub use ranker::*;
pub use scorer::*;
pub use store::*;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::MatchConfig;
use crate::db::DbError;
use crate::models::{MatchQuery, Patient, RequestStatusCounts, ScoredCandidate};

/// Matching errors.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Patient ID is required")]
    MissingPatientId,

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Invalid blood type: {0:?}")]
    InvalidBloodType(String),

    #[error("Invalid location: [{longitude}, {latitude}]")]
    InvalidLocation { longitude: f64, latitude: f64 },

    #[error("Match timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// Cause is kept as the error source and logged, not shown to callers.
    #[error("Server error finding matches")]
    Store(#[source] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// The caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MatchError::MissingPatientId
                | MatchError::PatientNotFound(_)
                | MatchError::InvalidLocation { .. }
        )
    }

    /// Retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::UpstreamTimeout(_))
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            MatchError::MissingPatientId | MatchError::InvalidLocation { .. } => 400,
            MatchError::PatientNotFound(_) => 404,
            MatchError::UpstreamTimeout(_) => 504,
            MatchError::InvalidBloodType(_) | MatchError::Store(_) | MatchError::Internal(_) => 500,
        }
    }
}

impl From<DbError> for MatchError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::InvalidBloodType(t) => MatchError::InvalidBloodType(t),
            other => MatchError::Store(other),
        }
    }
}

impl From<tokio::task::JoinError> for MatchError {
    fn from(e: tokio::task::JoinError) -> Self {
        MatchError::Internal(format!("store task failed: {}", e))
    }
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Main matcher that coordinates the full pipeline.
pub struct Matcher {
    patients: Arc<dyn PatientStore>,
    donors: Arc<dyn DonorStore>,
    history: Arc<dyn DonationHistory>,
    table: CompatibilityTable,
    config: MatchConfig,
}

impl Matcher {
    /// Create a matcher backed by a single store implementing every interface.
    pub fn new<S>(store: Arc<S>, config: MatchConfig) -> Self
    where
        S: PatientStore + DonorStore + DonationHistory + 'static,
    {
        Self::from_parts(store.clone(), store.clone(), store, config)
    }

    /// Create a matcher from separate stores.
    pub fn from_parts(
        patients: Arc<dyn PatientStore>,
        donors: Arc<dyn DonorStore>,
        history: Arc<dyn DonationHistory>,
        config: MatchConfig,
    ) -> Self {
        Self {
            patients,
            donors,
            history,
            table: CompatibilityTable::standard(),
            config,
        }
    }

    /// Find and rank compatible donors near a patient.
    ///
    /// Returns an empty list (not an error) when an explicit blood type filter
    /// is incompatible with the patient. Fails with `UpstreamTimeout` if the
    /// whole pipeline exceeds the configured timeout.
    pub async fn find_match(&self, query: &MatchQuery) -> MatchResult<Vec<ScoredCandidate>> {
        let patient_id = query.patient_id.trim();
        if patient_id.is_empty() {
            return Err(MatchError::MissingPatientId);
        }

        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, self.run(patient_id, query)).await {
            Ok(result) => result,
            Err(_) => Err(MatchError::UpstreamTimeout(timeout)),
        };

        match &result {
            Ok(ranked) => {
                tracing::info!(patient_id, results = ranked.len(), "Match complete");
            }
            Err(MatchError::Store(cause)) => {
                tracing::error!(patient_id, error = %cause, "Store failure while matching");
            }
            Err(e) => {
                tracing::warn!(patient_id, error = %e, "Match failed");
            }
        }
        result
    }

    async fn run(&self, patient_id: &str, query: &MatchQuery) -> MatchResult<Vec<ScoredCandidate>> {
        // Step 1: Load the patient
        let patient = self.load_patient(patient_id).await?;

        // Step 2: Resolve compatible donor types
        let compatibility = self
            .table
            .resolve(&patient.blood_type, query.blood_type.as_deref())
            .map_err(|e| MatchError::InvalidBloodType(e.0))?;

        let (eligible, effective) = match compatibility {
            Compatibility::Eligible {
                eligible,
                effective,
            } => (eligible, effective),
            Compatibility::NoEligibleCandidates => {
                tracing::debug!(
                    patient_id,
                    filter = ?query.blood_type,
                    "Blood type filter incompatible with patient, skipping search"
                );
                return Ok(Vec::new());
            }
        };

        // Step 3: Locate candidates
        let locator = CandidateLocator::new(&self.config);
        let radius_m = locator.effective_radius_m(query.radius_km);
        let donors = Arc::clone(&self.donors);
        let origin = patient.location;
        let filters = CandidateFilters {
            name: query.name.clone(),
        };
        let types = effective;
        let candidates = tokio::task::spawn_blocking(move || {
            locator.find_candidates(donors.as_ref(), origin, radius_m, &types, &filters)
        })
        .await??;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Step 4: Fetch every candidate's history concurrently
        let histories = self
            .gather_histories(candidates.iter().map(|c| c.donor.id.clone()).collect())
            .await?;

        // Step 5: Score and rank
        let scorer = Scorer::new(&self.table);
        let ctx = ScoringContext {
            eligible,
            urgency: patient.effective_urgency(),
            radius_m,
        };
        let scored = candidates
            .into_iter()
            .zip(histories.iter())
            .map(|(candidate, history)| scorer.score(candidate, &ctx, history))
            .collect();

        Ok(rank(scored, self.config.result_limit))
    }

    async fn load_patient(&self, patient_id: &str) -> MatchResult<Patient> {
        let patients = Arc::clone(&self.patients);
        let id = patient_id.to_string();
        tokio::task::spawn_blocking(move || patients.find_patient(&id))
            .await??
            .ok_or_else(|| MatchError::PatientNotFound(patient_id.to_string()))
    }

    /// Read status counts for each donor, preserving input order.
    ///
    /// Reads run concurrently, at most `max_concurrent_reads` at a time.
    async fn gather_histories(&self, donor_ids: Vec<String>) -> MatchResult<Vec<RequestStatusCounts>> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_reads.max(1)));
        let mut reads = JoinSet::new();
        let count = donor_ids.len();
        for (idx, donor_id) in donor_ids.into_iter().enumerate() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| MatchError::Internal(format!("read limiter closed: {}", e)))?;
            let history = Arc::clone(&self.history);
            reads.spawn_blocking(move || {
                let _permit = permit;
                (idx, history.status_counts(&donor_id))
            });
        }

        let mut histories = vec![RequestStatusCounts::default(); count];
        while let Some(joined) = reads.join_next().await {
            let (idx, counts) = joined?;
            histories[idx] = counts?;
        }

        tracing::debug!(donors = count, "Gathered donor histories");
        Ok(histories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{BloodType, Donor, GeoPoint, Urgency, EARTH_RADIUS_M};
    use std::sync::Mutex;

    fn setup() -> (Arc<Mutex<Database>>, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Asha", "O+", GeoPoint::new(77.59, 12.97))
            .with_urgency(Urgency::High);
        db.insert_patient(&patient).unwrap();
        (Arc::new(Mutex::new(db)), patient)
    }

    fn add_donor(db: &Mutex<Database>, name: &str, blood_type: BloodType, km_north: f64) -> Donor {
        let lat = 12.97 + (km_north * 1000.0 / EARTH_RADIUS_M).to_degrees();
        let mut d = Donor::new(name, format!("{}@example.com", name), blood_type, GeoPoint::new(77.59, lat));
        d.verified = true;
        d.otp_verified = true;
        db.lock().unwrap().upsert_donor(&d).unwrap();
        d
    }

    #[tokio::test]
    async fn test_find_match_ranks_compatible_donors() {
        let (db, patient) = setup();
        add_donor(&db, "opos", BloodType::OPos, 1.0);
        add_donor(&db, "oneg", BloodType::ONeg, 1.0);
        add_donor(&db, "apos", BloodType::APos, 0.5);

        let matcher = Matcher::new(db, MatchConfig::default());
        let results = matcher
            .find_match(&MatchQuery::new(&patient.id).radius_km(20.0))
            .await
            .unwrap();

        let names: Vec<&str> = results.iter().map(|c| c.name.as_str()).collect();
        // O- outranks O+ at equal distance; A+ cannot give to O+
        assert_eq!(names, vec!["oneg", "opos"]);
        assert_eq!(results[0].score_breakdown.urgency, Urgency::High);
    }

    #[tokio::test]
    async fn test_missing_patient_id() {
        let (db, _) = setup();
        let matcher = Matcher::new(db, MatchConfig::default());
        let err = matcher.find_match(&MatchQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, MatchError::MissingPatientId));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_unknown_patient() {
        let (db, _) = setup();
        let matcher = Matcher::new(db, MatchConfig::default());
        let err = matcher.find_match(&MatchQuery::new("ghost")).await.unwrap_err();
        assert!(matches!(err, MatchError::PatientNotFound(ref id) if id == "ghost"));
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_store_errors_are_opaque() {
        let err = MatchError::from(DbError::NotFound("secret table".into()));
        assert_eq!(err.to_string(), "Server error finding matches");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_retryable());

        let err = MatchError::from(DbError::InvalidBloodType("Z+".into()));
        assert!(matches!(err, MatchError::InvalidBloodType(_)));
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = MatchError::UpstreamTimeout(Duration::from_millis(10));
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 504);
    }
}
