//! LifeLink Core Library
//!
//! Donor matching and scoring engine for the LifeLink blood donation network.
//!
//! # Architecture
//!
//! ```text
//! findMatch(patientId, radiusKm?, name?, bloodType?)
//!                     │
//!         ┌───────────▼───────────┐
//!         │  Compatibility        │  patient type → eligible donor types
//!         │  Resolver             │  (incompatible filter → empty result)
//!         └───────────┬───────────┘
//!                     │
//!         ┌───────────▼───────────┐
//!         │  Candidate Locator    │  spherical radius query + hard filters
//!         └───────────┬───────────┘
//!                     │
//!      ┌──────────────┼──────────────┐
//!      ▼              ▼              ▼        donation history reads,
//!   history        history        history     fanned out concurrently
//!      └──────────────┼──────────────┘
//!                     │
//!         ┌───────────▼───────────┐
//!         │  Scorer               │  distance 40% · blood type 30%
//!         │                       │  activity 20% · urgency 10%
//!         └───────────┬───────────┘
//!                     │
//!         ┌───────────▼───────────┐
//!         │  Ranker               │  score ↓, distance ↑, top 20
//!         └───────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite stores for patients, donors and donation requests
//! - [`models`]: Domain types (Patient, Donor, ScoredCandidate, etc.)
//! - [`matcher`]: Compatibility, location, scoring and ranking
//! - [`config`]: Radius, result limit and timeout tunables

pub mod config;
pub mod db;
pub mod matcher;
pub mod models;

// Re-export commonly used types
pub use config::MatchConfig;
pub use db::Database;
pub use matcher::{MatchError, Matcher};
pub use models::{
    BloodType, DonationRequest, Donor, GeoPoint, MatchQuery, Patient, RequestStatus,
    ScoreBreakdown, ScoredCandidate, Urgency,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LifeLinkError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<db::DbError> for LifeLinkError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => LifeLinkError::NotFound(what),
            db::DbError::Constraint(what) => LifeLinkError::InvalidInput(what),
            other => LifeLinkError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LifeLinkError {
    fn from(e: serde_json::Error) -> Self {
        LifeLinkError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for LifeLinkError {
    fn from(e: config::ConfigError) -> Self {
        LifeLinkError::InvalidInput(e.to_string())
    }
}

impl From<MatchError> for LifeLinkError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::PatientNotFound(_) => LifeLinkError::NotFound(e.to_string()),
            MatchError::MissingPatientId | MatchError::InvalidLocation { .. } => {
                LifeLinkError::InvalidInput(e.to_string())
            }
            MatchError::UpstreamTimeout(_) => LifeLinkError::Timeout(e.to_string()),
            MatchError::InvalidBloodType(_) | MatchError::Store(_) | MatchError::Internal(_) => {
                LifeLinkError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for LifeLinkError {
    fn from(e: std::io::Error) -> Self {
        LifeLinkError::DatabaseError(format!("Runtime error: {}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for LifeLinkError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        LifeLinkError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<LifeLinkCore>, LifeLinkError> {
    let db = Database::open(&path)?;
    LifeLinkCore::new(db, MatchConfig::default())
}

/// Open a database with a JSON match configuration.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<LifeLinkCore>, LifeLinkError> {
    let config = MatchConfig::from_json(&config_json)?;
    let db = Database::open(&path)?;
    LifeLinkCore::new(db, config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<LifeLinkCore>, LifeLinkError> {
    let db = Database::open_in_memory()?;
    LifeLinkCore::new(db, MatchConfig::default())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database and matcher wrapper for FFI.
#[derive(uniffi::Object)]
pub struct LifeLinkCore {
    db: Arc<Mutex<Database>>,
    matcher: Matcher,
    runtime: tokio::runtime::Runtime,
}

impl LifeLinkCore {
    fn new(db: Database, config: MatchConfig) -> Result<Arc<Self>, LifeLinkError> {
        let db = Arc::new(Mutex::new(db));
        Ok(Arc::new(Self {
            matcher: Matcher::new(Arc::clone(&db), config),
            db,
            runtime: tokio::runtime::Runtime::new()?,
        }))
    }

    fn run_match(&self, query: &MatchQuery) -> Result<Vec<ScoredCandidate>, LifeLinkError> {
        Ok(self.runtime.block_on(self.matcher.find_match(query))?)
    }
}

#[uniffi::export]
impl LifeLinkCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient.
    pub fn create_patient(
        &self,
        name: String,
        blood_type: String,
        longitude: f64,
        latitude: f64,
        urgency: Option<String>,
    ) -> Result<FfiPatient, LifeLinkError> {
        let mut patient = Patient::new(name, blood_type, GeoPoint::new(longitude, latitude));
        if let Some(label) = urgency {
            let level = Urgency::parse(&label)
                .ok_or_else(|| LifeLinkError::InvalidInput(format!("Unknown urgency: {}", label)))?;
            patient = patient.with_urgency(level);
        }

        let db = self.db.lock()?;
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, LifeLinkError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    // =========================================================================
    // Donor Operations
    // =========================================================================

    /// Add or update a donor.
    pub fn upsert_donor(&self, donor: FfiDonor) -> Result<(), LifeLinkError> {
        let donor = Donor::try_from(donor)?;
        let db = self.db.lock()?;
        db.upsert_donor(&donor)?;
        Ok(())
    }

    /// Get a donor by ID.
    pub fn get_donor(&self, id: String) -> Result<Option<FfiDonor>, LifeLinkError> {
        let db = self.db.lock()?;
        let donor = db.get_donor(&id)?;
        Ok(donor.map(|d| d.into()))
    }

    /// Mark a donor available or unavailable.
    pub fn set_donor_availability(&self, id: String, available: bool) -> Result<bool, LifeLinkError> {
        let db = self.db.lock()?;
        Ok(db.set_donor_availability(&id, available)?)
    }

    /// Record admin and OTP verification results.
    pub fn set_donor_verification(
        &self,
        id: String,
        verified: bool,
        otp_verified: bool,
    ) -> Result<bool, LifeLinkError> {
        let db = self.db.lock()?;
        Ok(db.set_donor_verification(&id, verified, otp_verified)?)
    }

    // =========================================================================
    // Donation Request Operations
    // =========================================================================

    /// Track a new pending request to a donor.
    pub fn record_donation_request(
        &self,
        patient_id: String,
        donor_id: String,
    ) -> Result<FfiDonationRequest, LifeLinkError> {
        let request = DonationRequest::new(patient_id, donor_id);
        let db = self.db.lock()?;
        db.insert_donation_request(&request)?;
        Ok(request.into())
    }

    /// Move a request to a new status ("Accepted", "Completed", ...).
    pub fn update_request_status(
        &self,
        request_id: String,
        status: String,
    ) -> Result<FfiDonationRequest, LifeLinkError> {
        let status: RequestStatus = status.parse().map_err(LifeLinkError::InvalidInput)?;
        let db = self.db.lock()?;
        let request = db.update_request_status(&request_id, status)?;
        Ok(request.into())
    }

    // =========================================================================
    // Matching Operations
    // =========================================================================

    /// Find and rank compatible donors for a patient.
    pub fn find_match(&self, query: FfiMatchQuery) -> Result<Vec<FfiScoredCandidate>, LifeLinkError> {
        let ranked = self.run_match(&query.into())?;
        Ok(ranked.into_iter().map(|c| c.into()).collect())
    }

    /// Find matches and return the JSON array served to web clients.
    pub fn find_match_json(&self, query: FfiMatchQuery) -> Result<String, LifeLinkError> {
        let ranked = self.run_match(&query.into())?;
        Ok(serde_json::to_string(&ranked)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub blood_type: String,
    pub longitude: f64,
    pub latitude: f64,
    pub urgency: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            blood_type: patient.blood_type,
            longitude: patient.location.longitude,
            latitude: patient.location.latitude,
            urgency: patient.urgency.map(|u| u.as_str().to_string()),
        }
    }
}

/// FFI-safe badge.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBadge {
    pub name: String,
    pub description: Option<String>,
}

/// FFI-safe donor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDonor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_type: String,
    pub longitude: f64,
    pub latitude: f64,
    pub verified: bool,
    pub otp_verified: bool,
    pub availability: bool,
    pub points: u32,
    pub badges: Vec<FfiBadge>,
}

impl From<Donor> for FfiDonor {
    fn from(donor: Donor) -> Self {
        Self {
            id: donor.id,
            name: donor.name,
            email: donor.email,
            phone: donor.phone,
            blood_type: donor.blood_type.to_string(),
            longitude: donor.location.longitude,
            latitude: donor.location.latitude,
            verified: donor.verified,
            otp_verified: donor.otp_verified,
            availability: donor.availability,
            points: donor.points,
            badges: donor.badges.into_iter().map(|b| b.into()).collect(),
        }
    }
}

impl TryFrom<FfiDonor> for Donor {
    type Error = LifeLinkError;

    fn try_from(donor: FfiDonor) -> Result<Self, Self::Error> {
        let blood_type: BloodType = donor
            .blood_type
            .parse()
            .map_err(|e: models::UnknownBloodType| LifeLinkError::InvalidInput(e.to_string()))?;
        // Empty id means "new donor"
        let id = if donor.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            donor.id
        };

        Ok(Donor {
            id,
            name: donor.name,
            email: donor.email.to_lowercase(),
            phone: donor.phone,
            blood_type,
            location: GeoPoint::new(donor.longitude, donor.latitude),
            verified: donor.verified,
            otp_verified: donor.otp_verified,
            availability: donor.availability,
            points: donor.points,
            badges: donor
                .badges
                .into_iter()
                .map(|b| models::Badge {
                    name: b.name,
                    description: b.description,
                })
                .collect(),
        })
    }
}

impl From<models::Badge> for FfiBadge {
    fn from(badge: models::Badge) -> Self {
        Self {
            name: badge.name,
            description: badge.description,
        }
    }
}

/// FFI-safe donation request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDonationRequest {
    pub id: String,
    pub patient_id: String,
    pub donor_id: String,
    pub status: String,
    pub requested_at: String,
    pub responded_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<DonationRequest> for FfiDonationRequest {
    fn from(request: DonationRequest) -> Self {
        Self {
            id: request.id,
            patient_id: request.patient_id,
            donor_id: request.donor_id,
            status: request.status.to_string(),
            requested_at: request.requested_at,
            responded_at: request.responded_at,
            completed_at: request.completed_at,
        }
    }
}

/// FFI-safe match query.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatchQuery {
    pub patient_id: String,
    pub radius_km: Option<f64>,
    pub name: Option<String>,
    pub blood_type: Option<String>,
}

impl From<FfiMatchQuery> for MatchQuery {
    fn from(query: FfiMatchQuery) -> Self {
        MatchQuery {
            patient_id: query.patient_id,
            radius_km: query.radius_km,
            name: query.name,
            blood_type: query.blood_type,
        }
    }
}

/// FFI-safe scored candidate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScoredCandidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_type: String,
    pub longitude: f64,
    pub latitude: f64,
    pub availability: bool,
    pub badges: Vec<FfiBadge>,
    pub points: u32,
    pub distance_km: f64,
    pub match_score: f64,
    pub distance_score: u8,
    pub blood_type_score: u8,
    pub activity_score: u8,
    pub urgency: String,
}

impl From<ScoredCandidate> for FfiScoredCandidate {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            email: candidate.email,
            phone: candidate.phone,
            blood_type: candidate.blood_type.to_string(),
            longitude: candidate.location.longitude,
            latitude: candidate.location.latitude,
            availability: candidate.availability,
            badges: candidate.badges.into_iter().map(|b| b.into()).collect(),
            points: candidate.points,
            distance_km: candidate.distance_km,
            match_score: candidate.match_score,
            distance_score: candidate.score_breakdown.distance,
            blood_type_score: candidate.score_breakdown.blood_type,
            activity_score: candidate.score_breakdown.activity,
            urgency: candidate.score_breakdown.urgency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_donor(name: &str, blood_type: &str, longitude: f64, latitude: f64) -> FfiDonor {
        FfiDonor {
            id: String::new(),
            name: name.into(),
            email: format!("{}@Example.com", name),
            phone: None,
            blood_type: blood_type.into(),
            longitude,
            latitude,
            verified: true,
            otp_verified: true,
            availability: true,
            points: 0,
            badges: vec![],
        }
    }

    #[test]
    fn test_ffi_round_trip() {
        let core = open_database_in_memory().unwrap();
        let patient = core
            .create_patient("Asha".into(), "O+".into(), 77.59, 12.97, Some("critical".into()))
            .unwrap();
        assert_eq!(patient.urgency.as_deref(), Some("Critical"));

        core.upsert_donor(ffi_donor("ravi", "O-", 77.59, 12.98)).unwrap();

        let results = core
            .find_match(FfiMatchQuery {
                patient_id: patient.id.clone(),
                radius_km: Some(20.0),
                name: None,
                blood_type: None,
            })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].blood_type, "O-");
        assert_eq!(results[0].email, "ravi@example.com");
        assert_eq!(results[0].urgency, "Critical");

        let donor = core.get_donor(results[0].id.clone()).unwrap().unwrap();
        let request = core
            .record_donation_request(patient.id.clone(), donor.id.clone())
            .unwrap();
        assert_eq!(request.status, "Pending");
        let done = core
            .update_request_status(request.id, "Completed".into())
            .unwrap();
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_ffi_rejects_bad_input() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.create_patient("Asha".into(), "O+".into(), 0.0, 0.0, Some("soon".into())),
            Err(LifeLinkError::InvalidInput(_))
        ));
        assert!(matches!(
            core.upsert_donor(ffi_donor("ravi", "Q-", 0.0, 0.0)),
            Err(LifeLinkError::InvalidInput(_))
        ));
        assert!(matches!(
            core.update_request_status("missing".into(), "Finished".into()),
            Err(LifeLinkError::InvalidInput(_))
        ));
        assert!(matches!(
            core.find_match(FfiMatchQuery {
                patient_id: "ghost".into(),
                radius_km: None,
                name: None,
                blood_type: None,
            }),
            Err(LifeLinkError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_match_json_wire_shape() {
        let core = open_database_in_memory().unwrap();
        let patient = core
            .create_patient("Asha".into(), "A-".into(), 77.59, 12.97, None)
            .unwrap();
        core.upsert_donor(ffi_donor("ravi", "O-", 77.59, 12.98)).unwrap();

        let json = core
            .find_match_json(FfiMatchQuery {
                patient_id: patient.id.clone(),
                radius_km: Some(10.0),
                name: None,
                blood_type: None,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["bloodType"], "O-");
        assert_eq!(value[0]["location"]["type"], "Point");
        assert!(value[0]["matchScore"].is_number());

        // Incompatible explicit filter: empty array, not an error
        let json = core
            .find_match_json(FfiMatchQuery {
                patient_id: patient.id,
                radius_km: Some(10.0),
                name: None,
                blood_type: Some("B+".into()),
            })
            .unwrap();
        assert_eq!(json, "[]");
    }
}
