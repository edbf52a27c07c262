//! Store interfaces consumed by the matcher.
//!
//! Calls are blocking; the matcher runs them on tokio's blocking pool.

use std::sync::Mutex;

use crate::db::{Database, DbError, DbResult};
use crate::models::{CandidateRecord, Patient, ProximityQuery, RequestStatusCounts};

/// Patient lookup.
pub trait PatientStore: Send + Sync {
    fn find_patient(&self, id: &str) -> DbResult<Option<Patient>>;
}

/// Geospatial donor search with attribute filters.
pub trait DonorStore: Send + Sync {
    /// Eligible donors within the query radius, nearest first.
    fn find_nearby(&self, query: &ProximityQuery) -> DbResult<Vec<CandidateRecord>>;
}

/// Per-donor donation request history.
pub trait DonationHistory: Send + Sync {
    fn status_counts(&self, donor_id: &str) -> DbResult<RequestStatusCounts>;
}

fn lock(db: &Mutex<Database>) -> DbResult<std::sync::MutexGuard<'_, Database>> {
    db.lock().map_err(|_| DbError::LockPoisoned)
}

impl PatientStore for Mutex<Database> {
    fn find_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        lock(self)?.get_patient(id)
    }
}

impl DonorStore for Mutex<Database> {
    fn find_nearby(&self, query: &ProximityQuery) -> DbResult<Vec<CandidateRecord>> {
        lock(self)?.find_nearby_donors(query)
    }
}

impl DonationHistory for Mutex<Database> {
    fn status_counts(&self, donor_id: &str) -> DbResult<RequestStatusCounts> {
        lock(self)?.request_status_counts(donor_id)
    }
}
