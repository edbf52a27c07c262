//! Donor matching models.

use serde::{Deserialize, Serialize};

use super::{Badge, BloodType, Donor, GeoPoint, Urgency};

/// A donor-match request, shaped like the `GET /match` query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    /// Patient to match for (required; empty is rejected)
    #[serde(default)]
    pub patient_id: String,
    /// Search radius in km (defaulted and clamped by the matcher)
    #[serde(default)]
    pub radius_km: Option<f64>,
    /// Case-insensitive donor name substring
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit donor blood type; must be compatible with the patient
    #[serde(default)]
    pub blood_type: Option<String>,
}

impl MatchQuery {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            ..Default::default()
        }
    }

    pub fn radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn blood_type(mut self, blood_type: impl Into<String>) -> Self {
        self.blood_type = Some(blood_type.into());
        self
    }
}

/// Proximity query issued against the donor store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityQuery {
    /// Patient position
    pub origin: GeoPoint,
    /// Maximum spherical distance, already clamped
    pub radius_m: f64,
    /// Donor blood types allowed through
    pub blood_types: Vec<BloodType>,
    /// Case-insensitive donor name substring
    pub name: Option<String>,
}

/// A donor that passed the proximity query and hard filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub donor: Donor,
    /// Spherical distance from the patient, in meters
    pub distance_meters: f64,
}

/// Per-component scores, as rounded percentages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Distance decay (0 - 100) - weight: 40%
    pub distance: u8,
    /// Donor blood type priority (0 - 100) - weight: 30%
    pub blood_type: u8,
    /// Donor responsiveness (0 - 100) - weight: 20%
    pub activity: u8,
    /// Urgency level that fed the 10% slot
    pub urgency: Urgency,
}

/// A ranked donor as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_type: BloodType,
    pub location: GeoPoint,
    pub availability: bool,
    pub badges: Vec<Badge>,
    pub points: u32,
    /// Exact distance, used for tie-breaking
    #[serde(skip)]
    pub distance_meters: f64,
    pub distance_km: f64,
    /// Composite score (0 - 100, one decimal)
    pub match_score: f64,
    pub score_breakdown: ScoreBreakdown,
}
