//! Patient models.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, Urgency};

/// A patient awaiting a donor match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// UUID, generated locally
    #[serde(rename = "_id")]
    pub id: String,
    /// Patient name
    pub name: String,
    /// Blood type exactly as stored; validated at match time
    pub blood_type: String,
    /// Where the patient is being treated
    pub location: GeoPoint,
    /// Urgency of the need (None means Medium)
    pub urgency: Option<Urgency>,
    /// Creation timestamp
    pub created_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: impl Into<String>, blood_type: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            blood_type: blood_type.into(),
            location,
            urgency: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Urgency used for scoring.
    pub fn effective_urgency(&self) -> Urgency {
        self.urgency.unwrap_or_default()
    }
}
