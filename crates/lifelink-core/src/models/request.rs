//! Donation request models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a donation request sent to a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
        }
    }

    /// The donor has answered the request (in either direction).
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            RequestStatus::Accepted | RequestStatus::Rejected | RequestStatus::Completed
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Accepted" => Ok(RequestStatus::Accepted),
            "Rejected" => Ok(RequestStatus::Rejected),
            "Completed" => Ok(RequestStatus::Completed),
            "Cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("Unknown request status: {}", other)),
        }
    }
}

/// A request asking a donor to donate for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub donor_id: String,
    pub status: RequestStatus,
    pub requested_at: String,
    pub responded_at: Option<String>,
    pub completed_at: Option<String>,
}

impl DonationRequest {
    /// Create a new pending request.
    pub fn new(patient_id: impl Into<String>, donor_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            donor_id: donor_id.into(),
            status: RequestStatus::Pending,
            requested_at: chrono::Utc::now().to_rfc3339(),
            responded_at: None,
            completed_at: None,
        }
    }
}

/// Per-status request counts for one donor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatusCounts {
    pub pending: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub completed: u32,
    pub cancelled: u32,
}

impl RequestStatusCounts {
    /// Add `n` requests with the given status.
    pub fn add(&mut self, status: RequestStatus, n: u32) {
        let slot = match status {
            RequestStatus::Pending => &mut self.pending,
            RequestStatus::Accepted => &mut self.accepted,
            RequestStatus::Rejected => &mut self.rejected,
            RequestStatus::Completed => &mut self.completed,
            RequestStatus::Cancelled => &mut self.cancelled,
        };
        *slot += n;
    }

    /// Requests the donor answered, whatever the answer.
    pub fn responded(&self) -> u32 {
        self.completed + self.accepted + self.rejected
    }
}
