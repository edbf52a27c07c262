//! Donor models.

use serde::{Deserialize, Serialize};

use super::{BloodType, GeoPoint};

/// A registered blood donor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// UUID, generated locally
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub blood_type: BloodType,
    pub location: GeoPoint,
    /// Identity checked by an administrator
    pub verified: bool,
    /// Contact details confirmed by one-time password
    pub otp_verified: bool,
    /// Donor is currently willing to be contacted
    pub availability: bool,
    /// Gamification points
    pub points: u32,
    /// Earned badges
    pub badges: Vec<Badge>,
}

/// A gamification badge shown on donor cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub name: String,
    pub description: Option<String>,
}

impl Donor {
    /// Create a new donor. Donors start unverified and available.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        blood_type: BloodType,
        location: GeoPoint,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into().to_lowercase(),
            phone: None,
            blood_type,
            location,
            verified: false,
            otp_verified: false,
            availability: true,
            points: 0,
            badges: Vec::new(),
        }
    }

    /// Both verification steps are complete.
    pub fn is_fully_verified(&self) -> bool {
        self.verified && self.otp_verified
    }

    /// Passes every hard eligibility flag (blood type aside).
    pub fn is_eligible(&self) -> bool {
        self.is_fully_verified() && self.availability
    }

    /// Case-insensitive substring match on the donor name.
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}
