//! Blood type and urgency models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not one of the 8 ABO/Rh blood types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized blood type: {0:?}")]
pub struct UnknownBloodType(pub String);

/// ABO/Rh blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodType {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
}

impl BloodType {
    /// All 8 types in canonical order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];

    /// Canonical wire form (e.g. "AB+").
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APos => "A+",
            BloodType::ANeg => "A-",
            BloodType::BPos => "B+",
            BloodType::BNeg => "B-",
            BloodType::AbPos => "AB+",
            BloodType::AbNeg => "AB-",
            BloodType::OPos => "O+",
            BloodType::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = UnknownBloodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_ascii_uppercase();
        BloodType::ALL
            .into_iter()
            .find(|t| t.as_str() == canonical)
            .ok_or_else(|| UnknownBloodType(s.to_string()))
    }
}

impl TryFrom<String> for BloodType {
    type Error = UnknownBloodType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.as_str().to_string()
    }
}

/// Patient urgency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Urgency {
    /// Multiplier applied to the urgency slot of the match score.
    pub fn weight(&self) -> f64 {
        match self {
            Urgency::Critical => 1.2,
            Urgency::High => 1.1,
            Urgency::Medium => 1.0,
            Urgency::Low => 0.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "Critical",
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
        }
    }

    /// Parse a stored label, case-insensitively. Returns `None` for unknown labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Urgency::Critical),
            "high" => Some(Urgency::High),
            "medium" => Some(Urgency::Medium),
            "low" => Some(Urgency::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_forms() {
        for t in BloodType::ALL {
            assert_eq!(t.as_str().parse::<BloodType>().unwrap(), t);
        }
    }

    #[test]
    fn test_parse_is_lenient_on_case_and_whitespace() {
        assert_eq!(" ab- ".parse::<BloodType>().unwrap(), BloodType::AbNeg);
        assert_eq!("o+".parse::<BloodType>().unwrap(), BloodType::OPos);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("C+".parse::<BloodType>().is_err());
        assert!("A".parse::<BloodType>().is_err());
        assert!("".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&BloodType::AbPos).unwrap();
        assert_eq!(json, "\"AB+\"");
        let back: BloodType = serde_json::from_str("\"O-\"").unwrap();
        assert_eq!(back, BloodType::ONeg);
        assert!(serde_json::from_str::<BloodType>("\"Z+\"").is_err());
    }

    #[test]
    fn test_urgency_weights() {
        assert_eq!(Urgency::Critical.weight(), 1.2);
        assert_eq!(Urgency::High.weight(), 1.1);
        assert_eq!(Urgency::default(), Urgency::Medium);
        assert_eq!(Urgency::Medium.weight(), 1.0);
        assert_eq!(Urgency::Low.weight(), 0.9);
    }

    #[test]
    fn test_urgency_parse() {
        assert_eq!(Urgency::parse("critical"), Some(Urgency::Critical));
        assert_eq!(Urgency::parse("High"), Some(Urgency::High));
        assert_eq!(Urgency::parse("urgent"), None);
    }
}
