//! Blood type compatibility resolution.
//!
//! Maps a recipient's blood type to the donor types that can safely give to
//! them, and carries the per-donor-type priority weight used by the scorer.

use std::collections::HashMap;

use crate::models::{BloodType, UnknownBloodType};

/// Outcome of resolving which donor types a request may draw from.
#[derive(Debug, Clone, PartialEq)]
pub enum Compatibility {
    /// Candidates may be searched.
    Eligible {
        /// Every donor type compatible with the patient
        eligible: Vec<BloodType>,
        /// Types to actually query (narrowed by an explicit filter)
        effective: Vec<BloodType>,
    },
    /// The explicit filter excludes every compatible type; the result is empty.
    NoEligibleCandidates,
}

struct Entry {
    donors: Vec<BloodType>,
    weight: f64,
}

/// Immutable recipient → donor compatibility table.
pub struct CompatibilityTable {
    entries: HashMap<BloodType, Entry>,
}

impl CompatibilityTable {
    /// The standard ABO/Rh red cell compatibility rules.
    ///
    /// `weight` is the priority of using that type as a *donor*: O- is the
    /// universal donor and scores highest, AB+ can only give to AB+ and scores lowest.
    pub fn standard() -> Self {
        use BloodType::*;

        let rows = [
            (APos, vec![APos, ANeg, OPos, ONeg], 0.75),
            (ANeg, vec![ANeg, ONeg], 0.85),
            (BPos, vec![BPos, BNeg, OPos, ONeg], 0.75),
            (BNeg, vec![BNeg, ONeg], 0.85),
            (AbPos, BloodType::ALL.to_vec(), 0.5),
            (AbNeg, vec![ANeg, BNeg, AbNeg, ONeg], 0.7),
            (OPos, vec![OPos, ONeg], 0.9),
            (ONeg, vec![ONeg], 1.0),
        ];

        let entries = rows
            .into_iter()
            .map(|(recipient, donors, weight)| (recipient, Entry { donors, weight }))
            .collect();

        Self { entries }
    }

    /// Donor types that can give to `recipient`.
    pub fn compatible_donors(&self, recipient: BloodType) -> &[BloodType] {
        self.entries
            .get(&recipient)
            .map(|e| e.donors.as_slice())
            .unwrap_or(&[])
    }

    /// Priority weight of `donor_type` (0.5 - 1.0).
    pub fn weight(&self, donor_type: BloodType) -> f64 {
        self.entries.get(&donor_type).map(|e| e.weight).unwrap_or(0.0)
    }

    /// Resolve the donor types to search for a patient.
    ///
    /// Fails only when the patient's stored type is unrecognized. A filter that
    /// is absent or empty leaves the full compatible set; a filter that does not
    /// name a compatible type (including one that is not a blood type at all)
    /// yields [`Compatibility::NoEligibleCandidates`].
    pub fn resolve(
        &self,
        patient_blood_type: &str,
        explicit_filter: Option<&str>,
    ) -> Result<Compatibility, UnknownBloodType> {
        let recipient: BloodType = patient_blood_type.parse()?;
        let eligible = self.compatible_donors(recipient).to_vec();

        let filter = explicit_filter.map(str::trim).filter(|f| !f.is_empty());
        let effective = match filter {
            None => eligible.clone(),
            Some(raw) => match raw.parse::<BloodType>() {
                Ok(wanted) if eligible.contains(&wanted) => vec![wanted],
                _ => return Ok(Compatibility::NoEligibleCandidates),
            },
        };

        Ok(Compatibility::Eligible {
            eligible,
            effective,
        })
    }
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::standard()
    }
}
