//! Candidate scoring.
//!
//! Scoring weights:
//! - Distance decay: 40%
//! - Donor blood type priority: 30%
//! - Donor activity / responsiveness: 20%
//! - Patient urgency: 10%
//!
//! The urgency slot adds the raw urgency multiplier (0.9 - 1.2) times its
//! weight rather than a [0, 1] score, so the unclamped composite can reach 102.
//! The composite is clamped to [0, 100].

use crate::models::{
    BloodType, CandidateRecord, RequestStatusCounts, ScoreBreakdown, ScoredCandidate, Urgency,
};

use super::CompatibilityTable;

pub const DISTANCE_WEIGHT: f64 = 0.4;
pub const BLOOD_TYPE_WEIGHT: f64 = 0.3;
pub const ACTIVITY_WEIGHT: f64 = 0.2;
pub const URGENCY_WEIGHT: f64 = 0.1;

/// Activity score for a donor with no answered requests.
pub const NEUTRAL_ACTIVITY: f64 = 0.5;

/// Per-request inputs shared by every candidate.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// Donor types compatible with the patient
    pub eligible: Vec<BloodType>,
    pub urgency: Urgency,
    /// Effective (clamped) search radius
    pub radius_m: f64,
}

/// Scores candidates against a patient.
pub struct Scorer<'a> {
    table: &'a CompatibilityTable,
}

impl<'a> Scorer<'a> {
    pub fn new(table: &'a CompatibilityTable) -> Self {
        Self { table }
    }

    /// Score one candidate given its request history.
    pub fn score(
        &self,
        candidate: CandidateRecord,
        ctx: &ScoringContext,
        history: &RequestStatusCounts,
    ) -> ScoredCandidate {
        let distance_km = candidate.distance_meters / 1000.0;
        let distance = distance_score(distance_km, ctx.radius_m / 1000.0);
        let blood_type = self.blood_type_score(candidate.donor.blood_type, &ctx.eligible);
        let activity = activity_score(history);

        let match_score = composite_score(distance, blood_type, activity, ctx.urgency);

        let donor = candidate.donor;
        ScoredCandidate {
            id: donor.id,
            name: donor.name,
            email: donor.email,
            phone: donor.phone,
            blood_type: donor.blood_type,
            location: donor.location,
            availability: donor.availability,
            badges: donor.badges,
            points: donor.points,
            distance_meters: candidate.distance_meters,
            distance_km,
            match_score,
            score_breakdown: ScoreBreakdown {
                distance: percent(distance),
                blood_type: percent(blood_type),
                activity: percent(activity),
                urgency: ctx.urgency,
            },
        }
    }

    /// Priority weight of the donor's type, or 0 if it cannot give to the patient.
    pub fn blood_type_score(&self, donor_type: BloodType, eligible: &[BloodType]) -> f64 {
        if eligible.contains(&donor_type) {
            self.table.weight(donor_type)
        } else {
            0.0
        }
    }
}

/// Exponential decay over a tenth of the search radius: 1.0 at the patient,
/// about 0.0067 at the radius edge.
pub fn distance_score(distance_km: f64, radius_km: f64) -> f64 {
    (-0.5 * distance_km / (radius_km / 10.0)).exp()
}

/// `0.5 + 0.5 * completed / responded`, neutral 0.5 without any answered request.
pub fn activity_score(history: &RequestStatusCounts) -> f64 {
    let responded = history.responded();
    if responded == 0 {
        return NEUTRAL_ACTIVITY;
    }
    let response_rate = f64::from(history.completed) / f64::from(responded);
    (0.5 + 0.5 * response_rate).clamp(0.0, 1.0)
}

/// Weighted composite on a 0 - 100 scale, rounded to one decimal.
pub fn composite_score(distance: f64, blood_type: f64, activity: f64, urgency: Urgency) -> f64 {
    let raw = (distance * DISTANCE_WEIGHT
        + blood_type * BLOOD_TYPE_WEIGHT
        + activity * ACTIVITY_WEIGHT
        + urgency.weight() * URGENCY_WEIGHT)
        * 100.0;
    round_one_decimal(raw.clamp(0.0, 100.0))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Donor, GeoPoint, RequestStatus};
    use proptest::prelude::*;

    fn candidate(blood_type: BloodType, distance_meters: f64) -> CandidateRecord {
        CandidateRecord {
            donor: Donor::new("Priya", "priya@example.com", blood_type, GeoPoint::new(77.6, 12.98)),
            distance_meters,
        }
    }

    fn ctx(urgency: Urgency) -> ScoringContext {
        ScoringContext {
            eligible: vec![BloodType::OPos, BloodType::ONeg],
            urgency,
            radius_m: 20_000.0,
        }
    }

    fn counts(completed: u32, accepted: u32, rejected: u32, pending: u32) -> RequestStatusCounts {
        let mut c = RequestStatusCounts::default();
        c.add(RequestStatus::Completed, completed);
        c.add(RequestStatus::Accepted, accepted);
        c.add(RequestStatus::Rejected, rejected);
        c.add(RequestStatus::Pending, pending);
        c
    }

    #[test]
    fn test_distance_score_shape() {
        assert_eq!(distance_score(0.0, 20.0), 1.0);
        // 2 km in a 20 km radius: exp(-0.5)
        assert!((distance_score(2.0, 20.0) - (-0.5f64).exp()).abs() < 1e-12);
        let edge = distance_score(20.0, 20.0);
        assert!(edge > 0.0 && edge < 0.01);
        assert!(distance_score(1.0, 20.0) > distance_score(1.5, 20.0));
    }

    #[test]
    fn test_activity_score() {
        assert_eq!(activity_score(&RequestStatusCounts::default()), 0.5);
        // Pending-only history is still neutral
        assert_eq!(activity_score(&counts(0, 0, 0, 3)), 0.5);
        assert_eq!(activity_score(&counts(4, 0, 0, 0)), 1.0);
        assert_eq!(activity_score(&counts(0, 1, 1, 0)), 0.5);
        assert_eq!(activity_score(&counts(1, 0, 1, 0)), 0.75);
    }

    #[test]
    fn test_blood_type_score() {
        let table = CompatibilityTable::standard();
        let scorer = Scorer::new(&table);
        let eligible = [BloodType::OPos, BloodType::ONeg];
        assert_eq!(scorer.blood_type_score(BloodType::ONeg, &eligible), 1.0);
        assert_eq!(scorer.blood_type_score(BloodType::OPos, &eligible), 0.9);
        assert_eq!(scorer.blood_type_score(BloodType::APos, &eligible), 0.0);
    }

    #[test]
    fn test_composite_arithmetic() {
        // 0.4 + 0.3 + 0.2 + 1.0 * 0.1 = 1.0
        assert_eq!(composite_score(1.0, 1.0, 1.0, Urgency::Medium), 100.0);
        // Critical would push past 100; clamped
        assert_eq!(composite_score(1.0, 1.0, 1.0, Urgency::Critical), 100.0);
        // 0.5*0.4 + 0.5*0.3 + 0.5*0.2 + 0.9*0.1 = 0.54
        assert_eq!(composite_score(0.5, 0.5, 0.5, Urgency::Low), 54.0);
        assert_eq!(composite_score(0.0, 0.0, 0.0, Urgency::High), 11.0);
    }

    #[test]
    fn test_score_o_negative_at_two_km() {
        let table = CompatibilityTable::standard();
        let scorer = Scorer::new(&table);

        let scored = scorer.score(
            candidate(BloodType::ONeg, 2_000.0),
            &ctx(Urgency::Medium),
            &RequestStatusCounts::default(),
        );

        // exp(-0.5)*0.4 + 1.0*0.3 + 0.5*0.2 + 1.0*0.1 = 0.7426...
        assert_eq!(scored.match_score, 74.3);
        assert_eq!(scored.distance_km, 2.0);
        assert_eq!(scored.score_breakdown.distance, 61);
        assert_eq!(scored.score_breakdown.blood_type, 100);
        assert_eq!(scored.score_breakdown.activity, 50);
        assert_eq!(scored.score_breakdown.urgency, Urgency::Medium);
    }

    #[test]
    fn test_urgency_raises_score() {
        let table = CompatibilityTable::standard();
        let scorer = Scorer::new(&table);
        let history = RequestStatusCounts::default();

        let low = scorer.score(candidate(BloodType::OPos, 5_000.0), &ctx(Urgency::Low), &history);
        let critical =
            scorer.score(candidate(BloodType::OPos, 5_000.0), &ctx(Urgency::Critical), &history);
        assert!((critical.match_score - low.match_score - 3.0).abs() < 0.11);
    }

    proptest! {
        #[test]
        fn prop_score_bounded_with_one_decimal(
            distance_m in 0.0f64..200_000.0,
            radius_km in 1.0f64..200.0,
            completed in 0u32..50,
            accepted in 0u32..50,
            rejected in 0u32..50,
            type_idx in 0usize..8,
            urgency_idx in 0usize..4,
        ) {
            let table = CompatibilityTable::standard();
            let scorer = Scorer::new(&table);
            let urgency = [Urgency::Critical, Urgency::High, Urgency::Medium, Urgency::Low][urgency_idx];
            let ctx = ScoringContext {
                eligible: BloodType::ALL.to_vec(),
                urgency,
                radius_m: radius_km * 1000.0,
            };

            let scored = scorer.score(
                candidate(BloodType::ALL[type_idx], distance_m),
                &ctx,
                &counts(completed, accepted, rejected, 0),
            );

            prop_assert!((0.0..=100.0).contains(&scored.match_score));
            prop_assert!(((scored.match_score * 10.0).round() - scored.match_score * 10.0).abs() < 1e-9);
            prop_assert!(scored.score_breakdown.distance <= 100);
            prop_assert!(scored.score_breakdown.activity >= 50);
        }

        #[test]
        fn prop_distance_monotonic(a in 0.0f64..50_000.0, b in 0.0f64..50_000.0) {
            prop_assume!((a - b).abs() > 1.0);
            let (near, far) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(distance_score(near / 1000.0, 50.0) > distance_score(far / 1000.0, 50.0));
        }
    }
}
