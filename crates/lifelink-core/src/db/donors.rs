//! Donor database operations, including the proximity query.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{
    BloodType, CandidateRecord, Donor, GeoPoint, ProximityQuery, EARTH_RADIUS_M,
};

const DONOR_COLUMNS: &str = "id, name, email, phone, blood_type, longitude, latitude, \
                             verified, otp_verified, availability, points, badges";

impl Database {
    /// Insert or update a donor.
    pub fn upsert_donor(&self, donor: &Donor) -> DbResult<()> {
        if !donor.location.is_valid() {
            return Err(DbError::Constraint(format!(
                "donor {} has invalid coordinates",
                donor.id
            )));
        }
        let badges_json = serde_json::to_string(&donor.badges)?;

        self.conn.execute(
            r#"
            INSERT INTO donors (
                id, name, email, phone, blood_type, longitude, latitude,
                verified, otp_verified, availability, points, badges, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                blood_type = excluded.blood_type,
                longitude = excluded.longitude,
                latitude = excluded.latitude,
                verified = excluded.verified,
                otp_verified = excluded.otp_verified,
                availability = excluded.availability,
                points = excluded.points,
                badges = excluded.badges,
                updated_at = datetime('now')
            "#,
            params![
                donor.id,
                donor.name,
                donor.email,
                donor.phone,
                donor.blood_type.as_str(),
                donor.location.longitude,
                donor.location.latitude,
                donor.verified,
                donor.otp_verified,
                donor.availability,
                donor.points,
                badges_json,
            ],
        )?;
        Ok(())
    }

    /// Get a donor by ID.
    pub fn get_donor(&self, id: &str) -> DbResult<Option<Donor>> {
        let sql = format!("SELECT {} FROM donors WHERE id = ?", DONOR_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], DonorRow::from_row)
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Toggle whether a donor can be contacted.
    pub fn set_donor_availability(&self, id: &str, available: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE donors SET availability = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, available],
        )?;
        Ok(rows_affected > 0)
    }

    /// Record the outcome of admin and OTP verification.
    pub fn set_donor_verification(
        &self,
        id: &str,
        verified: bool,
        otp_verified: bool,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE donors SET verified = ?2, otp_verified = ?3, updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, verified, otp_verified],
        )?;
        Ok(rows_affected > 0)
    }

    /// Find eligible donors within `radius_m` of the origin, nearest first.
    ///
    /// Only verified, OTP-verified, available donors of an allowed blood type are
    /// returned. Equal distances are ordered by donor id.
    pub fn find_nearby_donors(&self, query: &ProximityQuery) -> DbResult<Vec<CandidateRecord>> {
        if query.blood_types.is_empty() {
            return Ok(Vec::new());
        }

        let types_json = serde_json::to_string(&query.blood_types)?;
        let (lat_min, lat_max) = latitude_band(query.origin, query.radius_m);

        let sql = format!(
            r#"
            SELECT {},
                   haversine_m(?1, ?2, latitude, longitude) AS distance_m
            FROM donors
            WHERE verified = 1
              AND otp_verified = 1
              AND availability = 1
              AND blood_type IN (SELECT value FROM json_each(?3))
              AND latitude BETWEEN ?4 AND ?5
              AND haversine_m(?1, ?2, latitude, longitude) <= ?6
            ORDER BY distance_m ASC, id ASC
            "#,
            DONOR_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                query.origin.latitude,
                query.origin.longitude,
                types_json,
                lat_min,
                lat_max,
                query.radius_m,
            ],
            |row| Ok((DonorRow::from_row(row)?, row.get::<_, f64>(12)?)),
        )?;

        let needle = query.name.as_deref().filter(|n| !n.is_empty());
        let mut candidates = Vec::new();
        for row in rows {
            let (donor_row, distance_meters) = row?;
            let donor: Donor = donor_row.try_into()?;
            if needle.is_some_and(|n| !donor.name_matches(n)) {
                continue;
            }
            candidates.push(CandidateRecord {
                donor,
                distance_meters,
            });
        }
        Ok(candidates)
    }
}

/// Latitude range that can contain points within `radius_m` of `origin`.
fn latitude_band(origin: GeoPoint, radius_m: f64) -> (f64, f64) {
    let delta = (radius_m / EARTH_RADIUS_M).to_degrees();
    (origin.latitude - delta, origin.latitude + delta)
}

/// Intermediate row struct for database mapping.
struct DonorRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    blood_type: String,
    longitude: f64,
    latitude: f64,
    verified: bool,
    otp_verified: bool,
    availability: bool,
    points: u32,
    badges: String,
}

impl DonorRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DonorRow {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            blood_type: row.get(4)?,
            longitude: row.get(5)?,
            latitude: row.get(6)?,
            verified: row.get(7)?,
            otp_verified: row.get(8)?,
            availability: row.get(9)?,
            points: row.get(10)?,
            badges: row.get(11)?,
        })
    }
}

impl TryFrom<DonorRow> for Donor {
    type Error = DbError;

    fn try_from(row: DonorRow) -> Result<Self, Self::Error> {
        let blood_type: BloodType = row
            .blood_type
            .parse()
            .map_err(|_| DbError::InvalidBloodType(row.blood_type.clone()))?;

        Ok(Donor {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            blood_type,
            location: GeoPoint::new(row.longitude, row.latitude),
            verified: row.verified,
            otp_verified: row.otp_verified,
            availability: row.availability,
            points: row.points,
            badges: serde_json::from_str(&row.badges)?,
        })
    }
}
