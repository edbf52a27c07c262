//! Donation request database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{DonationRequest, RequestStatus, RequestStatusCounts};

impl Database {
    /// Insert a new donation request.
    pub fn insert_donation_request(&self, request: &DonationRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO donation_requests (
                id, patient_id, donor_id, status, requested_at, responded_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                request.id,
                request.patient_id,
                request.donor_id,
                request.status.as_str(),
                request.requested_at,
                request.responded_at,
                request.completed_at,
            ],
        )?;
        Ok(())
    }

    /// Get a donation request by ID.
    pub fn get_donation_request(&self, id: &str) -> DbResult<Option<DonationRequest>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, patient_id, donor_id, status, requested_at, responded_at, completed_at
                FROM donation_requests
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(RequestRow {
                        id: row.get(0)?,
                        patient_id: row.get(1)?,
                        donor_id: row.get(2)?,
                        status: row.get(3)?,
                        requested_at: row.get(4)?,
                        responded_at: row.get(5)?,
                        completed_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Move a request to a new status.
    ///
    /// `responded_at` is stamped by the first answer (accept, reject or
    /// complete) and kept afterwards; `completed_at` by the first completion.
    pub fn update_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> DbResult<DonationRequest> {
        let now = chrono::Utc::now().to_rfc3339();
        let responded_at = status.is_response().then(|| now.clone());
        let completed_at = (status == RequestStatus::Completed).then(|| now.clone());

        let rows_affected = self.conn.execute(
            r#"
            UPDATE donation_requests SET
                status = ?2,
                responded_at = COALESCE(responded_at, ?3),
                completed_at = COALESCE(completed_at, ?4)
            WHERE id = ?1
            "#,
            params![id, status.as_str(), responded_at, completed_at],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("donation request {}", id)));
        }

        self.get_donation_request(id)?
            .ok_or_else(|| DbError::NotFound(format!("donation request {}", id)))
    }

    /// Count a donor's requests by status.
    pub fn request_status_counts(&self, donor_id: &str) -> DbResult<RequestStatusCounts> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT status, COUNT(*)
            FROM donation_requests
            WHERE donor_id = ?
            GROUP BY status
            "#,
        )?;

        let rows = stmt.query_map([donor_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut counts = RequestStatusCounts::default();
        for row in rows {
            let (status, n) = row?;
            let status: RequestStatus = status.parse().map_err(DbError::Constraint)?;
            counts.add(status, n);
        }
        Ok(counts)
    }
}

/// Intermediate row struct for database mapping.
struct RequestRow {
    id: String,
    patient_id: String,
    donor_id: String,
    status: String,
    requested_at: String,
    responded_at: Option<String>,
    completed_at: Option<String>,
}

impl TryFrom<RequestRow> for DonationRequest {
    type Error = DbError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(DonationRequest {
            id: row.id,
            patient_id: row.patient_id,
            donor_id: row.donor_id,
            status: row.status.parse().map_err(DbError::Constraint)?,
            requested_at: row.requested_at,
            responded_at: row.responded_at,
            completed_at: row.completed_at,
        })
    }
}
