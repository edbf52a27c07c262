//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{GeoPoint, Patient, Urgency};

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        if !patient.location.is_valid() {
            return Err(DbError::Constraint(format!(
                "patient {} has invalid coordinates",
                patient.id
            )));
        }

        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, blood_type, longitude, latitude, urgency, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                patient.id,
                patient.name,
                patient.blood_type,
                patient.location.longitude,
                patient.location.latitude,
                patient.urgency.map(|u| u.as_str()),
                patient.created_at,
            ],
        )?;
        Ok(())
    }

    /// Set or clear a patient's urgency level.
    pub fn update_patient_urgency(&self, id: &str, urgency: Option<Urgency>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET urgency = ?2 WHERE id = ?1",
            params![id, urgency.map(|u| u.as_str())],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, blood_type, longitude, latitude, urgency, created_at
                FROM patients
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(PatientRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        blood_type: row.get(2)?,
                        longitude: row.get(3)?,
                        latitude: row.get(4)?,
                        urgency: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(row.map(Patient::from))
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    blood_type: String,
    longitude: f64,
    latitude: f64,
    urgency: Option<String>,
    created_at: String,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        let urgency = row.urgency.as_deref().and_then(|label| {
            let parsed = Urgency::parse(label);
            if parsed.is_none() {
                tracing::warn!(patient_id = %row.id, label, "Unknown urgency label, treating as Medium");
            }
            parsed
        });

        Patient {
            id: row.id,
            name: row.name,
            blood_type: row.blood_type,
            location: GeoPoint::new(row.longitude, row.latitude),
            urgency,
            created_at: row.created_at,
        }
    }
}
