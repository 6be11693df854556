//! Patient queries.

use chrono::{DateTime, NaiveDate, Utc};
use labdesk_core::{NewPatient, Patient, PatientPatch, PatientQuery, generate_id, now_utc};
use labdesk_storage::StorageError;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;

use super::contains_pattern;
use crate::convert::{chrono_to_date, chrono_to_time, date_to_chrono, time_to_chrono};
use crate::error::query_error;

pub(crate) const PATIENT_COLUMNS: &str =
    "id, full_name, dob, email, phone, created_at, updated_at";

pub(crate) type PatientRow = (
    String,
    String,
    NaiveDate,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

pub(crate) fn patient_from_row(row: PatientRow) -> Result<Patient, StorageError> {
    let (id, full_name, dob, email, phone, created_at, updated_at) = row;
    Ok(Patient {
        id,
        full_name,
        dob: chrono_to_date(dob)?,
        email,
        phone,
        created_at: chrono_to_time(created_at)?,
        updated_at: chrono_to_time(updated_at)?,
    })
}

/// Lists patients matching the search query, newest first.
pub async fn list(pool: &PgPool, query: &PatientQuery) -> Result<Vec<Patient>, StorageError> {
    let pattern = query.text.as_deref().map(contains_pattern);
    let (dob_start, dob_end) = match query.dob_range {
        Some(range) => (
            Some(date_to_chrono(range.start)?),
            Some(date_to_chrono(range.end_exclusive)?),
        ),
        None => (None, None),
    };

    let sql = format!(
        r#"SELECT {PATIENT_COLUMNS}
           FROM patients
           WHERE $1::text IS NULL
              OR ($2 AND full_name ILIKE $1 ESCAPE '\')
              OR ($3 AND email ILIKE $1 ESCAPE '\')
              OR ($4 AND phone ILIKE $1 ESCAPE '\')
              OR ($5 AND dob >= $6::date AND dob < $7::date)
           ORDER BY created_at DESC, id DESC"#
    );

    let rows: Vec<PatientRow> = query_as(&sql)
        .bind(pattern)
        .bind(query.matches_name())
        .bind(query.matches_email())
        .bind(query.matches_phone())
        .bind(query.matches_birthdate())
        .bind(dob_start)
        .bind(dob_end)
        .fetch_all(pool)
        .await
        .map_err(|e| query_error("Failed to list patients", e))?;

    rows.into_iter().map(patient_from_row).collect()
}

pub async fn get(pool: &PgPool, id: &str) -> Result<Option<Patient>, StorageError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
    let row: Option<PatientRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("Failed to read patient", e))?;
    row.map(patient_from_row).transpose()
}

pub async fn create(pool: &PgPool, patient: &NewPatient) -> Result<Patient, StorageError> {
    let now = time_to_chrono(now_utc())?;
    let sql = format!(
        r#"INSERT INTO patients (id, full_name, dob, email, phone, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $6)
           RETURNING {PATIENT_COLUMNS}"#
    );

    let row: PatientRow = query_as(&sql)
        .bind(generate_id())
        .bind(&patient.full_name)
        .bind(date_to_chrono(patient.dob)?)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| query_error("Failed to create patient", e))?;

    patient_from_row(row)
}

/// Applies a partial update. `email`/`phone` are only touched when the
/// patch carries them, and may be cleared to NULL.
pub async fn update(
    pool: &PgPool,
    id: &str,
    patch: &PatientPatch,
) -> Result<Patient, StorageError> {
    let now = time_to_chrono(now_utc())?;
    let dob = patch.dob.map(date_to_chrono).transpose()?;
    let sql = format!(
        r#"UPDATE patients
           SET full_name = COALESCE($2, full_name),
               dob = COALESCE($3, dob),
               email = CASE WHEN $4 THEN $5 ELSE email END,
               phone = CASE WHEN $6 THEN $7 ELSE phone END,
               updated_at = $8
           WHERE id = $1
           RETURNING {PATIENT_COLUMNS}"#
    );

    let row: Option<PatientRow> = query_as(&sql)
        .bind(id)
        .bind(&patch.full_name)
        .bind(dob)
        .bind(patch.email.is_some())
        .bind(patch.email.clone().flatten())
        .bind(patch.phone.is_some())
        .bind(patch.phone.clone().flatten())
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("Failed to update patient", e))?;

    match row {
        Some(row) => patient_from_row(row),
        None => Err(StorageError::not_found("Patient", id)),
    }
}
