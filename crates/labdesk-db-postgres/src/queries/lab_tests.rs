//! Lab-test catalog queries.

use chrono::{DateTime, Utc};
use labdesk_core::{LabTest, LabTestPatch, NewLabTest, generate_id, now_utc};
use labdesk_storage::{LabTestFilter, StorageError};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;

use crate::convert::{chrono_to_time, time_to_chrono};
use crate::error::{is_unique_violation, query_error};

pub(crate) const LAB_TEST_COLUMNS: &str =
    "id, code, name, price_cents, turnaround_days, is_active, created_at, updated_at";

pub(crate) type LabTestRow = (
    String,
    String,
    String,
    i64,
    i32,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

pub(crate) fn lab_test_from_row(row: LabTestRow) -> Result<LabTest, StorageError> {
    let (id, code, name, price_cents, turnaround_days, is_active, created_at, updated_at) = row;
    Ok(LabTest {
        id,
        code,
        name,
        price_cents,
        turnaround_days,
        is_active,
        created_at: chrono_to_time(created_at)?,
        updated_at: chrono_to_time(updated_at)?,
    })
}

fn write_error(context: &str, code: &str, err: SqlxError) -> StorageError {
    if is_unique_violation(&err) {
        StorageError::already_exists("LabTest", "code", code)
    } else {
        query_error(context, err)
    }
}

pub async fn list(pool: &PgPool, filter: &LabTestFilter) -> Result<Vec<LabTest>, StorageError> {
    let sql = format!(
        "SELECT {LAB_TEST_COLUMNS} FROM lab_tests WHERE (NOT $1 OR is_active) ORDER BY code ASC"
    );
    let rows: Vec<LabTestRow> = query_as(&sql)
        .bind(filter.active_only)
        .fetch_all(pool)
        .await
        .map_err(|e| query_error("Failed to list lab tests", e))?;

    rows.into_iter().map(lab_test_from_row).collect()
}

pub async fn get(pool: &PgPool, id: &str) -> Result<Option<LabTest>, StorageError> {
    let sql = format!("SELECT {LAB_TEST_COLUMNS} FROM lab_tests WHERE id = $1");
    let row: Option<LabTestRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| query_error("Failed to read lab test", e))?;
    row.map(lab_test_from_row).transpose()
}

pub async fn create(pool: &PgPool, test: &NewLabTest) -> Result<LabTest, StorageError> {
    let now = time_to_chrono(now_utc())?;
    let sql = format!(
        r#"INSERT INTO lab_tests
               (id, code, name, price_cents, turnaround_days, is_active, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
           RETURNING {LAB_TEST_COLUMNS}"#
    );

    let row: LabTestRow = query_as(&sql)
        .bind(generate_id())
        .bind(&test.code)
        .bind(&test.name)
        .bind(test.price_cents)
        .bind(test.turnaround_days)
        .bind(test.is_active)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| write_error("Failed to create lab test", &test.code, e))?;

    lab_test_from_row(row)
}

pub async fn update(
    pool: &PgPool,
    id: &str,
    patch: &LabTestPatch,
) -> Result<LabTest, StorageError> {
    let now = time_to_chrono(now_utc())?;
    let sql = format!(
        r#"UPDATE lab_tests
           SET code = COALESCE($2, code),
               name = COALESCE($3, name),
               price_cents = COALESCE($4, price_cents),
               turnaround_days = COALESCE($5, turnaround_days),
               is_active = COALESCE($6, is_active),
               updated_at = $7
           WHERE id = $1
           RETURNING {LAB_TEST_COLUMNS}"#
    );

    let code = patch.code.as_deref().unwrap_or_default();
    let row: Option<LabTestRow> = query_as(&sql)
        .bind(id)
        .bind(&patch.code)
        .bind(&patch.name)
        .bind(patch.price_cents)
        .bind(patch.turnaround_days)
        .bind(patch.is_active)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(|e| write_error("Failed to update lab test", code, e))?;

    match row {
        Some(row) => lab_test_from_row(row),
        None => Err(StorageError::not_found("LabTest", id)),
    }
}
