//! Order queries.
//!
//! Orders are always returned as details. The order rows are fetched first
//! and their patients, items and lab tests are then loaded in three batched
//! queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use labdesk_core::{
    LabTest, NewOrder, Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, Patient,
    generate_id, now_utc,
};
use labdesk_storage::{OrderFilter, StorageError};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::{PgConnection, PgPool};
use tracing::debug;

use super::contains_pattern;
use super::lab_tests::{LAB_TEST_COLUMNS, LabTestRow, lab_test_from_row};
use super::patients::{PATIENT_COLUMNS, PatientRow, patient_from_row};
use crate::convert::{chrono_to_time, time_to_chrono};
use crate::error::{is_foreign_key_violation, query_error};

const ORDER_COLUMNS: &str = "o.id, o.patient_id, o.status, o.total_cents, o.placed_at, \
                             o.estimated_ready_at, o.created_at, o.updated_at";

type OrderRow = (
    String,
    String,
    String,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type OrderItemRow = (String, String, String, i64, i32);

fn order_from_row(row: OrderRow) -> Result<Order, StorageError> {
    let (
        id,
        patient_id,
        status,
        total_cents,
        placed_at,
        estimated_ready_at,
        created_at,
        updated_at,
    ) = row;
    let status: OrderStatus = status
        .parse()
        .map_err(|e| StorageError::internal(format!("order {id}: {e}")))?;
    Ok(Order {
        id,
        patient_id,
        status,
        total_cents,
        placed_at: chrono_to_time(placed_at)?,
        estimated_ready_at: chrono_to_time(estimated_ready_at)?,
        created_at: chrono_to_time(created_at)?,
        updated_at: chrono_to_time(updated_at)?,
    })
}

fn item_from_row(row: OrderItemRow) -> OrderItem {
    let (id, order_id, lab_test_id, unit_price_cents, turnaround_days_at_order) = row;
    OrderItem {
        id,
        order_id,
        lab_test_id,
        unit_price_cents,
        turnaround_days_at_order,
    }
}

/// Attaches patients, items and lab tests to the given orders, preserving
/// their order.
async fn load_details(
    conn: &mut PgConnection,
    orders: Vec<Order>,
) -> Result<Vec<OrderDetail>, StorageError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let mut patient_ids: Vec<String> = orders.iter().map(|o| o.patient_id.clone()).collect();
    patient_ids.sort();
    patient_ids.dedup();

    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ANY($1)");
    let patient_rows: Vec<PatientRow> = query_as(&sql)
        .bind(patient_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Failed to load order patients", e))?;
    let patients: HashMap<String, Patient> = patient_rows
        .into_iter()
        .map(|row| patient_from_row(row).map(|p| (p.id.clone(), p)))
        .collect::<Result<_, _>>()?;

    let item_rows: Vec<OrderItemRow> = query_as(
        r#"SELECT id, order_id, lab_test_id, unit_price_cents, turnaround_days_at_order
           FROM order_items
           WHERE order_id = ANY($1)
           ORDER BY order_id, position"#,
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| query_error("Failed to load order items", e))?;

    let mut test_ids: Vec<String> = item_rows.iter().map(|row| row.2.clone()).collect();
    test_ids.sort();
    test_ids.dedup();

    let sql = format!("SELECT {LAB_TEST_COLUMNS} FROM lab_tests WHERE id = ANY($1)");
    let test_rows: Vec<LabTestRow> = query_as(&sql)
        .bind(test_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Failed to load order lab tests", e))?;
    let tests: HashMap<String, LabTest> = test_rows
        .into_iter()
        .map(|row| lab_test_from_row(row).map(|t| (t.id.clone(), t)))
        .collect::<Result<_, _>>()?;

    let mut items_by_order: HashMap<String, Vec<OrderItemDetail>> = HashMap::new();
    for row in item_rows {
        let item = item_from_row(row);
        let lab_test = tests.get(&item.lab_test_id).cloned().ok_or_else(|| {
            StorageError::internal(format!(
                "order item {} references missing lab test {}",
                item.id, item.lab_test_id
            ))
        })?;
        items_by_order
            .entry(item.order_id.clone())
            .or_default()
            .push(OrderItemDetail { item, lab_test });
    }

    orders
        .into_iter()
        .map(|order| {
            let patient = patients.get(&order.patient_id).cloned().ok_or_else(|| {
                StorageError::internal(format!(
                    "order {} references missing patient {}",
                    order.id, order.patient_id
                ))
            })?;
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            Ok(OrderDetail {
                order,
                patient,
                items,
            })
        })
        .collect()
}

/// Lists order details matching the filter, most recently placed first.
pub async fn list(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<OrderDetail>, StorageError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| query_error("Failed to acquire connection", e))?;

    let name_pattern = filter.patient_name_needle().as_deref().map(contains_pattern);
    let sql = format!(
        r#"SELECT {ORDER_COLUMNS}
           FROM orders o
           JOIN patients p ON p.id = o.patient_id
           WHERE ($1::text IS NULL OR o.status = $1)
             AND ($2::text IS NULL OR o.patient_id = $2)
             AND ($3::text IS NULL OR p.full_name ILIKE $3 ESCAPE '\')
           ORDER BY o.placed_at DESC, o.created_at DESC"#
    );

    let rows: Vec<OrderRow> = query_as(&sql)
        .bind(filter.status.map(OrderStatus::as_str))
        .bind(&filter.patient_id)
        .bind(name_pattern)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Failed to list orders", e))?;

    let orders = rows
        .into_iter()
        .map(order_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    load_details(&mut conn, orders).await
}

async fn fetch_order(conn: &mut PgConnection, id: &str) -> Result<Option<Order>, StorageError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1");
    let row: Option<OrderRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Failed to read order", e))?;
    row.map(order_from_row).transpose()
}

pub async fn get(pool: &PgPool, id: &str) -> Result<Option<OrderDetail>, StorageError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| query_error("Failed to acquire connection", e))?;

    match fetch_order(&mut conn, id).await? {
        Some(order) => Ok(load_details(&mut conn, vec![order]).await?.pop()),
        None => Ok(None),
    }
}

/// Inserts the order and its items in one transaction.
pub async fn create(pool: &PgPool, order: &NewOrder) -> Result<OrderDetail, StorageError> {
    let write_error = |context: &str, e: SqlxError| {
        if is_foreign_key_violation(&e) {
            StorageError::invalid_reference(format!("{context}: {e}"))
        } else {
            query_error(context, e)
        }
    };

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::transaction_error(format!("Failed to begin: {e}")))?;

    let id = generate_id();
    let now = time_to_chrono(now_utc())?;
    query(
        r#"INSERT INTO orders
               (id, patient_id, status, total_cents, placed_at, estimated_ready_at,
                created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $7)"#,
    )
    .bind(&id)
    .bind(&order.patient_id)
    .bind(order.status.as_str())
    .bind(order.total_cents)
    .bind(time_to_chrono(order.placed_at)?)
    .bind(time_to_chrono(order.estimated_ready_at)?)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| write_error("Failed to insert order", e))?;

    for (position, item) in order.items.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| StorageError::internal("too many order items"))?;
        query(
            r#"INSERT INTO order_items
                   (id, order_id, lab_test_id, unit_price_cents, turnaround_days_at_order, position)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(generate_id())
        .bind(&id)
        .bind(&item.lab_test_id)
        .bind(item.unit_price_cents)
        .bind(item.turnaround_days_at_order)
        .bind(position)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to insert order item", e))?;
    }

    let stored = fetch_order(&mut tx, &id)
        .await?
        .ok_or_else(|| StorageError::internal(format!("order {id} vanished after insert")))?;
    let detail = load_details(&mut tx, vec![stored])
        .await?
        .pop()
        .ok_or_else(|| StorageError::internal(format!("order {id} has no detail")))?;

    tx.commit()
        .await
        .map_err(|e| StorageError::transaction_error(format!("Failed to commit: {e}")))?;

    debug!(order_id = %id, items = order.items.len(), "Order created");
    Ok(detail)
}

/// Compare-and-set status update.
pub async fn update_status(
    pool: &PgPool,
    id: &str,
    expected: OrderStatus,
    target: OrderStatus,
) -> Result<OrderDetail, StorageError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| query_error("Failed to acquire connection", e))?;

    let now = time_to_chrono(now_utc())?;
    let sql = format!(
        r#"UPDATE orders o
           SET status = $3, updated_at = $4
           WHERE o.id = $1 AND o.status = $2
           RETURNING {ORDER_COLUMNS}"#
    );
    let row: Option<OrderRow> = query_as(&sql)
        .bind(id)
        .bind(expected.as_str())
        .bind(target.as_str())
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Failed to update order status", e))?;

    let Some(row) = row else {
        let actual: Option<String> = query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| query_error("Failed to read order status", e))?;
        return Err(match actual {
            Some(actual) => StorageError::version_conflict(expected.as_str(), actual),
            None => StorageError::not_found("Order", id),
        });
    };

    let order = order_from_row(row)?;
    load_details(&mut conn, vec![order])
        .await?
        .pop()
        .ok_or_else(|| StorageError::internal(format!("order {id} has no detail")))
}
