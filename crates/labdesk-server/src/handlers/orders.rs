//! Order handlers.
//!
//! Creating an order resolves the patient and every lab test first, then
//! freezes prices and turnaround onto the items and persists the order and
//! its items in one write. Status changes are checked against the lifecycle
//! and applied as a compare-and-set on the status that was checked.

use axum::extract::{Path, Query, State};
use labdesk_api::{ApiError, ApiResponse, ApiResult, JsonBody, StorageResultExt};
use labdesk_core::validation::{validate_new_order, validate_status_update};
use labdesk_core::{NewOrder, OrderDetail, OrderStatus, ValidationErrors, now_utc};
use labdesk_storage::{OrderFilter, StorageError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::server::AppState;

const CREATE_FAILED: &str = "Failed to create order";
const UPDATE_FAILED: &str = "Failed to update order";

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    /// Patient id.
    pub patient: Option<String>,
    /// Patient name substring.
    pub q: Option<String>,
}

impl OrderListParams {
    fn filter(&self) -> Result<OrderFilter, ApiError> {
        let mut filter = OrderFilter::default();
        if let Some(status) = non_blank(&self.status) {
            filter = filter.with_status(status.parse::<OrderStatus>()?);
        }
        if let Some(patient) = non_blank(&self.patient) {
            filter = filter.with_patient_id(patient);
        }
        if let Some(q) = non_blank(&self.q) {
            filter = filter.with_patient_name(q);
        }
        Ok(filter)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> ApiResult<ApiResponse<Vec<OrderDetail>>> {
    let filter = params.filter()?;
    let orders = state
        .storage
        .list_orders(&filter)
        .await
        .or_fail("Failed to fetch orders")?;
    Ok(ApiResponse::ok(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<OrderDetail>> {
    state
        .storage
        .get_order(&id)
        .await
        .or_fail("Failed to fetch order")?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

#[instrument(skip(state, body))]
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<ApiResponse<OrderDetail>> {
    let request = validate_new_order(&body)?;
    let mut errors = ValidationErrors::new();

    let patient = state
        .storage
        .get_patient(&request.patient_id)
        .await
        .or_fail(CREATE_FAILED)?;
    if patient.is_none() {
        errors.push("patientId", "Patient not found");
    }

    let mut items = Vec::with_capacity(request.items.len());
    for (index, item) in request.items.iter().enumerate() {
        let field = format!("items.{index}.labTestId");
        match state
            .storage
            .get_lab_test(&item.lab_test_id)
            .await
            .or_fail(CREATE_FAILED)?
        {
            Some(test) if test.is_active => items.push(item.snapshot(&test)),
            Some(_) => errors.push(field, "Lab test is not active"),
            None => errors.push(field, "Lab test not found"),
        }
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let order = NewOrder::draft(request.patient_id, items, now_utc());
    let detail = state
        .storage
        .create_order(&order)
        .await
        .or_fail(CREATE_FAILED)?;

    info!(
        order_id = %detail.order.id,
        total_cents = detail.order.total_cents,
        items = detail.items.len(),
        "Order created"
    );
    Ok(ApiResponse::created(detail))
}

#[instrument(skip(state, body))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<ApiResponse<OrderDetail>> {
    let target = validate_status_update(&body)?;

    let current = state
        .storage
        .get_order(&id)
        .await
        .or_fail(UPDATE_FAILED)?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    let from = current.order.status;
    from.transition_to(target)?;

    match state.storage.update_order_status(&id, from, target).await {
        Ok(detail) => {
            info!(order_id = %id, from = %from, to = %target, "Order status changed");
            Ok(ApiResponse::ok(detail))
        }
        Err(StorageError::NotFound { .. }) => Err(ApiError::not_found("Order not found")),
        Err(e) => Err(ApiError::from_storage(e, UPDATE_FAILED)),
    }
}
