use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, header};
use labdesk_api::{ApiError, ApiResponse, ApiResult, JsonBody, StorageResultExt};
use labdesk_core::validation::{validate_new_patient, validate_patient_patch};
use labdesk_core::{Patient, PatientQuery};
use serde::Deserialize;
use serde_json::Value;

use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientListParams {
    pub search: Option<String>,
    pub field: Option<String>,
}

pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<PatientListParams>,
) -> ApiResult<ApiResponse<Vec<Patient>>> {
    let query = PatientQuery::parse(params.search.as_deref(), params.field.as_deref())?;
    let patients = state
        .storage
        .list_patients(&query)
        .await
        .or_fail("Failed to fetch patients")?;
    Ok(ApiResponse::ok(patients))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Patient>> {
    state
        .storage
        .get_patient(&id)
        .await
        .or_fail("Failed to fetch patient")?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::not_found("Patient not found"))
}

pub async fn create_patient(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<ApiResponse<Patient>> {
    let input = validate_new_patient(&body)?;
    let patient = state
        .storage
        .create_patient(&input)
        .await
        .or_fail("Failed to create patient")?;

    tracing::info!(patient_id = %patient.id, "Patient created");
    let mut response = ApiResponse::created(patient);
    if let Ok(location) = HeaderValue::try_from(format!("/api/patients/{}", response.value.id)) {
        response = response.with_header(header::LOCATION, location);
    }
    Ok(response)
}

/// `PATCH /api/patients` with the patient id in the body.
pub async fn update_patient(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<ApiResponse<Patient>> {
    let (id, patch) = validate_patient_patch(&body)?;
    match state.storage.update_patient(&id, &patch).await {
        Ok(patient) => Ok(ApiResponse::ok(patient)),
        Err(e) if e.is_not_found() => Err(ApiError::not_found_field("id", "Patient not found")),
        Err(e) => Err(ApiError::from_storage(e, "Failed to update patient")),
    }
}
