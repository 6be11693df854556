//! HTTP-facing error and response types shared by the LabDesk handlers.
//!
//! Every failure a handler can produce is an [`ApiError`]. Validation errors
//! render as `{"errors":[{"field","message"}]}`, everything else as
//! `{"error":"message"}`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use labdesk_core::{FieldError, InvalidTransition, ValidationErrors};
use labdesk_storage::StorageError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire shape of every error response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// High-level API errors to be mapped to HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed ({} errors)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// `field` is set when the missing record was named by a body field.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        field: Option<String>,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
            field: None,
        }
    }
    pub fn not_found_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
            field: Some(field.into()),
        }
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Maps a storage failure. Anything the client cannot act on is logged
    /// and replaced by `context`, e.g. `Failed to create order`.
    pub fn from_storage(err: StorageError, context: &str) -> Self {
        match err {
            StorageError::NotFound { entity, .. } => Self::not_found(format!("{entity} not found")),
            StorageError::VersionConflict { .. } => {
                Self::conflict(format!("Order was modified concurrently. {err}"))
            }
            StorageError::AlreadyExists { field, .. } => Self::field(field, err.to_string()),
            StorageError::InvalidReference { message } => Self::bad_request(message),
            other => {
                tracing::error!(error = %other, category = %other.category(), "{context}");
                Self::internal(context)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(errors) => ErrorBody {
                error: None,
                errors: Some(errors.clone()),
            },
            ApiError::NotFound {
                message,
                field: Some(field),
            } => ErrorBody {
                error: Some(message.clone()),
                errors: Some(vec![FieldError::new(field.clone(), message.clone())]),
            },
            ApiError::NotFound { message, .. }
            | ApiError::BadRequest(message)
            | ApiError::Conflict(message)
            | ApiError::PayloadTooLarge(message)
            | ApiError::ServiceUnavailable(message)
            | ApiError::Internal(message) => ErrorBody {
                error: Some(message.clone()),
                errors: None,
            },
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.into_vec())
    }
}

impl From<labdesk_core::CoreError> for ApiError {
    fn from(err: labdesk_core::CoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<InvalidTransition> for ApiError {
    fn from(err: InvalidTransition) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large(rejection.body_text());
        }
        Self::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Attaches a generic failure message to storage results.
pub trait StorageResultExt<T> {
    fn or_fail(self, context: &str) -> Result<T, ApiError>;
}

impl<T> StorageResultExt<T> for Result<T, StorageError> {
    fn or_fail(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::from_storage(err, context))
    }
}

/// JSON body extractor whose rejection is an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Successful JSON response with an explicit status.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self {
            value,
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn created(value: T) -> Self {
        Self::new(value, StatusCode::CREATED)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.value)).into_response();
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        if !headers.contains_key(header::CACHE_CONTROL) {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use serde_json::{Value, json};

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn api_error_variants_map_to_status() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (ApiError::field("fullName", "Name is required"), StatusCode::BAD_REQUEST),
            (ApiError::bad_request("x"), StatusCode::BAD_REQUEST),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::not_found_field("id", "x"), StatusCode::NOT_FOUND),
            (ApiError::conflict("x"), StatusCode::CONFLICT),
            (ApiError::payload_too_large("x"), StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::service_unavailable("x"), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[tokio::test]
    async fn validation_body_lists_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.push("fullName", "Name is required");
        errors.push("items.0.labTestId", "Lab test is required");

        let resp = ApiError::from(errors).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"errors": [
                {"field": "fullName", "message": "Name is required"},
                {"field": "items.0.labTestId", "message": "Lab test is required"}
            ]})
        );
    }

    #[tokio::test]
    async fn plain_errors_use_error_key() {
        let resp = ApiError::internal("Failed to fetch patients").into_response();
        assert_eq!(
            body_json(resp).await,
            json!({"error": "Failed to fetch patients"})
        );
    }

    #[tokio::test]
    async fn field_scoped_not_found_carries_both_shapes() {
        let resp = ApiError::not_found_field("id", "Patient not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Patient not found");
        assert_eq!(body["errors"][0]["field"], "id");
    }

    #[test]
    fn storage_errors_map_by_kind() {
        let err = ApiError::from_storage(StorageError::not_found("Order", "o1"), "Failed");
        assert!(matches!(
            &err,
            ApiError::NotFound { message, field: None } if message == "Order not found"
        ));

        let err = ApiError::from_storage(
            StorageError::version_conflict("DRAFT", "SUBMITTED"),
            "Failed",
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = ApiError::from_storage(
            StorageError::already_exists("LabTest", "code", "CBC"),
            "Failed",
        );
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].field, "code"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = ApiError::from_storage(
            StorageError::connection_error("refused"),
            "Failed to create order",
        );
        assert!(matches!(&err, ApiError::Internal(msg) if msg == "Failed to create order"));
    }

    #[tokio::test]
    async fn invalid_transition_is_a_plain_bad_request() {
        use labdesk_core::OrderStatus;

        let err = OrderStatus::Ready
            .transition_to(OrderStatus::InProgress)
            .unwrap_err();
        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let message = "Invalid status transition: cannot move order from READY to IN_PROGRESS";
        assert_eq!(body_json(resp).await, json!({ "error": message }));
    }

    #[tokio::test]
    async fn json_body_rejects_malformed_input() {
        let req = HttpRequest::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = JsonBody::<Value>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let req = HttpRequest::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"fullName":"Sarah"}"#))
            .unwrap();
        let JsonBody(value) = JsonBody::<Value>::from_request(req, &()).await.unwrap();
        assert_eq!(value["fullName"], "Sarah");
    }

    #[tokio::test]
    async fn api_response_created_sets_status() {
        let resp = ApiResponse::created(json!({"id": "p1"}))
            .with_header(header::LOCATION, HeaderValue::from_static("/api/patients/p1"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/api/patients/p1");
        assert_eq!(body_json(resp).await["id"], "p1");
    }
}
