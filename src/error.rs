//! Error types for the leave workflow and their HTTP mapping.

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveStatus;

/// One rejected input field, reported so the form can highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "end_date")]
    pub field: String,
    #[schema(example = "end date must not be before start date")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Failures reported by a storage adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the query shape (for instance a missing index).
    #[error("store rejected query: {0}")]
    Query(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::Query(db_err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Malformed(err.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("leave request {0} not found")]
    NotFound(u64),

    #[error("leave request {id} is already {status}")]
    Conflict { id: u64, status: LeaveStatus },

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LeaveError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        LeaveError::Validation(vec![FieldError::new(field, message)])
    }

    /// Field errors carried by a validation failure, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            LeaveError::Validation(fields) => fields,
            _ => &[],
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Conflict { .. } => StatusCode::CONFLICT,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            LeaveError::Validation(fields) => json!({
                "message": "Validation failed",
                "errors": fields,
            }),
            // store details stay in the logs
            LeaveError::Store(_) => json!({ "message": "Internal Server Error" }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Error handler for JSON bodies that do not deserialize at all, so they get
/// the same `{ message, errors }` shape as field validation.
pub fn json_payload_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, path = req.path(), "Unreadable JSON body");
    LeaveError::invalid("body", err.to_string()).into()
}
