//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` and convert domain errors
//! with `?` or `.map_err(Into::into)` so every failure renders the same envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadflow_core::{AppError, ErrorMetadata, LogLevel};
use leadflow_infra::ErrorResponse;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from leadflow-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<leadflow_processing::FileParseError> for HttpAppError {
    fn from(err: leadflow_processing::FileParseError) -> Self {
        HttpAppError(err.into())
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

/// Build the response body for `error`, hiding internals when `hide_details` is set
fn error_body(error: &AppError, hide_details: bool) -> ErrorResponse {
    let mut body = ErrorResponse::new(error.client_message(), error.error_code());
    body.recoverable = error.is_recoverable();
    body.suggested_action = error.suggested_action().map(String::from);
    body.errors = error.row_errors().to_vec();

    if !hide_details {
        body.details = Some(error.detailed_message());
        body.error_type = Some(error.error_type().to_string());
    }

    body
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Row errors are part of the contract and survive in production; free-text details do not.
        let hide_details = is_production_env() || app_error.is_sensitive();
        (status, Json(error_body(app_error, hide_details))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::models::RowError;

    #[test]
    fn test_invalid_rows_listed_in_body() {
        let err = AppError::InvalidRows(vec![
            RowError {
                row: 2,
                column: "phone".to_string(),
                message: "invalid phone number".to_string(),
            },
            RowError {
                row: 4,
                column: "cpf".to_string(),
                message: "invalid CPF".to_string(),
            },
        ]);
        let body = error_body(&err, true);
        assert_eq!(body.error, "file contains invalid rows");
        assert_eq!(body.code, "INVALID_ROWS");
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[1].column, "cpf");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_sensitive_error_hides_details() {
        let err = AppError::Internal("pool exhausted at 10.0.0.5".to_string());
        let response = HttpAppError(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = error_body(&AppError::Internal("secret".to_string()), true);
        assert_eq!(body.error, "Internal server error");
        assert!(body.error_type.is_none());
    }

    #[test]
    fn test_forbidden_status_and_message() {
        let err = AppError::Forbidden("UNABLE_TO_IMPORT_LEADS".to_string());
        let body = error_body(&err, false);
        assert_eq!(body.error, "UNABLE_TO_IMPORT_LEADS");
        assert_eq!(body.code, "FORBIDDEN");
        assert_eq!(body.error_type.as_deref(), Some("Forbidden"));

        let response = HttpAppError(err).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
