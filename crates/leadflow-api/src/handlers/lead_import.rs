use crate::auth::models::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use leadflow_core::models::ImportRequest;
use leadflow_core::AppError;
use leadflow_infra::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportAccepted {
    pub import_id: i64,
}

/// Request fields in the order their errors are reported
const REQUEST_FIELDS: [&str; 4] = ["name", "account_id", "source_id", "tag_ids"];

fn first_validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    REQUEST_FIELDS
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .chain(field_errors.values())
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| format!("Validation error: {}", errors))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("upload exceeds the maximum request size".to_string())
    } else {
        AppError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

struct Upload {
    data: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload {
        data: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("data") => upload.data = Some(field.text().await.map_err(multipart_error)?),
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload.file = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    Ok(upload)
}

#[utoipa::path(
    post,
    path = "/api/v1/leads/import",
    tag = "leads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import accepted; processing continues in background", body = ImportAccepted),
        (status = 400, description = "Invalid request or file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller may not import leads", body = ErrorResponse),
        (status = 404, description = "Unknown source or account", body = ErrorResponse),
        (status = 409, description = "Import name already used", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Invalid tag ids", body = ErrorResponse),
        (status = 429, description = "Import rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Permission service unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(tenant_id = auth.tenant.tenant_id, user_id = auth.tenant.user_id))]
pub async fn import_leads(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    multipart: Multipart,
) -> Result<Json<ImportAccepted>, HttpAppError> {
    if !state
        .permissions
        .can_import_leads(&auth.bearer, auth.tenant.tenant_id)
        .await?
    {
        return Err(AppError::Forbidden("UNABLE_TO_IMPORT_LEADS".to_string()).into());
    }

    let upload = read_upload(multipart).await?;

    let data = upload
        .data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("missing 'data' form field".to_string()))?;
    let request: ImportRequest = serde_json::from_str(&data)
        .map_err(|e| AppError::BadRequest(format!("invalid 'data' JSON: {}", e)))?;
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(first_validation_message(&e)))?;

    let (file_name, bytes) = upload.file.ok_or_else(|| {
        AppError::BadRequest(
            "missing 'file': use form field 'file' with a CSV or Excel file".to_string(),
        )
    })?;
    if bytes.len() > state.upload.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "file must be at most {} bytes",
            state.upload.max_upload_bytes
        ))
        .into());
    }

    let parser = state.upload.file_parser.clone();
    let rows = tokio::task::spawn_blocking(move || parser.parse(&bytes, &file_name))
        .await
        .map_err(|e| AppError::Internal(format!("file parsing task failed: {}", e)))??;

    let import_id = state
        .orchestrator
        .start_import(auth.tenant, &request, rows)
        .await?;

    Ok(Json(ImportAccepted { import_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_validation_message_follows_field_order() {
        let request = ImportRequest {
            name: String::new(),
            account_id: 0,
            source_id: 3,
            tag_ids: vec![],
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            first_validation_message(&errors),
            "name is required and must be at most 255 characters"
        );

        let request = ImportRequest {
            name: "ok".to_string(),
            account_id: 7,
            source_id: 0,
            tag_ids: vec![],
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(first_validation_message(&errors), "source_id is required");
    }
}
