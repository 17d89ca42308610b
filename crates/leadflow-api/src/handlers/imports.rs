use crate::auth::models::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use leadflow_core::models::LeadImport;
use leadflow_core::AppError;
use leadflow_infra::ErrorResponse;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListImportsQuery {
    /// Page size, 1 to 200 (default 50)
    pub limit: Option<i64>,
    /// Rows to skip (default 0)
    pub offset: Option<i64>,
}

impl ListImportsQuery {
    fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/leads/imports/{id}",
    tag = "leads",
    params(
        ("id" = i64, Path, description = "Import job ID")
    ),
    responses(
        (status = 200, description = "Import job", body = LeadImport),
        (status = 404, description = "No such import for this company", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_import(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<LeadImport>, HttpAppError> {
    let job = state
        .jobs
        .get_import(auth.tenant.tenant_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("import not found".to_string()))?;

    Ok(Json(job))
}

#[utoipa::path(
    get,
    path = "/api/v1/leads/imports",
    tag = "leads",
    params(ListImportsQuery),
    responses(
        (status = 200, description = "Import jobs, newest first", body = Vec<LeadImport>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_imports(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(query): Query<ListImportsQuery>,
) -> Result<Json<Vec<LeadImport>>, HttpAppError> {
    let (limit, offset) = query.page();
    let jobs = state
        .jobs
        .list_imports(auth.tenant.tenant_id, limit, offset)
        .await?;

    Ok(Json(jobs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_bounds() {
        let query = ListImportsQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(query.page(), (50, 0));

        let query = ListImportsQuery {
            limit: Some(1000),
            offset: Some(-3),
        };
        assert_eq!(query.page(), (200, 0));

        let query = ListImportsQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(query.page(), (1, 20));
    }
}
