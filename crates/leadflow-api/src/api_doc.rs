//! OpenAPI documentation, served at `/api/v1/openapi.json`

use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use leadflow_core::models::{ImportCounters, ImportRequest, LeadImport, LeadImportStatus, RowError};
use leadflow_infra::ErrorResponse;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadflow API",
        version = "0.1.0",
        description = "Bulk lead import: upload a contact sheet, poll the resulting job."
    ),
    paths(
        handlers::lead_import::import_leads,
        handlers::imports::get_import,
        handlers::imports::list_imports,
        handlers::health::health_check,
    ),
    components(schemas(
        ImportRequest,
        handlers::lead_import::ImportAccepted,
        LeadImport,
        LeadImportStatus,
        ImportCounters,
        RowError,
        ErrorResponse,
        handlers::health::HealthCheckResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "leads", description = "Lead import jobs"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_import_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/api/v1/leads/import"));
        assert!(spec.paths.paths.contains_key("/api/v1/leads/imports/{id}"));
        assert!(spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
