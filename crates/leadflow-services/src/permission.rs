//! Permission oracle consulted before an import is accepted

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use leadflow_core::AppError;

pub const IMPORT_LEADS_MODULE: &str = "LEADS";
pub const IMPORT_LEADS_PERMISSION: &str = "IMPORT_LEADS";

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Whether the bearer may import leads into `tenant_id`
    ///
    /// `Ok(false)` is a denial; `Err` means the oracle could not be asked.
    async fn can_import_leads(&self, bearer: &str, tenant_id: i64) -> Result<bool, AppError>;
}

/// Grants every request. Selected when the oracle URL is `IGNORE`.
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionChecker for AllowAllPermissions {
    async fn can_import_leads(&self, _bearer: &str, _tenant_id: i64) -> Result<bool, AppError> {
        Ok(true)
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    permissions: Vec<ModulePermissions>,
}

#[derive(Debug, Deserialize)]
struct ModulePermissions {
    module: String,
    #[serde(default)]
    permissions: Vec<String>,
}

impl UserInfo {
    fn allows_import(&self) -> bool {
        self.permissions.iter().any(|m| {
            m.module == IMPORT_LEADS_MODULE
                && m.permissions.iter().any(|p| p == IMPORT_LEADS_PERMISSION)
        })
    }
}

/// Asks `GET {base_url}/api/user/info` on behalf of the caller
pub struct HttpPermissionChecker {
    client: Client,
    base_url: String,
}

impl HttpPermissionChecker {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PermissionChecker for HttpPermissionChecker {
    #[tracing::instrument(skip(self, bearer))]
    async fn can_import_leads(&self, bearer: &str, tenant_id: i64) -> Result<bool, AppError> {
        let url = format!("{}/api/user/info", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer)
            .header("company-id", tenant_id.to_string())
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("permission check failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            tracing::info!(status = %response.status(), "Permission oracle refused caller");
            return Ok(false);
        }

        let info: UserInfo = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("failed to parse permission response: {}", e))
        })?;

        Ok(info.allows_import())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn user_info(headers: HeaderMap) -> Json<serde_json::Value> {
        let company = headers
            .get("company-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let permissions = if company == "1" {
            json!([{ "module": "LEADS", "permissions": ["VIEW_LEADS", "IMPORT_LEADS"] }])
        } else {
            json!([{ "module": "LEADS", "permissions": ["VIEW_LEADS"] }])
        };
        Json(json!({ "permissions": permissions }))
    }

    #[test]
    fn test_allows_import_requires_module_and_permission() {
        let info: UserInfo = serde_json::from_value(json!({
            "permissions": [{ "module": "CHATS", "permissions": ["IMPORT_LEADS"] }]
        }))
        .unwrap();
        assert!(!info.allows_import());

        let info: UserInfo = serde_json::from_value(json!({
            "permissions": [{ "module": "LEADS", "permissions": ["IMPORT_LEADS"] }]
        }))
        .unwrap();
        assert!(info.allows_import());
    }

    #[tokio::test]
    async fn test_http_checker_reads_oracle_response() {
        let base = serve(Router::new().route("/api/user/info", get(user_info))).await;
        let checker = HttpPermissionChecker::new(Client::new(), format!("{}/", base));

        assert!(checker.can_import_leads("token", 1).await.unwrap());
        assert!(!checker.can_import_leads("token", 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_http_checker_non_ok_is_denial() {
        let base = serve(Router::new().route(
            "/api/user/info",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, "nope") }),
        ))
        .await;
        let checker = HttpPermissionChecker::new(Client::new(), base);

        assert!(!checker.can_import_leads("token", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_allow_all() {
        assert!(AllowAllPermissions.can_import_leads("", 9).await.unwrap());
    }
}
