use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use leadflow_core::models::TenantContext;
use leadflow_core::AppError;
use serde::{Deserialize, Serialize};

/// User block embedded in the token by the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub company_id: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user: JwtUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Authenticated caller, stored in request extensions by the auth middleware
///
/// The raw bearer is kept for forwarding to the permission oracle.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub tenant: TenantContext,
    pub bearer: String,
}

// Extension cannot be used with Multipart, so we extract directly from request parts
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing tenant context".to_string(),
                ))
            })
    }
}
