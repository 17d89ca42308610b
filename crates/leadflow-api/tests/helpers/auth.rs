//! Token minting for authenticated requests

use axum::http::HeaderValue;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use super::{TENANT_ID, USER_ID};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn token_for(user_id: i64, company_id: i64) -> String {
    let claims = json!({
        "user": { "id": user_id, "company_id": company_id },
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// `Authorization` header value for the default tenant's user
pub fn bearer() -> HeaderValue {
    bearer_for_tenant(TENANT_ID)
}

pub fn bearer_for_tenant(company_id: i64) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token_for(USER_ID, company_id)))
        .expect("Token is a valid header value")
}
