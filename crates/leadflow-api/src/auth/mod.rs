//! Bearer authentication
//!
//! Tokens are HS256 JWTs minted by the identity service. The middleware resolves them
//! into an [`AuthContext`](models::AuthContext) that handlers extract directly.

pub mod middleware;
pub mod models;
