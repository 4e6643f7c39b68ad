//! JWT authentication module.
//!
//! Verifies HS256 bearer tokens and turns them into the acting user.
//! Token issuance belongs to the identity service; [`JwtManager::sign`]
//! exists for trusted tooling and tests.
//!
//! ## Roles
//! ```text
//! staff  <  manager  <  admin
//!
//! reads                         any authenticated user
//! invoice / payment / customer  manager
//! product / import-order writes manager
//! import-order delete           admin
//! audit-log delete              admin
//! ```

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use steel_core::Actor;

use crate::error::ApiError;

/// User role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Display name recorded on audit rows
    pub username: String,

    pub role: Role,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager").finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign claims into a token.
    pub fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthenticated(format!("Invalid token: {}", e)))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// First `x-forwarded-for` hop, else `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuthUser {
    /// Fails with 403 unless the caller holds at least `min`.
    pub fn require(&self, min: Role) -> Result<(), ApiError> {
        if self.role >= min {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                role = self.role.as_str(),
                required = min.as_str(),
                "Permission denied"
            );
            Err(ApiError::forbidden(format!(
                "Requires {} role",
                min.as_str()
            )))
        }
    }

    /// Audit actor for this request.
    pub fn actor(&self) -> Actor {
        Actor::user(self.user_id, self.username.clone())
            .with_request(self.ip_address.clone(), self.user_agent.clone())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthenticated("Missing bearer token"))?;

        let claims = jwt.verify(token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::unauthenticated("Invalid token subject"))?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
            role: claims.role,
            ip_address: client_ip(&parts.headers),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    fn claims(role: Role, ttl_secs: i64) -> Claims {
        Claims {
            sub: "7".into(),
            username: "thu.ngan".into(),
            role,
            exp: (Utc::now() + Duration::seconds(ttl_secs)).timestamp(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret");
        let token = manager.sign(&claims(Role::Manager, 3600)).unwrap();

        let decoded = manager.verify(&token).unwrap();
        assert_eq!(decoded.sub, "7");
        assert_eq!(decoded.username, "thu.ngan");
        assert_eq!(decoded.role, Role::Manager);
    }

    #[test]
    fn test_rejects_expired_and_foreign_tokens() {
        let manager = JwtManager::new("test-secret");

        let expired = manager.sign(&claims(Role::Admin, -3600)).unwrap();
        assert!(manager.verify(&expired).is_err());

        let foreign = JwtManager::new("other-secret")
            .sign(&claims(Role::Admin, 3600))
            .unwrap();
        assert!(manager.verify(&foreign).is_err());
    }

    #[test]
    fn test_role_ordering() {
        let user = AuthUser {
            user_id: 1,
            username: "nv".into(),
            role: Role::Manager,
            ip_address: None,
            user_agent: None,
        };
        assert!(user.require(Role::Staff).is_ok());
        assert!(user.require(Role::Manager).is_ok());
        assert!(user.require(Role::Admin).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5, 10.0.0.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.5"));
    }
}
