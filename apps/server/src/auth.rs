//! Login token handling and the authenticated-user extractor.
//!
//! The original session model is a signed, self-contained token: `login`
//! issues a JWT carrying the username, display name and role; every `/api`
//! handler extracts an [`AuthUser`] from the `Authorization: Bearer` header
//! and checks one permission before doing anything. There is no server-side
//! session store - a token is valid until it expires.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use lacto_core::{Permission, Role, User};

// =============================================================================
// Claims
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Display name, so handlers never re-query the user row
    pub name: String,

    /// Role at login time; a role change takes effect at next login
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

// =============================================================================
// JwtManager
// =============================================================================

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    token_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, token_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            token_lifetime_secs,
        }
    }

    /// Generate a login token for a verified user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_lifetime_secs);

        let claims = Claims {
            sub: user.username.clone(),
            name: user.display_name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

// =============================================================================
// AuthUser Extractor
// =============================================================================

/// The authenticated user behind a request.
///
/// Extracted from the Bearer token by axum; handlers receive it as an
/// argument and call [`AuthUser::require`] with the permission the
/// operation needs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Login name; snapshotted onto sale records as `recorded_by`.
    pub username: String,

    /// Display name from the token.
    pub display_name: String,

    /// Role driving permission checks.
    pub role: Role,
}

impl AuthUser {
    /// Fails with Forbidden unless the user's role grants the permission.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {:?} does not grant {:?}",
                self.role, permission
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = extract_bearer_token(auth_header)
            .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;

        let claims = state.jwt.validate_token(token)?;

        Ok(AuthUser {
            username: claims.sub,
            display_name: claims.name,
            role: claims.role,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn test_user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            username: "operator".to_string(),
            password_hash: "unused".to_string(),
            display_name: "Stock Operator".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(&test_user(Role::Operator)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "operator");
        assert_eq!(claims.name, "Stock Operator");
        assert_eq!(claims.role, Role::Operator);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);

        let token = issuer.generate_token(&test_user(Role::Manager)).unwrap();
        let err = verifier.validate_token(&token).unwrap_err();

        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), -3600);

        let token = manager.generate_token(&test_user(Role::Manager)).unwrap();
        let err = manager.validate_token(&token).unwrap_err();

        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic dXNlcg=="), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_require_permission() {
        let user = AuthUser {
            username: "auditor".to_string(),
            display_name: "Stock Auditor".to_string(),
            role: Role::Viewer,
        };

        assert!(user.require(Permission::ViewWarehouse).is_ok());

        let err = user.require(Permission::RecordSales).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
