use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use lta_common::Role;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Bearer-token claims. `role` gates which routes a caller may reach
/// (the admin/user/system distinction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Any successfully authenticated caller, regardless of role. Used by the
/// read-only GET routes.
pub struct AnyAuth(pub Claims);

impl FromRequestParts<Arc<AppState>> for AnyAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(AnyAuth(decode_bearer(parts, state)?))
    }
}

/// A caller authenticated as `system` or `admin`. Used by the mutating
/// routes workers call: PATCH, POST actions/pop, bulk_create, bulk_update,
/// bulk_delete.
pub struct SystemAuth(pub Claims);

impl FromRequestParts<Arc<AppState>> for SystemAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let claims = decode_bearer(parts, state)?;
        match claims.role {
            Role::System | Role::Admin => Ok(SystemAuth(claims)),
            Role::User => Err(ApiError::Forbidden),
        }
    }
}

/// A caller authenticated as `admin`. Used by DELETE routes.
pub struct AdminAuth(pub Claims);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let claims = decode_bearer(parts, state)?;
        match claims.role {
            Role::Admin => Ok(AdminAuth(claims)),
            Role::User | Role::System => Err(ApiError::Forbidden),
        }
    }
}

fn decode_bearer(parts: &Parts, state: &Arc<AppState>) -> Result<Claims, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    let mut validation = Validation::default();
    validation.set_issuer(&[state.auth_issuer.as_str()]);

    decode::<Claims>(token, &DecodingKey::from_secret(state.auth_secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims(role: Role) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: "tester".to_string(),
            role,
            exp: now + 3600,
            iat: now,
            iss: "lta".to_string(),
        }
    }

    #[test]
    fn system_or_admin_role_accepted_by_system_auth() {
        for role in [Role::System, Role::Admin] {
            let c = claims(role);
            assert!(matches!(c.role, Role::System | Role::Admin));
        }
    }

    #[test]
    fn token_roundtrips_through_jsonwebtoken() {
        let secret = "test-secret";
        let key = EncodingKey::from_secret(secret.as_bytes());
        let c = claims(Role::System);
        let token = encode(&Header::default(), &c, &key).unwrap();

        let mut validation = Validation::default();
        validation.set_issuer(&["lta"]);
        let decoded = decode::<Claims>(&token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .unwrap()
            .claims;
        assert_eq!(decoded.sub, "tester");
        assert!(matches!(decoded.role, Role::System));
    }
}
