//! # Authentication and Authorization
//!
//! The Scheduling API trusts an upstream authorization collaborator (the
//! gateway) to verify credentials and forward a normalized identity as
//! `X-User-Id` / `X-User-Role` / `X-User-Permissions` headers. This module
//! turns those headers into a typed [`AuthContext`], and provides the role
//! and permission guards the handlers apply before invoking the
//! orchestrator. No credential verification happens here.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, forbidden, unauthorized};

/// Caller role as resolved by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Provider of sessions (publishes availability, hosts sessions)
    Teacher,
    /// Consumer of sessions (books slots, enrolls)
    Student,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// Verified caller identity attached to each request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Raw caller identifier as supplied by the gateway; normalized to a
    /// canonical UUID by the orchestrator
    pub user_id: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl AuthContext {
    /// Fails with 403 unless the caller holds the given role.
    pub fn require_role(&self, role: Role, action: &str) -> Result<(), ApiError> {
        if self.role != role {
            let who = match role {
                Role::Teacher => "teachers",
                Role::Student => "students",
            };
            return Err(forbidden(Some(&format!("Only {} can {}", who, action))));
        }
        Ok(())
    }

    /// Fails with 403 unless the caller carries the given permission.
    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if !self.permissions.iter().any(|p| p == permission) {
            return Err(forbidden(Some(&format!(
                "Insufficient permissions: {} required",
                permission
            ))));
        }
        Ok(())
    }
}

/// Extractor for the caller identity from request extensions.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| unauthorized(Some("Missing user authentication headers")))
    }
}

/// Middleware resolving the gateway identity headers into an [`AuthContext`].
pub async fn auth_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let context = parse_identity_headers(request.headers())?;

    tracing::debug!(user_id = %context.user_id, role = ?context.role, "Resolved caller identity");

    let mut request = request;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn parse_identity_headers(headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let user_id = headers
        .get("X-User-Id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthorized(Some("Missing user authentication headers")))?
        .to_string();

    let role_raw = headers
        .get("X-User-Role")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthorized(Some("Missing user authentication headers")))?;

    let role =
        Role::parse(role_raw).ok_or_else(|| forbidden(Some("Invalid user role")))?;

    let permissions = headers
        .get("X-User-Permissions")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(AuthContext {
        user_id,
        role,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: &str, role: &str, permissions: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("X-User-Id", HeaderValue::from_str(id).unwrap());
        map.insert("X-User-Role", HeaderValue::from_str(role).unwrap());
        map.insert(
            "X-User-Permissions",
            HeaderValue::from_str(permissions).unwrap(),
        );
        map
    }

    #[test]
    fn parses_full_identity() {
        let ctx =
            parse_identity_headers(&headers("teacher-9", "teacher", "create_session,view_sessions"))
                .unwrap();
        assert_eq!(ctx.user_id, "teacher-9");
        assert_eq!(ctx.role, Role::Teacher);
        assert_eq!(ctx.permissions.len(), 2);
    }

    #[test]
    fn missing_identity_is_unauthorized() {
        let err = parse_identity_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unknown_role_is_forbidden() {
        let err = parse_identity_headers(&headers("u", "admin", "")).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn role_and_permission_guards() {
        let ctx = parse_identity_headers(&headers("s1", "student", "book_session")).unwrap();

        assert!(ctx.require_role(Role::Student, "book sessions").is_ok());
        assert!(ctx.require_role(Role::Teacher, "create group sessions").is_err());
        assert!(ctx.require_permission("book_session").is_ok());
        assert!(ctx.require_permission("enroll_session").is_err());
    }
}
