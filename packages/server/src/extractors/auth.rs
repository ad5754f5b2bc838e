use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Roles allowed to modify the catalog.
pub const CATALOG_EDITOR_ROLES: &[&str] = &["admin", "editor"];

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen via `require_role()` in the handler body.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    /// Whether the user holds one of `roles`.
    pub fn authorize(&self, roles: &[&str]) -> bool {
        roles.contains(&self.role.as_str())
    }

    /// Returns `Ok(())` if the user holds ANY of the given roles.
    pub fn require_role(&self, roles: &[&str]) -> Result<(), AppError> {
        if self.authorize(roles) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Shorthand for the roles that may edit the catalog.
    pub fn require_editor(&self) -> Result<(), AppError> {
        self.require_role(CATALOG_EDITOR_ROLES)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(&state.config.auth.jwt_secret, token).map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
        })
    }
}
