use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{Error, HttpRequest};
use uuid::Uuid;

use super::jwt::{validate_token, ACCESS_TOKEN_TYPE};
use super::model::{Claims, User};
use super::store::UserStore;
use crate::config::JwtConfig;

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest, config: &JwtConfig) -> Result<Claims, Error> {
    let token =
        extract_token(req).ok_or_else(|| ErrorUnauthorized("Missing authorization token"))?;

    let claims = validate_token(config, &token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        ErrorUnauthorized("Invalid or expired token")
    })?;

    if claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(ErrorUnauthorized("Invalid token type"));
    }

    Ok(claims)
}

/// Resolve the calling user's id from the bearer token.
pub fn authenticated_user_id(req: &HttpRequest, config: &JwtConfig) -> Result<Uuid, Error> {
    validate_request_token(req, config)?
        .user_id()
        .ok_or_else(|| ErrorUnauthorized("Invalid token subject"))
}

/// Resolve the calling user and confirm the account still exists and is
/// active. A valid token for a deleted or disabled account is rejected.
pub async fn authenticated_user(
    req: &HttpRequest,
    config: &JwtConfig,
    users: &dyn UserStore,
) -> Result<User, Error> {
    let user_id = authenticated_user_id(req, config)?;

    match users.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active => Ok(user),
        Ok(_) => {
            log::warn!("Rejected token for unknown or inactive user {}", user_id);
            Err(ErrorUnauthorized("User no longer exists"))
        }
        Err(e) => {
            log::error!("Database error loading user: {:?}", e);
            Err(ErrorInternalServerError("Failed to load user"))
        }
    }
}
