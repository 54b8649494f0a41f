//! Time-limited download tokens for generated artifacts.
//!
//! Tokens are HS256 JWTs carrying only the artifact file name and an expiry.
//! No route serves artifacts yet; these are the signing primitives a download
//! endpoint would check.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactClaims {
    file_name: String,
    exp: usize,
}

/// Sign a token granting access to `file_name` for `ttl`.
pub fn sign_artifact_token(
    config: &JwtConfig,
    file_name: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = ArtifactClaims {
        file_name: file_name.to_string(),
        exp: now + ttl.as_secs() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Return the file name a token grants access to, or `None` when the token is
/// forged, malformed or expired.
pub fn verify_artifact_token(config: &JwtConfig, token: &str) -> Option<String> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    match decode::<ArtifactClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(data.claims.file_name),
        Err(e) => {
            log::debug!("Rejected artifact token: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_token_round_trips_file_name() {
        let config = JwtConfig::new("artifact-secret");
        let token = sign_artifact_token(&config, "invoice_abc.pdf", Duration::from_secs(60)).unwrap();
        assert_eq!(
            verify_artifact_token(&config, &token).as_deref(),
            Some("invoice_abc.pdf")
        );
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token =
            sign_artifact_token(&JwtConfig::new("a"), "invoice.pdf", Duration::from_secs(60)).unwrap();
        assert!(verify_artifact_token(&JwtConfig::new("b"), &token).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = JwtConfig::new("artifact-secret");
        let expired = ArtifactClaims {
            file_name: "invoice.pdf".to_string(),
            exp: (chrono::Utc::now().timestamp() - 120) as usize,
        };
        let token = encode(
            &Header::default(),
            &expired,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_artifact_token(&config, &token).is_none());
    }

    #[test]
    fn test_access_token_is_not_an_artifact_token() {
        let config = JwtConfig::new("artifact-secret");
        let access = crate::auth::generate_access_token(&config, "user", "a@b.c").unwrap();
        assert!(verify_artifact_token(&config, &access).is_none());
    }
}
