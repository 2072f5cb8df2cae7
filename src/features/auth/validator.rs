use super::model::AuthenticatedUser;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::jwks::JwksClient;

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "iss")]
    _iss: String,
    #[serde(rename = "exp")]
    _exp: u64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    /// Postgres role of the hosted auth service ("authenticated", "anon", ...)
    #[serde(default)]
    role: Option<String>,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let verification = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        // A key is only ever accepted with the algorithm it was published for
        if header.alg != verification.algorithm {
            return Err(AppError::Auth(format!(
                "Unexpected algorithm {:?} for key {}",
                header.alg, kid
            )));
        }

        let mut validation = Validation::new(verification.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &verification.key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        claims_to_user(claims)
    }
}

fn claims_to_user(claims: Claims) -> Result<AuthenticatedUser, AppError> {
    if claims.role.as_deref() == Some("anon") {
        return Err(AppError::Auth(
            "Anonymous tokens cannot access this service".to_string(),
        ));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Auth("Token subject is not a user id".to_string()))?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
        session_id: claims.session_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            _iss: "issuer".to_string(),
            _exp: 0,
            email: Some("student@example.edu".to_string()),
            session_id: None,
            role: role.map(String::from),
        }
    }

    #[test]
    fn test_claims_to_user() {
        let id = Uuid::new_v4();
        let user = claims_to_user(claims(&id.to_string(), Some("authenticated"))).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email.as_deref(), Some("student@example.edu"));
    }

    #[test]
    fn test_rejects_anonymous_and_non_uuid_subjects() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            claims_to_user(claims(&id, Some("anon"))),
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            claims_to_user(claims("service-account", None)),
            Err(AppError::Auth(_))
        ));
    }
}
