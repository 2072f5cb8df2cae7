use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// A single JSON Web Key. RSA keys carry `n`/`e`, EC keys carry `crv`/`x`/`y`.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    crv: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

/// Verification key together with the only algorithm it may be used with
#[derive(Clone)]
pub struct VerificationKey {
    pub algorithm: Algorithm,
    pub key: DecodingKey,
}

struct JwksCache {
    keys: HashMap<String, VerificationKey>,
    last_fetched: Instant,
}

pub struct JwksClient {
    jwks_url: String,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<JwksCache>>>,
    cache_ttl: Duration,
}

impl JwksClient {
    pub fn new(issuer_url: &str, cache_ttl: Duration) -> Self {
        Self {
            jwks_url: format!("{}/.well-known/jwks.json", issuer_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<VerificationKey, JwksError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.last_fetched.elapsed() < self.cache_ttl {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Cache miss, expired, or key rotated
        self.fetch_jwks().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.keys.get(kid).cloned())
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn fetch_jwks(&self) -> Result<(), JwksError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwksError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JwksError::FetchError(format!(
                "Failed to fetch JWKS: HTTP {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| JwksError::ParseError(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let Some(kid) = jwk.kid.clone() else {
                continue;
            };
            match convert_jwk(&jwk) {
                Ok(Some(key)) => {
                    keys.insert(kid, key);
                }
                Ok(None) => {
                    tracing::debug!(kid = %kid, kty = %jwk.kty, "Skipping unsupported JWK");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(count = keys.len(), "JWKS refreshed");

        let mut cache = self.cache.write().await;
        *cache = Some(JwksCache {
            keys,
            last_fetched: Instant::now(),
        });

        Ok(())
    }
}

/// Convert a JWK into a verification key. Returns `Ok(None)` for key types we don't accept.
fn convert_jwk(jwk: &Jwk) -> Result<Option<VerificationKey>, JwksError> {
    match (jwk.kty.as_str(), jwk.crv.as_deref()) {
        ("RSA", _) => {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                return Err(JwksError::KeyConversionError(
                    "RSA key missing modulus or exponent".to_string(),
                ));
            };
            let key = DecodingKey::from_rsa_components(n, e)
                .map_err(|e| JwksError::KeyConversionError(e.to_string()))?;
            Ok(Some(VerificationKey {
                algorithm: Algorithm::RS256,
                key,
            }))
        }
        ("EC", Some("P-256")) => {
            let (Some(x), Some(y)) = (jwk.x.as_deref(), jwk.y.as_deref()) else {
                return Err(JwksError::KeyConversionError(
                    "EC key missing coordinates".to_string(),
                ));
            };
            let key = DecodingKey::from_ec_components(x, y)
                .map_err(|e| JwksError::KeyConversionError(e.to_string()))?;
            Ok(Some(VerificationKey {
                algorithm: Algorithm::ES256,
                key,
            }))
        }
        _ => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("Failed to fetch JWKS: {0}")]
    FetchError(String),

    #[error("Failed to parse JWKS: {0}")]
    ParseError(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to convert key: {0}")]
    KeyConversionError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwk(json: &str) -> Jwk {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_jwks_url_from_issuer() {
        let client = JwksClient::new("https://auth.example.edu/auth/v1/", Duration::from_secs(1));
        assert_eq!(
            client.jwks_url,
            "https://auth.example.edu/auth/v1/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_unsupported_key_types_are_skipped() {
        let oct = jwk(r#"{"kid":"a","kty":"oct","k":"c2VjcmV0"}"#);
        assert!(convert_jwk(&oct).unwrap().is_none());

        let p384 = jwk(r#"{"kid":"b","kty":"EC","crv":"P-384","x":"AA","y":"AA"}"#);
        assert!(convert_jwk(&p384).unwrap().is_none());
    }

    #[test]
    fn test_incomplete_rsa_key_is_rejected() {
        let rsa = jwk(r#"{"kid":"c","kty":"RSA","e":"AQAB"}"#);
        assert!(matches!(
            convert_jwk(&rsa),
            Err(JwksError::KeyConversionError(_))
        ));
    }
}
