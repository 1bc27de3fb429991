//! Identity token verification.
//!
//! Tokens are JWTs bound to one issuer and a set of audiences. Signing keys
//! come from the issuer's JWKS (RS256) or from a shared secret (HS256).
//! The token header's algorithm must match the key source.

mod jwks;

pub use jwks::JwksProvider;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::decision::Effect;
use crate::verifier::{AuthError, CredentialVerifier, Verdict};

/// Principal reported for every verified token. The token subject travels in
/// the decision context instead.
pub const VERIFIED_PRINCIPAL: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    /// Cognito marks tokens as `id` or `access`
    #[serde(default)]
    pub token_use: Option<String>,
}

impl Claims {
    fn into_context(self) -> BTreeMap<String, String> {
        let mut context = BTreeMap::from([
            ("sub".to_string(), self.sub),
            ("iss".to_string(), self.iss),
        ]);
        if let Some(email) = self.email {
            context.insert("email".to_string(), email);
        }
        if let Some(token_use) = self.token_use {
            context.insert("token_use".to_string(), token_use);
        }
        context
    }
}

/// Where signing keys come from
pub enum KeySource {
    Jwks(JwksProvider),
    Secret(Arc<DecodingKey>),
}

impl KeySource {
    pub fn shared_secret(secret: &[u8]) -> Self {
        KeySource::Secret(Arc::new(DecodingKey::from_secret(secret)))
    }

    fn algorithm(&self) -> Algorithm {
        match self {
            KeySource::Jwks(_) => Algorithm::RS256,
            KeySource::Secret(_) => Algorithm::HS256,
        }
    }
}

pub struct JwtVerifier {
    keys: KeySource,
    issuer: String,
    audience: Vec<String>,
    leeway: Duration,
}

impl JwtVerifier {
    pub fn new(keys: KeySource, issuer: impl Into<String>, audience: Vec<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience,
            leeway: Duration::from_secs(60),
        }
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    async fn decoding_key(&self, kid: Option<&str>) -> Result<Arc<DecodingKey>, AuthError> {
        match &self.keys {
            KeySource::Secret(key) => Ok(key.clone()),
            KeySource::Jwks(provider) => {
                let kid = kid.ok_or_else(|| {
                    AuthError::InvalidToken("Token header has no kid".to_string())
                })?;
                provider.get_key(kid).await
            }
        }
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway.as_secs();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(self.audience.as_slice());
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Verdict, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("Malformed token header: {}", e)))?;

        let expected = self.keys.algorithm();
        if header.alg != expected {
            return Err(AuthError::InvalidToken(format!(
                "Algorithm {:?} not allowed, expected {:?}",
                header.alg, expected
            )));
        }

        let key = self.decoding_key(header.kid.as_deref()).await?;
        let data = decode::<Claims>(token, &key, &self.validation(expected))
            .map_err(|e| AuthError::InvalidToken(format!("Token rejected: {}", e)))?;

        Ok(Verdict {
            principal_id: VERIFIED_PRINCIPAL.to_string(),
            effect: Effect::Allow,
            context: data.claims.into_context(),
        })
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test_secret_for_unit_testing_only";
    const ISSUER: &str = "https://cognito-idp.ap-south-1.amazonaws.com/ap-south-1_test";
    const AUDIENCE: &str = "notes-client";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn claims() -> serde_json::Value {
        json!({
            "sub": "user-123",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": now() + 3600,
            "iat": now(),
            "email": "someone@example.com",
            "token_use": "id",
        })
    }

    fn sign(claims: &serde_json::Value, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(
            KeySource::shared_secret(SECRET),
            ISSUER,
            vec![AUDIENCE.to_string()],
        )
    }

    fn assert_invalid(result: Result<Verdict, AuthError>) {
        assert!(
            matches!(result, Err(AuthError::InvalidToken(_))),
            "expected invalid token, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn valid_token_is_allowed_with_claims_in_context() {
        let verdict = verifier().verify(&sign(&claims(), SECRET)).await.unwrap();

        assert_eq!(verdict.effect, Effect::Allow);
        assert_eq!(verdict.principal_id, "user");
        assert_eq!(verdict.context.get("sub").map(String::as_str), Some("user-123"));
        assert_eq!(verdict.context.get("iss").map(String::as_str), Some(ISSUER));
        assert_eq!(
            verdict.context.get("email").map(String::as_str),
            Some("someone@example.com")
        );
    }

    #[tokio::test]
    async fn expired_token_is_invalid() {
        let mut claims = claims();
        claims["exp"] = json!(now() - 3600);
        assert_invalid(verifier().verify(&sign(&claims, SECRET)).await);
    }

    #[tokio::test]
    async fn wrong_issuer_is_invalid() {
        let mut claims = claims();
        claims["iss"] = json!("https://evil.example.com");
        assert_invalid(verifier().verify(&sign(&claims, SECRET)).await);
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid() {
        let mut claims = claims();
        claims["aud"] = json!("someone-else");
        assert_invalid(verifier().verify(&sign(&claims, SECRET)).await);
    }

    #[tokio::test]
    async fn missing_audience_is_invalid() {
        let mut claims = claims();
        claims.as_object_mut().unwrap().remove("aud");
        assert_invalid(verifier().verify(&sign(&claims, SECRET)).await);
    }

    #[tokio::test]
    async fn bad_signature_is_invalid() {
        let token = sign(&claims(), b"a_completely_different_secret");
        assert_invalid(verifier().verify(&token).await);
    }

    #[tokio::test]
    async fn unsigned_token_is_invalid() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims().to_string());
        let token = format!("{}.{}.", header, payload);
        assert_invalid(verifier().verify(&token).await);
    }

    #[tokio::test]
    async fn algorithm_must_match_key_source() {
        // Forged RS256 header on an HS256-configured verifier
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims().to_string());
        let token = format!("{}.{}.c2ln", header, payload);

        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(msg)) if msg.contains("not allowed")));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_invalid(verifier().verify("not-a-jwt").await);
        assert_invalid(verifier().verify("a.b.c").await);
    }
}
