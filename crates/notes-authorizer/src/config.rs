use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::authorizer::Authorizer;
use crate::jwt::{JwksProvider, JwtVerifier, KeySource};
use crate::static_token::StaticTokenVerifier;
use crate::verifier::{AuthError, CredentialVerifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// Literal `allow` / `deny` tokens
    #[default]
    Static,
    /// Verified identity tokens
    Jwt,
}

impl std::str::FromStr for AuthStrategy {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(AuthStrategy::Static),
            "jwt" => Ok(AuthStrategy::Jwt),
            other => Err(AuthError::Config(format!("Unknown auth strategy: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    #[serde(default)]
    pub strategy: AuthStrategy,

    /// Expected `iss` claim. Derived from `user_pool_id` + `region` when unset.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Accepted `aud` values
    #[serde(default)]
    pub audience: Vec<String>,

    /// Cognito user pool id, e.g. `ap-south-1_AbCdEf`
    #[serde(default)]
    pub user_pool_id: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Explicit JWKS location. Defaults to `<issuer>/.well-known/jwks.json`.
    #[serde(default)]
    pub jwks_uri: Option<Url>,

    /// HS256 secret for development issuers. Takes precedence over JWKS.
    #[serde(default)]
    pub shared_secret: Option<String>,

    /// Allowed clock skew for `exp`/`nbf`, in seconds
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    60
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::default(),
            issuer: None,
            audience: Vec::new(),
            user_pool_id: None,
            region: None,
            jwks_uri: None,
            shared_secret: None,
            leeway_secs: default_leeway_secs(),
        }
    }
}

impl AuthorizerConfig {
    /// The issuer tokens must carry, if one can be determined.
    pub fn resolved_issuer(&self) -> Option<String> {
        if let Some(issuer) = &self.issuer {
            return Some(issuer.trim_end_matches('/').to_string());
        }
        match (&self.user_pool_id, &self.region) {
            (Some(pool), Some(region)) => Some(format!(
                "https://cognito-idp.{}.amazonaws.com/{}",
                region, pool
            )),
            _ => None,
        }
    }

    pub fn resolved_jwks_uri(&self) -> Result<Option<Url>, AuthError> {
        if let Some(uri) = &self.jwks_uri {
            return Ok(Some(uri.clone()));
        }
        match self.resolved_issuer() {
            Some(issuer) => Url::parse(&format!("{}/.well-known/jwks.json", issuer))
                .map(Some)
                .map_err(|e| AuthError::Config(format!("Invalid issuer URL {}: {}", issuer, e))),
            None => Ok(None),
        }
    }

    /// Check that the selected strategy has everything it needs.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.strategy == AuthStrategy::Static {
            return Ok(());
        }
        if self.resolved_issuer().is_none() {
            return Err(AuthError::Config(
                "jwt strategy needs an issuer (or user_pool_id and region)".to_string(),
            ));
        }
        if self.audience.is_empty() {
            return Err(AuthError::Config(
                "jwt strategy needs at least one audience".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured verification strategy.
    pub fn build_verifier(&self) -> Result<Arc<dyn CredentialVerifier>, AuthError> {
        self.validate()?;

        match self.strategy {
            AuthStrategy::Static => Ok(Arc::new(StaticTokenVerifier)),
            AuthStrategy::Jwt => {
                let issuer = self
                    .resolved_issuer()
                    .ok_or_else(|| AuthError::Config("missing issuer".to_string()))?;

                let keys = match (&self.shared_secret, self.resolved_jwks_uri()?) {
                    (Some(secret), _) => KeySource::shared_secret(secret.as_bytes()),
                    (None, Some(uri)) => KeySource::Jwks(JwksProvider::new(uri)?),
                    (None, None) => {
                        return Err(AuthError::Config(
                            "jwt strategy needs a JWKS URI or a shared secret".to_string(),
                        ));
                    }
                };

                let verifier = JwtVerifier::new(keys, issuer, self.audience.clone())
                    .with_leeway(Duration::from_secs(self.leeway_secs));
                Ok(Arc::new(verifier))
            }
        }
    }

    pub fn build(&self) -> Result<Authorizer, AuthError> {
        Ok(Authorizer::new(self.build_verifier()?))
    }
}
