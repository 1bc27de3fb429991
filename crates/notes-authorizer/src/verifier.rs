use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::decision::Effect;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential is missing, malformed, expired or unverifiable.
    /// No policy document is produced for it.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Authorizer misconfigured: {0}")]
    Config(String),
}

/// What a verifier concluded about a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub principal_id: String,
    pub effect: Effect,
    pub context: BTreeMap<String, String>,
}

impl Verdict {
    pub fn new(principal_id: impl Into<String>, effect: Effect) -> Self {
        Self {
            principal_id: principal_id.into(),
            effect,
            context: BTreeMap::new(),
        }
    }
}

/// Credential verification strategy, chosen once at startup.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check `token` (without any `Bearer ` prefix).
    async fn verify(&self, token: &str) -> Result<Verdict, AuthError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
