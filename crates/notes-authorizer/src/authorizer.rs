use std::sync::Arc;

use crate::decision::AccessDecision;
use crate::verifier::{AuthError, CredentialVerifier};

/// Turns a bearer credential into an access decision for one resource.
#[derive(Clone)]
pub struct Authorizer {
    verifier: Arc<dyn CredentialVerifier>,
}

impl Authorizer {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    pub fn strategy(&self) -> &'static str {
        self.verifier.name()
    }

    /// Decide whether `credential` may invoke `resource`.
    ///
    /// `credential` may carry a `Bearer ` prefix. An invalid credential is an
    /// error, never a Deny decision.
    pub async fn authorize(
        &self,
        credential: &str,
        resource: &str,
    ) -> Result<AccessDecision, AuthError> {
        let token = strip_bearer(credential);
        if token.is_empty() {
            return Err(AuthError::InvalidToken("empty credential".to_string()));
        }

        let verdict = match self.verifier.verify(token).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::debug!(strategy = self.strategy(), resource, "Rejected credential: {}", e);
                return Err(e);
            }
        };

        let decision = AccessDecision {
            principal_id: verdict.principal_id,
            effect: verdict.effect,
            resource: resource.to_string(),
            context: verdict.context,
        };
        tracing::info!(
            strategy = self.strategy(),
            principal = %decision.principal_id,
            effect = ?decision.effect,
            resource,
            "Access decision"
        );
        Ok(decision)
    }
}

/// Remove a leading `Bearer ` (any case) and surrounding whitespace.
pub fn strip_bearer(credential: &str) -> &str {
    let credential = credential.trim();
    match credential.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => credential[7..].trim(),
        _ => credential,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Effect;
    use crate::static_token::StaticTokenVerifier;

    const RESOURCE: &str = "arn:aws:execute-api:ap-south-1:123456789012:abc/dev/POST/notes";

    fn authorizer() -> Authorizer {
        Authorizer::new(Arc::new(StaticTokenVerifier))
    }

    #[tokio::test]
    async fn allow_echoes_resource() {
        let decision = authorizer().authorize("allow", RESOURCE).await.unwrap();
        assert_eq!(decision.effect, Effect::Allow);
        assert_eq!(decision.resource, RESOURCE);
        assert_eq!(decision.principal_id, "user");
    }

    #[tokio::test]
    async fn deny_is_a_decision() {
        let decision = authorizer().authorize("deny", RESOURCE).await.unwrap();
        assert_eq!(decision.effect, Effect::Deny);
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn unknown_token_is_an_error() {
        let result = authorizer().authorize("letmein", RESOURCE).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));

        let result = authorizer().authorize("Bearer ", RESOURCE).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn bearer_prefix_is_accepted() {
        let decision = authorizer()
            .authorize("Bearer allow", RESOURCE)
            .await
            .unwrap();
        assert_eq!(decision.effect, Effect::Allow);
    }

    #[test]
    fn strip_bearer_variants() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("bearer   abc "), "abc");
        assert_eq!(strip_bearer("abc"), "abc");
        assert_eq!(strip_bearer("Bear"), "Bear");
        assert_eq!(strip_bearer(""), "");
    }
}
