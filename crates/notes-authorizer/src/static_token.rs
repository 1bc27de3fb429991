use async_trait::async_trait;

use crate::decision::Effect;
use crate::verifier::{AuthError, CredentialVerifier, Verdict};

pub const STATIC_PRINCIPAL: &str = "user";

/// Accepts the literal tokens `allow` and `deny`; anything else is invalid.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticTokenVerifier;

#[async_trait]
impl CredentialVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Verdict, AuthError> {
        match token {
            "allow" => Ok(Verdict::new(STATIC_PRINCIPAL, Effect::Allow)),
            "deny" => Ok(Verdict::new(STATIC_PRINCIPAL, Effect::Deny)),
            _ => Err(AuthError::InvalidToken(
                "expected `allow` or `deny`".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_literal_tokens() {
        let verifier = StaticTokenVerifier;

        let allow = verifier.verify("allow").await.unwrap();
        assert_eq!(allow.effect, Effect::Allow);
        assert_eq!(allow.principal_id, "user");
        assert!(allow.context.is_empty());

        let deny = verifier.verify("deny").await.unwrap();
        assert_eq!(deny.effect, Effect::Deny);
    }

    #[tokio::test]
    async fn anything_else_is_invalid() {
        let verifier = StaticTokenVerifier;
        for token in ["", "Allow", "maybe", "allow "] {
            assert!(matches!(
                verifier.verify(token).await,
                Err(AuthError::InvalidToken(_))
            ));
        }
    }
}
