//! notes-authorizer: bearer token authorization for the notes API.
//!
//! A `CredentialVerifier` turns a token into a verdict. Two strategies exist:
//! - `StaticTokenVerifier` - the literal tokens `allow` and `deny`
//! - `JwtVerifier` - identity tokens checked against an issuer and audience,
//!   with keys from the issuer's JWKS or a shared secret
//!
//! `Authorizer` wraps whichever strategy is configured and produces an
//! `AccessDecision`, which renders as an API Gateway access-policy document.

pub mod authorizer;
pub mod config;
pub mod decision;
pub mod jwt;
pub mod static_token;
pub mod verifier;

pub use authorizer::{Authorizer, strip_bearer};
pub use config::{AuthStrategy, AuthorizerConfig};
pub use decision::{AccessDecision, AuthorizerResponse, Effect, PolicyDocument, Statement};
pub use jwt::{Claims, JwksProvider, JwtVerifier, KeySource};
pub use static_token::StaticTokenVerifier;
pub use verifier::{AuthError, CredentialVerifier, Verdict};
