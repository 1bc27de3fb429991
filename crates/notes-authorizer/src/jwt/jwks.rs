use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::verifier::AuthError;

const MAX_CACHED_KEYS: u64 = 100;
const KEY_TTL: Duration = Duration::from_secs(3600);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_JWKS_BYTES: usize = 512 * 1024;
/// Unknown `kid`s trigger at most one refetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// RSA signing keys published by the token issuer, cached by `kid`.
#[derive(Clone)]
pub struct JwksProvider {
    cache: Cache<String, Arc<DecodingKey>>,
    client: Client,
    jwks_uri: Url,
    last_refresh: Arc<Mutex<Option<Instant>>>,
    min_refresh_interval: Duration,
}

impl JwksProvider {
    pub fn new(jwks_uri: Url) -> Result<Self, AuthError> {
        Self::check_uri(&jwks_uri)?;

        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("notes-authorizer/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            cache: Cache::builder()
                .max_capacity(MAX_CACHED_KEYS)
                .time_to_live(KEY_TTL)
                .build(),
            client,
            jwks_uri,
            last_refresh: Arc::new(Mutex::new(None)),
            min_refresh_interval: MIN_REFRESH_INTERVAL,
        })
    }

    /// Override how soon an unknown `kid` may trigger another fetch.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Keys must come over https. Plain http is only accepted for loopback
    /// hosts (local issuers and tests).
    fn check_uri(uri: &Url) -> Result<(), AuthError> {
        match uri.scheme() {
            "https" => Ok(()),
            "http" if is_loopback(uri) => Ok(()),
            scheme => Err(AuthError::Config(format!(
                "JWKS URI must use https, got {}: {}",
                scheme, uri
            ))),
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.cache.get(kid) {
            return Ok(key);
        }

        // Unknown kid: the issuer may have rotated keys
        if self.claim_refresh() {
            self.refresh().await?;
        } else {
            tracing::debug!(kid, "JWKS refreshed recently, not refetching");
        }

        self.cache
            .get(kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("Unknown signing key: {}", kid)))
    }

    /// Record a refresh attempt unless one happened within the interval.
    fn claim_refresh(&self) -> bool {
        let now = Instant::now();
        let mut last = match self.last_refresh.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match *last {
            Some(at) if now.duration_since(at) < self.min_refresh_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        tracing::info!(uri = %self.jwks_uri, "Fetching JWKS");
        let unavailable = |e: reqwest::Error| {
            tracing::warn!(uri = %self.jwks_uri, "JWKS fetch failed: {}", e);
            AuthError::InvalidToken("Signing keys unavailable".to_string())
        };

        let mut resp = self
            .client
            .get(self.jwks_uri.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?;

        let too_large = || {
            tracing::warn!(uri = %self.jwks_uri, "JWKS response exceeds {} bytes", MAX_JWKS_BYTES);
            AuthError::InvalidToken("JWKS response too large".to_string())
        };
        if resp.content_length().is_some_and(|len| len > MAX_JWKS_BYTES as u64) {
            return Err(too_large());
        }

        // Content-Length may be absent (chunked), so bound the read itself
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(unavailable)? {
            if body.len() + chunk.len() > MAX_JWKS_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let jwks: JwksResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(uri = %self.jwks_uri, "Malformed JWKS document: {}", e);
            AuthError::InvalidToken("Signing keys unavailable".to_string())
        })?;

        let mut loaded = 0;
        for key in jwks.keys {
            if key.kty != "RSA" {
                continue;
            }
            if let (Some(n), Some(e)) = (&key.n, &key.e) {
                match DecodingKey::from_rsa_components(n, e) {
                    Ok(decoding_key) => {
                        self.cache.insert(key.kid.clone(), Arc::new(decoding_key));
                        loaded += 1;
                    }
                    Err(err) => tracing::warn!(kid = %key.kid, "Skipping malformed JWK: {}", err),
                }
            }
        }
        tracing::debug!(loaded, "JWKS refreshed");

        Ok(())
    }
}

fn is_loopback(uri: &Url) -> bool {
    match uri.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
