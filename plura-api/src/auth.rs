//! Session Resolution
//!
//! Sessions are issued by the auth provider and stored in the `session`
//! table. This module finds the session token on a request and resolves it
//! to a live `Session`. A token is taken from, in order:
//! 1. `Authorization: Bearer <token>`
//! 2. the session cookie (`better-auth.session_token` by default, with or
//!    without the `__Secure-` prefix)
//!
//! Cookie values are URL-encoded `<token>.<signature>` pairs. When a signing
//! secret is configured the signature must be the base64 HMAC-SHA256 of the
//! token, otherwise the cookie is ignored.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use plura_core::Session;
use plura_storage::DataStore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::{ApiError, ApiResult};

type HmacSha256 = Hmac<Sha256>;

/// Default name of the auth provider's session cookie.
pub const DEFAULT_SESSION_COOKIE: &str = "better-auth.session_token";

const SECURE_COOKIE_PREFIX: &str = "__Secure-";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Session lookup configuration.
#[derive(Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Cookie signing secret shared with the auth provider.
    pub secret: Option<SecretString>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            secret: None,
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SessionConfig {
    /// Create SessionConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PLURA_SESSION_COOKIE`: Cookie name (default: better-auth.session_token)
    /// - `PLURA_AUTH_SECRET`: Cookie signing secret (unset = signatures not checked)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cookie_name = lookup("PLURA_SESSION_COOKIE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let secret = lookup("PLURA_AUTH_SECRET")
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        Self {
            cookie_name,
            secret,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }
}

// ============================================================================
// TOKEN EXTRACTION
// ============================================================================

/// Sign a session token the way the auth provider signs its cookie.
pub fn sign_session_token(secret: &str, token: &str) -> ApiResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::internal_error(format!("Invalid HMAC key: {}", e)))?;
    mac.update(token.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn signature_matches(secret: &SecretString, token: &str, signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(token.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let secure_name = format!("{}{}", SECURE_COOKIE_PREFIX, name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name || *key == secure_name)
        .map(|(_, value)| value)
}

fn cookie_token(headers: &HeaderMap, config: &SessionConfig) -> Option<String> {
    let raw = cookie_value(headers, &config.cookie_name)?;
    let decoded = urlencoding::decode(raw).ok()?;

    let (token, signature) = match decoded.rsplit_once('.') {
        Some((token, signature)) => (token, Some(signature)),
        None => (decoded.as_ref(), None),
    };

    if let Some(secret) = &config.secret {
        let verified = signature
            .map(|sig| signature_matches(secret, token, sig))
            .unwrap_or(false);
        if !verified {
            tracing::debug!("Session cookie signature rejected");
            return None;
        }
    }

    (!token.is_empty()).then(|| token.to_string())
}

/// Find the session token on a request, if any.
pub fn extract_session_token(headers: &HeaderMap, config: &SessionConfig) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers, config))
}

// ============================================================================
// SESSION PROVIDER
// ============================================================================

/// Resolves the current session from request headers.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when the request carries no live session.
    async fn get_session(&self, headers: &HeaderMap) -> ApiResult<Option<Session>>;
}

/// `SessionProvider` backed by the session table of a `DataStore`.
#[derive(Clone)]
pub struct StoreSessionProvider {
    store: Arc<dyn DataStore>,
    config: SessionConfig,
}

impl StoreSessionProvider {
    pub fn new(store: Arc<dyn DataStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl SessionProvider for StoreSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> ApiResult<Option<Session>> {
        let Some(token) = extract_session_token(headers, &self.config) else {
            return Ok(None);
        };

        let session = self.store.session_find_by_token(&token).await?;
        Ok(session.filter(|session| {
            let live = !session.is_expired(Utc::now());
            if !live {
                tracing::debug!(session_id = %session.id, "Ignoring expired session");
            }
            live
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use plura_storage::InMemoryDataStore;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> Result<HeaderMap, String> {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            let value = HeaderValue::from_str(value).map_err(|e| e.to_string())?;
            map.append(name.clone(), value);
        }
        Ok(map)
    }

    fn session(token: &str, expires_in: Duration) -> Session {
        Session {
            id: format!("s-{}", token),
            token: token.to_string(),
            user_id: "u01".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_bearer_token_takes_precedence() -> Result<(), String> {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer abc"),
            (header::COOKIE, "better-auth.session_token=xyz.sig"),
        ])?;
        assert_eq!(
            extract_session_token(&map, &SessionConfig::default()).as_deref(),
            Some("abc")
        );
        Ok(())
    }

    #[test]
    fn test_non_bearer_scheme_falls_back_to_cookie() -> Result<(), String> {
        let map = headers(&[
            (header::AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (header::COOKIE, "theme=dark; better-auth.session_token=xyz.sig"),
        ])?;
        assert_eq!(
            extract_session_token(&map, &SessionConfig::default()).as_deref(),
            Some("xyz")
        );
        Ok(())
    }

    #[test]
    fn test_secure_cookie_prefix_is_accepted() -> Result<(), String> {
        let map = headers(&[(header::COOKIE, "__Secure-better-auth.session_token=tok")])?;
        assert_eq!(
            extract_session_token(&map, &SessionConfig::default()).as_deref(),
            Some("tok")
        );
        Ok(())
    }

    #[test]
    fn test_signed_cookie_is_verified() -> Result<(), String> {
        let config = SessionConfig::default().with_secret("s3cret");
        let signature = sign_session_token("s3cret", "tok").map_err(|e| e.message)?;
        let cookie = format!(
            "better-auth.session_token={}",
            urlencoding::encode(&format!("tok.{}", signature))
        );

        let map = headers(&[(header::COOKIE, cookie.as_str())])?;
        assert_eq!(extract_session_token(&map, &config).as_deref(), Some("tok"));
        Ok(())
    }

    #[test]
    fn test_bad_signature_is_ignored() -> Result<(), String> {
        let config = SessionConfig::default().with_secret("s3cret");
        let signature = sign_session_token("other", "tok").map_err(|e| e.message)?;
        let cookie = format!("better-auth.session_token=tok.{}", signature);

        let map = headers(&[(header::COOKIE, cookie.as_str())])?;
        assert_eq!(extract_session_token(&map, &config), None);

        let unsigned = headers(&[(header::COOKIE, "better-auth.session_token=tok")])?;
        assert_eq!(extract_session_token(&unsigned, &config), None);
        Ok(())
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = SessionConfig::default().with_secret("hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_provider_resolves_live_session() -> Result<(), String> {
        let store = InMemoryDataStore::new();
        store
            .insert_session(session("live", Duration::hours(1)))
            .map_err(|e| e.to_string())?;
        store
            .insert_session(session("stale", -Duration::hours(1)))
            .map_err(|e| e.to_string())?;
        let provider = StoreSessionProvider::new(Arc::new(store), SessionConfig::default());

        let live = headers(&[(header::AUTHORIZATION, "Bearer live")])?;
        let found = provider.get_session(&live).await.map_err(|e| e.message)?;
        assert_eq!(found.map(|s| s.user_id), Some("u01".to_string()));

        let stale = headers(&[(header::AUTHORIZATION, "Bearer stale")])?;
        assert!(provider.get_session(&stale).await.map_err(|e| e.message)?.is_none());

        let anonymous = HeaderMap::new();
        assert!(provider.get_session(&anonymous).await.map_err(|e| e.message)?.is_none());
        Ok(())
    }
}
