//! API Configuration Module
//!
//! Configuration for CORS, the user-listing cache and deployment mode.
//! Everything is loaded from `PLURA_*` environment variables with defaults
//! suitable for local development.

use std::time::Duration;

/// Default key of the shared user-listing cache list.
pub const DEFAULT_USERS_CACHE_KEY: &str = "users:cache";

/// Default lifetime of the user-listing cache list.
pub const DEFAULT_USERS_CACHE_TTL_SECS: u64 = 600;

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP surface configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://plura.app,https://app.plura.app"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Deployment
    // ========================================================================
    /// Deployment environment name (production, staging, development).
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PLURA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PLURA_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `PLURA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PLURA_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("PLURA_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("PLURA_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.cors_allow_credentials);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs: parse_or(
                lookup("PLURA_CORS_MAX_AGE_SECS"),
                defaults.cors_max_age_secs,
            ),
            environment: non_empty(lookup("PLURA_ENVIRONMENT")).unwrap_or(defaults.environment),
        }
    }

    /// Check if the deployment environment is production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// User-listing cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis URL. `None` selects the in-process cache.
    pub redis_url: Option<String>,
    /// Key of the shared user list.
    pub users_key: String,
    /// Lifetime of the user list after it is populated.
    pub users_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            users_key: DEFAULT_USERS_CACHE_KEY.to_string(),
            users_ttl: Duration::from_secs(DEFAULT_USERS_CACHE_TTL_SECS),
        }
    }
}

impl CacheConfig {
    /// Create CacheConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PLURA_REDIS_URL`: Redis connection URL (unset = in-memory cache)
    /// - `PLURA_USERS_CACHE_KEY`: List key (default: users:cache)
    /// - `PLURA_USERS_CACHE_TTL_SECS`: List lifetime (default: 600)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            redis_url: non_empty(lookup("PLURA_REDIS_URL")),
            users_key: non_empty(lookup("PLURA_USERS_CACHE_KEY"))
                .unwrap_or_else(|| DEFAULT_USERS_CACHE_KEY.to_string()),
            users_ttl: Duration::from_secs(parse_or(
                lookup("PLURA_USERS_CACHE_TTL_SECS"),
                DEFAULT_USERS_CACHE_TTL_SECS,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(!config.is_production());
    }

    #[test]
    fn test_api_config_from_lookup() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("PLURA_CORS_ORIGINS", "https://plura.app, https://app.plura.app,"),
            ("PLURA_CORS_ALLOW_CREDENTIALS", "TRUE"),
            ("PLURA_CORS_MAX_AGE_SECS", "not-a-number"),
        ]));
        assert_eq!(
            config.cors_origins,
            vec!["https://plura.app", "https://app.plura.app"]
        );
        assert!(config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(!config.is_production());
    }

    #[test]
    fn test_environment_marks_production() {
        let config = ApiConfig::from_lookup(lookup_from(&[("PLURA_ENVIRONMENT", "prod")]));
        assert!(config.is_production());
    }

    #[test]
    fn test_origin_allowed() {
        let mut config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:5173"));

        config.cors_origins = vec!["https://plura.app".to_string()];
        assert!(config.is_origin_allowed("https://plura.app"));
        assert!(!config.is_origin_allowed("https://evil.example"));
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[("PLURA_REDIS_URL", "  ")]));
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.users_key, "users:cache");
        assert_eq!(config.users_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_cache_config_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("PLURA_REDIS_URL", "redis://cache:6379"),
            ("PLURA_USERS_CACHE_TTL_SECS", "30"),
        ]));
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.users_ttl, Duration::from_secs(30));
    }
}
