//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EMERALD_CATALOG_PATH` - JSON product file replacing the built-in catalog
//! - `EMERALD_SALE_PERCENT` - Discount shown on the sale page, 0-100 (default: 30)
//! - `EMERALD_REMOTE_URL` - Base URL of the remote data service
//! - `EMERALD_REMOTE_API_KEY` - API key for the remote data service (required with the URL)
//! - `EMERALD_REMOTE_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)
//! - `SENTRY_SAMPLE_RATE` - Fraction of errors reported, 0.0-1.0 (default: 1.0)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::catalog::{Catalog, CatalogError};
use crate::promotions::DEFAULT_SALE_PERCENT;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Product file to load instead of the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Percent off shown on the sale page
    pub sale_percent: u8,
    /// Remote data service, when configured
    pub remote: Option<RemoteConfig>,
    /// Error tracking settings
    pub sentry: SentryConfig,
}

/// Remote data service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct RemoteConfig {
    /// Service base URL (e.g., <https://project.supabase.co>)
    pub url: Url,
    /// API key sent as both `apikey` and bearer token
    pub api_key: SecretString,
    /// How long product reads stay cached
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Sentry settings.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: String,
    pub sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: "development".to_string(),
            sample_rate: 1.0,
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            sale_percent: DEFAULT_SALE_PERCENT,
            remote: None,
            sentry: SentryConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, if only half of the
    /// remote URL/key pair is set, or if the API key fails validation
    /// (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let catalog_path = env.optional("EMERALD_CATALOG_PATH").map(PathBuf::from);

        let sale_percent = env
            .or_default("EMERALD_SALE_PERCENT", &DEFAULT_SALE_PERCENT.to_string())
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "EMERALD_SALE_PERCENT".to_string(),
                    "must be a whole number from 0 to 100".to_string(),
                )
            })?;

        let remote = RemoteConfig::from_env(&env)?;
        let sentry = SentryConfig::from_env(&env)?;

        Ok(Self {
            catalog_path,
            sale_percent,
            remote,
            sentry,
        })
    }

    /// Load the configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the configured file cannot be read or parsed.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        self.catalog_path
            .as_deref()
            .map_or_else(|| Ok(Catalog::builtin()), Catalog::from_path)
    }
}

impl RemoteConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let url = env.optional("EMERALD_REMOTE_URL");
        let key = env.optional("EMERALD_REMOTE_API_KEY");

        let url = match (url, key) {
            (None, None) => return Ok(None),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    "EMERALD_REMOTE_API_KEY".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("EMERALD_REMOTE_URL".to_string()));
            }
            (Some(url), Some(_)) => url,
        };

        let url = Url::parse(&url).map_err(|e| {
            ConfigError::InvalidEnvVar("EMERALD_REMOTE_URL".to_string(), e.to_string())
        })?;
        let api_key = env.validated_secret("EMERALD_REMOTE_API_KEY")?;
        let cache_ttl = env
            .or_default(
                "EMERALD_REMOTE_CACHE_TTL_SECS",
                &DEFAULT_CACHE_TTL_SECS.to_string(),
            )
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "EMERALD_REMOTE_CACHE_TTL_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        Ok(Some(Self {
            url,
            api_key,
            cache_ttl,
        }))
    }
}

impl SentryConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let sample_rate = env
            .or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .ok()
            .filter(|rate| (0.0..=1.0).contains(rate))
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "SENTRY_SAMPLE_RATE".to_string(),
                    "must be a number from 0.0 to 1.0".to_string(),
                )
            })?;

        Ok(Self {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.or_default("SENTRY_ENVIRONMENT", "development"),
            sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with the lookup helpers.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the service."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const GOOD_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.k3Xq9Lm2";

    fn config_from(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.sale_percent, 30);
        assert!(config.catalog_path.is_none());
        assert!(config.remote.is_none());
        assert!(config.sentry.dsn.is_none());
        assert_eq!(config.sentry.environment, "development");
    }

    #[test]
    fn test_sale_percent_bounds() {
        let config = config_from(&[("EMERALD_SALE_PERCENT", "100")]).unwrap();
        assert_eq!(config.sale_percent, 100);

        for bad in ["101", "-5", "thirty"] {
            let err = config_from(&[("EMERALD_SALE_PERCENT", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        }
    }

    #[test]
    fn test_remote_requires_both_vars() {
        let err = config_from(&[("EMERALD_REMOTE_URL", "https://db.emerald.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "EMERALD_REMOTE_API_KEY"));

        let err = config_from(&[("EMERALD_REMOTE_API_KEY", GOOD_KEY)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "EMERALD_REMOTE_URL"));
    }

    #[test]
    fn test_remote_config() {
        let config = config_from(&[
            ("EMERALD_REMOTE_URL", "https://db.emerald.test"),
            ("EMERALD_REMOTE_API_KEY", GOOD_KEY),
            ("EMERALD_REMOTE_CACHE_TTL_SECS", "60"),
        ])
        .unwrap();
        let remote = config.remote.unwrap();
        assert_eq!(remote.url.host_str(), Some("db.emerald.test"));
        assert_eq!(remote.api_key.expose_secret(), GOOD_KEY);
        assert_eq!(remote.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_remote_placeholder_key_rejected() {
        let err = config_from(&[
            ("EMERALD_REMOTE_URL", "https://db.emerald.test"),
            ("EMERALD_REMOTE_API_KEY", "your-anon-key"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = config_from(&[
            ("EMERALD_REMOTE_URL", "not a url"),
            ("EMERALD_REMOTE_API_KEY", GOOD_KEY),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_sentry_sample_rate() {
        let config = config_from(&[("SENTRY_SAMPLE_RATE", "0.25")]).unwrap();
        assert!((config.sentry.sample_rate - 0.25).abs() < f32::EPSILON);
        assert!(config_from(&[("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_remote_config_debug_redacts_key() {
        let remote = RemoteConfig {
            url: Url::parse("https://db.emerald.test").unwrap(),
            api_key: SecretString::from("super_hidden_api_key_value"),
            cache_ttl: Duration::from_secs(300),
        };
        let debug_output = format!("{remote:?}");
        assert!(debug_output.contains("db.emerald.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_hidden_api_key_value"));
    }

    #[test]
    fn test_load_builtin_catalog() {
        let config = StorefrontConfig::default();
        assert_eq!(config.load_catalog().unwrap().len(), 24);
    }
}
