//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public URL of the site (used for OAuth redirects and cookie security)
//! - `AUTH_GOOGLE_ID` - Google OAuth client ID
//! - `AUTH_GOOGLE_SECRET` - Google OAuth client secret
//! - `CLOUDINARY_CLOUD_NAME` - Cloudinary cloud name
//! - `CLOUDINARY_API_KEY` - Cloudinary Admin API key
//! - `CLOUDINARY_API_SECRET` - Cloudinary Admin API secret
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `AUTHORIZED_ADMIN_EMAIL` - Comma-separated emails allowed to sign in as admin.
//!   When empty nobody can sign in.
//! - `CLOUDINARY_PROJECT_FOLDER` - Folder holding one subfolder per project (default: projects)
//! - `ORPHANED_FOLDER_MAX_AGE_SECS` - Minimum age of an unreferenced project folder
//!   before cleanup deletes it (default: 3600)
//! - `WEB3FORMS_ACCESS_KEY` - Web3Forms access key (contact form disabled when unset)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use woodshop_core::AdminAllowList;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_PROJECT_FOLDER: &str = "projects";
const DEFAULT_ORPHANED_FOLDER_MAX_AGE_SECS: u64 = 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site, without trailing slash
    pub base_url: String,
    /// Google OAuth client configuration
    pub google: GoogleOAuthConfig,
    /// Cloudinary configuration
    pub cloudinary: CloudinaryConfig,
    /// Emails that become admins when they sign in
    pub admin_allow_list: AdminAllowList,
    /// Minimum age of an orphaned project folder before cleanup deletes it
    pub orphaned_folder_max_age: Duration,
    /// Web3Forms configuration (optional - contact form disabled when absent)
    pub web3forms: Option<Web3FormsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Google OAuth client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID (public)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Cloudinary Admin API configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name (path segment of every API URL)
    pub cloud_name: String,
    /// API key (public half of the credential pair)
    pub api_key: String,
    /// API secret
    pub api_secret: SecretString,
    /// Folder that holds one subfolder per project
    pub project_folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("project_folder", &self.project_folder)
            .finish()
    }
}

/// Web3Forms configuration.
///
/// Implements `Debug` manually to redact the access key.
#[derive(Clone)]
pub struct Web3FormsConfig {
    /// Access key identifying the destination inbox
    pub access_key: SecretString,
}

impl std::fmt::Debug for Web3FormsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web3FormsConfig")
            .field("access_key", &"[REDACTED]")
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(&get_required_env("BASE_URL")?)?;

        let google = GoogleOAuthConfig::from_env()?;
        let cloudinary = CloudinaryConfig::from_env()?;
        let admin_allow_list = get_optional_env("AUTHORIZED_ADMIN_EMAIL")
            .map(|raw| AdminAllowList::from_csv(&raw))
            .unwrap_or_default();

        let orphaned_folder_max_age = parse_max_age(
            get_optional_env("ORPHANED_FOLDER_MAX_AGE_SECS").as_deref(),
        )?;
        let web3forms = Web3FormsConfig::from_env();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            google,
            cloudinary,
            admin_allow_list,
            orphaned_folder_max_age,
            web3forms,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls the `Secure` cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL Google redirects back to after sign-in.
    #[must_use]
    pub fn google_redirect_uri(&self) -> String {
        format!("{}/auth/google/callback", self.base_url)
    }
}

/// Settings for running the folder cleanup outside the server.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub database_url: SecretString,
    pub cloudinary: CloudinaryConfig,
    pub orphaned_folder_max_age: Duration,
}

impl CleanupConfig {
    /// Load from the same variables the server reads.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database or Cloudinary variables are
    /// missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_required_secret("DATABASE_URL")?,
            cloudinary: CloudinaryConfig::from_env()?,
            orphaned_folder_max_age: parse_max_age(
                get_optional_env("ORPHANED_FOLDER_MAX_AGE_SECS").as_deref(),
            )?,
        })
    }
}

/// Load only `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if it is not set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_required_secret("DATABASE_URL")
}

impl GoogleOAuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: get_required_env("AUTH_GOOGLE_ID")?,
            client_secret: get_validated_secret("AUTH_GOOGLE_SECRET")?,
        })
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let project_folder =
            get_env_or_default("CLOUDINARY_PROJECT_FOLDER", DEFAULT_PROJECT_FOLDER)
                .trim_matches('/')
                .to_string();
        if project_folder.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_PROJECT_FOLDER".to_string(),
                "must name a folder; cleanup never runs against the account root".to_string(),
            ));
        }

        Ok(Self {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required_env("CLOUDINARY_API_KEY")?,
            api_secret: get_validated_secret("CLOUDINARY_API_SECRET")?,
            project_folder,
        })
    }
}

impl Web3FormsConfig {
    /// Returns `None` if `WEB3FORMS_ACCESS_KEY` is not set (contact form disabled).
    fn from_env() -> Option<Self> {
        get_optional_env("WEB3FORMS_ACCESS_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self {
                access_key: SecretString::from(key.trim().to_string()),
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate `BASE_URL` and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("BASE_URL".to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "BASE_URL".to_string(),
            format!("unsupported scheme {}", parsed.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Parse the orphaned folder age threshold in seconds.
fn parse_max_age(raw: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_ORPHANED_FOLDER_MAX_AGE_SECS));
    };
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("ORPHANED_FOLDER_MAX_AGE_SECS".to_string(), e.to_string())
    })?;
    Ok(Duration::from_secs(secs))
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
    let len = s.chars().count() as f64;
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use woodshop_core::Email;

    /// Configuration used by handler tests; never touches the environment.
    pub(crate) fn test_config() -> SiteConfig {
        SiteConfig {
            database_url: SecretString::from("postgres://localhost/woodshop_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            google: GoogleOAuthConfig {
                client_id: "client-id.apps.googleusercontent.com".to_string(),
                client_secret: SecretString::from("GOCSPX-k9Qz2LmV7pR4tW1xY8bN3cD6"),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: "woodshop".to_string(),
                api_key: "123456789012345".to_string(),
                api_secret: SecretString::from("aZ3kP9qL2mX7vR4tW1yB8nC6dF0"),
                project_folder: "projects".to_string(),
            },
            admin_allow_list: AdminAllowList::new([Email::parse("owner@woodshop.com").unwrap()]),
            orphaned_folder_max_age: Duration::from_secs(3600),
            web3forms: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-cloudinary-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aZ3kP9qL2mX7vR4tW1yB8nC6dF0", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_base_url_strips_trailing_slash() {
        assert_eq!(
            parse_base_url("https://woodshop.com/").unwrap(),
            "https://woodshop.com"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://woodshop.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_max_age_default() {
        assert_eq!(parse_max_age(None).unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_max_age_custom_and_invalid() {
        assert_eq!(
            parse_max_age(Some(" 120 ")).unwrap(),
            Duration::from_secs(120)
        );
        assert!(parse_max_age(Some("an hour")).is_err());
        assert!(parse_max_age(Some("-5")).is_err());
    }

    #[test]
    fn test_socket_addr_and_redirect_uri() {
        let config = test_config();
        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(
            config.google_redirect_uri(),
            "http://localhost:3000/auth/google/callback"
        );
        assert!(!config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug_output = format!("{:?}", config.cloudinary);
        assert!(debug_output.contains("woodshop"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aZ3kP9qL2mX7vR4tW1yB8nC6dF0"));

        let debug_output = format!("{:?}", config.google);
        assert!(!debug_output.contains("GOCSPX"));
    }
}
