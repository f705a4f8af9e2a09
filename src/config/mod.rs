use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SWEEP_BUDGET_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;
const MIN_AUTH_KEY_LENGTH: usize = 10;
pub const ANY_ORIGIN: &str = "*";

/// Header name/value pair every protected request must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub header_name: String,
    pub header_value: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Storage
    pub storage_url: Option<String>,
    pub use_stubbed_storage: bool,
    pub store_timeout: Duration,

    // Retention
    pub retention: chrono::Duration,
    pub sweep_budget: Duration,
    /// Zero disables the built-in scheduler.
    pub sweep_interval_secs: u64,

    // HTTP
    pub allowed_origin: String,
    /// `None` disables authentication (dev mode).
    pub auth: Option<AuthConfig>,
    /// Dump every incoming request (headers and body) to the log.
    pub log_requests: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            storage_url: None,
            use_stubbed_storage: false,
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            retention: chrono::Duration::days(DEFAULT_RETENTION_DAYS),
            sweep_budget: Duration::from_secs(DEFAULT_SWEEP_BUDGET_SECS),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            allowed_origin: ANY_ORIGIN.into(),
            auth: None,
            log_requests: false,
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        None => Ok(default),
    }
}

/// Boolean flag: `true`/`false` in any case, or `1`/`0`.
fn parse_flag(raw: Option<String>, key: &str) -> anyhow::Result<bool> {
    let Some(v) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(false);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => anyhow::bail!("invalid value for {key}: {other:?} is not a boolean"),
    }
}

/// True when `origin` ends with the allowed domain. A leading `*` in the
/// allowed value is dropped, so `*.example.com` matches any subdomain.
pub fn origin_matches(allowed: &str, origin: &str) -> bool {
    if allowed == ANY_ORIGIN {
        return true;
    }
    origin.ends_with(&allowed.replacen('*', "", 1))
}

/// Decode the configured auth key: base64, at least
/// [`MIN_AUTH_KEY_LENGTH`] characters before decoding, trimmed after.
fn decode_auth_key(encoded: &str) -> anyhow::Result<String> {
    let encoded = encoded.trim();
    if encoded.len() < MIN_AUTH_KEY_LENGTH {
        anyhow::bail!("AUTH_HEADER_KEY must be at least {MIN_AUTH_KEY_LENGTH} characters");
    }
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| anyhow::anyhow!("AUTH_HEADER_KEY is not valid base64: {e}"))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|_| anyhow::anyhow!("AUTH_HEADER_KEY does not decode to UTF-8"))?;
    let decoded = decoded.trim();
    if decoded.is_empty() {
        anyhow::bail!("AUTH_HEADER_KEY decodes to an empty value");
    }
    Ok(decoded.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_url = lookup("SIGNALS_STORAGE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|v| !v.trim().is_empty());
        let use_stubbed_storage =
            parse_flag(lookup("USE_STUBBED_STORAGE"), "USE_STUBBED_STORAGE")?;
        if storage_url.is_none() && !use_stubbed_storage {
            anyhow::bail!("SIGNALS_STORAGE_URL must be set unless USE_STUBBED_STORAGE=true");
        }

        let retention_days: i64 =
            parse_or(lookup("SIGNAL_EXPIRY"), "SIGNAL_EXPIRY", DEFAULT_RETENTION_DAYS)?;
        if retention_days < 0 {
            anyhow::bail!("SIGNAL_EXPIRY must not be negative");
        }
        let retention = chrono::Duration::try_days(retention_days)
            .ok_or_else(|| anyhow::anyhow!("SIGNAL_EXPIRY out of range: {retention_days} days"))?;

        let auth_name = lookup("AUTH_HEADER_NAME").filter(|v| !v.trim().is_empty());
        let auth_key = lookup("AUTH_HEADER_KEY").filter(|v| !v.trim().is_empty());
        let auth = match (auth_name, auth_key) {
            (Some(name), Some(key)) => Some(AuthConfig {
                header_name: name.trim().to_string(),
                header_value: decode_auth_key(&key)?,
            }),
            (None, None) => None,
            _ => anyhow::bail!("AUTH_HEADER_NAME and AUTH_HEADER_KEY must be set together"),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), "PORT", defaults.port)?,
            storage_url,
            use_stubbed_storage,
            store_timeout: Duration::from_secs(parse_or(
                lookup("STORE_TIMEOUT_SECS"),
                "STORE_TIMEOUT_SECS",
                DEFAULT_STORE_TIMEOUT_SECS,
            )?),
            retention,
            sweep_budget: Duration::from_secs(parse_or(
                lookup("SWEEP_BUDGET_SECS"),
                "SWEEP_BUDGET_SECS",
                DEFAULT_SWEEP_BUDGET_SECS,
            )?),
            sweep_interval_secs: parse_or(
                lookup("SWEEP_INTERVAL_SECS"),
                "SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )?,
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.allowed_origin),
            auth,
            log_requests: parse_flag(lookup("LOG_REQUESTS"), "LOG_REQUESTS")?,
        })
    }

    /// Returns true if CORS should allow any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origin == ANY_ORIGIN
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        origin_matches(&self.allowed_origin, origin)
    }
}
