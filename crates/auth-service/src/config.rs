use chrono::Duration;
use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use thiserror::Error;

/// Minimum accepted PBKDF2 iteration count.
///
/// Counts below this are rejected at startup; the configured count only
/// applies to newly stored hashes, historical hashes carry their own count.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Default PBKDF2-HMAC-SHA-512 iteration count (~tens of milliseconds per
/// verification on current server hardware).
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 210_000;

/// Default lifetime of a general-purpose API token (24 hours).
pub const DEFAULT_API_TOKEN_TTL_SECS: u64 = 86_400;

/// Default lifetime of an event-stream handshake token (5 minutes).
///
/// Handshake tokens travel in a query parameter and may end up in URL logs;
/// the short lifetime bounds the blast radius of a leak.
pub const DEFAULT_SSE_TOKEN_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub pbkdf2_iterations: NonZeroU32,
    pub api_token_ttl: Duration,
    pub sse_token_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("PBKDF2 iteration count {0} is below the minimum of {MIN_PBKDF2_ITERATIONS}")]
    IterationCountTooLow(u32),

    #[error("Event-stream token TTL must be shorter than the API token TTL")]
    StreamTtlNotShorter,

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid signing key material: {0}")]
    InvalidSigningKey(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let iterations = parse_or_default(vars, "AUTH_PBKDF2_ITERATIONS", DEFAULT_PBKDF2_ITERATIONS)?;
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(ConfigError::IterationCountTooLow(iterations));
        }
        let pbkdf2_iterations = NonZeroU32::new(iterations)
            .ok_or(ConfigError::IterationCountTooLow(0))?;

        let api_ttl_secs: u64 =
            parse_or_default(vars, "AUTH_API_TOKEN_TTL_SECS", DEFAULT_API_TOKEN_TTL_SECS)?;
        let sse_ttl_secs: u64 =
            parse_or_default(vars, "AUTH_SSE_TOKEN_TTL_SECS", DEFAULT_SSE_TOKEN_TTL_SECS)?;

        if sse_ttl_secs == 0 || api_ttl_secs == 0 || sse_ttl_secs >= api_ttl_secs {
            return Err(ConfigError::StreamTtlNotShorter);
        }

        Ok(Config {
            pbkdf2_iterations,
            api_token_ttl: Duration::seconds(api_ttl_secs as i64),
            sse_token_ttl: Duration::seconds(sse_ttl_secs as i64),
        })
    }
}

fn parse_or_default<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("defaults should load");
        assert_eq!(config.pbkdf2_iterations.get(), DEFAULT_PBKDF2_ITERATIONS);
        assert_eq!(
            config.api_token_ttl,
            Duration::seconds(DEFAULT_API_TOKEN_TTL_SECS as i64)
        );
        assert_eq!(
            config.sse_token_ttl,
            Duration::seconds(DEFAULT_SSE_TOKEN_TTL_SECS as i64)
        );
    }

    #[test]
    fn test_iteration_count_below_minimum() {
        let vars = HashMap::from([("AUTH_PBKDF2_ITERATIONS".to_string(), "50000".to_string())]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::IterationCountTooLow(50_000))));
    }

    #[test]
    fn test_iteration_count_not_a_number() {
        let vars = HashMap::from([("AUTH_PBKDF2_ITERATIONS".to_string(), "lots".to_string())]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_stream_ttl_must_be_shorter_than_api_ttl() {
        let vars = HashMap::from([
            ("AUTH_API_TOKEN_TTL_SECS".to_string(), "300".to_string()),
            ("AUTH_SSE_TOKEN_TTL_SECS".to_string(), "300".to_string()),
        ]);
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::StreamTtlNotShorter)));
    }

    #[test]
    fn test_custom_ttls() {
        let vars = HashMap::from([
            ("AUTH_API_TOKEN_TTL_SECS".to_string(), "3600".to_string()),
            ("AUTH_SSE_TOKEN_TTL_SECS".to_string(), "120".to_string()),
        ]);
        let config = Config::from_vars(&vars).expect("config should load");
        assert_eq!(config.api_token_ttl, Duration::seconds(3600));
        assert_eq!(config.sse_token_ttl, Duration::seconds(120));
    }
}
