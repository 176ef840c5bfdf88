//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Default topic for order events.
pub const DEFAULT_KAFKA_TOPIC: &str = "orders";

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server and collaborator configuration.
///
/// Reads from environment variables:
/// - `CHECKOUT_SERVICE_PORT`: listen port (required)
/// - `CHECKOUT_SERVICE_HOST`: bind address (default: `"0.0.0.0"`)
/// - `CART_SERVICE_ADDR`, `PRODUCT_CATALOG_SERVICE_ADDR`, `CURRENCY_SERVICE_ADDR`,
///   `SHIPPING_SERVICE_ADDR`, `PAYMENT_SERVICE_ADDR`, `EMAIL_SERVICE_ADDR`: collaborator
///   base URLs (required)
/// - `KAFKA_SERVICE_ADDR`: broker bootstrap servers; unset disables publishing
/// - `KAFKA_TOPIC`: order topic (default: `"orders"`)
/// - `FLAGD_ADDR`: flag backend base URL; unset makes every flag its default
/// - `CHECKOUT_REQUEST_TIMEOUT_MS`: default request deadline (default: `30000`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cart_addr: String,
    pub catalog_addr: String,
    pub currency_addr: String,
    pub shipping_addr: String,
    pub payment_addr: String,
    pub email_addr: String,
    pub kafka_addr: Option<String>,
    pub kafka_topic: String,
    pub flagd_addr: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset.
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let port = parse_number::<u16>("CHECKOUT_SERVICE_PORT", required("CHECKOUT_SERVICE_PORT")?)?;
        let request_timeout = match optional("CHECKOUT_REQUEST_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse_number::<u64>(
                "CHECKOUT_REQUEST_TIMEOUT_MS",
                value,
            )?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            host: optional("CHECKOUT_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cart_addr: with_scheme(required("CART_SERVICE_ADDR")?),
            catalog_addr: with_scheme(required("PRODUCT_CATALOG_SERVICE_ADDR")?),
            currency_addr: with_scheme(required("CURRENCY_SERVICE_ADDR")?),
            shipping_addr: with_scheme(required("SHIPPING_SERVICE_ADDR")?),
            payment_addr: with_scheme(required("PAYMENT_SERVICE_ADDR")?),
            email_addr: with_scheme(required("EMAIL_SERVICE_ADDR")?),
            kafka_addr: optional("KAFKA_SERVICE_ADDR"),
            kafka_topic: optional("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            flagd_addr: optional("FLAGD_ADDR").map(with_scheme),
            request_timeout,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

/// Prefixes `http://` onto addresses given as bare `host:port`.
fn with_scheme(addr: String) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}
