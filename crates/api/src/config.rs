use rust_decimal::Decimal;

use influberry_core::invoice::{DEFAULT_PAYMENT_TERM_DAYS, DEFAULT_TAX_RATE};
use influberry_core::money::{parse_decimal, validate_tax_rate};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Invoice defaults.
    pub billing: BillingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            billing: BillingConfig::from_env(),
        }
    }
}

/// Defaults applied when an invoice is generated or created without
/// explicit terms.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Tax rate in percent (default: `10.0`).
    pub default_tax_rate: Decimal,
    /// Days from issue to due date (default: `30`).
    pub payment_term_days: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: DEFAULT_TAX_RATE,
            payment_term_days: DEFAULT_PAYMENT_TERM_DAYS,
        }
    }
}

impl BillingConfig {
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `INVOICE_TAX_RATE`          | `10.0`  |
    /// | `INVOICE_PAYMENT_TERM_DAYS` | `30`    |
    ///
    /// # Panics
    ///
    /// Panics on a malformed or out-of-range value.
    pub fn from_env() -> Self {
        let default_tax_rate = match std::env::var("INVOICE_TAX_RATE") {
            Ok(raw) => parse_tax_rate(&raw).unwrap_or_else(|e| panic!("INVOICE_TAX_RATE: {e}")),
            Err(_) => DEFAULT_TAX_RATE,
        };

        let payment_term_days: i64 = std::env::var("INVOICE_PAYMENT_TERM_DAYS")
            .unwrap_or_else(|_| DEFAULT_PAYMENT_TERM_DAYS.to_string())
            .parse()
            .expect("INVOICE_PAYMENT_TERM_DAYS must be a valid i64");
        assert!(
            payment_term_days >= 0,
            "INVOICE_PAYMENT_TERM_DAYS must not be negative"
        );

        Self {
            default_tax_rate,
            payment_term_days,
        }
    }
}

fn parse_tax_rate(raw: &str) -> Result<Decimal, influberry_core::error::CoreError> {
    validate_tax_rate(parse_decimal("tax_rate", raw)?)
}
