//! Runtime configuration, loaded from environment variables.
//!
//! Gateway credentials are gathered here once at startup and handed to each payment
//! backend explicitly.

use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DELIVERY_FEE: Decimal = dec!(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_FLW_API_BASE: &str = "https://api.flutterwave.com";

/// A secret API key that never shows up in `Debug` output.
#[derive(Clone, PartialEq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct HostedCheckoutConfig {
    pub secret_key: Secret,
    pub api_base: String,
    pub currency: String,
    pub delivery_fee: Decimal,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RedirectLinkConfig {
    pub secret_key: Secret,
    pub api_base: String,
    pub currency: String,
    pub tx_ref_prefix: String,
    pub title: String,
    pub description: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub currency: String,
    pub delivery_fee: Decimal,
    pub timeout: Duration,
    /// Present only when a hosted checkout secret is configured.
    pub hosted_checkout: Option<HostedCheckoutConfig>,
    /// Present only when a redirect link secret is configured.
    pub redirect_link: Option<RedirectLinkConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            delivery_fee: DEFAULT_DELIVERY_FEE,
            timeout: DEFAULT_TIMEOUT,
            hosted_checkout: None,
            redirect_link: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let currency = get("ORDERS_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let delivery_fee = match get("ORDERS_DELIVERY_FEE") {
            Some(raw) => parse_fee(&raw)?,
            None => DEFAULT_DELIVERY_FEE,
        };
        let timeout = match get("GATEWAY_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    OrderError::ConfigError(format!("GATEWAY_TIMEOUT_SECS is not a number: {raw}"))
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let hosted_checkout = get("STRIPE_SECRET_KEY").map(|key| HostedCheckoutConfig {
            secret_key: Secret::new(key),
            api_base: get("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            currency: currency.clone(),
            delivery_fee,
            timeout,
        });

        let redirect_link = get("FLW_SECRET_KEY").map(|key| RedirectLinkConfig {
            secret_key: Secret::new(key),
            api_base: get("FLW_API_BASE").unwrap_or_else(|| DEFAULT_FLW_API_BASE.to_string()),
            currency: currency.clone(),
            tx_ref_prefix: get("FLW_TX_PREFIX").unwrap_or_else(|| "order_tx".to_string()),
            title: get("FLW_TITLE").unwrap_or_else(|| "Order payment".to_string()),
            description: get("FLW_DESCRIPTION")
                .unwrap_or_else(|| "Payment for your order".to_string()),
            timeout,
        });

        Ok(Self {
            currency,
            delivery_fee,
            timeout,
            hosted_checkout,
            redirect_link,
        })
    }
}

fn parse_fee(raw: &str) -> Result<Decimal> {
    let fee = Decimal::from_str(raw.trim())
        .map_err(|_| OrderError::ConfigError(format!("ORDERS_DELIVERY_FEE is not a number: {raw}")))?;
    if fee < Decimal::ZERO {
        return Err(OrderError::ConfigError(
            "ORDERS_DELIVERY_FEE must not be negative".to_string(),
        ));
    }
    Ok(fee)
}
