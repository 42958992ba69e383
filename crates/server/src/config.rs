//! Application configuration loaded from the environment
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file by the binary. Everything is parsed and checked once at
//! startup.

use cashout_gateway::{BankCodeTable, HttpGatewayConfig, MerchantProfile};
use cashout_workflow::{FailurePolicy, ListScope, WorkflowConfig};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// `DATABASE_URL` value selecting the in-process store
pub const MEMORY_DATABASE: &str = "memory";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATABASE_URL: &str = "sqlite:cashout.db?mode=rwc";
const DEFAULT_GATEWAY_URL: &str = "https://apify.epayco.co";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
/// Smallest gap between the payout deadline and the claim lease
const MIN_CLAIM_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_host: String,
    pub app_port: u16,
    /// `sqlite:` URL, or [`MEMORY_DATABASE`]
    pub database_url: String,
    pub auth_secret: String,
    pub token_ttl_secs: i64,
    pub gateway: HttpGatewayConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let timeout_secs: u64 =
            vars.parsed("PAYOUT_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PAYOUT_GATEWAY_TIMEOUT_SECS",
                message: "must be at least 1".to_string(),
            });
        }
        let timeout = Duration::from_secs(timeout_secs);

        let token_ttl_secs: i64 =
            vars.parsed("AUTH_TOKEN_TTL_SECS", cashout_auth::DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=cashout_auth::MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            return Err(ConfigError::InvalidValue {
                key: "AUTH_TOKEN_TTL_SECS",
                message: format!(
                    "must be between 1 and {}",
                    cashout_auth::MAX_TOKEN_TTL_SECS
                ),
            });
        }

        let bank_codes = match vars.optional("PAYOUT_BANK_CODES") {
            Some(raw) => BankCodeTable::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                key: "PAYOUT_BANK_CODES",
                message: e.to_string(),
            })?,
            None => BankCodeTable::default(),
        };

        let defaults = MerchantProfile::default();
        let merchant = MerchantProfile {
            description: vars.or("PAYOUT_DESCRIPTION", defaults.description),
            currency: vars.or("PAYOUT_CURRENCY", defaults.currency),
            country: vars.or("PAYOUT_COUNTRY", defaults.country),
            customer_name: vars.or("PAYOUT_CUSTOMER_NAME", defaults.customer_name),
            customer_last_name: vars.or("PAYOUT_CUSTOMER_LAST_NAME", defaults.customer_last_name),
            customer_email: vars.or("PAYOUT_CUSTOMER_EMAIL", defaults.customer_email),
            url_response: vars.or("PAYOUT_URL_RESPONSE", defaults.url_response),
            url_confirmation: vars.or("PAYOUT_URL_CONFIRMATION", defaults.url_confirmation),
            test_mode: vars.parsed("PAYOUT_GATEWAY_TEST_MODE", defaults.test_mode)?,
        };

        Ok(Self {
            app_host: vars.or("APP_HOST", DEFAULT_HOST.to_string()),
            app_port: vars.parsed("PORT", DEFAULT_PORT)?,
            database_url: vars.or("DATABASE_URL", DEFAULT_DATABASE_URL.to_string()),
            auth_secret: vars.required("AUTH_SECRET")?,
            token_ttl_secs,
            gateway: HttpGatewayConfig {
                base_url: vars.or("PAYOUT_GATEWAY_URL", DEFAULT_GATEWAY_URL.to_string()),
                public_key: vars.required("PAYOUT_GATEWAY_PUBLIC_KEY")?,
                private_key: vars.required("PAYOUT_GATEWAY_PRIVATE_KEY")?,
                timeout,
            },
            workflow: WorkflowConfig {
                merchant,
                bank_codes,
                list_scope: vars.parsed("LIST_SCOPE", ListScope::default())?,
                failure_policy: vars.parsed("GATEWAY_FAILURE_POLICY", FailurePolicy::default())?,
                // `timeout` bounds the whole payout, login included
                claim_lease: timeout + timeout.max(MIN_CLAIM_MARGIN),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.eq_ignore_ascii_case(MEMORY_DATABASE)
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values count as unset
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: String) -> String {
        self.optional(key).unwrap_or(default)
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::MissingEnvVar(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashout_core::PayoutMethod;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("AUTH_SECRET", "s3cret"),
        ("PAYOUT_GATEWAY_PUBLIC_KEY", "pk"),
        ("PAYOUT_GATEWAY_PRIVATE_KEY", "sk"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.database_url, "sqlite:cashout.db?mode=rwc");
        assert_eq!(config.token_ttl_secs, 7200);
        assert_eq!(config.gateway.base_url, "https://apify.epayco.co");
        assert_eq!(config.gateway.timeout, Duration::from_secs(30));
        assert_eq!(config.workflow.claim_lease, Duration::from_secs(60));
        assert_eq!(config.workflow.list_scope, ListScope::Caller);
        assert_eq!(config.workflow.failure_policy, FailurePolicy::KeepPending);
        assert_eq!(config.workflow.bank_codes, BankCodeTable::default());
        assert_eq!(config.workflow.merchant, MerchantProfile::default());
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn test_missing_secret() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("AUTH_SECRET"));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PAYOUT_GATEWAY_PRIVATE_KEY", "   "));
        let vars: HashMap<_, _> = pairs.into_iter().collect();
        let err = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();

        assert_eq!(err, ConfigError::MissingEnvVar("PAYOUT_GATEWAY_PRIVATE_KEY"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("DATABASE_URL", "memory"),
            ("PAYOUT_GATEWAY_TIMEOUT_SECS", "5"),
            ("PAYOUT_GATEWAY_TEST_MODE", "true"),
            ("PAYOUT_BANK_CODES", "Nequi=1507, Daviplata=1551"),
            ("LIST_SCOPE", "all"),
            ("GATEWAY_FAILURE_POLICY", "mark-failed"),
            ("PAYOUT_CURRENCY", "USD"),
        ]);
        let config = load(&pairs).unwrap();

        assert_eq!(config.app_port, 8080);
        assert!(config.uses_memory_store());
        assert_eq!(config.workflow.claim_lease, Duration::from_secs(15));
        assert!(config.workflow.merchant.test_mode);
        assert_eq!(config.workflow.merchant.currency, "USD");
        assert_eq!(config.workflow.list_scope, ListScope::All);
        assert_eq!(config.workflow.failure_policy, FailurePolicy::MarkFailed);
        assert_eq!(
            config.workflow.bank_codes.code_for(PayoutMethod::Nequi),
            Some("1507")
        );
        assert_eq!(
            config.workflow.bank_codes.unmapped(),
            vec![PayoutMethod::Bancolombia]
        );
    }

    #[test]
    fn test_claim_lease_outlasts_payout_deadline() {
        for secs in ["1", "5", "30", "120"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("PAYOUT_GATEWAY_TIMEOUT_SECS", secs));
            let config = load(&pairs).unwrap();

            assert!(config.workflow.claim_lease >= config.gateway.timeout + MIN_CLAIM_MARGIN);
        }
    }

    #[test]
    fn test_longest_token_ttl_accepted() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AUTH_TOKEN_TTL_SECS", "31536000"));
        assert_eq!(load(&pairs).unwrap().token_ttl_secs, 31_536_000);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("PAYOUT_GATEWAY_TIMEOUT_SECS", "0"),
            ("AUTH_TOKEN_TTL_SECS", "-1"),
            ("AUTH_TOKEN_TTL_SECS", "0"),
            ("AUTH_TOKEN_TTL_SECS", "10000000000000"),
            ("PAYOUT_BANK_CODES", "Paypal=1"),
            ("LIST_SCOPE", "everyone"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            match load(&pairs) {
                Err(ConfigError::InvalidValue { key: got, .. }) => assert_eq!(got, key),
                other => panic!("{key}={value} should be invalid, got {other:?}"),
            }
        }
    }
}
