//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Validate the proxy route prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty proxy route prefix")]
    EmptyPrefix,

    #[error("wrong proxy prefix [{0}] value")]
    InvalidPrefix(String),

    #[error("proxy request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("wrong metrics address [{0}]")]
    InvalidMetricsAddress(String),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.proxy.prefix;
    if prefix.trim_matches('/').is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
    {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    if config.proxy.request_timeout.is_zero() {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn prefix_rules() {
        let mut config = ProxyConfig::default();

        for ok in ["foo", "api/v1/proxy", "a_b-c", "/wrapped/"] {
            config.proxy.prefix = ok.to_string();
            assert_eq!(validate_config(&config), Ok(()), "{ok}");
        }

        config.proxy.prefix = "$$$".to_string();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidPrefix("$$$".to_string())])
        );

        for empty in ["", "/", "//"] {
            config.proxy.prefix = empty.to_string();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::EmptyPrefix])
            );
        }
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.proxy.prefix = "bad prefix".to_string();
        config.proxy.request_timeout = Duration::ZERO;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroRequestTimeout));
        assert!(errors.contains(&ValidationError::InvalidMetricsAddress("nowhere".to_string())));
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert_eq!(validate_config(&config), Ok(()));
    }
}
