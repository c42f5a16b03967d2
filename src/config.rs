//! Client configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// DALN client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the cooperative backend, e.g. `https://api.daln.example`.
    pub api_base_url: String,
    /// Address of the deployed membership (SBT) contract.
    pub contract_address: String,
    /// Interval between historical-sync status polls during `Processing`.
    pub historical_poll_interval: Duration,
    /// How long to wait for a mint/burn transaction to confirm.
    pub confirmation_timeout: Duration,
    /// Minimum wallet balance (wei) before the mint pre-flight warns.
    pub min_gas_balance_wei: u128,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            contract_address: String::new(),
            historical_poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(120), // ~4 FEVM blocks
            min_gas_balance_wei: 10_000_000_000_000_000, // 0.01 FIL
        }
    }
}

impl ClientConfig {
    /// Build a config from environment variables.
    ///
    /// `DALN_API_URL` and `DALN_CONTRACT_ADDRESS` are required;
    /// `DALN_POLL_INTERVAL_MS` is optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("DALN_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DALN_API_URL".to_string()))?;
        let contract_address = std::env::var("DALN_CONTRACT_ADDRESS")
            .map_err(|_| ConfigError::MissingEnvVar("DALN_CONTRACT_ADDRESS".to_string()))?;

        let mut config = Self {
            api_base_url,
            contract_address,
            ..Self::default()
        };

        if let Ok(ms) = std::env::var("DALN_POLL_INTERVAL_MS") {
            let ms: u64 = ms.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DALN_POLL_INTERVAL_MS".to_string(),
                message: format!("not an integer: {ms}"),
            })?;
            config.historical_poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_interval_is_sub_second() {
        let config = ClientConfig::default();
        assert!(config.historical_poll_interval < Duration::from_secs(1));
    }
}
