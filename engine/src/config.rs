use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::ConfigBuilder;
use solana_sdk::commitment_config::CommitmentConfig;
use transfer_core::constants::*;
use transfer_core::Cluster;

use crate::funding::FundingPolicy;

/// Environment variables are read as `TRANSFER_<FIELD>`, e.g. `TRANSFER_RPC_URL`.
pub const ENV_PREFIX: &str = "TRANSFER";

/// Optional config file, any format the `config` crate understands (`transfer.toml`, ...).
pub const CONFIG_FILE: &str = "transfer";

#[derive(Debug, serde::Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// Overrides the cluster's public endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default = "default_secret_path")]
    pub secret_path: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    #[serde(default = "default_funding_threshold")]
    pub funding_threshold_lamports: u64,
    #[serde(default = "default_airdrop")]
    pub airdrop_lamports: u64,
    #[serde(default = "default_transfer")]
    pub transfer_lamports: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub confirm_poll_interval_ms: u64,
}

fn default_cluster() -> String { "devnet".to_string() }
fn default_secret_path() -> String { ".env".to_string() }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_funding_threshold() -> u64 { DEFAULT_FUNDING_THRESHOLD_LAMPORTS } // 0.5 SOL
fn default_airdrop() -> u64 { DEFAULT_AIRDROP_LAMPORTS } // 1 SOL
fn default_transfer() -> u64 { DEFAULT_TRANSFER_LAMPORTS } // 0.01 SOL
fn default_poll_interval_ms() -> u64 { 500 }

impl AppConfig {
    /// Optional `transfer.*` file, overridden by `TRANSFER_*` environment variables.
    pub fn new() -> Result<Self, String> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX));
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, String> {
        let s = builder
            .build()
            .map_err(|e| format!("Config Build Error: {}", e))?;

        let config: AppConfig = s
            .try_deserialize()
            .map_err(|e| format!("Config Deserialize Error: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values at startup (Fail Fast)
    pub fn validate(&self) -> Result<(), String> {
        self.cluster()?;
        self.commitment_config()?;

        let rpc_url = self.rpc_url();
        if !rpc_url.starts_with("http") {
            return Err(format!("Invalid RPC_URL: must start with http/https. Got: {}", rpc_url));
        }
        if rpc_url.contains("mainnet") {
            return Err(format!("Refusing mainnet RPC endpoint {}: no faucet available", rpc_url));
        }

        if self.secret_path.trim().is_empty() {
            return Err("SECRET_PATH cannot be empty".into());
        }
        if self.transfer_lamports == 0 {
            return Err("TRANSFER_LAMPORTS cannot be 0".into());
        }
        if self.airdrop_lamports == 0 {
            return Err("AIRDROP_LAMPORTS cannot be 0 (funding could never succeed)".into());
        }
        if self.confirm_poll_interval_ms == 0 {
            return Err("CONFIRM_POLL_INTERVAL_MS cannot be 0".into());
        }

        if self.airdrop_lamports < self.funding_threshold_lamports {
            tracing::warn!(
                "⚠️  AIRDROP_LAMPORTS ({}) is below FUNDING_THRESHOLD_LAMPORTS ({}). A single top-up may not clear the threshold.",
                self.airdrop_lamports,
                self.funding_threshold_lamports
            );
        }
        if self.transfer_lamports >= self.airdrop_lamports {
            tracing::warn!(
                "⚠️  TRANSFER_LAMPORTS ({}) is not below AIRDROP_LAMPORTS ({}). A freshly funded wallet cannot cover it.",
                self.transfer_lamports,
                self.airdrop_lamports
            );
        }

        Ok(())
    }

    pub fn cluster(&self) -> Result<Cluster, String> {
        Cluster::from_str(&self.cluster)
    }

    pub fn rpc_url(&self) -> String {
        match &self.rpc_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self
                .cluster()
                .unwrap_or_default()
                .default_rpc_url()
                .to_string(),
        }
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig, String> {
        CommitmentConfig::from_str(self.commitment.trim())
            .map_err(|_| format!("Invalid COMMITMENT: {}", self.commitment))
    }

    pub fn secret_path(&self) -> PathBuf {
        PathBuf::from(&self.secret_path)
    }

    pub fn funding_policy(&self) -> FundingPolicy {
        FundingPolicy {
            threshold_lamports: self.funding_threshold_lamports,
            top_up_lamports: self.airdrop_lamports,
        }
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::from_builder(::config::Config::builder())
            .expect("Defaults should be valid");

        assert_eq!(config.cluster().unwrap(), Cluster::Devnet);
        assert_eq!(config.rpc_url(), "https://api.devnet.solana.com");
        assert_eq!(config.secret_path(), PathBuf::from(".env"));
        assert_eq!(config.commitment_config().unwrap(), CommitmentConfig::confirmed());
        assert_eq!(config.funding_policy().threshold_lamports, 500_000_000);
        assert_eq!(config.funding_policy().top_up_lamports, 1_000_000_000);
        assert_eq!(config.transfer_lamports, 10_000_000);
        assert_eq!(config.confirm_poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_overrides_are_applied() {
        let builder = ::config::Config::builder()
            .set_override("cluster", "testnet").unwrap()
            .set_override("secret_path", "/tmp/wallet.env").unwrap()
            .set_override("transfer_lamports", 2_000_000i64).unwrap();

        let config = AppConfig::from_builder(builder).expect("Failed to load config");

        assert_eq!(config.cluster().unwrap(), Cluster::Testnet);
        assert_eq!(config.rpc_url(), "https://api.testnet.solana.com");
        assert_eq!(config.secret_path(), PathBuf::from("/tmp/wallet.env"));
        assert_eq!(config.transfer_lamports, 2_000_000);
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
