use std::fmt;
use std::str::FromStr;

use solana_sdk::signature::Signature;

const EXPLORER_TX_BASE: &str = "https://explorer.solana.com/tx";

/// Clusters that expose a faucet. Mainnet is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    /// Public RPC endpoint for the cluster.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        match self {
            Cluster::Devnet => format!("{}/{}?cluster=devnet", EXPLORER_TX_BASE, signature),
            Cluster::Testnet => format!("{}/{}?cluster=testnet", EXPLORER_TX_BASE, signature),
            Cluster::Localnet => format!(
                "{}/{}?cluster=custom&customUrl={}",
                EXPLORER_TX_BASE,
                signature,
                "http%3A%2F%2F127.0.0.1%3A8899"
            ),
        }
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            "mainnet" | "mainnet-beta" => {
                Err("mainnet-beta has no faucet; use devnet, testnet or localnet".to_string())
            }
            other => Err(format!("Unknown cluster: {}", other)),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cluster_names() {
        assert_eq!("devnet".parse::<Cluster>(), Ok(Cluster::Devnet));
        assert_eq!(" Testnet ".parse::<Cluster>(), Ok(Cluster::Testnet));
        assert_eq!("localhost".parse::<Cluster>(), Ok(Cluster::Localnet));
        assert!("mainnet-beta".parse::<Cluster>().is_err());
        assert!("moon".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_devnet_explorer_url() {
        let signature = Signature::default();
        let url = Cluster::Devnet.explorer_tx_url(&signature);
        assert_eq!(
            url,
            format!("https://explorer.solana.com/tx/{}?cluster=devnet", signature)
        );
    }

    #[test]
    fn test_localnet_explorer_url_points_at_custom_rpc() {
        let url = Cluster::Localnet.explorer_tx_url(&Signature::default());
        assert!(url.contains("cluster=custom"));
        assert!(url.contains("customUrl=http%3A%2F%2F127.0.0.1%3A8899"));
    }
}
