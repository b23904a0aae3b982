//! RPC Network Adapter
//!
//! Implements `NetworkPort` over the nonblocking Solana JSON-RPC client.
//! Confirmation uses the blockhash-expiry strategy: poll the signature status
//! until it reaches the configured commitment, fail as soon as the cluster
//! reports an error, and give up once the block height passes the receipt's
//! `last_valid_block_height`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use tracing::{debug, info};
use transfer_core::{ports::NetworkPort, BlockhashContext, ConfirmationReceipt};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct RpcNetwork {
    rpc: RpcClient,
    commitment: CommitmentConfig,
    poll_interval: Duration,
}

impl RpcNetwork {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }
}

#[async_trait::async_trait]
impl NetworkPort for RpcNetwork {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance_with_commitment(pubkey, self.commitment)
            .await
            .map(|response| response.value)
            .with_context(|| format!("Failed to get balance of {}", pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<BlockhashContext> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .context("Failed to get recent blockhash")?;

        debug!("Latest blockhash: {} (valid until height {})", blockhash, last_valid_block_height);
        Ok(BlockhashContext {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        let signature = self
            .rpc
            .request_airdrop(pubkey, lamports)
            .await
            .with_context(|| format!("Failed to request airdrop of {} lamports", lamports))?;

        info!("Airdrop requested: {}", signature);
        Ok(signature)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let signature = self
            .rpc
            .send_transaction(transaction)
            .await
            .context("Failed to send transaction")?;

        info!("Transaction sent: {}", signature);
        Ok(signature)
    }

    async fn confirm_transaction(&self, receipt: &ConfirmationReceipt) -> Result<()> {
        loop {
            let status = self
                .rpc
                .get_signature_status_with_commitment(&receipt.signature, self.commitment)
                .await
                .context("Failed to get signature status")?;

            match status {
                Some(Ok(())) => {
                    info!("Transaction confirmed with {:?}: {}", self.commitment.commitment, receipt.signature);
                    return Ok(());
                }
                Some(Err(e)) => bail!("Transaction {} failed: {}", receipt.signature, e),
                None => {}
            }

            let block_height = self
                .rpc
                .get_block_height_with_commitment(self.commitment)
                .await
                .context("Failed to get block height")?;

            if block_height > receipt.last_valid_block_height {
                bail!(
                    "Blockhash {} expired at height {} before {} was confirmed",
                    receipt.blockhash,
                    receipt.last_valid_block_height,
                    receipt.signature
                );
            }

            debug!(
                "Waiting for {} (height {}/{})",
                receipt.signature, block_height, receipt.last_valid_block_height
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
