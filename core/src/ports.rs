// Port definitions: the boundary between the transfer flow and the network.

use anyhow::Result;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::{BlockhashContext, ConfirmationReceipt};

/// Port for the remote cluster.
///
/// Submission (`request_airdrop`, `send_transaction`) and waiting
/// (`confirm_transaction`) are separate calls, so an adapter can block,
/// poll or subscribe without the callers changing. Timeouts are the
/// adapter's business; callers treat every error as final.
#[async_trait::async_trait]
pub trait NetworkPort: Send + Sync {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64>;

    async fn get_latest_blockhash(&self) -> Result<BlockhashContext>;

    /// Ask the faucet for `lamports`. Returns once the request is accepted, not confirmed.
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature>;

    /// Submit a signed transaction. Returns once it is accepted, not confirmed.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Wait until the receipt's transaction is confirmed, failed, or its blockhash expired.
    async fn confirm_transaction(&self, receipt: &ConfirmationReceipt) -> Result<()>;
}
