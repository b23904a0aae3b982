pub mod cluster;
pub mod error;
pub mod math;
pub mod mock;
pub mod ports;
pub mod telemetry;

pub use cluster::Cluster;
pub use error::FlowError;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Signature,
    system_instruction,
};

/// Latest blockhash plus the last block height at which it is still valid.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashContext {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Everything needed to await finality of a submitted transaction.
/// Produced by the submit phase, consumed once by the confirm phase.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationReceipt {
    pub signature: Signature,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

impl ConfirmationReceipt {
    pub fn new(signature: Signature, context: BlockhashContext) -> Self {
        Self {
            signature,
            blockhash: context.blockhash,
            last_valid_block_height: context.last_valid_block_height,
        }
    }
}

/// A single native transfer from `from` to `to`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
}

impl TransferIntent {
    pub fn new(from: Pubkey, to: Pubkey, lamports: u64) -> Self {
        Self { from, to, lamports }
    }

    pub fn instruction(&self) -> Instruction {
        system_instruction::transfer(&self.from, &self.to, self.lamports)
    }
}

/// Outcome of a confirmed transfer, with both balances re-read afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransactionReport {
    pub signature: Signature,
    pub payer: Pubkey,
    pub receiver: Pubkey,
    pub lamports: u64,
    pub payer_balance: u64,
    pub receiver_balance: u64,
}

impl TransactionReport {
    pub fn explorer_url(&self, cluster: &Cluster) -> String {
        cluster.explorer_tx_url(&self.signature)
    }
}

pub mod constants {
    pub use solana_sdk::native_token::LAMPORTS_PER_SOL;

    /// Below this balance the funding guard asks the faucet for more (0.5 SOL).
    pub const DEFAULT_FUNDING_THRESHOLD_LAMPORTS: u64 = LAMPORTS_PER_SOL / 2;

    /// Faucet top-up amount (1 SOL).
    pub const DEFAULT_AIRDROP_LAMPORTS: u64 = LAMPORTS_PER_SOL;

    /// Amount sent to the receiver (0.01 SOL).
    pub const DEFAULT_TRANSFER_LAMPORTS: u64 = LAMPORTS_PER_SOL / 100;

    /// Base fee charged per signature on Solana clusters.
    pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

    pub const SECRET_KEY_ENTRY: &str = "PRIVATE_KEY";
}
