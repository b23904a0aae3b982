// In-memory NetworkPort adapter. Backs the flow tests; never talks to a cluster.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    system_instruction::SystemInstruction,
    system_program,
    transaction::Transaction,
};

use crate::constants::LAMPORTS_PER_SIGNATURE;
use crate::ports::NetworkPort;
use crate::{BlockhashContext, ConfirmationReceipt};

/// Blocks a blockhash stays valid for, same as mainnet.
const BLOCKHASH_VALIDITY: u64 = 150;

#[derive(Debug, Clone)]
enum PendingEffect {
    Airdrop { to: Pubkey, lamports: u64 },
    Transfers { payer: Pubkey, fee: u64, moves: Vec<(Pubkey, Pubkey, u64)> },
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Pubkey, u64>,
    issued_blockhashes: HashSet<Hash>,
    pending: HashMap<Signature, PendingEffect>,
    confirmed: Vec<Signature>,
    airdrop_requests: Vec<(Pubkey, u64)>,
    submitted_transactions: usize,
    block_height: u64,
    fail_airdrops: bool,
    fail_confirmations: bool,
}

/// Mock cluster: a balance map with preflight checks, fees and two-phase settlement.
///
/// Effects of airdrops and transfers are applied only when the matching
/// receipt is confirmed, so a caller that skips the await phase observes
/// unchanged balances.
pub struct MockNetwork {
    state: Mutex<LedgerState>,
    fee_per_signature: u64,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                block_height: 1_000,
                ..Default::default()
            }),
            fee_per_signature: LAMPORTS_PER_SIGNATURE,
        }
    }

    pub fn with_balance(self, pubkey: Pubkey, lamports: u64) -> Self {
        self.set_balance(pubkey, lamports);
        self
    }

    pub fn set_balance(&self, pubkey: Pubkey, lamports: u64) {
        self.state.lock().balances.insert(pubkey, lamports);
    }

    pub fn balance_of(&self, pubkey: &Pubkey) -> u64 {
        self.state.lock().balances.get(pubkey).copied().unwrap_or(0)
    }

    /// Faucet requests seen so far, in order.
    pub fn airdrop_requests(&self) -> Vec<(Pubkey, u64)> {
        self.state.lock().airdrop_requests.clone()
    }

    pub fn submitted_transactions(&self) -> usize {
        self.state.lock().submitted_transactions
    }

    pub fn confirmed_signatures(&self) -> Vec<Signature> {
        self.state.lock().confirmed.clone()
    }

    pub fn fail_airdrops(&self, fail: bool) {
        self.state.lock().fail_airdrops = fail;
    }

    pub fn fail_confirmations(&self, fail: bool) {
        self.state.lock().fail_confirmations = fail;
    }

    /// Moves the chain forward, expiring older blockhashes.
    pub fn advance_blocks(&self, blocks: u64) {
        self.state.lock().block_height += blocks;
    }

    fn decode_transfers(tx: &Transaction) -> Result<Vec<(Pubkey, Pubkey, u64)>> {
        let keys = &tx.message.account_keys;
        let key_at = |index: u8| -> Result<Pubkey> {
            keys.get(index as usize)
                .copied()
                .ok_or_else(|| anyhow!("account index {} out of range", index))
        };

        let mut moves = Vec::with_capacity(tx.message.instructions.len());
        for ix in &tx.message.instructions {
            if key_at(ix.program_id_index)? != system_program::id() {
                bail!("unsupported program {}", key_at(ix.program_id_index)?);
            }
            let decoded: SystemInstruction = bincode::deserialize(&ix.data)
                .context("invalid system instruction data")?;
            match decoded {
                SystemInstruction::Transfer { lamports } => {
                    let from = key_at(*ix.accounts.first().ok_or_else(|| anyhow!("missing source"))?)?;
                    let to = key_at(*ix.accounts.get(1).ok_or_else(|| anyhow!("missing destination"))?)?;
                    moves.push((from, to, lamports));
                }
                other => bail!("unsupported system instruction {:?}", other),
            }
        }
        Ok(moves)
    }

    /// Lamports each account must hold for the effect to settle.
    fn required_debits(payer: &Pubkey, fee: u64, moves: &[(Pubkey, Pubkey, u64)]) -> HashMap<Pubkey, u64> {
        let mut debits: HashMap<Pubkey, u64> = HashMap::new();
        *debits.entry(*payer).or_default() += fee;
        for (from, _, lamports) in moves {
            *debits.entry(*from).or_default() += lamports;
        }
        debits
    }

    fn check_funds(balances: &HashMap<Pubkey, u64>, debits: &HashMap<Pubkey, u64>) -> Result<()> {
        for (account, needed) in debits {
            let available = balances.get(account).copied().unwrap_or(0);
            if available < *needed {
                bail!(
                    "insufficient funds in {}: need {} lamports, have {}",
                    account,
                    needed,
                    available
                );
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl NetworkPort for MockNetwork {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        Ok(self.balance_of(pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<BlockhashContext> {
        let mut state = self.state.lock();
        let blockhash = Hash::new_unique();
        state.issued_blockhashes.insert(blockhash);
        Ok(BlockhashContext {
            blockhash,
            last_valid_block_height: state.block_height + BLOCKHASH_VALIDITY,
        })
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        let mut state = self.state.lock();
        state.airdrop_requests.push((*pubkey, lamports));
        if state.fail_airdrops {
            bail!("airdrop request rejected: faucet rate limit reached");
        }
        let signature = Signature::new_unique();
        state
            .pending
            .insert(signature, PendingEffect::Airdrop { to: *pubkey, lamports });
        Ok(signature)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        transaction
            .verify()
            .map_err(|e| anyhow!("signature verification failed: {}", e))?;

        let payer = *transaction
            .message
            .account_keys
            .first()
            .ok_or_else(|| anyhow!("transaction has no fee payer"))?;
        let signature = *transaction
            .signatures
            .first()
            .ok_or_else(|| anyhow!("transaction is unsigned"))?;
        let moves = Self::decode_transfers(transaction)?;
        let fee = self.fee_per_signature * transaction.signatures.len() as u64;

        let mut state = self.state.lock();
        if !state.issued_blockhashes.contains(&transaction.message.recent_blockhash) {
            bail!("blockhash not found");
        }
        // Preflight: an underfunded transaction never lands.
        Self::check_funds(&state.balances, &Self::required_debits(&payer, fee, &moves))
            .context("transaction simulation failed")?;

        state.submitted_transactions += 1;
        state
            .pending
            .insert(signature, PendingEffect::Transfers { payer, fee, moves });
        Ok(signature)
    }

    async fn confirm_transaction(&self, receipt: &ConfirmationReceipt) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_confirmations {
            bail!("confirmation of {} timed out", receipt.signature);
        }
        if state.confirmed.contains(&receipt.signature) {
            return Ok(());
        }
        if state.block_height > receipt.last_valid_block_height {
            state.pending.remove(&receipt.signature);
            bail!("blockhash for {} expired before confirmation", receipt.signature);
        }
        let effect = state
            .pending
            .remove(&receipt.signature)
            .ok_or_else(|| anyhow!("unknown signature {}", receipt.signature))?;

        match effect {
            PendingEffect::Airdrop { to, lamports } => {
                *state.balances.entry(to).or_default() += lamports;
            }
            PendingEffect::Transfers { payer, fee, moves } => {
                Self::check_funds(&state.balances, &Self::required_debits(&payer, fee, &moves))?;
                *state.balances.entry(payer).or_default() -= fee;
                for (from, to, lamports) in moves {
                    *state.balances.entry(from).or_default() -= lamports;
                    *state.balances.entry(to).or_default() += lamports;
                }
            }
        }
        state.confirmed.push(receipt.signature);
        state.block_height += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransferIntent;
    use solana_sdk::signature::{Keypair, Signer};

    async fn signed_transfer(network: &MockNetwork, payer: &Keypair, to: Pubkey, lamports: u64) -> (Transaction, BlockhashContext) {
        let context = network.get_latest_blockhash().await.unwrap();
        let ix = TransferIntent::new(payer.pubkey(), to, lamports).instruction();
        let tx = Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[payer], context.blockhash);
        (tx, context)
    }

    #[tokio::test]
    async fn test_airdrop_settles_only_on_confirmation() {
        let network = MockNetwork::new();
        let owner = Pubkey::new_unique();

        let signature = network.request_airdrop(&owner, 1_000).await.unwrap();
        assert_eq!(network.balance_of(&owner), 0);

        let context = network.get_latest_blockhash().await.unwrap();
        network
            .confirm_transaction(&ConfirmationReceipt::new(signature, context))
            .await
            .unwrap();
        assert_eq!(network.balance_of(&owner), 1_000);
        assert_eq!(network.airdrop_requests(), vec![(owner, 1_000)]);
    }

    #[tokio::test]
    async fn test_transfer_charges_fee() {
        let payer = Keypair::new();
        let to = Pubkey::new_unique();
        let network = MockNetwork::new().with_balance(payer.pubkey(), 100_000);

        let (tx, context) = signed_transfer(&network, &payer, to, 10_000).await;
        let signature = network.send_transaction(&tx).await.unwrap();
        network
            .confirm_transaction(&ConfirmationReceipt::new(signature, context))
            .await
            .unwrap();

        assert_eq!(network.balance_of(&to), 10_000);
        assert_eq!(network.balance_of(&payer.pubkey()), 100_000 - 10_000 - LAMPORTS_PER_SIGNATURE);
    }

    #[tokio::test]
    async fn test_preflight_rejects_underfunded_transfer() {
        let payer = Keypair::new();
        let network = MockNetwork::new().with_balance(payer.pubkey(), 10_000);

        let (tx, _) = signed_transfer(&network, &payer, Pubkey::new_unique(), 10_000).await;
        let err = network.send_transaction(&tx).await.unwrap_err();

        assert!(format!("{:#}", err).contains("insufficient funds"));
        assert_eq!(network.submitted_transactions(), 0);
    }

    #[tokio::test]
    async fn test_rejects_unknown_blockhash() {
        let payer = Keypair::new();
        let network = MockNetwork::new().with_balance(payer.pubkey(), 1_000_000);
        let ix = TransferIntent::new(payer.pubkey(), Pubkey::new_unique(), 1).instruction();
        let tx = Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[&payer], Hash::new_unique());

        assert!(network.send_transaction(&tx).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_blockhash_fails_confirmation() {
        let payer = Keypair::new();
        let to = Pubkey::new_unique();
        let network = MockNetwork::new().with_balance(payer.pubkey(), 1_000_000);

        let (tx, context) = signed_transfer(&network, &payer, to, 1_000).await;
        let signature = network.send_transaction(&tx).await.unwrap();
        network.advance_blocks(BLOCKHASH_VALIDITY + 1);

        let result = network
            .confirm_transaction(&ConfirmationReceipt::new(signature, context))
            .await;
        assert!(result.is_err());
        assert_eq!(network.balance_of(&to), 0);
    }
}
