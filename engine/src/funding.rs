use std::time::Instant;

use anyhow::Context;
use solana_sdk::pubkey::Pubkey;
use tracing::info;
use transfer_core::{
    constants::{DEFAULT_AIRDROP_LAMPORTS, DEFAULT_FUNDING_THRESHOLD_LAMPORTS},
    math::{lamports_to_sol, needs_top_up},
    ports::NetworkPort,
    telemetry::{AIRDROPS_REQUESTED, AIRDROP_LAMPORTS, CONFIRMATION_LATENCY},
    ConfirmationReceipt, FlowError,
};

/// When to ask the faucet, and for how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    pub threshold_lamports: u64,
    pub top_up_lamports: u64,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            threshold_lamports: DEFAULT_FUNDING_THRESHOLD_LAMPORTS,
            top_up_lamports: DEFAULT_AIRDROP_LAMPORTS,
        }
    }
}

/// Tops `pubkey` up from the faucet when its balance is under the threshold.
///
/// Issues at most one airdrop request and only returns once that airdrop is
/// confirmed or has failed. Returns the last observed balance.
pub async fn ensure_minimum_balance(
    network: &dyn NetworkPort,
    pubkey: &Pubkey,
    policy: &FundingPolicy,
) -> Result<u64, FlowError> {
    let balance = network.get_balance(pubkey).await.map_err(FlowError::funding)?;
    info!("💰 Current balance is {} SOL", lamports_to_sol(balance));

    if !needs_top_up(balance, policy.threshold_lamports) {
        return Ok(balance);
    }

    info!("🪂 Airdropping {} SOL...", lamports_to_sol(policy.top_up_lamports));
    let requested_at = Instant::now();
    let signature = network
        .request_airdrop(pubkey, policy.top_up_lamports)
        .await
        .map_err(FlowError::funding)?;
    AIRDROPS_REQUESTED.inc();
    AIRDROP_LAMPORTS.inc_by(policy.top_up_lamports);

    let context = network
        .get_latest_blockhash()
        .await
        .map_err(FlowError::funding)?;
    network
        .confirm_transaction(&ConfirmationReceipt::new(signature, context))
        .await
        .with_context(|| format!("Airdrop {} was not confirmed", signature))
        .map_err(FlowError::funding)?;
    CONFIRMATION_LATENCY.observe(requested_at.elapsed().as_secs_f64());

    let new_balance = network.get_balance(pubkey).await.map_err(FlowError::funding)?;
    info!("💰 New balance is {} SOL", lamports_to_sol(new_balance));
    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transfer_core::constants::LAMPORTS_PER_SOL;
    use transfer_core::mock::MockNetwork;

    #[tokio::test]
    async fn test_funded_account_is_left_alone() {
        let owner = Pubkey::new_unique();
        let network = MockNetwork::new().with_balance(owner, LAMPORTS_PER_SOL / 2);

        let balance = ensure_minimum_balance(&network, &owner, &FundingPolicy::default())
            .await
            .unwrap();

        assert_eq!(balance, LAMPORTS_PER_SOL / 2);
        assert!(network.airdrop_requests().is_empty());
    }

    #[tokio::test]
    async fn test_low_balance_requests_exactly_one_top_up() {
        let owner = Pubkey::new_unique();
        let network = MockNetwork::new().with_balance(owner, LAMPORTS_PER_SOL / 2 - 1);

        let balance = ensure_minimum_balance(&network, &owner, &FundingPolicy::default())
            .await
            .unwrap();

        assert_eq!(network.airdrop_requests(), vec![(owner, LAMPORTS_PER_SOL)]);
        // Returned only after the airdrop settled.
        assert_eq!(balance, LAMPORTS_PER_SOL + LAMPORTS_PER_SOL / 2 - 1);
        assert_eq!(network.confirmed_signatures().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_policy_amounts() {
        let owner = Pubkey::new_unique();
        let network = MockNetwork::new();
        let policy = FundingPolicy {
            threshold_lamports: 2 * LAMPORTS_PER_SOL,
            top_up_lamports: 3 * LAMPORTS_PER_SOL,
        };

        let balance = ensure_minimum_balance(&network, &owner, &policy).await.unwrap();

        assert_eq!(balance, 3 * LAMPORTS_PER_SOL);
        assert_eq!(network.airdrop_requests(), vec![(owner, 3 * LAMPORTS_PER_SOL)]);
    }

    #[tokio::test]
    async fn test_faucet_rejection_is_funding_failure() {
        let owner = Pubkey::new_unique();
        let network = MockNetwork::new();
        network.fail_airdrops(true);

        let result = ensure_minimum_balance(&network, &owner, &FundingPolicy::default()).await;

        assert!(matches!(result, Err(FlowError::FundingFailed(_))));
        assert_eq!(network.airdrop_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unconfirmed_airdrop_is_funding_failure() {
        let owner = Pubkey::new_unique();
        let network = MockNetwork::new();
        network.fail_confirmations(true);

        let err = ensure_minimum_balance(&network, &owner, &FundingPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::FundingFailed(_)));
        assert!(err.to_string().contains("was not confirmed"));
        assert_eq!(network.balance_of(&owner), 0);
    }
}
