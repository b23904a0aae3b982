//! Transfer Executor
//!
//! Builds a single system transfer, signs it with the payer alone, submits it
//! and waits for confirmation. Transfers are not reversible, so any failure
//! is reported as `FlowError::TransferFailed` and never retried.

use std::time::Instant;

use anyhow::Context;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{error, info};
use transfer_core::{
    math::lamports_to_sol,
    ports::NetworkPort,
    telemetry::{CONFIRMATION_LATENCY, TRANSFERS_CONFIRMED, TRANSFER_LAMPORTS},
    ConfirmationReceipt, FlowError, TransactionReport, TransferIntent,
};

/// Send `lamports` from `payer` to `receiver` and report both balances afterwards.
///
/// # Errors
/// Returns `FlowError::TransferFailed` if:
/// - `lamports` is zero
/// - the payer holds less than `lamports` (nothing is submitted)
/// - the blockhash query, submission or confirmation fails
/// - the post-transfer balances cannot be read
pub async fn execute_transfer(
    network: &dyn NetworkPort,
    payer: &Keypair,
    receiver: &Pubkey,
    lamports: u64,
) -> Result<TransactionReport, FlowError> {
    if lamports == 0 {
        return Err(FlowError::TransferFailed("transfer amount must be positive".into()));
    }

    let intent = TransferIntent::new(payer.pubkey(), *receiver, lamports);

    // 1. Pre-flight balance check
    let available = network
        .get_balance(&intent.from)
        .await
        .map_err(FlowError::transfer)?;
    if available < intent.lamports {
        error!(
            "Payer {} holds {} SOL, cannot send {} SOL",
            intent.from,
            lamports_to_sol(available),
            lamports_to_sol(intent.lamports)
        );
        return Err(FlowError::TransferFailed(format!(
            "insufficient balance: {} has {} lamports, transfer needs {}",
            intent.from, available, intent.lamports
        )));
    }

    // 2. Build and sign
    let context = network
        .get_latest_blockhash()
        .await
        .map_err(FlowError::transfer)?;
    let transaction = Transaction::new_signed_with_payer(
        &[intent.instruction()],
        Some(&intent.from),
        &[payer],
        context.blockhash,
    );

    // 3. Submit, then await
    info!(
        "Sending {} SOL from {} to {}",
        lamports_to_sol(intent.lamports),
        intent.from,
        intent.to
    );
    let submitted_at = Instant::now();
    let signature = network
        .send_transaction(&transaction)
        .await
        .map_err(FlowError::transfer)?;
    let receipt = ConfirmationReceipt::new(signature, context);
    network
        .confirm_transaction(&receipt)
        .await
        .with_context(|| format!("Transfer {} was not confirmed", signature))
        .map_err(FlowError::transfer)?;

    CONFIRMATION_LATENCY.observe(submitted_at.elapsed().as_secs_f64());
    TRANSFERS_CONFIRMED.inc();
    TRANSFER_LAMPORTS.inc_by(intent.lamports);
    info!("Transfer confirmed: {}", signature);

    // 4. Post-transfer balances
    let payer_balance = network
        .get_balance(&intent.from)
        .await
        .map_err(FlowError::transfer)?;
    let receiver_balance = network
        .get_balance(&intent.to)
        .await
        .map_err(FlowError::transfer)?;

    Ok(TransactionReport {
        signature,
        payer: intent.from,
        receiver: intent.to,
        lamports: intent.lamports,
        payer_balance,
        receiver_balance,
    })
}
