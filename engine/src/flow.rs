use executor::execute_transfer;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::info;
use transfer_core::{ports::NetworkPort, telemetry, FlowError, TransactionReport};

use crate::config::AppConfig;
use crate::identity::{load_or_create_identity, SecretStore};

pub struct RunSummary {
    pub payer: Pubkey,
    pub receiver: Pubkey,
    pub identity_created: bool,
    pub report: TransactionReport,
}

/// Identity → funding → transfer to a fresh receiver.
///
/// The receiver is never funded; it only exists to receive the transfer.
pub async fn run(network: &dyn NetworkPort, config: &AppConfig) -> Result<RunSummary, FlowError> {
    let result = run_inner(network, config).await;
    if let Err(e) = &result {
        telemetry::record_failure(e.kind());
    }
    result
}

async fn run_inner(network: &dyn NetworkPort, config: &AppConfig) -> Result<RunSummary, FlowError> {
    let store = SecretStore::new(config.secret_path());
    let identity = load_or_create_identity(&store, network, &config.funding_policy()).await?;
    let payer = identity.keypair;
    info!("From Public Key: {} ({})", payer.pubkey(), store.path().display());

    let receiver = Keypair::new();
    info!("To Public Key: {}", receiver.pubkey());

    let report = execute_transfer(network, &payer, &receiver.pubkey(), config.transfer_lamports).await?;

    Ok(RunSummary {
        payer: payer.pubkey(),
        receiver: receiver.pubkey(),
        identity_created: identity.created,
        report,
    })
}
