use std::env;

use executor::RpcNetwork;
use tracing::{debug, error, info};
use transfer_core::{math::lamports_to_sol, telemetry};

mod config;
mod flow;
mod funding;
mod identity;

#[tokio::main]
async fn main() {
    // 1. Logging (stderr, RUST_LOG or info)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string())
        )
        .init();

    telemetry::init_metrics();

    // 2. Configuration (Fail Fast)
    let config = match config::AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ CRITICAL: Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    let (cluster, commitment) = match (config.cluster(), config.commitment_config()) {
        (Ok(cluster), Ok(commitment)) => (cluster, commitment),
        (Err(e), _) | (_, Err(e)) => {
            error!("❌ Configuration Validation Failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("✅ Config Loaded: cluster={}, RPC={}, secret store={}", cluster, config.rpc_url(), config.secret_path);

    // 3. Network adapter
    let network = RpcNetwork::new(&config.rpc_url(), commitment)
        .with_poll_interval(config.confirm_poll_interval());

    // 4. Identity → funding → transfer
    let summary = match flow::run(&network, &config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("❌ {}", e);
            debug!("{}", telemetry::gather_metrics());
            std::process::exit(1);
        }
    };

    if summary.identity_created {
        info!("🆕 Identity {} saved to {}", summary.payer, config.secret_path);
    }
    let report = &summary.report;
    println!("Sent {} SOL from {} to {}", lamports_to_sol(report.lamports), summary.payer, summary.receiver);
    println!("Transaction: {}", report.explorer_url(&cluster));
    println!("New sender balance is {}", lamports_to_sol(report.payer_balance));
    println!("New receiver balance is {}", lamports_to_sol(report.receiver_balance));

    debug!("{}", telemetry::gather_metrics());
    println!("Finished successfully");
}
