use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Faucet
    pub static ref AIRDROPS_REQUESTED: IntCounter = IntCounter::new(
        "airdrops_requested_total",
        "Faucet requests issued by the funding guard"
    ).unwrap();

    pub static ref AIRDROP_LAMPORTS: IntCounter = IntCounter::new(
        "airdrop_lamports_total",
        "Lamports requested from the faucet"
    ).unwrap();

    // Transfers
    pub static ref TRANSFERS_CONFIRMED: IntCounter = IntCounter::new(
        "transfers_confirmed_total",
        "Transfers confirmed by the cluster"
    ).unwrap();

    pub static ref TRANSFER_LAMPORTS: IntCounter = IntCounter::new(
        "transfer_lamports_total",
        "Lamports moved by confirmed transfers"
    ).unwrap();

    pub static ref FLOW_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("flow_failures_total", "Fatal flow errors by kind"),
        &["kind"]
    ).unwrap();

    pub static ref CONFIRMATION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "confirmation_latency_seconds",
            "Time from submission to confirmation"
        ).buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 90.0])
    ).unwrap();
}

/// Registers every collector. Safe to call more than once.
pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(AIRDROPS_REQUESTED.clone()));
    let _ = REGISTRY.register(Box::new(AIRDROP_LAMPORTS.clone()));
    let _ = REGISTRY.register(Box::new(TRANSFERS_CONFIRMED.clone()));
    let _ = REGISTRY.register(Box::new(TRANSFER_LAMPORTS.clone()));
    let _ = REGISTRY.register(Box::new(FLOW_FAILURES.clone()));
    let _ = REGISTRY.register(Box::new(CONFIRMATION_LATENCY.clone()));
}

pub fn record_failure(kind: &str) {
    FLOW_FAILURES.with_label_values(&[kind]).inc();
}

/// Text exposition of the registry.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exposes_flow_metrics() {
        init_metrics();
        init_metrics();
        AIRDROPS_REQUESTED.inc();
        record_failure("transfer");

        let text = gather_metrics();
        assert!(text.contains("airdrops_requested_total"));
        assert!(text.contains("flow_failures_total{kind=\"transfer\"}"));
    }
}
