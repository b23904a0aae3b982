use crate::constants::LAMPORTS_PER_SOL;

/// Lamports as a SOL amount for display.
#[inline]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// `balance < threshold`, the only condition under which the faucet is asked.
#[inline]
pub fn needs_top_up(balance_lamports: u64, threshold_lamports: u64) -> bool {
    balance_lamports < threshold_lamports
}
