// Benchmark Report Types
// Structured output for independent analysis of the price process

use serde::Serialize;

pub use market_playback_engine::Stats;

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub seed: u64,
    pub periods: usize,
    pub years: f64,
    pub final_price: f64,
    /// Realised CAGR from the 100 anchor, percent.
    pub cagr_pct: f64,
    /// Annualised stdev of log returns, percent.
    pub volatility_pct: f64,
    /// CAGR of the smoothed path a buy-and-hold player sees, percent.
    pub buy_hold_cagr_pct: f64,
    pub elapsed_ms: u128,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub theoretical_cagr_pct: f64,
    pub theoretical_volatility_pct: f64,
    pub cagr_pct: Stats,
    pub volatility_pct: Stats,
    pub buy_hold_cagr_pct: Stats,
    pub final_price: Stats,
    pub elapsed_ms: Stats,
    pub cagr_within_tolerance: bool,
    pub volatility_within_tolerance: bool,
    pub pass: bool,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub summary: Summary,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
