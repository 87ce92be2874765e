// Monte Carlo Infrastructure - N seeded playbacks per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N, computing mean ± 95% CI

use market_playback_engine::analytics::{annualized_volatility, cagr};
use market_playback_engine::price_process::ANCHOR_PRICE;
use market_playback_engine::*;

use crate::report::*;
use crate::scenarios::Scenario;
use crate::time_series::TimeSeriesRecorder;

use std::time::Instant;

/// Play one seeded run of a scenario to completion, ticking synchronously.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> Result<BenchResult, SimError> {
    let start = Instant::now();
    let config = scenario.config();
    let periods_per_year = 365.0 / config.days_per_step();
    let dt = config.dt();

    let mut sim = MarketSimulation::seeded(seed);
    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());

    let first = sim.start(config)?;
    if let Some(ts) = time_series.as_mut() {
        ts.record(&first);
    }
    while let TickOutcome::Advanced(event) = sim.tick() {
        if let Some(ts) = time_series.as_mut() {
            ts.record(&event);
        }
    }

    let raw = sim.raw_prices();
    let periods = raw.len();
    let years = periods as f64 * dt;
    let final_price = raw.last().copied().unwrap_or(ANCHOR_PRICE);

    let mut path = Vec::with_capacity(periods + 1);
    path.push(ANCHOR_PRICE);
    path.extend_from_slice(raw);

    if let (Some(dir), Some(ts)) = (time_series_dir, time_series) {
        let out = dir.join(format!("{}-seed{}.jsonl", scenario.name, seed));
        if let Err(e) = ts.write_jsonl(&out) {
            eprintln!("  warning: failed to write {}: {}", out.display(), e);
        }
    }

    Ok(BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        seed,
        periods,
        years,
        final_price,
        cagr_pct: cagr(ANCHOR_PRICE, final_price, years) * 100.0,
        volatility_pct: annualized_volatility(&path, periods_per_year) * 100.0,
        buy_hold_cagr_pct: sim.summary().buy_hold_cagr,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

fn aggregate(results: &[BenchResult], f: impl Fn(&BenchResult) -> f64) -> Stats {
    let samples: Vec<f64> = results.iter().map(f).collect();
    Stats::from_samples(&samples)
}

/// Whether the sample mean lies within `tolerance` of `target`.
fn within(stats: &Stats, target: f64, tolerance: f64) -> bool {
    (stats.mean - target).abs() <= tolerance
}

/// Run a scenario N times and aggregate.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> Result<MonteCarloReport, SimError> {
    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        results.push(run_single(scenario, base_seed + i as u64, time_series_dir)?);
    }

    let cagr_pct = aggregate(&results, |r| r.cagr_pct);
    let volatility_pct = aggregate(&results, |r| r.volatility_pct);
    let theoretical_cagr_pct = scenario.theoretical_cagr_pct();
    let theoretical_volatility_pct = scenario.annual_volatility * 100.0;

    let cagr_within_tolerance = within(&cagr_pct, theoretical_cagr_pct, scenario.criteria.cagr_tolerance_pct);
    let volatility_within_tolerance = within(
        &volatility_pct,
        theoretical_volatility_pct,
        scenario.criteria.volatility_tolerance_pct,
    );

    Ok(MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs,
        theoretical_cagr_pct,
        theoretical_volatility_pct,
        cagr_pct,
        volatility_pct,
        buy_hold_cagr_pct: aggregate(&results, |r| r.buy_hold_cagr_pct),
        final_price: aggregate(&results, |r| r.final_price),
        elapsed_ms: aggregate(&results, |r| r.elapsed_ms as f64),
        cagr_within_tolerance,
        volatility_within_tolerance,
        pass: cagr_within_tolerance && volatility_within_tolerance,
        individual_runs: results,
    })
}
