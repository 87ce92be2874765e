// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Run Analytics
//
// Every aggregate over zero samples resolves to 0 so nothing non-finite is
// ever published.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ActionKind, TradeAction};

// ─── Return Metrics ──────────────────────────────────────────────────────────

/// Compound annual growth rate, `(end / start)^(1 / years) - 1`.
pub fn cagr(start_value: f64, end_value: f64, years: f64) -> f64 {
    if !(years > 0.0) || !(start_value > 0.0) || !(end_value >= 0.0) {
        return 0.0;
    }
    let rate = (end_value / start_value).powf(1.0 / years) - 1.0;
    if rate.is_finite() { rate } else { 0.0 }
}

/// Per-step natural log returns of a price path.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Annualised sample standard deviation of log returns.
pub fn annualized_volatility(prices: &[f64], periods_per_year: f64) -> f64 {
    let stats = Stats::from_samples(&log_returns(prices));
    let vol = stats.std_dev * periods_per_year.max(0.0).sqrt();
    if vol.is_finite() { vol } else { 0.0 }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Linear Regression ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope.
    pub slope_uncertainty: f64,
}

/// Ordinary least squares over paired samples. Pairs beyond the shorter
/// slice are ignored; empty input or zero x-variance gives a zero slope.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Regression {
    let n = x.len().min(y.len());
    if n == 0 {
        return Regression::default();
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        numerator += (xi - mean_x) * (yi - mean_y);
        denominator += (xi - mean_x).powi(2);
    }
    let slope = if denominator == 0.0 { 0.0 } else { numerator / denominator };
    let intercept = mean_y - slope * mean_x;

    let rss: f64 = x.iter().zip(y).map(|(xi, yi)| (yi - (slope * xi + intercept)).powi(2)).sum();
    let residual_variance = if n > 2 { rss / (n - 2) as f64 } else { 0.0 };
    let slope_uncertainty = if denominator > 0.0 {
        (residual_variance / denominator).sqrt()
    } else {
        0.0
    };

    Regression { slope, intercept, slope_uncertainty }
}

// ─── Excess Return vs Trading Activity ───────────────────────────────────────

/// The per-run fields the leaderboard chart is built from, in the stored
/// document's camelCase layout. Snake-case keys are accepted too.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    #[serde(alias = "total_trades")]
    pub total_trades: u32,
    #[serde(rename = "portfolioCAGR", alias = "portfolio_cagr")]
    pub portfolio_cagr: f64,
    #[serde(rename = "buyHoldCAGR", alias = "buy_hold_cagr")]
    pub buy_hold_cagr: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

const REGRESSION_LINE_POINTS: usize = 100;

/// Excess CAGR (portfolio minus buy-and-hold) against trade count, with the
/// fitted line and axis bounds precomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcessReturnChart {
    pub points: Vec<ChartPoint>,
    /// Mean excess CAGR per distinct trade count, ascending.
    pub mean_points: Vec<ChartPoint>,
    pub regression: Regression,
    pub regression_line: Vec<ChartPoint>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_tick_min: f64,
    pub x_tick_max: f64,
    pub y_tick_min: f64,
    pub y_tick_max: f64,
}

impl ExcessReturnChart {
    pub fn compute(records: &[RunRecord]) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        let points: Vec<ChartPoint> = records
            .iter()
            .map(|r| ChartPoint {
                x: r.total_trades as f64,
                y: finite(r.portfolio_cagr) - finite(r.buy_hold_cagr),
            })
            .collect();

        let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for (record, point) in records.iter().zip(&points) {
            groups.entry(record.total_trades).or_default().push(point.y);
        }
        let mean_points = groups
            .into_iter()
            .map(|(trades, ys)| ChartPoint {
                x: trades as f64,
                y: ys.iter().sum::<f64>() / ys.len() as f64,
            })
            .collect();

        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let regression = linear_regression(&xs, &ys);

        let x = Stats::from_samples(&xs);
        let y = Stats::from_samples(&ys);
        let (x_min, x_max) = (x.min, x.max);
        let (y_min, y_max) = (y.min, y.max);

        let step = (x_max - x_min) / (REGRESSION_LINE_POINTS - 1) as f64;
        let regression_line = (0..REGRESSION_LINE_POINTS)
            .map(|i| {
                let x = x_min + i as f64 * step;
                ChartPoint { x, y: regression.slope * x + regression.intercept }
            })
            .collect();

        Self {
            points,
            mean_points,
            regression,
            regression_line,
            x_min,
            x_max,
            y_min,
            y_max,
            x_tick_min: x_min - 1.0,
            x_tick_max: x_max + 1.0,
            y_tick_min: ((y_min - 1.0) / 5.0).floor() * 5.0,
            y_tick_max: ((y_max + 1.0) / 5.0).ceil() * 5.0,
        }
    }
}

// ─── SimulationSummary ───────────────────────────────────────────────────────

/// End-of-run figures handed to the persistence/leaderboard layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSummary {
    /// Periods published so far, including the opening point.
    pub periods_played: usize,
    pub duration_years: f64,
    /// User-initiated buys; the opening allocation is not counted.
    pub buys: u32,
    pub sells: u32,
    pub total_trades: u32,
    pub portfolio_value: f64,
    /// Value of the opening share held untouched to the final price.
    pub buy_hold_final_value: f64,
    pub portfolio_cagr: f64,
    pub buy_hold_cagr: f64,
    pub excess_cagr: f64,
    pub win: bool,
    pub real_mode: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_price: f64,
    pub final_raw_price: f64,
    pub final_smoothed_price: f64,
    pub actions: Vec<TradeAction>,
}

impl SimulationSummary {
    pub fn record(&self) -> RunRecord {
        RunRecord {
            total_trades: self.total_trades,
            portfolio_cagr: self.portfolio_cagr,
            buy_hold_cagr: self.buy_hold_cagr,
        }
    }
}

/// Count user-initiated buys and sells; the action at index 0 is the opening allocation.
pub fn count_trades(actions: &[TradeAction]) -> (u32, u32) {
    actions.iter().skip(1).fold((0, 0), |(buys, sells), a| match a.kind {
        ActionKind::Buy => (buys + 1, sells),
        ActionKind::Sell => (buys, sells + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cagr_of_doubling_over_one_year() {
        assert!((cagr(100.0, 200.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((cagr(100.0, 121.0, 2.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn cagr_degenerate_inputs_are_zero() {
        assert_eq!(cagr(100.0, 150.0, 0.0), 0.0);
        assert_eq!(cagr(0.0, 150.0, 1.0), 0.0);
        assert_eq!(cagr(100.0, f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn volatility_of_flat_path_is_zero() {
        assert_eq!(annualized_volatility(&[100.0; 10], 60.0), 0.0);
        assert_eq!(annualized_volatility(&[], 60.0), 0.0);
        assert_eq!(annualized_volatility(&[100.0], 60.0), 0.0);
    }

    #[test]
    fn stats_of_empty_are_zero() {
        let s = Stats::from_samples(&[]);
        assert_eq!((s.mean, s.min, s.max, s.n), (0.0, 0.0, 0.0, 0));
    }

    #[test]
    fn regression_fits_a_line() {
        let r = linear_regression(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]);
        assert!((r.slope - 2.0).abs() < 1e-12);
        assert!((r.intercept - 1.0).abs() < 1e-12);
        assert!(r.slope_uncertainty.abs() < 1e-9);
    }

    #[test]
    fn empty_chart_has_no_non_finite_values() {
        let chart = ExcessReturnChart::compute(&[]);
        assert_eq!(chart.x_min, 0.0);
        assert_eq!(chart.x_max, 0.0);
        assert_eq!(chart.regression, Regression::default());
        assert_eq!(chart.regression_line.len(), REGRESSION_LINE_POINTS);
        for p in &chart.regression_line {
            assert_eq!((p.x, p.y), (0.0, 0.0));
        }
        assert!(chart.y_tick_min.is_finite() && chart.y_tick_max.is_finite());
    }

    #[test]
    fn chart_with_data() {
        let records = [
            RunRecord { total_trades: 5, portfolio_cagr: 10.0, buy_hold_cagr: 8.0 },
            RunRecord { total_trades: 10, portfolio_cagr: 12.0, buy_hold_cagr: 8.0 },
            RunRecord { total_trades: 15, portfolio_cagr: 11.0, buy_hold_cagr: 8.0 },
            RunRecord { total_trades: 5, portfolio_cagr: 6.0, buy_hold_cagr: 8.0 },
        ];
        let chart = ExcessReturnChart::compute(&records);
        assert_eq!(chart.points.len(), 4);
        assert_eq!((chart.x_min, chart.x_max), (5.0, 15.0));
        assert_eq!(chart.mean_points[0], ChartPoint { x: 5.0, y: 0.0 });
        assert_eq!(chart.mean_points.len(), 3);
        assert!(chart.regression.slope.is_finite());
        assert_eq!(chart.regression_line.first().unwrap().x, 5.0);
        assert!((chart.regression_line.last().unwrap().x - 15.0).abs() < 1e-9);
        assert_eq!(chart.y_tick_min, -5.0);
        assert_eq!(chart.y_tick_max, 5.0);
    }

    #[test]
    fn run_records_decode_from_stored_documents() {
        let json = r#"[
            {"_id": "a1", "totalTrades": 5, "portfolioCAGR": 10.0, "buyHoldCAGR": 8.0, "win": true},
            {"total_trades": 2, "portfolio_cagr": 6.5, "buy_hold_cagr": 7.0}
        ]"#;
        let records: Vec<RunRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(
            records,
            vec![
                RunRecord { total_trades: 5, portfolio_cagr: 10.0, buy_hold_cagr: 8.0 },
                RunRecord { total_trades: 2, portfolio_cagr: 6.5, buy_hold_cagr: 7.0 },
            ]
        );
        assert_eq!(ExcessReturnChart::compute(&records).points[0], ChartPoint { x: 5.0, y: 2.0 });

        let out = serde_json::to_value(records[0]).unwrap();
        assert_eq!(out["portfolioCAGR"], 10.0);
        assert_eq!(out["totalTrades"], 5);
    }

    #[test]
    fn malformed_run_record_is_an_error() {
        let json = r#"[{"totalTrades": "many", "portfolioCAGR": 1.0, "buyHoldCAGR": 1.0}]"#;
        assert!(serde_json::from_str::<Vec<RunRecord>>(json).is_err());
        assert!(serde_json::from_str::<Vec<RunRecord>>(r#"[{"totalTrades": 1}]"#).is_err());
    }

    #[test]
    fn single_record_chart() {
        let chart = ExcessReturnChart::compute(&[RunRecord {
            total_trades: 5,
            portfolio_cagr: 10.0,
            buy_hold_cagr: 8.0,
        }]);
        assert_eq!((chart.x_min, chart.x_max), (5.0, 5.0));
        assert_eq!(chart.regression.slope, 0.0);
        assert!(chart.regression_line.iter().all(|p| p.x == 5.0 && p.y == 2.0));
    }

    #[test]
    fn opening_action_is_not_a_trade() {
        let a = |kind| TradeAction { kind, day: 0, executed_price: 1.0 };
        let actions = [a(ActionKind::Buy), a(ActionKind::Sell), a(ActionKind::Buy), a(ActionKind::Sell)];
        assert_eq!(count_trades(&actions), (1, 2));
        assert_eq!(count_trades(&actions[..1]), (0, 0));
    }
}
