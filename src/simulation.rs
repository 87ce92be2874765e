// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Simulation Core

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::analytics::{self, SimulationSummary};
use crate::config::{SimulationConfig, SimulationMode, DAYS_IN_YEAR};
use crate::error::SimError;
use crate::historical::HistoricalSeries;
use crate::portfolio::Portfolio;
use crate::price_process::{GbmProcess, ANCHOR_PRICE};
use crate::smoothing::smooth;
use crate::types::*;

pub type TickCallback = Box<dyn FnMut(&TickEvent) + Send>;
pub type TradeCallback = Box<dyn FnMut(&TradeEvent) + Send>;
pub type CompleteCallback = Box<dyn FnMut(&SimulationSummary) + Send>;

// ─── SimulationState ─────────────────────────────────────────────────────────

/// Mutable per-run state. Reset by every `start()` and by `reset_state()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationState {
    pub current_index: usize,
    pub current_raw_price: f64,
    pub current_smoothed_price: f64,
    pub portfolio: Portfolio,
    pub actions: Vec<TradeAction>,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            current_index: 0,
            current_raw_price: ANCHOR_PRICE,
            current_smoothed_price: ANCHOR_PRICE,
            portfolio: Portfolio::default(),
            actions: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Observers {
    tick: Vec<TickCallback>,
    trade: Vec<TradeCallback>,
    complete: Vec<CompleteCallback>,
}

// ─── MarketSimulation struct ─────────────────────────────────────────────────

/// Playback state machine: `Idle -> Running -> Idle`.
///
/// The whole dataset is generated inside `start()`; `tick()` only moves the
/// playback index. Nothing here owns a timer: the caller drives `tick()` at
/// [`interval`](Self::interval) (see `playback::Playback` on native targets,
/// `setInterval` in the browser).
#[wasm_bindgen]
pub struct MarketSimulation {
    pub(crate) config: SimulationConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) raw_prices: Vec<f64>,
    pub(crate) smoothed_prices: Vec<f64>,
    pub(crate) dates: Vec<NaiveDate>,
    pub(crate) state: SimulationState,
    pub(crate) status: PlaybackStatus,
    pub(crate) historical: Option<Arc<HistoricalSeries>>,
    /// Incremented by every successful start.
    pub(crate) run_id: u64,
    observers: Observers,
}

impl Default for MarketSimulation {
    fn default() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl MarketSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            config: SimulationConfig::default(),
            rng,
            raw_prices: Vec::new(),
            smoothed_prices: Vec::new(),
            dates: Vec::new(),
            state: SimulationState::default(),
            status: PlaybackStatus::Idle,
            historical: None,
            run_id: 0,
            observers: Observers::default(),
        }
    }

    /// Historical series used by `SimulationMode::Historical` runs. Shared,
    /// read-only, kept across runs.
    pub fn set_historical_series(&mut self, series: Arc<HistoricalSeries>) {
        self.historical = Some(series);
    }

    pub fn historical_series(&self) -> Option<&Arc<HistoricalSeries>> {
        self.historical.as_ref()
    }

    // ─── Observers ───────────────────────────────────────────────────────────
    //
    // Callbacks run synchronously while the simulation is borrowed; they must
    // not call back into it.

    pub fn on_tick(&mut self, callback: impl FnMut(&TickEvent) + Send + 'static) {
        self.observers.tick.push(Box::new(callback));
    }

    pub fn on_trade(&mut self, callback: impl FnMut(&TradeEvent) + Send + 'static) {
        self.observers.trade.push(Box::new(callback));
    }

    pub fn on_complete(&mut self, callback: impl FnMut(&SimulationSummary) + Send + 'static) {
        self.observers.complete.push(Box::new(callback));
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Validate, build the full raw and smoothed datasets, reset state and
    /// publish the first point. Any error leaves the previous run untouched.
    pub fn start(&mut self, config: SimulationConfig) -> Result<TickEvent, SimError> {
        config.validate()?;
        let periods = config.total_periods();

        let (raw, dates) = match config.mode {
            SimulationMode::Synthetic => {
                let gbm = GbmProcess::from_config(&config);
                (gbm.generate_path(periods, &mut self.rng), Vec::new())
            }
            SimulationMode::Historical => {
                let series = self.historical.as_ref().ok_or(SimError::HistoricalUnavailable)?;
                let slice = series.draw_slice(periods, &mut self.rng)?;
                tracing::debug!(offset = slice.start_offset, periods, "historical slice drawn");
                (slice.closes, slice.dates)
            }
        };

        self.start_with_path(config, raw, dates)
    }

    /// Start a run over a caller-supplied raw path instead of a generated one.
    /// `dates` are kept only when they match the path length.
    pub fn start_with_path(
        &mut self,
        config: SimulationConfig,
        raw_prices: Vec<f64>,
        dates: Vec<NaiveDate>,
    ) -> Result<TickEvent, SimError> {
        config.validate()?;
        config.check_cadence(raw_prices.len())?;
        if self.status == PlaybackStatus::Running {
            tracing::info!(index = self.state.current_index, "previous run discarded by start");
        }

        self.smoothed_prices = smooth(&raw_prices, config.window_size);
        self.dates = if dates.len() == raw_prices.len() { dates } else { Vec::new() };
        self.raw_prices = raw_prices;
        self.config = config;

        let opening_price = self.smoothed_prices[0];
        self.state = SimulationState {
            current_index: 0,
            current_raw_price: self.raw_prices[0],
            current_smoothed_price: opening_price,
            portfolio: Portfolio::default(),
            actions: vec![TradeAction {
                kind: ActionKind::Buy,
                day: 0,
                executed_price: opening_price,
            }],
        };
        self.status = PlaybackStatus::Running;
        self.run_id += 1;

        tracing::info!(
            run = self.run_id,
            mode = ?self.config.mode,
            periods = self.raw_prices.len(),
            interval_ms = self.config.interval_ms(),
            "simulation started"
        );
        Ok(self.publish_tick())
    }

    /// Advance the playback index by one period.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != PlaybackStatus::Running {
            return TickOutcome::Idle;
        }

        let next = self.state.current_index + 1;
        if next >= self.raw_prices.len() {
            self.status = PlaybackStatus::Idle;
            let summary = self.summary();
            tracing::info!(
                periods = summary.periods_played,
                portfolio_value = summary.portfolio_value,
                buy_hold_value = summary.buy_hold_final_value,
                "simulation completed"
            );
            for callback in self.observers.complete.iter_mut() {
                callback(&summary);
            }
            return TickOutcome::Completed;
        }

        self.state.current_index = next;
        self.state.current_raw_price = self.raw_prices[next];
        self.state.current_smoothed_price = self.smoothed_prices[next];
        TickOutcome::Advanced(self.publish_tick())
    }

    /// Halt playback. Idempotent; state is kept for inspection.
    pub fn stop(&mut self) {
        if self.status == PlaybackStatus::Running {
            tracing::info!(index = self.state.current_index, "simulation stopped");
        }
        self.status = PlaybackStatus::Idle;
    }

    /// Back to the pre-run state: no dataset, one share, no cash, price 100.
    pub fn reset_state(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.raw_prices.clear();
        self.smoothed_prices.clear();
        self.dates.clear();
        self.state = SimulationState::default();
    }

    // ─── Trading ─────────────────────────────────────────────────────────────

    /// Convert all cash to shares at the current smoothed price. No-op without cash.
    pub fn buy_shares(&mut self) -> Option<TradeAction> {
        let price = self.state.current_smoothed_price;
        self.state.portfolio.buy_all(price)?;
        Some(self.record_trade(ActionKind::Buy, price))
    }

    /// Convert all shares to cash at the current smoothed price. No-op without shares.
    pub fn sell_shares(&mut self) -> Option<TradeAction> {
        let price = self.state.current_smoothed_price;
        self.state.portfolio.sell_all(price)?;
        Some(self.record_trade(ActionKind::Sell, price))
    }

    fn record_trade(&mut self, kind: ActionKind, executed_price: f64) -> TradeAction {
        let action = TradeAction { kind, day: self.state.current_index, executed_price };
        self.state.actions.push(action);
        let event = TradeEvent { action, portfolio: self.snapshot() };
        tracing::debug!(?kind, day = action.day, price = executed_price, "trade executed");
        for callback in self.observers.trade.iter_mut() {
            callback(&event);
        }
        action
    }

    fn publish_tick(&mut self) -> TickEvent {
        let day = self.state.current_index;
        let market_day = match self.config.mode {
            SimulationMode::Synthetic => day as f64 * self.config.days_per_step(),
            SimulationMode::Historical => day as f64,
        };
        let event = TickEvent {
            day,
            market_day,
            date: self.dates.get(day).copied(),
            raw_price: self.state.current_raw_price,
            smoothed_price: self.state.current_smoothed_price,
            portfolio: self.snapshot(),
        };
        for callback in self.observers.tick.iter_mut() {
            callback(&event);
        }
        event
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Portfolio marked to market at the current smoothed price.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.state.portfolio.snapshot(self.state.current_smoothed_price)
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Identifies the current run; a timer armed for an older run must not tick this one.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn is_running(&self) -> bool {
        self.status == PlaybackStatus::Running
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn raw_prices(&self) -> &[f64] {
        &self.raw_prices
    }

    pub fn smoothed_prices(&self) -> &[f64] {
        &self.smoothed_prices
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn total_periods(&self) -> usize {
        self.raw_prices.len()
    }

    /// Wall-clock spacing of playback ticks for the current run.
    pub fn interval(&self) -> Duration {
        match self.raw_prices.len() {
            0 => Duration::ZERO,
            n => Duration::from_secs_f64(self.config.real_time_duration_seconds / n as f64),
        }
    }

    /// Figures for the run so far (or the finished run).
    pub fn summary(&self) -> SimulationSummary {
        let (buys, sells) = analytics::count_trades(&self.state.actions);
        let real_mode = self.config.mode == SimulationMode::Historical;

        if self.raw_prices.is_empty() {
            return SimulationSummary {
                periods_played: 0,
                duration_years: 0.0,
                buys,
                sells,
                total_trades: buys + sells,
                portfolio_value: self.snapshot().portfolio_value,
                buy_hold_final_value: 0.0,
                portfolio_cagr: 0.0,
                buy_hold_cagr: 0.0,
                excess_cagr: 0.0,
                win: false,
                real_mode,
                start_date: None,
                end_date: None,
                initial_price: 0.0,
                final_raw_price: 0.0,
                final_smoothed_price: 0.0,
                actions: self.state.actions.clone(),
            };
        }

        let last = self.state.current_index.min(self.raw_prices.len() - 1);
        let start_date = self.dates.first().copied();
        let end_date = self.dates.get(last).copied();
        let duration_years = match (start_date, end_date) {
            (Some(start), Some(end)) => (end - start).num_days() as f64 / DAYS_IN_YEAR,
            _ => last as f64 * self.config.dt(),
        };

        let initial_price = self.smoothed_prices[0];
        let final_smoothed_price = self.smoothed_prices[last];
        let portfolio_value = self.state.portfolio.value(final_smoothed_price);
        let buy_hold_final_value = final_smoothed_price;
        let portfolio_cagr = analytics::cagr(initial_price, portfolio_value, duration_years) * 100.0;
        let buy_hold_cagr = analytics::cagr(initial_price, buy_hold_final_value, duration_years) * 100.0;

        SimulationSummary {
            periods_played: last + 1,
            duration_years,
            buys,
            sells,
            total_trades: buys + sells,
            portfolio_value,
            buy_hold_final_value,
            portfolio_cagr,
            buy_hold_cagr,
            excess_cagr: portfolio_cagr - buy_hold_cagr,
            win: portfolio_value > buy_hold_final_value,
            real_mode,
            start_date,
            end_date,
            initial_price,
            final_raw_price: self.raw_prices[last],
            final_smoothed_price,
            actions: self.state.actions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::sync::{Arc, Mutex};

    fn config(periods: usize) -> SimulationConfig {
        SimulationConfig {
            real_time_duration_seconds: 1.0,
            steps_per_second: periods as f64,
            window_size: 1,
            ..Default::default()
        }
    }

    #[test]
    fn fresh_simulation_is_idle_at_anchor() {
        let sim = MarketSimulation::seeded(1);
        assert_eq!(sim.status(), PlaybackStatus::Idle);
        assert_eq!(sim.state().current_index, 0);
        assert_eq!(sim.state().current_raw_price, 100.0);
        assert_eq!(sim.snapshot().portfolio_value, 100.0);
        assert!(sim.raw_prices().is_empty());
    }

    #[test]
    fn start_publishes_first_point_and_opening_buy() {
        let mut sim = MarketSimulation::seeded(2);
        let first = sim.start(config(20)).unwrap();
        assert_eq!(first.day, 0);
        assert_eq!(first.raw_price, sim.raw_prices()[0]);
        assert_eq!(first.smoothed_price, first.raw_price);
        assert_eq!(sim.state().actions.len(), 1);
        assert_eq!(sim.state().actions[0].kind, ActionKind::Buy);
        assert_eq!(sim.state().actions[0].executed_price, first.smoothed_price);
        assert_eq!(first.portfolio.portfolio_value, first.smoothed_price);
        assert!(sim.is_running());
    }

    #[test]
    fn invalid_config_leaves_state_untouched() {
        let mut sim = MarketSimulation::seeded(3);
        sim.start(config(10)).unwrap();
        sim.tick();
        let before = sim.state().clone();

        let bad = SimulationConfig { window_size: 0, ..config(10) };
        assert!(matches!(sim.start(bad), Err(SimError::Config(ConfigError::InvalidWindowSize(0)))));
        assert_eq!(sim.state(), &before);
        assert!(sim.is_running());
    }

    #[test]
    fn oversized_config_is_rejected_without_allocating() {
        let mut sim = MarketSimulation::seeded(11);
        let huge = SimulationConfig { real_time_duration_seconds: 1e20, ..Default::default() };
        assert!(matches!(
            sim.start(huge),
            Err(SimError::Config(ConfigError::TooManyPeriods { .. }))
        ));
        assert!(sim.raw_prices().is_empty());
        assert_eq!(sim.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn supplied_path_too_dense_for_duration_is_rejected() {
        let mut sim = MarketSimulation::seeded(12);
        let cfg = SimulationConfig { real_time_duration_seconds: 0.5, steps_per_second: 2.0, ..config(1) };
        assert!(matches!(
            sim.start_with_path(cfg.clone(), vec![100.0; 1000], Vec::new()),
            Err(SimError::Config(ConfigError::IntervalTooShort { .. }))
        ));
        assert!(matches!(
            sim.start_with_path(cfg, Vec::new(), Vec::new()),
            Err(SimError::Config(ConfigError::NoPeriods))
        ));
        assert_eq!(sim.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn historical_without_series_is_rejected() {
        let mut sim = MarketSimulation::seeded(4);
        let cfg = SimulationConfig { mode: SimulationMode::Historical, ..config(10) };
        assert!(matches!(sim.start(cfg), Err(SimError::HistoricalUnavailable)));
        assert_eq!(sim.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn ticks_walk_both_paths_then_complete_once() {
        let mut sim = MarketSimulation::seeded(5);
        let completions = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&completions);
        sim.on_complete(move |_| *counter.lock().unwrap() += 1);

        sim.start(SimulationConfig { window_size: 3, ..config(5) }).unwrap();
        for i in 1..5 {
            match sim.tick() {
                TickOutcome::Advanced(ev) => {
                    assert_eq!(ev.day, i);
                    assert_eq!(ev.raw_price, sim.raw_prices()[i]);
                    assert_eq!(ev.smoothed_price, sim.smoothed_prices()[i]);
                }
                other => panic!("expected Advanced, got {:?}", other),
            }
        }
        assert_eq!(sim.tick(), TickOutcome::Completed);
        assert_eq!(sim.tick(), TickOutcome::Idle);
        assert_eq!(sim.tick(), TickOutcome::Idle);
        assert_eq!(*completions.lock().unwrap(), 1);
        assert_eq!(sim.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn trades_execute_at_smoothed_price() {
        let mut sim = MarketSimulation::seeded(6);
        let cfg = SimulationConfig { window_size: 2, ..config(4) };
        sim.start_with_path(cfg, vec![100.0, 120.0, 80.0, 90.0], Vec::new()).unwrap();
        sim.tick();
        let sell = sim.sell_shares().unwrap();
        assert_eq!(sell.executed_price, 110.0);
        assert_eq!(sim.state().portfolio.cash, 110.0);
        assert_eq!(sim.sell_shares(), None);

        sim.tick();
        let buy = sim.buy_shares().unwrap();
        assert_eq!(buy.executed_price, 100.0);
        assert!((sim.state().portfolio.shares - 1.1).abs() < 1e-12);
        assert_eq!(sim.buy_shares(), None);
        assert_eq!(sim.state().actions.len(), 3);
    }

    #[test]
    fn stop_is_idempotent_and_keeps_state() {
        let mut sim = MarketSimulation::seeded(7);
        sim.start(config(10)).unwrap();
        sim.tick();
        sim.tick();
        sim.stop();
        sim.stop();
        assert_eq!(sim.status(), PlaybackStatus::Idle);
        assert_eq!(sim.state().current_index, 2);
        assert_eq!(sim.tick(), TickOutcome::Idle);
    }

    #[test]
    fn reset_state_returns_to_anchor() {
        let mut sim = MarketSimulation::seeded(8);
        sim.start(config(10)).unwrap();
        sim.sell_shares();
        sim.reset_state();
        assert_eq!(sim.state(), &SimulationState::default());
        assert!(sim.raw_prices().is_empty());
        assert_eq!(sim.summary().periods_played, 0);
    }

    #[test]
    fn interval_spreads_duration_over_periods() {
        let mut sim = MarketSimulation::seeded(9);
        let cfg = SimulationConfig {
            real_time_duration_seconds: 2.0,
            steps_per_second: 5.0,
            ..Default::default()
        };
        sim.start(cfg).unwrap();
        assert_eq!(sim.total_periods(), 10);
        assert_eq!(sim.interval(), Duration::from_millis(200));
    }

    #[test]
    fn summary_counts_user_trades_only() {
        let mut sim = MarketSimulation::seeded(10);
        sim.start_with_path(config(3), vec![100.0, 50.0, 100.0], Vec::new()).unwrap();
        sim.sell_shares();
        sim.tick();
        sim.buy_shares();
        sim.tick();
        let summary = sim.summary();
        assert_eq!((summary.buys, summary.sells, summary.total_trades), (1, 1, 2));
        assert_eq!(summary.portfolio_value, 200.0);
        assert_eq!(summary.buy_hold_final_value, 100.0);
        assert!(summary.win);
        assert!(summary.portfolio_cagr > summary.buy_hold_cagr);
        assert_eq!(summary.buy_hold_cagr, 0.0);
    }
}
