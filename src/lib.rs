// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite

pub mod analytics;
pub mod config;
pub mod error;
pub mod historical;
pub mod portfolio;
pub mod price_process;
pub mod smoothing;
pub mod simulation;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod playback;

pub use analytics::{ExcessReturnChart, RunRecord, SimulationSummary, Stats};
pub use config::{SimulationConfig, SimulationMode};
pub use error::{ConfigError, SimError};
pub use historical::{CachedHistoricalSource, HistoricalSeries, HistoricalSource, JsonFileSource};
pub use portfolio::Portfolio;
pub use price_process::GbmProcess;
pub use simulation::{MarketSimulation, SimulationState};
pub use smoothing::smooth;
pub use types::*;

#[cfg(not(target_arch = "wasm32"))]
pub use playback::Playback;

use std::sync::Arc;
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────
//
// The browser owns the timer: call `start`, then `tick` every `interval_ms`
// until it returns `null`.

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| {
        tracing::warn!(error = %e, "value could not be converted for JS");
        js_error(e)
    })
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl MarketSimulation {
    #[wasm_bindgen(constructor)]
    pub fn js_new() -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        MarketSimulation::new()
    }

    /// Deterministic instance for replays and tests.
    #[wasm_bindgen(js_name = withSeed)]
    pub fn js_with_seed(seed: u64) -> Self {
        MarketSimulation::seeded(seed)
    }

    /// Parse and keep a `[{Date, Close}]` JSON array for historical runs.
    #[wasm_bindgen(js_name = loadHistorical)]
    pub fn js_load_historical(&mut self, json: &str) -> Result<usize, JsValue> {
        let series = HistoricalSeries::from_json(json).map_err(js_error)?;
        let len = series.len();
        self.set_historical_series(Arc::new(series));
        Ok(len)
    }

    /// Start a run from a (possibly partial) config object and return the first point.
    #[wasm_bindgen(js_name = start)]
    pub fn js_start(&mut self, config: JsValue) -> Result<JsValue, JsValue> {
        let config: SimulationConfig = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };
        let first = self.start(config).map_err(js_error)?;
        to_js(&first)
    }

    /// Next point, or `null` once the run is over. Throws if the point
    /// cannot be converted.
    #[wasm_bindgen(js_name = tick)]
    pub fn js_tick(&mut self) -> Result<JsValue, JsValue> {
        match self.tick() {
            TickOutcome::Advanced(event) => to_js(&event),
            TickOutcome::Completed | TickOutcome::Idle => Ok(JsValue::NULL),
        }
    }

    /// The executed action, or `null` when there was no cash to spend.
    #[wasm_bindgen(js_name = buy)]
    pub fn js_buy(&mut self) -> Result<JsValue, JsValue> {
        match self.buy_shares() {
            Some(action) => to_js(&action),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = sell)]
    pub fn js_sell(&mut self) -> Result<JsValue, JsValue> {
        match self.sell_shares() {
            Some(action) => to_js(&action),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = stop)]
    pub fn js_stop(&mut self) {
        self.stop();
    }

    #[wasm_bindgen(js_name = resetState)]
    pub fn js_reset_state(&mut self) {
        self.reset_state();
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn js_snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.snapshot())
    }

    #[wasm_bindgen(js_name = summary)]
    pub fn js_summary(&self) -> Result<JsValue, JsValue> {
        to_js(&self.summary())
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn js_is_running(&self) -> bool {
        self.is_running()
    }

    #[wasm_bindgen(js_name = intervalMs)]
    pub fn js_interval_ms(&self) -> f64 {
        self.interval().as_secs_f64() * 1000.0
    }

    /// Full raw and smoothed series of the current run, for chart backfill.
    #[wasm_bindgen(js_name = series)]
    pub fn js_series(&self) -> Result<JsValue, JsValue> {
        #[derive(serde::Serialize)]
        struct Series<'a> {
            raw: &'a [f64],
            smoothed: &'a [f64],
        }
        to_js(&Series { raw: self.raw_prices(), smoothed: self.smoothed_prices() })
    }
}

/// Precompute the excess-return-vs-trades chart from stored run documents
/// (`[{totalTrades, portfolioCAGR, buyHoldCAGR}]`). Throws on malformed records.
#[wasm_bindgen(js_name = excessReturnChart)]
pub fn js_excess_return_chart(records: JsValue) -> Result<JsValue, JsValue> {
    let records: Vec<RunRecord> = serde_wasm_bindgen::from_value(records).map_err(js_error)?;
    to_js(&ExcessReturnChart::compute(&records))
}
