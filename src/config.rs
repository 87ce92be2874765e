// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Simulation Configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DAYS_IN_YEAR: f64 = 365.0;

/// Largest dataset a single run may generate.
pub const MAX_PERIODS: usize = 10_000_000;

/// Shortest wall-clock spacing between two published points.
pub const MIN_INTERVAL_MS: f64 = 1.0;

// ─── Simulation Mode ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Prices generated by geometric Brownian motion.
    #[default]
    Synthetic,
    /// Prices replayed from a random slice of a historical close series.
    Historical,
}

// ─── SimulationConfig ────────────────────────────────────────────────────────

/// Parameters for one playback run. Immutable once handed to `start()`.
///
/// Deserialises from a partial JSON object: missing fields take the defaults
/// below and unrecognised fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Expected annual drift of log returns.
    pub annual_drift: f64,
    /// Annual volatility, must be >= 0.
    pub annual_volatility: f64,
    /// Trailing rolling-average window in periods.
    pub window_size: usize,
    /// Wall-clock length of a full playback.
    pub real_time_duration_seconds: f64,
    /// Simulated years covered by a full synthetic playback.
    pub simulation_duration_years: f64,
    /// Synthetic periods published per wall-clock second.
    pub steps_per_second: f64,
    /// Historical periods published per wall-clock second.
    pub real_market_data_frequency: f64,
    pub mode: SimulationMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            annual_drift: 0.09,
            annual_volatility: 0.20,
            window_size: 2,
            real_time_duration_seconds: 30.0,
            simulation_duration_years: 5.0,
            steps_per_second: 10.0,
            real_market_data_frequency: 61.0,
            mode: SimulationMode::Synthetic,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject any configuration that would divide by zero in the derived
    /// quantities or produce an empty run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("annual_drift", self.annual_drift),
            ("annual_volatility", self.annual_volatility),
            ("real_time_duration_seconds", self.real_time_duration_seconds),
            ("simulation_duration_years", self.simulation_duration_years),
            ("steps_per_second", self.steps_per_second),
            ("real_market_data_frequency", self.real_market_data_frequency),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if self.window_size < 1 {
            return Err(ConfigError::InvalidWindowSize(self.window_size));
        }
        if self.annual_volatility < 0.0 {
            return Err(ConfigError::NegativeVolatility(self.annual_volatility));
        }

        let positive = [
            ("real_time_duration_seconds", self.real_time_duration_seconds),
            ("simulation_duration_years", self.simulation_duration_years),
            ("steps_per_second", self.steps_per_second),
            ("real_market_data_frequency", self.real_market_data_frequency),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        self.check_cadence(self.total_periods())
    }

    /// Whether `periods` points can be played back over the configured
    /// duration without exceeding [`MAX_PERIODS`] or ticking faster than
    /// [`MIN_INTERVAL_MS`].
    pub fn check_cadence(&self, periods: usize) -> Result<(), ConfigError> {
        if periods == 0 {
            return Err(ConfigError::NoPeriods);
        }
        if periods > MAX_PERIODS {
            return Err(ConfigError::TooManyPeriods { periods, max: MAX_PERIODS });
        }
        let interval_ms = self.real_time_duration_seconds / periods as f64 * 1000.0;
        if interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::IntervalTooShort { interval_ms, min_ms: MIN_INTERVAL_MS });
        }
        Ok(())
    }

    // ─── Derived Parameters ──────────────────────────────────────────────────

    /// Simulated market days advanced by one synthetic period.
    pub fn days_per_step(&self) -> f64 {
        (self.simulation_duration_years * DAYS_IN_YEAR)
            / (self.real_time_duration_seconds * self.steps_per_second)
    }

    /// Per-period time fraction in years (GBM `dt`).
    pub fn dt(&self) -> f64 {
        self.days_per_step() / DAYS_IN_YEAR
    }

    /// Number of periods in a full playback for the configured mode.
    /// Saturates at `usize::MAX`; `validate` rejects anything above [`MAX_PERIODS`].
    pub fn total_periods(&self) -> usize {
        let rate = match self.mode {
            SimulationMode::Synthetic => self.steps_per_second,
            SimulationMode::Historical => self.real_market_data_frequency,
        };
        let periods = (self.real_time_duration_seconds * rate).round();
        if periods.is_finite() && periods > 0.0 {
            periods as usize
        } else {
            0
        }
    }

    /// Wall-clock seconds between playback ticks.
    pub fn interval_secs(&self) -> f64 {
        match self.total_periods() {
            0 => 0.0,
            n => self.real_time_duration_seconds / n as f64,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_secs() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_parameters() {
        let cfg = SimulationConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.total_periods(), 300);
        assert!((cfg.days_per_step() - 6.083333333).abs() < 1e-6);
        assert!((cfg.interval_ms() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn partial_json_takes_defaults_and_ignores_unknown_fields() {
        let cfg = SimulationConfig::from_json(
            r#"{"annual_drift": 0.05, "window_size": 5, "theme": "dark"}"#,
        )
        .unwrap();
        assert_eq!(cfg.annual_drift, 0.05);
        assert_eq!(cfg.window_size, 5);
        assert_eq!(cfg.annual_volatility, 0.20);
        assert_eq!(cfg.mode, SimulationMode::Synthetic);
    }

    #[test]
    fn historical_mode_parses_and_uses_data_frequency() {
        let cfg = SimulationConfig::from_json(r#"{"mode": "historical"}"#).unwrap();
        assert_eq!(cfg.mode, SimulationMode::Historical);
        assert_eq!(cfg.total_periods(), 30 * 61);
    }

    #[test]
    fn zero_window_is_rejected() {
        let cfg = SimulationConfig { window_size: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidWindowSize(0)));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        let cfg = SimulationConfig { steps_per_second: 0.0, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { field: "steps_per_second", .. })
        ));

        let cfg = SimulationConfig { real_time_duration_seconds: -1.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn negative_volatility_and_nan_are_rejected() {
        let cfg = SimulationConfig { annual_volatility: -0.1, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::NegativeVolatility(-0.1)));

        let cfg = SimulationConfig { annual_drift: f64::NAN, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::NonFinite { field: "annual_drift" }));
    }

    #[test]
    fn tiny_duration_rounds_to_no_periods() {
        let cfg = SimulationConfig {
            real_time_duration_seconds: 0.01,
            steps_per_second: 1.0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoPeriods));
    }

    #[test]
    fn huge_duration_is_too_many_periods() {
        let cfg = SimulationConfig { real_time_duration_seconds: 1e20, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooManyPeriods { max: MAX_PERIODS, .. })
        ));

        let cfg = SimulationConfig {
            real_time_duration_seconds: 2_000_000.0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TooManyPeriods { periods: 20_000_000, max: MAX_PERIODS })
        );
    }

    #[test]
    fn sub_millisecond_cadence_is_rejected() {
        let cfg = SimulationConfig { steps_per_second: 5000.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::IntervalTooShort { .. })));

        let cfg = SimulationConfig { steps_per_second: 500.0, ..Default::default() };
        assert_eq!(cfg.validate(), Ok(()));
        assert!((cfg.interval_ms() - 2.0).abs() < 1e-9);
    }
}
