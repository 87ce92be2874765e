// Scenario Definitions - GBM parameter sets checked against closed-form theory

use market_playback_engine::{SimulationConfig, SimulationMode};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub annual_drift: f64,
    pub annual_volatility: f64,
    pub years: f64,
    /// Simulated days advanced per period.
    pub days_per_step: f64,
    pub window_size: usize,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Allowed gap between mean realised CAGR and theory, in percentage points.
    pub cagr_tolerance_pct: f64,
    /// Allowed gap between mean realised volatility and sigma, in percentage points.
    pub volatility_tolerance_pct: f64,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            cagr_tolerance_pct: 1.5,
            volatility_tolerance_pct: 3.0,
        }
    }
}

impl Scenario {
    /// Synthetic config whose derived `days_per_step` matches the scenario,
    /// keeping the game's 10 steps per wall-clock second.
    pub fn config(&self) -> SimulationConfig {
        let steps_per_second = 10.0;
        let periods = (self.years * 365.0 / self.days_per_step).round();
        SimulationConfig {
            annual_drift: self.annual_drift,
            annual_volatility: self.annual_volatility,
            window_size: self.window_size,
            real_time_duration_seconds: periods / steps_per_second,
            simulation_duration_years: self.years,
            steps_per_second,
            mode: SimulationMode::Synthetic,
            ..Default::default()
        }
    }

    pub fn theoretical_cagr_pct(&self) -> f64 {
        ((self.annual_drift - 0.5 * self.annual_volatility.powi(2)).exp() - 1.0) * 100.0
    }
}

// ─── Scenario List ──────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "GAME_DEFAULT",
            label: "Game defaults (mu 9%, sigma 20%, 20y)",
            category: "game",
            annual_drift: 0.09, annual_volatility: 0.20, years: 20.0,
            days_per_step: 365.0 * 5.0 / 300.0, window_size: 2,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "GAME_LONG_RUN",
            label: "Game defaults over a century",
            category: "game",
            annual_drift: 0.09, annual_volatility: 0.20, years: 100.0,
            days_per_step: 365.0 * 5.0 / 300.0, window_size: 2,
            criteria: PassCriteria { cagr_tolerance_pct: 1.0, volatility_tolerance_pct: 2.0 },
        },
        Scenario {
            name: "CALM_MARKET",
            label: "Calm market (mu 8%, sigma 10%)",
            category: "regime",
            annual_drift: 0.08, annual_volatility: 0.10, years: 20.0,
            days_per_step: 5.09, window_size: 5,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "VOLATILE_MARKET",
            label: "Volatile market (mu 9%, sigma 35%)",
            category: "regime",
            annual_drift: 0.09, annual_volatility: 0.35, years: 20.0,
            days_per_step: 365.0 * 5.0 / 300.0, window_size: 2,
            criteria: PassCriteria { cagr_tolerance_pct: 2.5, volatility_tolerance_pct: 3.0 },
        },
        Scenario {
            name: "DRIFTLESS",
            label: "Zero drift (mu 0%, sigma 20%)",
            category: "edge",
            annual_drift: 0.0, annual_volatility: 0.20, years: 20.0,
            days_per_step: 365.0 * 5.0 / 300.0, window_size: 2,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "DETERMINISTIC",
            label: "Zero volatility (pure drift)",
            category: "edge",
            annual_drift: 0.09, annual_volatility: 0.0, years: 20.0,
            days_per_step: 365.0 * 5.0 / 300.0, window_size: 2,
            criteria: PassCriteria { cagr_tolerance_pct: 0.01, volatility_tolerance_pct: 0.01 },
        },
    ]
}
