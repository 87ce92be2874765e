// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Price Process (GBM)

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Pre-simulation reference price. The first stored point is one step from here.
pub const ANCHOR_PRICE: f64 = 100.0;

/// Standard normal variate via the Box–Muller transform.
/// Exact zeros are redrawn so `ln(u)` stays finite.
pub fn generate_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let mut u: f64 = 0.0;
    while u == 0.0 {
        u = rng.gen();
    }
    let mut v: f64 = 0.0;
    while v == 0.0 {
        v = rng.gen();
    }
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

// ─── GbmProcess ──────────────────────────────────────────────────────────────

/// Discretised geometric Brownian motion:
///
/// ```text
/// S[i] = S[i-1] * exp((mu - sigma^2 / 2) * dt + sigma * sqrt(dt) * z)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GbmProcess {
    pub annual_drift: f64,
    pub annual_volatility: f64,
    /// Step length in years.
    pub dt: f64,
}

impl GbmProcess {
    pub fn new(annual_drift: f64, annual_volatility: f64, dt: f64) -> Self {
        Self { annual_drift, annual_volatility, dt }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.annual_drift, config.annual_volatility, config.dt())
    }

    /// Deterministic part of one log-return step.
    pub fn drift_term(&self) -> f64 {
        (self.annual_drift - 0.5 * self.annual_volatility.powi(2)) * self.dt
    }

    pub fn next_price<R: Rng + ?Sized>(&self, price: f64, rng: &mut R) -> f64 {
        let z = generate_standard_normal(rng);
        let diffusion = self.annual_volatility * self.dt.sqrt() * z;
        price * (self.drift_term() + diffusion).exp()
    }

    /// `num_periods` prices, the first already one step evolved from
    /// [`ANCHOR_PRICE`]. Zero periods yields an empty path.
    pub fn generate_path<R: Rng + ?Sized>(&self, num_periods: usize, rng: &mut R) -> Vec<f64> {
        let mut path = Vec::with_capacity(num_periods);
        let mut price = ANCHOR_PRICE;
        for _ in 0..num_periods {
            price = self.next_price(price, rng);
            path.push(price);
        }
        path
    }

    /// Closed-form expected CAGR, `exp(mu - sigma^2 / 2) - 1`.
    pub fn theoretical_cagr(&self) -> f64 {
        (self.annual_drift - 0.5 * self.annual_volatility.powi(2)).exp() - 1.0
    }
}
