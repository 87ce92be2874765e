// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Portfolio Account

use serde::{Deserialize, Serialize};

use crate::types::PortfolioSnapshot;

/// Mark-to-market value of a position.
pub fn portfolio_value(shares: f64, cash: f64, price: f64) -> f64 {
    shares * price + cash
}

/// The user's holdings. Every trade converts 100% of one side into the other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    pub shares: f64,
    pub cash: f64,
}

impl Default for Portfolio {
    /// The opening allocation: one share, no cash.
    fn default() -> Self {
        Self { shares: 1.0, cash: 0.0 }
    }
}

impl Portfolio {
    pub fn value(&self, price: f64) -> f64 {
        portfolio_value(self.shares, self.cash, price)
    }

    pub fn snapshot(&self, price: f64) -> PortfolioSnapshot {
        PortfolioSnapshot {
            shares: self.shares,
            cash: self.cash,
            portfolio_value: self.value(price),
        }
    }

    /// Spend all cash on shares at `price`. Returns the shares bought, or
    /// `None` when there is no cash or the price cannot absorb it.
    pub fn buy_all(&mut self, price: f64) -> Option<f64> {
        if self.cash <= 0.0 || !(price > 0.0) || !price.is_finite() {
            return None;
        }
        let bought = self.cash / price;
        self.shares += bought;
        self.cash = 0.0;
        Some(bought)
    }

    /// Sell all shares at `price`. Returns the cash gained, or `None` when
    /// there are no shares.
    pub fn sell_all(&mut self, price: f64) -> Option<f64> {
        if self.shares <= 0.0 || !price.is_finite() {
            return None;
        }
        let gained = self.shares * price;
        self.cash += gained;
        self.shares = 0.0;
        Some(gained)
    }
}
