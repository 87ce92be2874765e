// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Type Definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Playback Status ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle = 0,
    Running = 1,
}

// ─── Trade Actions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TradeAction {
    pub kind: ActionKind,
    /// Playback index at which the trade executed.
    pub day: usize,
    /// Smoothed price the trade executed at.
    pub executed_price: f64,
}

// ─── PortfolioSnapshot ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    pub shares: f64,
    pub cash: f64,
    pub portfolio_value: f64,
}

// ─── Published Events ────────────────────────────────────────────────────────

/// One published playback point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickEvent {
    /// Playback index into the precomputed paths.
    pub day: usize,
    /// Simulated market days elapsed (index * days per step; index in historical mode).
    pub market_day: f64,
    /// Calendar date of the point, historical mode only.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub raw_price: f64,
    pub smoothed_price: f64,
    pub portfolio: PortfolioSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeEvent {
    pub action: TradeAction,
    pub portfolio: PortfolioSnapshot,
}

// ─── TickOutcome ─────────────────────────────────────────────────────────────

/// Result of advancing the playback index by one.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new point was published.
    Advanced(TickEvent),
    /// The index ran past the end of the dataset; the run is now Idle.
    Completed,
    /// No run is active; nothing happened.
    Idle,
}
