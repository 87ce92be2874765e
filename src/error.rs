// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Error Types

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A simulation configuration that cannot produce a well-defined run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("window size must be at least 1 (got {0})")]
    InvalidWindowSize(usize),

    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("annual volatility must not be negative (got {0})")]
    NegativeVolatility(f64),

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("configuration yields zero playback periods")]
    NoPeriods,

    #[error("configuration yields {periods} playback periods (max {max})")]
    TooManyPeriods { periods: usize, max: usize },

    #[error("playback interval of {interval_ms} ms is shorter than {min_ms} ms")]
    IntervalTooShort { interval_ms: f64, min_ms: f64 },
}

// ---------------------------------------------------------------------------
// Run errors
// ---------------------------------------------------------------------------

/// Errors surfaced by `start()` before any state is mutated or a timer armed.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("not enough historical data: {requested} periods requested, {available} available")]
    InsufficientData { requested: usize, available: usize },

    #[error("historical mode requested but no historical series is loaded")]
    HistoricalUnavailable,

    #[error("historical data could not be parsed: {0}")]
    HistoricalParse(#[from] serde_json::Error),

    #[error("historical data could not be read: {0}")]
    HistoricalIo(#[from] std::io::Error),

    #[error("historical record {index} has an invalid date {value:?}")]
    InvalidDate { index: usize, value: String },

    #[error("historical load task failed: {0}")]
    LoadTask(String),
}
