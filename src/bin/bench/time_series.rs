// Per-Period JSONL Time Series Recorder
// Outputs one JSON line per published point for independent analysis

use market_playback_engine::TickEvent;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct PeriodSnapshot {
    pub day: usize,
    pub market_day: f64,
    pub raw_price: f64,
    pub smoothed_price: f64,
    /// Raw price minus the rolling average the player trades at.
    pub smoothing_lag: f64,
}

impl PeriodSnapshot {
    pub fn from_event(event: &TickEvent) -> Self {
        Self {
            day: event.day,
            market_day: event.market_day,
            raw_price: event.raw_price,
            smoothed_price: event.smoothed_price,
            smoothing_lag: event.raw_price - event.smoothed_price,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
#[derive(Default)]
pub struct TimeSeriesRecorder {
    snapshots: Vec<PeriodSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &TickEvent) {
        self.snapshots.push(PeriodSnapshot::from_event(event));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
