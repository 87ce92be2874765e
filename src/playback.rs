// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Native Playback Driver

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::analytics::SimulationSummary;
use crate::config::{SimulationConfig, SimulationMode};
use crate::error::SimError;
use crate::historical::HistoricalSource;
use crate::simulation::MarketSimulation;
use crate::types::*;

fn lock(sim: &Mutex<MarketSimulation>) -> MutexGuard<'_, MarketSimulation> {
    sim.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a [`MarketSimulation`] on a tokio interval.
///
/// The simulation sits behind one mutex covering the whole struct, shared by
/// the timer task and the caller's `buy_shares`/`sell_shares`. At most one
/// timer task exists per `Playback`; a task armed for an older run exits
/// without ticking once a newer run has started.
pub struct Playback {
    sim: Arc<Mutex<MarketSimulation>>,
    source: Option<Arc<dyn HistoricalSource>>,
    timer: Option<JoinHandle<()>>,
}

impl Playback {
    pub fn new(sim: MarketSimulation) -> Self {
        Self {
            sim: Arc::new(Mutex::new(sim)),
            source: None,
            timer: None,
        }
    }

    /// Source consulted by historical-mode starts. Wrap it in a
    /// `CachedHistoricalSource` to load it once per process.
    pub fn with_historical_source(mut self, source: Arc<dyn HistoricalSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Shared handle to the simulation, e.g. for registering observers.
    pub fn simulation(&self) -> Arc<Mutex<MarketSimulation>> {
        Arc::clone(&self.sim)
    }

    pub fn lock(&self) -> MutexGuard<'_, MarketSimulation> {
        lock(&self.sim)
    }

    /// Load historical data if needed, start the run and arm its timer.
    ///
    /// Fails before touching the current run when the config is invalid or
    /// the historical data cannot be loaded or is too short.
    pub async fn start(&mut self, config: SimulationConfig) -> Result<TickEvent, SimError> {
        if config.mode == SimulationMode::Historical {
            if let Some(source) = &self.source {
                let source = Arc::clone(source);
                let series = tokio::task::spawn_blocking(move || source.load())
                    .await
                    .map_err(|e| SimError::LoadTask(e.to_string()))??;
                self.lock().set_historical_series(series);
            }
        }

        let (first, run_id, period) = {
            let mut sim = self.lock();
            let first = sim.start(config).map_err(|e| {
                tracing::warn!(error = %e, "simulation start rejected");
                e
            })?;
            (first, sim.run_id(), sim.interval())
        };

        self.cancel_timer();
        let sim = Arc::clone(&self.sim);
        self.timer = Some(tokio::spawn(drive(sim, run_id, period)));
        Ok(first)
    }

    /// Cancel the timer and halt the run. Idempotent.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.lock().stop();
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    pub fn buy_shares(&self) -> Option<TradeAction> {
        self.lock().buy_shares()
    }

    pub fn sell_shares(&self) -> Option<TradeAction> {
        self.lock().sell_shares()
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.lock().snapshot()
    }

    pub fn summary(&self) -> SimulationSummary {
        self.lock().summary()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().status()
    }

    /// Whether a timer task is still alive.
    pub fn is_timer_active(&self) -> bool {
        self.timer.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

async fn drive(sim: Arc<Mutex<MarketSimulation>>, run_id: u64, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let mut guard = lock(&sim);
        if guard.run_id() != run_id {
            tracing::debug!(run_id, "stale playback timer exiting");
            break;
        }
        match guard.tick() {
            TickOutcome::Advanced(_) => {}
            TickOutcome::Completed | TickOutcome::Idle => break,
        }
    }
}
