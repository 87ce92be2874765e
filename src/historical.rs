// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Market Playback Simulation Suite - Historical Close Series

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ─── Records ─────────────────────────────────────────────────────────────────

/// One row of the static close-price dataset, `{"Date": ..., "Close": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Close")]
    pub close: f64,
}

fn parse_date(index: usize, raw: &str) -> Result<NaiveDate, SimError> {
    // Accept both plain dates and ISO timestamps.
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| SimError::InvalidDate {
        index,
        value: raw.to_string(),
    })
}

// ─── HistoricalSeries ────────────────────────────────────────────────────────

/// Ordered, read-only close series. Shared across runs behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalSeries {
    closes: Vec<f64>,
    dates: Vec<NaiveDate>,
}

/// A contiguous slice of the series, values and dates unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSlice {
    pub start_offset: usize,
    pub closes: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl HistoricalSeries {
    pub fn from_records(records: &[HistoricalRecord]) -> Result<Self, SimError> {
        let mut closes = Vec::with_capacity(records.len());
        let mut dates = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            dates.push(parse_date(i, &record.date)?);
            closes.push(record.close);
        }
        Ok(Self { closes, dates })
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let records: Vec<HistoricalRecord> = serde_json::from_str(json)?;
        Self::from_records(&records)
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Draw `num_periods` consecutive points starting at a uniformly chosen
    /// offset in `0..=len - num_periods`.
    pub fn draw_slice<R: Rng + ?Sized>(
        &self,
        num_periods: usize,
        rng: &mut R,
    ) -> Result<HistoricalSlice, SimError> {
        if num_periods > self.len() {
            return Err(SimError::InsufficientData {
                requested: num_periods,
                available: self.len(),
            });
        }
        let max_start = self.len() - num_periods;
        let start = rng.gen_range(0..=max_start);
        let end = start + num_periods;
        Ok(HistoricalSlice {
            start_offset: start,
            closes: self.closes[start..end].to_vec(),
            dates: self.dates[start..end].to_vec(),
        })
    }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Somewhere a historical series can be loaded from. Loading may block.
pub trait HistoricalSource: Send + Sync {
    fn load(&self) -> Result<Arc<HistoricalSeries>, SimError>;
}

/// Reads a JSON array of [`HistoricalRecord`]s from disk on every load.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoricalSource for JsonFileSource {
    fn load(&self) -> Result<Arc<HistoricalSeries>, SimError> {
        let json = std::fs::read_to_string(&self.path)?;
        let series = HistoricalSeries::from_json(&json)?;
        tracing::info!(path = %self.path.display(), points = series.len(), "historical series loaded");
        Ok(Arc::new(series))
    }
}

/// An already-loaded series.
impl HistoricalSource for Arc<HistoricalSeries> {
    fn load(&self) -> Result<Arc<HistoricalSeries>, SimError> {
        Ok(Arc::clone(self))
    }
}

/// Loads from the inner source once and serves the same series afterwards.
/// A failed load is not cached, so the next `start()` retries it.
pub struct CachedHistoricalSource<S> {
    inner: S,
    cache: OnceLock<Arc<HistoricalSeries>>,
}

impl<S: HistoricalSource> CachedHistoricalSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, cache: OnceLock::new() }
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<S: HistoricalSource> HistoricalSource for CachedHistoricalSource<S> {
    fn load(&self) -> Result<Arc<HistoricalSeries>, SimError> {
        if let Some(series) = self.cache.get() {
            tracing::debug!("using cached historical series");
            return Ok(Arc::clone(series));
        }
        let series = self.inner.load()?;
        Ok(Arc::clone(self.cache.get_or_init(|| series)))
    }
}
