//! Per-session state: the current upload, chart filters, and the last run.
//!
//! Training requests are serialized: while one request is in flight, further
//! requests are ignored. Uploading a new file bumps the session generation so a
//! run that finishes for an older upload is discarded instead of displayed.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::pipeline::{ForecastRun, run_forecast};
use crate::chart::ChartSeriesSet;
use crate::domain::{ChartOptions, ForecastConfig, SalesRecord};
use crate::error::AppError;
use crate::io::ingest::IngestedData;

/// Work item handed to whoever executes training (inline or on a worker).
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    pub generation: u64,
    pub records: Vec<SalesRecord>,
    pub config: ForecastConfig,
}

impl TrainingRequest {
    pub fn execute(self) -> TrainingOutcome {
        TrainingOutcome {
            generation: self.generation,
            result: run_forecast(&self.records, &self.config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub generation: u64,
    pub result: Result<Option<ForecastRun>, AppError>,
}

/// How a finished training request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishStatus {
    /// A new run replaced the previous one.
    Applied,
    /// Nothing usable to train on; the chart is unchanged.
    NoData,
    /// The upload changed while training; result dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    config: ForecastConfig,
    pub chart: ChartOptions,
    records: Vec<SalesRecord>,
    source: Option<PathBuf>,
    generation: u64,
    in_flight: Option<u64>,
    run: Option<ForecastRun>,
}

impl Session {
    pub fn new(config: ForecastConfig, chart: ChartOptions) -> Self {
        Self {
            config,
            chart,
            ..Self::default()
        }
    }

    /// Replace the uploaded records, discarding any previous run.
    pub fn upload(&mut self, data: IngestedData, source: Option<&Path>) {
        info!(
            rows_used = data.rows_used(),
            rows_dropped = data.rows_dropped(),
            "upload received"
        );
        self.records = data.records;
        self.source = source.map(Path::to_path_buf);
        self.generation += 1;
        self.run = None;
        self.chart.selected = None;
    }

    /// Start a training request if none is active and there is data.
    pub fn begin_training(&mut self) -> Option<TrainingRequest> {
        if self.in_flight.is_some() {
            warn!("training already in progress; ignoring request");
            return None;
        }
        if self.records.is_empty() {
            warn!("no uploaded records; nothing to train");
            return None;
        }
        self.in_flight = Some(self.generation);
        Some(TrainingRequest {
            generation: self.generation,
            records: self.records.clone(),
            config: self.config.clone(),
        })
    }

    /// Apply a finished request. Errors from the pipeline are returned as-is.
    pub fn finish_training(&mut self, outcome: TrainingOutcome) -> Result<FinishStatus, AppError> {
        self.in_flight = None;
        if outcome.generation != self.generation {
            info!(
                finished = outcome.generation,
                current = self.generation,
                "discarding result for a previous upload"
            );
            return Ok(FinishStatus::Stale);
        }
        match outcome.result? {
            Some(run) => {
                self.run = Some(run);
                Ok(FinishStatus::Applied)
            }
            None => Ok(FinishStatus::NoData),
        }
    }

    /// Train on the current thread. Returns `None` when the request was refused.
    pub fn train_blocking(&mut self) -> Result<Option<FinishStatus>, AppError> {
        let Some(request) = self.begin_training() else {
            return Ok(None);
        };
        self.finish_training(request.execute()).map(Some)
    }

    pub fn is_training(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn run(&self) -> Option<&ForecastRun> {
        self.run.as_ref()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Settings changes apply to the next training request.
    pub fn config_mut(&mut self) -> &mut ForecastConfig {
        &mut self.config
    }

    /// Chart for the current filters; `None` until a run has completed.
    pub fn series(&self) -> Option<ChartSeriesSet> {
        self.run.as_ref().map(|run| run.series(&self.chart))
    }

    /// Cycle the single-product selection: all → first → … → last → all.
    pub fn cycle_selection(&mut self, forward: bool) {
        let Some(run) = &self.run else {
            return;
        };
        let names = run.features.products.names();
        if names.is_empty() {
            self.chart.selected = None;
            return;
        }
        let current = self
            .chart
            .selected
            .as_deref()
            .and_then(|s| names.iter().position(|n| n == s));

        // Position 0 is "all products"; product i lives at i + 1.
        let slots = names.len() + 1;
        let pos = current.map_or(0, |i| i + 1);
        let next = if forward { (pos + 1) % slots } else { (pos + slots - 1) % slots };
        self.chart.selected = if next == 0 { None } else { Some(names[next - 1].clone()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_data() -> IngestedData {
        IngestedData {
            records: vec![
                SalesRecord::new("2024-01-01", "Widget A", "10"),
                SalesRecord::new("2024-02-01", "Gadget B", "20"),
            ],
            rows_read: 2,
            ..IngestedData::default()
        }
    }

    fn session() -> Session {
        let config = ForecastConfig {
            seed: Some(1),
            ..ForecastConfig::default()
        };
        let mut s = Session::new(config, ChartOptions::default());
        s.upload(upload_data(), None);
        s
    }

    #[test]
    fn second_request_is_ignored_while_training() {
        let mut s = session();
        let first = s.begin_training().expect("first request starts");
        assert!(s.is_training());
        assert!(s.begin_training().is_none());

        assert_eq!(s.finish_training(first.execute()).unwrap(), FinishStatus::Applied);
        assert!(!s.is_training());
        assert!(s.begin_training().is_some());
    }

    #[test]
    fn upload_during_training_discards_result() {
        let mut s = session();
        let request = s.begin_training().unwrap();
        s.upload(upload_data(), None);
        assert_eq!(s.finish_training(request.execute()).unwrap(), FinishStatus::Stale);
        assert!(s.run().is_none());
    }

    #[test]
    fn nothing_to_train_without_upload() {
        let mut s = Session::default();
        assert_eq!(s.train_blocking().unwrap(), None);
        assert!(s.series().is_none());
    }

    #[test]
    fn blocking_training_produces_a_chart() {
        let mut s = session();
        assert_eq!(s.train_blocking().unwrap(), Some(FinishStatus::Applied));
        let set = s.series().unwrap();
        assert_eq!(set.series.len(), 2);
        assert!(set.series.iter().all(|x| x.values.iter().all(|v| v.is_finite())));
    }

    #[test]
    fn selection_cycles_through_all_products() {
        let mut s = session();
        s.train_blocking().unwrap();

        s.cycle_selection(true);
        assert_eq!(s.chart.selected.as_deref(), Some("Widget A"));
        s.cycle_selection(true);
        assert_eq!(s.chart.selected.as_deref(), Some("Gadget B"));
        s.cycle_selection(true);
        assert_eq!(s.chart.selected, None);
        s.cycle_selection(false);
        assert_eq!(s.chart.selected.as_deref(), Some("Gadget B"));

        assert_eq!(s.series().unwrap().series.len(), 1);
    }
}
