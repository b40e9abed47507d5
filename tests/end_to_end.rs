//! Upload → features → training → predictions → chart, through the public API.

use std::fs;
use std::path::Path;

use sales_forecast::app::pipeline::run_forecast;
use sales_forecast::app::session::{FinishStatus, Session};
use sales_forecast::chart::SeriesKind;
use sales_forecast::domain::{ActualOverlay, ChartOptions, ForecastConfig, HorizonMode, InvalidValuePolicy};
use sales_forecast::io::export::{SeriesFile, read_series_json, write_predictions_csv, write_series_json};
use sales_forecast::io::ingest::{load_sales_csv, process_file};

fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn seeded(seed: u64) -> ForecastConfig {
    ForecastConfig {
        seed: Some(seed),
        ..ForecastConfig::default()
    }
}

#[test]
fn two_products_give_two_six_point_series() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "sales_date,product_description,quantity_sold\n2024-01-15,Product A,10\n2024-02-15,Product B,20\n",
    );

    let ingest = load_sales_csv(&path).unwrap();
    assert_eq!(ingest.rows_used(), 2);

    let run = run_forecast(&ingest.records, &seeded(5)).unwrap().unwrap();
    assert_eq!(run.predictions.len(), 12);
    assert_eq!(run.training.loss_history.len(), 50);

    let set = run.series(&ChartOptions::default());
    assert_eq!(set.title, "Sales Forecast");
    assert_eq!(set.labels[0], "Month 1");
    assert_eq!(set.labels[5], "Month 6");
    assert_eq!(set.series.len(), 2);
    assert_eq!(set.series[0].label, "Product A");
    assert_eq!(set.series[1].label, "Product B");
    assert!(set.series.iter().all(|s| s.values.iter().all(|v| v.is_finite())));
    assert_ne!(set.series[0].color, set.series[1].color);
}

#[test]
fn seeded_runs_repeat_and_unseeded_runs_still_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "Sales_Date,Product_Description,Quantity_Sold\n\
         2024-01-01,Widget,5\n2024-02-01,Widget,7\n2024-03-01,Widget,9\n2024-03-09,Gizmo,2\n",
    );
    let records = load_sales_csv(&path).unwrap().records;

    let a = run_forecast(&records, &seeded(9)).unwrap().unwrap();
    let b = run_forecast(&records, &seeded(9)).unwrap().unwrap();
    assert_eq!(a.predictions, b.predictions);

    let c = run_forecast(&records, &ForecastConfig::default()).unwrap().unwrap();
    assert_eq!(c.predictions.len(), a.predictions.len());
}

#[test]
fn falsy_and_invalid_rows_follow_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "sales_date,product_description,quantity_sold\n\
         2024-01-01,Widget,5\n\
         2024-02-01,Widget,\n\
         not-a-date,Widget,3\n\
         2024-03-01,Widget,lots\n",
    );
    let ingest = load_sales_csv(&path).unwrap();
    // Empty quantity is dropped at ingest; the others reach the feature builder.
    assert_eq!(ingest.rows_read, 4);
    assert_eq!(ingest.rows_used(), 3);

    let zero_fill = run_forecast(&ingest.records, &seeded(1)).unwrap().unwrap();
    assert_eq!(zero_fill.features.len(), 2);
    assert_eq!(zero_fill.features.zero_filled, 1);
    assert_eq!(zero_fill.features.dropped_invalid_date, 1);

    let config = ForecastConfig {
        policy: InvalidValuePolicy::DropInvalidRows,
        ..seeded(1)
    };
    let dropped = run_forecast(&ingest.records, &config).unwrap().unwrap();
    assert_eq!(dropped.features.len(), 1);
    assert_eq!(dropped.features.dropped_invalid_quantity, 1);
}

#[test]
fn rolling_horizon_starts_after_last_observed_month() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "sales_date,product_description,quantity_sold\n2024-10-01,Widget,5\n2024-11-01,Widget,6\n",
    );
    let records = load_sales_csv(&path).unwrap().records;
    let config = ForecastConfig {
        horizon: HorizonMode::RollingHorizon,
        ..seeded(2)
    };
    let run = run_forecast(&records, &config).unwrap().unwrap();
    let months: Vec<u32> = run.predictions.iter().map(|p| p.feature_month).collect();
    assert_eq!(months, [12, 1, 2, 3, 4, 5]);
}

#[test]
fn session_upload_train_and_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "sales_date,product_description,quantity_sold\n\
         2024-01-01,Widget,5\n2024-01-20,Widget,4\n2024-02-01,Gizmo,8\n",
    );

    let mut session = Session::new(seeded(4), ChartOptions::default());
    // Nothing selected: no upload happens.
    process_file(None, |data| session.upload(data, None)).unwrap();
    assert!(session.records().is_empty());

    process_file(Some(path.as_path()), |data| session.upload(data, Some(path.as_path()))).unwrap();
    assert_eq!(session.records().len(), 3);
    assert_eq!(session.train_blocking().unwrap(), Some(FinishStatus::Applied));

    session.chart.selected = Some("Widget".to_string());
    session.chart.overlay = ActualOverlay::Aggregated;
    let set = session.series().unwrap();
    assert_eq!(set.series.len(), 2);
    let actual = set.series.iter().find(|s| s.kind == SeriesKind::Actual).unwrap();
    assert_eq!(actual.values, [9.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

    session.chart.selected = None;
    session.chart.overlay = ActualOverlay::FirstMatch;
    let set = session.series().unwrap();
    assert_eq!(set.series.len(), 4);
    let widget_actual = set.series.iter().find(|s| s.label == "Widget (actual)").unwrap();
    assert_eq!(widget_actual.values[0], 5.0);
}

#[test]
fn exports_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sales.csv",
        "sales_date,product_description,quantity_sold\n2024-01-01,Widget,5\n",
    );
    let records = load_sales_csv(&path).unwrap().records;
    let run = run_forecast(&records, &seeded(8)).unwrap().unwrap();

    let csv_path = dir.path().join("predictions.csv");
    write_predictions_csv(&csv_path, &run.predictions).unwrap();
    assert_eq!(fs::read_to_string(&csv_path).unwrap().lines().count(), 7);

    let json_path = dir.path().join("series.json");
    let chart = run.series(&ChartOptions::default());
    write_series_json(&json_path, &SeriesFile::new(&run.config, chart.clone())).unwrap();
    let back = read_series_json(&json_path).unwrap().chart;
    assert_eq!(back.labels, chart.labels);
    assert_eq!(back.series.len(), chart.series.len());
    for (a, b) in back.series.iter().zip(&chart.series) {
        assert_eq!(a.label, b.label);
        assert!(a.values.iter().zip(&b.values).all(|(x, y)| (x - y).abs() < 1e-9));
    }
}

#[test]
fn header_only_upload_produces_no_chart() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "empty.csv", "sales_date,product_description,quantity_sold\n");
    let records = load_sales_csv(&path).unwrap().records;
    assert!(records.is_empty());
    assert!(run_forecast(&records, &seeded(1)).unwrap().is_none());
}
