//! Formatted terminal output for `forecast run`.
//!
//! Formatting lives here so the pipeline stays free of presentation code and
//! output changes stay localized.

use crate::app::pipeline::ForecastRun;
use crate::domain::PredictionEntry;
use crate::io::ingest::IngestedData;
use crate::report::ProductTotal;

/// Dataset stats, preprocessing counts, and training diagnostics.
pub fn format_run_summary(ingest: &IngestedData, run: &ForecastRun) -> String {
    let mut out = String::new();
    let features = &run.features;
    let config = &run.config;

    out.push_str("=== forecast - Sales Forecast (MLP) ===\n");
    out.push_str(&format!(
        "Rows: read={} | used={} | dropped={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.rows_dropped()
    ));
    out.push_str(&format!(
        "Features: samples={} | products={} | invalid dates dropped={} | quantities zero-filled={} | quantities dropped={}\n",
        features.len(),
        features.products.len(),
        features.dropped_invalid_date,
        features.zero_filled,
        features.dropped_invalid_quantity
    ));
    out.push_str(&format!(
        "Last observed: {}\n",
        features
            .last_observed
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    ));
    out.push_str(&format!(
        "Policy: {} | Horizon: {}\n",
        config.policy.label(),
        config.horizon.label()
    ));

    out.push_str("\nTraining:\n");
    out.push_str(&format!(
        "- network: 2 -> {} (relu) -> 1 | params={}\n",
        run.model.hidden_units(),
        run.model.param_count()
    ));
    out.push_str(&format!(
        "- epochs={} | batch={} | steps={} | lr={}\n",
        run.training.epochs,
        config
            .batch_size
            .map(|b| b.to_string())
            .unwrap_or_else(|| "full".to_string()),
        run.training.optimizer_steps,
        config.learning_rate
    ));
    out.push_str(&format!(
        "- final loss (mse): {}\n",
        run.training
            .final_loss()
            .map(|l| format!("{l:.4}"))
            .unwrap_or_else(|| "n/a".to_string())
    ));
    out.push_str(&format!(
        "- seed: {}\n",
        config
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "entropy".to_string())
    ));
    out.push('\n');

    out
}

/// Up to `max` row diagnostics from ingest.
pub fn format_row_errors(ingest: &IngestedData, max: usize) -> String {
    let mut out = String::new();
    if !ingest.missing_columns.is_empty() {
        out.push_str(&format!("Missing columns: {}\n", ingest.missing_columns.join(", ")));
    }
    if ingest.row_errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Dropped rows ({}):\n", ingest.row_errors.len()));
    for e in ingest.row_errors.iter().take(max) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > max {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - max));
    }
    out
}

/// Predictions table, one row per (month, product) in forecast order.
pub fn format_prediction_table(predictions: &[PredictionEntry]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<8} {:>6} {:<28} {:>12}\n", "month", "feat", "product", "predicted").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<6} {:-<28} {:-<12}\n", "", "", "", "").trim_end());
    out.push('\n');

    let mut last_month = None;
    for p in predictions {
        let month = if last_month == Some(p.month) {
            String::new()
        } else {
            format!("Month {}", p.month)
        };
        last_month = Some(p.month);
        out.push_str(
            format!(
                "{:<8} {:>6} {:<28} {:>12.2}\n",
                month,
                p.feature_month,
                truncate(&p.product, 28),
                p.predicted
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Top-N products by horizon total.
pub fn format_rankings(totals: &[ProductTotal], top_n: usize) -> String {
    let mut out = String::from("Top products by forecast total:\n");
    for (rank, t) in totals.iter().take(top_n).enumerate() {
        out.push_str(&format!("{:>3}. {:<28} {:>12.2}\n", rank + 1, truncate(&t.product, 28), t.total));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::RowError;

    fn entry(product: &str, idx: usize, month: u32, predicted: f64) -> PredictionEntry {
        PredictionEntry {
            product: product.to_string(),
            product_index: idx,
            month,
            feature_month: month,
            predicted,
        }
    }

    #[test]
    fn prediction_table_groups_by_month() {
        let preds = vec![
            entry("Widget A", 0, 1, 1.5),
            entry("Gadget B", 1, 1, -0.25),
            entry("Widget A", 0, 2, 2.0),
        ];
        let txt = format_prediction_table(&preds);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("Month 1"));
        assert!(lines[3].starts_with("         "));
        assert!(lines[3].ends_with("-0.25"));
        assert!(lines[4].starts_with("Month 2"));
    }

    #[test]
    fn row_errors_are_capped() {
        let ingest = IngestedData {
            row_errors: (0..5)
                .map(|i| RowError {
                    line: i + 2,
                    message: "missing quantity_sold".to_string(),
                })
                .collect(),
            rows_read: 5,
            ..IngestedData::default()
        };
        let txt = format_row_errors(&ingest, 2);
        assert!(txt.contains("Dropped rows (5):"));
        assert!(txt.contains("line 3:"));
        assert!(!txt.contains("line 4:"));
        assert!(txt.contains("... 3 more"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd.");
    }
}
