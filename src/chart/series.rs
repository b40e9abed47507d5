//! Predictions → labeled chart series.
//!
//! Every series is exactly `HORIZON_MONTHS` points wide and aligned to the
//! `Month 1..Month 6` labels, whatever the filters or overlay.

use serde::{Deserialize, Serialize};

use crate::chart::palette::{SeriesColor, color_for_index};
use crate::domain::{ActualOverlay, ChartOptions, HORIZON_MONTHS, PredictionEntry, SalesRecord};
use crate::features::{MonthlyActuals, parse_month, parse_quantity};

const POINTS: usize = HORIZON_MONTHS as usize;

pub const CHART_TITLE: &str = "Sales Forecast";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Predicted,
    Actual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub product: String,
    pub kind: SeriesKind,
    pub color: SeriesColor,
    pub dashed: bool,
    pub values: [f64; POINTS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesSet {
    pub title: String,
    pub labels: [String; POINTS],
    pub series: Vec<ChartSeries>,
}

impl ChartSeriesSet {
    pub fn empty() -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            labels: month_labels(),
            series: Vec::new(),
        }
    }

    pub fn predicted(&self) -> impl Iterator<Item = &ChartSeries> {
        self.series.iter().filter(|s| s.kind == SeriesKind::Predicted)
    }

    pub fn actual(&self) -> impl Iterator<Item = &ChartSeries> {
        self.series.iter().filter(|s| s.kind == SeriesKind::Actual)
    }

    /// `(min, max)` over all values, `None` when there are no series.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.series.iter().flat_map(|s| s.values.iter()) {
            if v.is_finite() {
                lo = lo.min(*v);
                hi = hi.max(*v);
            }
        }
        if lo.is_finite() && hi.is_finite() { Some((lo, hi)) } else { None }
    }
}

/// `["Month 1", …, "Month 6"]`.
pub fn month_labels() -> [String; POINTS] {
    std::array::from_fn(|i| format!("Month {}", i + 1))
}

/// Where "actual" comparison values come from.
#[derive(Debug, Clone, Copy)]
pub struct ActualSources<'a> {
    pub aggregated: &'a MonthlyActuals,
    pub records: &'a [SalesRecord],
}

/// Per-product view of the prediction list.
struct ProductRow<'a> {
    index: usize,
    name: &'a str,
    values: [f64; POINTS],
    feature_months: [u32; POINTS],
}

/// Build the chart series for the current filters.
pub fn build_series_set(
    predictions: &[PredictionEntry],
    actuals: Option<ActualSources<'_>>,
    options: &ChartOptions,
) -> ChartSeriesSet {
    let search = options.search.trim().to_lowercase();
    let selected = options.selected.as_deref().filter(|s| !s.is_empty());

    let mut set = ChartSeriesSet::empty();

    for row in group_by_product(predictions) {
        if !search.is_empty() && !row.name.to_lowercase().contains(&search) {
            continue;
        }
        if selected.is_some_and(|s| s != row.name) {
            continue;
        }

        let color = color_for_index(row.index);
        set.series.push(ChartSeries {
            label: row.name.to_string(),
            product: row.name.to_string(),
            kind: SeriesKind::Predicted,
            color,
            dashed: false,
            values: row.values,
        });

        let actual_values = match (options.overlay, actuals) {
            (ActualOverlay::Aggregated, Some(src)) if selected.is_some() => Some(std::array::from_fn(|i| {
                src.aggregated.get(row.index, row.feature_months[i])
            })),
            (ActualOverlay::FirstMatch, Some(src)) => {
                Some(first_match_actuals(src.records, row.name, &row.feature_months))
            }
            _ => None,
        };

        if let Some(values) = actual_values {
            set.series.push(ChartSeries {
                label: format!("{} (actual)", row.name),
                product: row.name.to_string(),
                kind: SeriesKind::Actual,
                color: color.dimmed(),
                dashed: true,
                values,
            });
        }
    }

    set
}

/// Distinct products in first-appearance order with their 6 predicted values.
fn group_by_product(predictions: &[PredictionEntry]) -> Vec<ProductRow<'_>> {
    let slots = predictions.iter().map(|p| p.product_index + 1).max().unwrap_or(0);
    // product_index -> position in `rows`
    let mut positions: Vec<Option<usize>> = vec![None; slots];
    let mut rows: Vec<ProductRow<'_>> = Vec::new();
    for p in predictions {
        let slot = (p.month as usize).wrapping_sub(1);
        if slot >= POINTS {
            continue;
        }
        let pos = *positions[p.product_index].get_or_insert_with(|| {
            rows.push(ProductRow {
                index: p.product_index,
                name: &p.product,
                values: [0.0; POINTS],
                feature_months: std::array::from_fn(|i| i as u32 + 1),
            });
            rows.len() - 1
        });
        rows[pos].values[slot] = p.predicted;
        rows[pos].feature_months[slot] = p.feature_month;
    }
    rows
}

/// First record per month for `product` (not a sum); 0 where nothing matches.
fn first_match_actuals(records: &[SalesRecord], product: &str, months: &[u32; POINTS]) -> [f64; POINTS] {
    std::array::from_fn(|i| {
        records
            .iter()
            .find(|r| r.product_description == product && parse_month(&r.sales_date) == Some(months[i]))
            .map(|r| parse_quantity(&r.quantity_sold).unwrap_or(0.0))
            .unwrap_or(0.0)
    })
}
