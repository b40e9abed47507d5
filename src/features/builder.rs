//! Records → training features.
//!
//! Inputs and outputs are produced by a single pass over the records: a row either
//! contributes one `(FeaturePair, quantity)` pair or nothing, so the two arrays can
//! never drift out of alignment.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, error, info};

use crate::domain::{FeaturePair, InvalidValuePolicy, SalesRecord};
use crate::features::dates::parse_sales_date;
use crate::features::products::ProductIndex;

/// Summed actual quantity per product per calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyActuals {
    totals: Vec<[f64; 12]>,
}

impl MonthlyActuals {
    fn add(&mut self, product: usize, month: u32, quantity: f64) {
        if self.totals.len() <= product {
            self.totals.resize(product + 1, [0.0; 12]);
        }
        self.totals[product][(month - 1) as usize] += quantity;
    }

    /// Total for `product` in calendar `month` (1–12); 0 when nothing was observed.
    pub fn get(&self, product: usize, month: u32) -> f64 {
        if !(1..=12).contains(&month) {
            return 0.0;
        }
        self.totals
            .get(product)
            .map(|m| m[(month - 1) as usize])
            .unwrap_or(0.0)
    }

    pub fn product_totals(&self, product: usize) -> Option<&[f64; 12]> {
        self.totals.get(product)
    }
}

/// Training-ready features for one run.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub inputs: Vec<FeaturePair>,
    pub outputs: Vec<f64>,
    pub products: ProductIndex,
    pub actuals: MonthlyActuals,
    /// Latest date among rows that produced a feature.
    pub last_observed: Option<NaiveDate>,
    pub dropped_invalid_date: usize,
    pub dropped_invalid_quantity: usize,
    pub zero_filled: usize,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() || self.outputs.is_empty()
    }

    pub fn last_observed_month(&self) -> Option<u32> {
        self.last_observed.map(|d| d.month())
    }
}

/// Build features from uploaded records.
///
/// Empty input is not an error: it logs and returns an empty set.
pub fn build_features(records: &[SalesRecord], policy: InvalidValuePolicy) -> FeatureSet {
    if records.is_empty() {
        error!("no sales records to build features from");
        return FeatureSet::default();
    }

    // The mapping covers every product in the upload, including ones whose rows
    // are all dropped below; those products are still forecast.
    let products = ProductIndex::from_names(records.iter().map(|r| r.product_description.as_str()));

    let mut set = FeatureSet {
        products,
        ..FeatureSet::default()
    };

    for record in records {
        let Some(date) = parse_sales_date(&record.sales_date) else {
            debug!(sales_date = %record.sales_date, "dropping row with unparsable date");
            set.dropped_invalid_date += 1;
            continue;
        };
        let Some(product) = set.products.get(&record.product_description) else {
            continue;
        };

        let quantity = match (parse_quantity(&record.quantity_sold), policy) {
            (Some(q), _) => q,
            (None, InvalidValuePolicy::ZeroFillInvalidNumeric) => {
                set.zero_filled += 1;
                0.0
            }
            (None, InvalidValuePolicy::DropInvalidRows) => {
                debug!(quantity_sold = %record.quantity_sold, "dropping row with unparsable quantity");
                set.dropped_invalid_quantity += 1;
                continue;
            }
        };

        let month = date.month();
        set.inputs.push(FeaturePair { month, product });
        set.outputs.push(quantity);
        set.actuals.add(product, month, quantity);
        set.last_observed = Some(set.last_observed.map_or(date, |d| d.max(date)));
    }

    info!(
        records = records.len(),
        features = set.len(),
        products = set.products.len(),
        dropped_invalid_date = set.dropped_invalid_date,
        dropped_invalid_quantity = set.dropped_invalid_quantity,
        zero_filled = set.zero_filled,
        policy = policy.label(),
        "built training features"
    );

    set
}

/// Parse a quantity cell; `None` when it is not a finite number.
pub fn parse_quantity(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
