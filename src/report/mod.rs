//! Reporting utilities: product rankings and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::PredictionEntry;

/// A product's predicted quantity summed over the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTotal {
    pub product: String,
    pub product_index: usize,
    pub total: f64,
}

/// Products ordered by forecast total, largest first; ties keep mapping order.
pub fn rank_by_forecast_total(predictions: &[PredictionEntry]) -> Vec<ProductTotal> {
    let slots = predictions.iter().map(|p| p.product_index + 1).max().unwrap_or(0);
    let mut by_index: Vec<Option<ProductTotal>> = vec![None; slots];
    for p in predictions {
        match &mut by_index[p.product_index] {
            Some(t) => t.total += p.predicted,
            empty => {
                *empty = Some(ProductTotal {
                    product: p.product.clone(),
                    product_index: p.product_index,
                    total: p.predicted,
                })
            }
        }
    }
    let mut totals: Vec<ProductTotal> = by_index.into_iter().flatten().collect();
    totals.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.product_index.cmp(&b.product_index))
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn ranks_by_horizon_total() {
        let preds = vec![
            entry("A", 0, 1, 1.0),
            entry("B", 1, 1, 5.0),
            entry("C", 2, 1, 1.0),
            entry("A", 0, 2, 1.0),
            entry("B", 1, 2, -1.0),
            entry("C", 2, 2, 1.0),
        ];
        let ranked = rank_by_forecast_total(&preds);
        let names: Vec<&str> = ranked.iter().map(|t| t.product.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert_eq!(ranked[0].total, 4.0);
    }

    #[test]
    fn sparse_and_unordered_indices_are_grouped() {
        let preds = vec![
            entry("D", 3, 1, 2.0),
            entry("A", 0, 1, 2.0),
            entry("D", 3, 2, 2.0),
            entry("A", 0, 2, 3.0),
        ];
        let ranked = rank_by_forecast_total(&preds);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].product.as_str(), ranked[0].total), ("A", 5.0));
        assert_eq!((ranked[1].product_index, ranked[1].total), (3, 4.0));
        assert!(rank_by_forecast_total(&[]).is_empty());
    }
}
