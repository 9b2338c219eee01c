//! Footer aggregation over the displayed rows.

use funnel_core::types::AttributionItem;

use crate::accessors::ItemAccessors;
use crate::columns::{ColumnDef, Footer};

/// Sums `value` over `items`. Missing and NaN values count as zero.
pub fn sum_by<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    value: impl Fn(&T) -> Option<f64>,
) -> f64 {
    items
        .into_iter()
        .map(|item| match value(item) {
            Some(v) if !v.is_nan() => v,
            _ => 0.0,
        })
        .sum()
}

/// Evaluates every deferred footer against `rows`. Must run on the
/// filtered rows so totals match what is displayed.
pub fn resolve_footers<T, A>(columns: Vec<ColumnDef>, rows: &[&T], accessors: &A) -> Vec<ColumnDef>
where
    T: AttributionItem,
    A: ItemAccessors<T> + ?Sized,
{
    columns
        .into_iter()
        .map(|mut column| {
            if let Footer::Sum { accessor, format } = &column.footer {
                let total = sum_by(rows.iter().copied(), |item| {
                    Some(accessor.number(item, accessors))
                });
                column.footer = Footer::Value(format.number(total));
            }
            column
        })
        .collect()
}
