//! Row filter. Drops rows that carry nothing for the selected stage.

use funnel_core::types::AttributionItem;
use funnel_core::AttributionResult;

use crate::columns::{ColumnDef, ColumnId, ColumnRegistry};

/// Columns whose values make a row worth showing.
pub const NON_EMPTY_ROW_COLUMNS: [ColumnId; 5] = [
    ColumnId::StageIndicator,
    ColumnId::InfluencedStageIndicator,
    ColumnId::Pipeline,
    ColumnId::Revenue,
    ColumnId::InfluencedRevenue,
];

/// Item fields that decide whether a row is shown: the content-bearing
/// registry columns plus `extra_columns`, restricted to accessors the
/// stage actually displays.
pub fn content_keys(
    registry: &ColumnRegistry,
    extra_columns: &[ColumnDef],
    stage_columns: &[ColumnDef],
) -> AttributionResult<Vec<String>> {
    let mut keys = Vec::new();
    for column in registry
        .pick(NON_EMPTY_ROW_COLUMNS.iter().cloned())?
        .iter()
        .chain(extra_columns)
    {
        let shown = stage_columns
            .iter()
            .any(|stage_column| stage_column.accessor == column.accessor);
        if let Some(key) = column.accessor.field_key().filter(|_| shown) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    Ok(keys)
}

/// Indices of the items where at least one key holds a non-zero number.
pub fn retained_rows<T: AttributionItem>(data: &[T], keys: &[String]) -> Vec<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, item)| {
            keys.iter()
                .any(|key| item.metric(key).is_some_and(|v| v != 0.0 && !v.is_nan()))
        })
        .map(|(index, _)| index)
        .collect()
}
