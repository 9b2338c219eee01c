//! Table export to CSV, JSON and aligned plain text.

use chrono::{DateTime, Utc};
use funnel_core::config::ExportFormat;
use funnel_core::types::StageKey;
use funnel_core::AttributionResult;
use serde::Serialize;

use crate::columns::ColumnId;
use crate::table::{RenderedColumn, TableView};

#[derive(Debug, Serialize)]
struct TableExport<'a> {
    title: Option<&'a str>,
    stage: StageKey,
    stage_name: &'a str,
    generated_at: DateTime<Utc>,
    columns: Vec<&'a str>,
    records: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<serde_json::Map<String, serde_json::Value>>,
}

pub fn export(view: &TableView, format: ExportFormat, include_footer: bool) -> AttributionResult<String> {
    match format {
        ExportFormat::Text => Ok(to_text(view, include_footer)),
        ExportFormat::Csv => Ok(to_csv(view, include_footer)),
        ExportFormat::Json => to_json(view, include_footer),
    }
}

pub fn to_csv(view: &TableView, include_footer: bool) -> String {
    let exported = exported_columns(view);
    let mut csv = exported
        .iter()
        .map(|(_, column)| quote(&header_text(column)))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');

    for row in &view.rows {
        let cells: Vec<String> = exported
            .iter()
            .map(|(index, _)| quote(row.cells.get(*index).map_or("", String::as_str)))
            .collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }

    if include_footer && has_footer(view) {
        let cells: Vec<String> = exported
            .iter()
            .map(|(_, column)| quote(&column.footer))
            .collect();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

pub fn to_json(view: &TableView, include_footer: bool) -> AttributionResult<String> {
    let exported = exported_columns(view);
    let record = |values: Vec<&str>| {
        exported
            .iter()
            .zip(values)
            .map(|((_, column), value)| {
                (
                    column.id.to_string(),
                    serde_json::Value::String(value.to_string()),
                )
            })
            .collect::<serde_json::Map<_, _>>()
    };

    let records = view
        .rows
        .iter()
        .map(|row| {
            record(
                exported
                    .iter()
                    .map(|(index, _)| row.cells.get(*index).map_or("", String::as_str))
                    .collect(),
            )
        })
        .collect();
    let footer = (include_footer && has_footer(view)).then(|| {
        record(
            exported
                .iter()
                .map(|(_, column)| column.footer.as_str())
                .collect(),
        )
    });

    let document = TableExport {
        title: view.title.as_deref(),
        stage: view.selected_stage,
        stage_name: view.stage_name(),
        generated_at: Utc::now(),
        columns: exported.iter().map(|(_, column)| column.id.as_str()).collect(),
        records,
        footer,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Column-aligned text for terminals.
pub fn to_text(view: &TableView, include_footer: bool) -> String {
    let exported = exported_columns(view);
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(view.rows.len() + 2);
    lines.push(exported.iter().map(|(_, column)| header_text(column)).collect());
    for row in &view.rows {
        lines.push(
            exported
                .iter()
                .map(|(index, _)| row.cells.get(*index).cloned().unwrap_or_default())
                .collect(),
        );
    }
    let footer_line = (include_footer && has_footer(view))
        .then(|| exported.iter().map(|(_, column)| column.footer.clone()).collect::<Vec<_>>());

    let widths: Vec<usize> = (0..exported.len())
        .map(|i| {
            lines
                .iter()
                .chain(footer_line.iter())
                .map(|line| line[i].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |line: &[String]| {
        line.iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &width))| {
                // title column left-aligned, figures right-aligned
                if i == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = String::new();
    if let Some(title) = &view.title {
        out.push_str(title);
        out.push('\n');
    }
    out.push_str(&format!("Stage: {}\n", view.stage_name()));
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format_line(line.as_slice()));
        out.push('\n');
        if i == 0 {
            out.push_str(&rule);
            out.push('\n');
        }
    }
    if let Some(line) = footer_line {
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format_line(line.as_slice()));
        out.push('\n');
    }
    out
}

/// Columns worth exporting with their index in the view; the row action
/// icon is dropped.
fn exported_columns(view: &TableView) -> Vec<(usize, &RenderedColumn)> {
    view.columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.id != ColumnId::OnClick)
        .collect()
}

fn header_text(column: &RenderedColumn) -> String {
    if column.header.label.is_empty() {
        column.id.to_string()
    } else {
        column.header.label.clone()
    }
}

fn has_footer(view: &TableView) -> bool {
    view.columns.iter().any(|column| !column.footer.is_empty())
}

fn quote(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::RowAccessors;
    use crate::table::{AttributionTable, TableProps};
    use funnel_core::types::AttributionRow;

    fn view(show_total_row: bool) -> TableView {
        let data = vec![
            AttributionRow::new("Email, newsletter")
                .with_cost(1500.0)
                .with_metric("MCL", 5.0)
                .with_metric("influencedMCL", 9.0),
            AttributionRow::new("Webinar")
                .with_cost(300.0)
                .with_metric("MCL", 3.0),
        ];
        let props = TableProps::new("Channel", RowAccessors)
            .title("Channel impact")
            .show_total_row(show_total_row);
        AttributionTable::new(&data, props).render().unwrap()
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&view(true), true);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4); // header + 2 rows + footer
        assert_eq!(
            lines[0],
            "Channel,Cost,Touched MCLs,Attributed MCLs,Efficiency"
        );
        assert_eq!(lines[1], "\"Email, newsletter\",\"$1,500\",9,5,$300 per MCL");
        assert!(lines[3].starts_with("Total,\"$1,800\""));
    }

    #[test]
    fn test_quote_line_breaks() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("two\nlines"), "\"two\nlines\"");
        assert_eq!(quote("carriage\rreturn"), "\"carriage\rreturn\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_without_total_row() {
        let csv = to_csv(&view(false), true);
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_json_export() {
        let json = to_json(&view(true), true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["stage"], "MCL");
        assert_eq!(parsed["stage_name"], "MCLs");
        assert_eq!(parsed["title"], "Channel impact");
        assert_eq!(parsed["records"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["records"][1]["row-title"], "Webinar");
        assert_eq!(parsed["footer"]["cost"], "$1,800");
        assert!(parsed["columns"]
            .as_array()
            .unwrap()
            .iter()
            .all(|id| id != "on-click"));
    }

    #[test]
    fn test_text_export_aligns_columns() {
        let text = export(&view(true), ExportFormat::Text, true).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Channel impact");
        assert_eq!(lines[1], "Stage: MCLs");
        assert!(lines[2].starts_with("Channel"));
        assert!(lines[3].starts_with("-----"));
        assert!(lines.last().unwrap().starts_with("Total"));
    }
}
