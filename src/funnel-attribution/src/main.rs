//! Funnel Attribution. Renders the multi-stage attribution table for a
//! dataset of channels or campaigns.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use funnel_core::config::{AppConfig, ExportFormat};
use funnel_core::types::{load_rows, AttributionItem, AttributionRow, StageKey};
use funnel_reporting::columns::{Accessor, CellFormat, ColumnDef, Footer};
use funnel_reporting::export::export;
use funnel_reporting::{AttributionTable, RowAccessors, TableProps};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "funnel-attribution")]
#[command(about = "Render a multi-stage marketing funnel attribution table")]
#[command(version)]
struct Cli {
    /// JSON file holding an array of attributed rows
    data: PathBuf,

    /// TOML config file
    #[arg(long, env = "FUNNEL_ATTRIBUTION_CONFIG")]
    config: Option<PathBuf>,

    /// Funnel stage to show: webVisits, MCL, MQL, SQL, opps or users (overrides config)
    #[arg(long)]
    stage: Option<StageKey>,

    /// Output format: text, csv or json (overrides config)
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Hide cost, efficiency and ROI columns
    #[arg(long, default_value_t = false)]
    hide_costs: bool,

    /// Hide the total row
    #[arg(long, default_value_t = false)]
    no_total: bool,

    /// Attribution model name shown in header tooltips (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// What a row represents, e.g. "Campaign" (overrides config)
    #[arg(long)]
    nickname: Option<String>,

    /// Table title (overrides config)
    #[arg(long)]
    title: Option<String>,

    /// Column id to sort by
    #[arg(long)]
    sort_by: Option<String>,

    /// Sort descending
    #[arg(long, default_value_t = false)]
    descending: bool,
}

/// Extra identified-visitor columns, added when the dataset carries them.
const WEB_VISIT_FIELDS: [(&str, &str); 3] = [
    ("impressions", "Impressions"),
    ("clicks", "Clicks"),
    ("conversions", "Conversions"),
];

fn web_visits_columns(rows: &[AttributionRow]) -> Vec<ColumnDef> {
    WEB_VISIT_FIELDS
        .into_iter()
        .filter(|(key, _)| rows.iter().any(|row| row.metric(key).is_some()))
        .map(|(key, label)| {
            ColumnDef::new(key, label, Accessor::field(key), CellFormat::Number).with_footer(
                Footer::Sum {
                    accessor: Accessor::field(key),
                    format: CellFormat::Number,
                },
            )
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the table
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funnel_attribution=info,funnel_reporting=warn".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path.as_path()))
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(stage) = cli.stage {
        config.table.default_stage = stage;
    }
    if let Some(format) = cli.format {
        config.export.format = format;
    }
    if cli.hide_costs {
        config.table.show_cost_columns = false;
    }
    if cli.no_total {
        config.table.show_total_row = false;
    }
    if let Some(model) = cli.model {
        config.table.attribution_model = model;
    }
    if let Some(nickname) = cli.nickname {
        config.table.data_nickname = nickname;
    }
    if let Some(title) = cli.title {
        config.table.title = Some(title);
    }

    info!(
        stage = %config.table.default_stage,
        show_total_row = config.table.show_total_row,
        show_cost_columns = config.table.show_cost_columns,
        format = ?config.export.format,
        "Configuration loaded"
    );

    let rows = load_rows(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))?;
    info!(rows = rows.len(), path = %cli.data.display(), "Dataset loaded");

    let props =
        TableProps::from_config(&config.table, RowAccessors).web_visits_columns(web_visits_columns(&rows));
    let mut table = AttributionTable::new(&rows, props);
    if let Some(column) = cli.sort_by.as_deref() {
        table.sort_by(column, cli.descending)?;
    }

    let view = table.render()?;
    info!(
        stage = %view.selected_stage,
        rows = view.rows.len(),
        columns = view.columns.len(),
        "Table rendered"
    );

    let output = export(&view, config.export.format, config.export.include_footer)?;
    print!("{output}");
    Ok(())
}
