//! Column registry, the catalog of column definitions every funnel stage
//! picks its columns from.

use std::collections::HashMap;
use std::fmt;

use funnel_core::format::{
    average_format, format_budget, format_number, format_number_with_decimal_point,
    precision_format, roi_format,
};
use funnel_core::types::{fields, AttributionItem, ItemTitle, StageKey};
use funnel_core::{AttributionError, AttributionResult};
use serde::{Deserialize, Serialize};

use crate::accessors::ItemAccessors;
use crate::footer::sum_by;
use crate::tooltip::TooltipContext;

// ─── Column ids ─────────────────────────────────────────────────────────────

/// Stable column identifier. Ids the registry does not know are carried as
/// `Custom`, e.g. caller-supplied `impressions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnId {
    RowTitle,
    Cost,
    StageIndicator,
    InfluencedStageIndicator,
    Efficiency,
    Revenue,
    Arpa,
    Roi,
    Pipeline,
    PipelineRoi,
    Ltv,
    InfluencedRevenue,
    OnClick,
    Custom(String),
}

impl ColumnId {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnId::RowTitle => "row-title",
            ColumnId::Cost => "cost",
            ColumnId::StageIndicator => "stage-indicator",
            ColumnId::InfluencedStageIndicator => "influenced-stage-indicator",
            ColumnId::Efficiency => "efficiency",
            ColumnId::Revenue => "revenue",
            ColumnId::Arpa => "arpa",
            ColumnId::Roi => "roi",
            ColumnId::Pipeline => "pipeline",
            ColumnId::PipelineRoi => "pipeline-roi",
            ColumnId::Ltv => "ltv",
            ColumnId::InfluencedRevenue => "influenced-revenue",
            ColumnId::OnClick => "on-click",
            ColumnId::Custom(id) => id,
        }
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        match id {
            "row-title" => ColumnId::RowTitle,
            "cost" => ColumnId::Cost,
            "stage-indicator" => ColumnId::StageIndicator,
            "influenced-stage-indicator" => ColumnId::InfluencedStageIndicator,
            "efficiency" => ColumnId::Efficiency,
            "revenue" => ColumnId::Revenue,
            "arpa" => ColumnId::Arpa,
            "roi" => ColumnId::Roi,
            "pipeline" => ColumnId::Pipeline,
            "pipeline-roi" => ColumnId::PipelineRoi,
            "ltv" => ColumnId::Ltv,
            "influenced-revenue" => ColumnId::InfluencedRevenue,
            "on-click" => ColumnId::OnClick,
            other => ColumnId::Custom(other.to_string()),
        }
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        ColumnId::from(id.as_str())
    }
}

impl From<ColumnId> for String {
    fn from(id: ColumnId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Column parts ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl Header {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tooltip: None,
        }
    }
}

impl From<&str> for Header {
    fn from(label: &str) -> Self {
        Header::new(label)
    }
}

/// One side of a per-row ratio.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Numeric field; missing yields NaN.
    Field(String),
    /// Caller cost accessor; missing yields NaN.
    Cost,
    /// Numeric field rounded to two decimals; missing yields zero.
    Precision(String),
}

impl Operand {
    fn value<T, A>(&self, item: &T, accessors: &A) -> f64
    where
        T: AttributionItem,
        A: ItemAccessors<T> + ?Sized,
    {
        match self {
            Operand::Field(key) => item.metric(key).unwrap_or(f64::NAN),
            Operand::Cost => accessors.cost(item).unwrap_or(f64::NAN),
            Operand::Precision(key) => precision_format(item.metric(key).unwrap_or(0.0)),
        }
    }
}

/// How a column extracts its raw value from an item.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    /// The item itself, shown through its title.
    Item,
    Field(String),
    Cost,
    Ratio {
        numerator: Operand,
        denominator: Operand,
    },
    /// Row interaction icon.
    RowAction,
}

impl Accessor {
    pub fn field(key: impl Into<String>) -> Self {
        Accessor::Field(key.into())
    }

    /// Item field name for plain field accessors.
    pub fn field_key(&self) -> Option<&str> {
        match self {
            Accessor::Field(key) => Some(key),
            _ => None,
        }
    }

    pub fn value<T, A>(&self, item: &T, accessors: &A) -> CellValue
    where
        T: AttributionItem,
        A: ItemAccessors<T> + ?Sized,
    {
        match self {
            Accessor::Item => CellValue::Title(accessors.title(item)),
            Accessor::Field(key) => CellValue::Number(item.metric(key)),
            Accessor::Cost => CellValue::Number(accessors.cost(item)),
            Accessor::Ratio {
                numerator,
                denominator,
            } => CellValue::Number(Some(
                numerator.value(item, accessors) / denominator.value(item, accessors),
            )),
            Accessor::RowAction => CellValue::Action,
        }
    }

    /// Numeric value for aggregation; missing and NaN count as zero.
    pub fn number<T, A>(&self, item: &T, accessors: &A) -> f64
    where
        T: AttributionItem,
        A: ItemAccessors<T> + ?Sized,
    {
        match self.value(item, accessors) {
            CellValue::Number(Some(value)) if !value.is_nan() => value,
            _ => 0.0,
        }
    }
}

/// Raw value produced by an [`Accessor`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Title(ItemTitle),
    Number(Option<f64>),
    Action,
}

/// Cell formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum CellFormat {
    /// Title label.
    Title,
    Currency,
    /// Two decimals at most.
    Precision,
    Rounded,
    /// Thousands-grouped, as is.
    Number,
    /// Currency average, placeholder when not finite.
    Average,
    /// Return multiple with an `x` suffix.
    Roi,
    /// Currency average followed by `per <unit>`.
    Efficiency { unit: String },
    Blank,
}

impl CellFormat {
    pub fn render(&self, value: &CellValue) -> String {
        match (self, value) {
            (CellFormat::Blank, _) | (_, CellValue::Action) => String::new(),
            (CellFormat::Title, CellValue::Title(title)) => title.label.clone(),
            (_, CellValue::Title(title)) => title.text.clone(),
            (format, CellValue::Number(number)) => format.number(number.unwrap_or(0.0)),
        }
    }

    /// Formats a numeric value; used for cells and computed footers alike.
    pub fn number(&self, value: f64) -> String {
        let zeroed = if value.is_nan() { 0.0 } else { value };
        match self {
            CellFormat::Currency => format_budget(zeroed),
            CellFormat::Precision => format_number_with_decimal_point(zeroed),
            CellFormat::Rounded => format_number(zeroed.round()),
            CellFormat::Number => format_number(zeroed),
            CellFormat::Average => average_format(value, true),
            CellFormat::Roi => roi_format(value),
            CellFormat::Efficiency { unit } => {
                format!("{} per {unit}", average_format(value, true))
            }
            CellFormat::Title | CellFormat::Blank => String::new(),
        }
    }
}

/// Column footer: either a value computed up front or a total evaluated
/// later against the rows actually displayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Footer {
    #[default]
    None,
    Value(String),
    /// Sum of the accessor over the displayed rows, formatted with `format`.
    Sum {
        accessor: Accessor,
        format: CellFormat,
    },
}

impl Footer {
    pub fn value(text: impl Into<String>) -> Self {
        Footer::Value(text.into())
    }

    /// Resolved footer text. Unresolved sums render empty.
    pub fn text(&self) -> &str {
        match self {
            Footer::Value(text) => text,
            Footer::None | Footer::Sum { .. } => "",
        }
    }
}

// ─── Column definition ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub header: Header,
    pub accessor: Accessor,
    pub cell: CellFormat,
    pub footer: Footer,
    pub sortable: bool,
}

impl ColumnDef {
    /// Sortable column without a footer.
    pub fn new(
        id: impl Into<ColumnId>,
        header: impl Into<Header>,
        accessor: Accessor,
        cell: CellFormat,
    ) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor,
            cell,
            footer: Footer::None,
            sortable: true,
        }
    }

    pub fn with_footer(mut self, footer: Footer) -> Self {
        self.footer = footer;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Merges a partial override onto this definition.
    pub fn apply(mut self, overrides: &ColumnOverride) -> Self {
        if let Some(header) = &overrides.header {
            self.header = header.clone();
        }
        if let Some(cell) = &overrides.cell {
            self.cell = cell.clone();
        }
        if let Some(footer) = &overrides.footer {
            self.footer = footer.clone();
        }
        if let Some(sortable) = overrides.sortable {
            self.sortable = sortable;
        }
        self
    }
}

/// Partial column definition merged onto a registry column when a stage
/// picks it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOverride {
    pub header: Option<Header>,
    pub cell: Option<CellFormat>,
    pub footer: Option<Footer>,
    pub sortable: Option<bool>,
}

impl ColumnOverride {
    pub fn header(header: Header) -> Self {
        Self {
            header: Some(header),
            ..Default::default()
        }
    }
}

/// A column id, optionally with overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPick {
    pub id: ColumnId,
    pub overrides: Option<ColumnOverride>,
}

impl ColumnPick {
    pub fn with(id: impl Into<ColumnId>, overrides: ColumnOverride) -> Self {
        Self {
            id: id.into(),
            overrides: Some(overrides),
        }
    }
}

impl From<ColumnId> for ColumnPick {
    fn from(id: ColumnId) -> Self {
        Self {
            id,
            overrides: None,
        }
    }
}

impl From<&str> for ColumnPick {
    fn from(id: &str) -> Self {
        ColumnPick::from(ColumnId::from(id))
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Settings the registry reads besides the stage and dataset.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub data_nickname: String,
    pub attribution_model: String,
    pub show_total_row: bool,
    /// A leading caller column already labels the footer row.
    pub leading_total: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            data_nickname: "Channel".to_string(),
            attribution_model: "full journey".to_string(),
            show_total_row: true,
            leading_total: false,
        }
    }
}

pub struct ColumnRegistry {
    stage: StageKey,
    tooltips: TooltipTexts,
    columns: HashMap<ColumnId, ColumnDef>,
}

/// Owned copy of the tooltip inputs so stages can relabel headers later.
#[derive(Debug, Clone)]
struct TooltipTexts {
    data_nickname: String,
    attribution_model: String,
}

impl ColumnRegistry {
    /// Builds every column for `stage`. Footers other than cost are totals
    /// over the whole of `data`; the cost footer is left for the rows that
    /// end up displayed.
    pub fn build<T, A>(stage: StageKey, data: &[T], accessors: &A, options: &RegistryOptions) -> Self
    where
        T: AttributionItem,
        A: ItemAccessors<T> + ?Sized,
    {
        let tips = TooltipContext {
            stage,
            data_nickname: &options.data_nickname,
            attribution_model: &options.attribution_model,
        };
        let stage_key = stage.data_key();
        let unit = stage.singular_nickname().to_string();

        let total_cost = sum_by(data, |item| accessors.cost(item));
        let total_metric = precision_format(sum_by(data, |item| item.metric(stage_key)));
        let total_influenced = sum_by(data, |item| item.metric(stage.influenced_data_key()));
        let total_revenue = sum_by(data, |item| item.metric(fields::REVENUE));
        let total_influenced_revenue = sum_by(data, |item| item.metric(fields::INFLUENCED_REVENUE));
        let total_pipeline = sum_by(data, |item| item.metric(fields::PIPELINE));
        let total_ltv = sum_by(data, |item| item.metric(fields::LTV));

        let per_stage = |numerator: Operand| Accessor::Ratio {
            numerator,
            denominator: Operand::Precision(stage_key.to_string()),
        };
        let per_cost = |field: &str| Accessor::Ratio {
            numerator: Operand::Field(field.to_string()),
            denominator: Operand::Cost,
        };
        let efficiency = CellFormat::Efficiency { unit };

        let columns = vec![
            ColumnDef::new(
                ColumnId::RowTitle,
                Header::new(options.data_nickname.clone()),
                Accessor::Item,
                CellFormat::Title,
            )
            .with_footer(Footer::value(if options.leading_total { "" } else { "Total" })),
            ColumnDef::new(ColumnId::Cost, "Cost", Accessor::Cost, CellFormat::Currency)
                .with_footer(Footer::Sum {
                    accessor: Accessor::Cost,
                    format: CellFormat::Currency,
                }),
            ColumnDef::new(
                ColumnId::StageIndicator,
                Header::default(),
                Accessor::field(stage_key),
                CellFormat::Precision,
            )
            .with_footer(Footer::value(format_number_with_decimal_point(total_metric))),
            ColumnDef::new(
                ColumnId::InfluencedStageIndicator,
                Header::default(),
                Accessor::field(stage.influenced_data_key()),
                CellFormat::Rounded,
            )
            .with_footer(Footer::value(CellFormat::Rounded.number(total_influenced))),
            ColumnDef::new(
                ColumnId::Efficiency,
                tips.header(&ColumnId::Efficiency, "Efficiency"),
                per_stage(Operand::Cost),
                efficiency.clone(),
            )
            .with_footer(Footer::value(efficiency.number(total_cost / total_metric))),
            ColumnDef::new(
                ColumnId::Revenue,
                tips.header(&ColumnId::Revenue, "Attributed Revenue"),
                Accessor::field(fields::REVENUE),
                CellFormat::Currency,
            )
            .with_footer(Footer::value(format_budget(total_revenue))),
            ColumnDef::new(
                ColumnId::Arpa,
                "ARPA",
                per_stage(Operand::Field(fields::REVENUE.to_string())),
                CellFormat::Average,
            )
            .with_footer(Footer::value(average_format(total_revenue / total_metric, true))),
            ColumnDef::new(
                ColumnId::Roi,
                "ROI",
                per_cost(fields::REVENUE),
                CellFormat::Roi,
            )
            .with_footer(Footer::value(roi_format(total_revenue / total_cost))),
            ColumnDef::new(
                ColumnId::Pipeline,
                tips.header(&ColumnId::Pipeline, "Pipeline"),
                Accessor::field(fields::PIPELINE),
                CellFormat::Currency,
            )
            .with_footer(Footer::value(format_budget(total_pipeline))),
            ColumnDef::new(
                ColumnId::PipelineRoi,
                "Pipeline ROI",
                per_cost(fields::PIPELINE),
                CellFormat::Roi,
            )
            .with_footer(Footer::value(roi_format(total_pipeline / total_cost))),
            ColumnDef::new(
                ColumnId::Ltv,
                "LTV",
                Accessor::field(fields::LTV),
                CellFormat::Currency,
            )
            .with_footer(Footer::value(format_budget(total_ltv))),
            ColumnDef::new(
                ColumnId::InfluencedRevenue,
                tips.header(&ColumnId::InfluencedRevenue, "Touched Revenue"),
                Accessor::field(fields::INFLUENCED_REVENUE),
                CellFormat::Currency,
            )
            .with_footer(Footer::value(format_budget(total_influenced_revenue))),
            ColumnDef::new(
                ColumnId::OnClick,
                Header::default(),
                Accessor::RowAction,
                CellFormat::Blank,
            )
            .with_footer(Footer::value(""))
            .with_sortable(false),
        ];

        let mut registry = Self {
            stage,
            tooltips: TooltipTexts {
                data_nickname: options.data_nickname.clone(),
                attribution_model: options.attribution_model.clone(),
            },
            columns: HashMap::with_capacity(columns.len()),
        };
        for mut column in columns {
            if !options.show_total_row {
                column.footer = Footer::None;
            }
            registry.insert(column);
        }
        registry
    }

    fn insert(&mut self, column: ColumnDef) {
        let previous = self.columns.insert(column.id.clone(), column);
        debug_assert!(previous.is_none(), "duplicate column id in registry");
    }

    pub fn stage(&self) -> StageKey {
        self.stage
    }

    pub fn get(&self, id: &ColumnId) -> Option<&ColumnDef> {
        self.columns.get(id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Copies the picked columns, in pick order, with overrides applied.
    pub fn pick<P>(&self, picks: impl IntoIterator<Item = P>) -> AttributionResult<Vec<ColumnDef>>
    where
        P: Into<ColumnPick>,
    {
        picks
            .into_iter()
            .map(|pick| {
                let pick = pick.into();
                let column = self
                    .get(&pick.id)
                    .cloned()
                    .ok_or_else(|| AttributionError::UnknownColumn(pick.id.to_string()))?;
                Ok(match &pick.overrides {
                    Some(overrides) => column.apply(overrides),
                    None => column,
                })
            })
            .collect()
    }

    /// Header with the tooltip this registry's stage gives `id`.
    pub fn header_with_tooltip(&self, id: &ColumnId, label: impl Into<String>) -> Header {
        TooltipContext {
            stage: self.stage,
            data_nickname: &self.tooltips.data_nickname,
            attribution_model: &self.tooltips.attribution_model,
        }
        .header(id, label)
    }
}
