//! Stage catalog: the funnel stages and the columns each one shows.

use funnel_core::types::{AttributionItem, StageKey};
use funnel_core::AttributionResult;
use serde::Serialize;
use tracing::debug;

use crate::accessors::ItemAccessors;
use crate::columns::{ColumnDef, ColumnId, ColumnOverride, ColumnPick, ColumnRegistry, RegistryOptions};

/// Columns hidden when cost display is off.
pub const COST_DEPENDENT_COLUMNS: [ColumnId; 4] = [
    ColumnId::Cost,
    ColumnId::Efficiency,
    ColumnId::Roi,
    ColumnId::PipelineRoi,
];

/// Fixed column order of the identified-visitors stage. Ids not listed
/// sort first.
const WEB_VISITS_COLUMN_ORDER: [&str; 7] = [
    "row-title",
    "cost",
    "impressions",
    "clicks",
    "stage-indicator",
    "efficiency",
    "conversions",
];

#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub name: String,
    pub key: StageKey,
    pub columns: Vec<ColumnDef>,
}

/// Entry in the stage selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub key: StageKey,
    pub name: String,
    /// Rounded, thousands-grouped stage total.
    pub number: String,
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub registry: RegistryOptions,
    /// Caller columns added to the identified-visitors stage.
    pub web_visits_columns: Vec<ColumnDef>,
    pub show_cost_columns: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            registry: RegistryOptions::default(),
            web_visits_columns: Vec::new(),
            show_cost_columns: true,
        }
    }
}

pub struct StageCatalog {
    stages: Vec<(StageDefinition, ColumnRegistry)>,
}

impl StageCatalog {
    /// Builds every stage in funnel order, each from its own registry.
    pub fn build<T, A>(data: &[T], accessors: &A, options: &CatalogOptions) -> AttributionResult<Self>
    where
        T: AttributionItem,
        A: ItemAccessors<T> + ?Sized,
    {
        let stages = StageKey::ALL
            .into_iter()
            .map(|key| {
                let registry = ColumnRegistry::build(key, data, accessors, &options.registry);
                let mut stage = define_stage(&registry, &options.web_visits_columns)?;
                if !options.show_cost_columns {
                    stage
                        .columns
                        .retain(|column| !COST_DEPENDENT_COLUMNS.contains(&column.id));
                }
                Ok((stage, registry))
            })
            .collect::<AttributionResult<Vec<_>>>()?;

        debug!(
            stages = stages.len(),
            show_cost_columns = options.show_cost_columns,
            "Stage catalog built"
        );
        Ok(Self { stages })
    }

    pub fn stages(&self) -> impl Iterator<Item = &StageDefinition> {
        self.stages.iter().map(|(stage, _)| stage)
    }

    pub fn find(&self, key: StageKey) -> Option<&StageDefinition> {
        self.stages().find(|stage| stage.key == key)
    }

    /// Registry the stage's columns were picked from.
    pub fn registry(&self, key: StageKey) -> Option<&ColumnRegistry> {
        self.stages
            .iter()
            .find(|(stage, _)| stage.key == key)
            .map(|(_, registry)| registry)
    }
}

/// Column set of the registry's stage.
pub fn define_stage(
    registry: &ColumnRegistry,
    web_visits_columns: &[ColumnDef],
) -> AttributionResult<StageDefinition> {
    let key = registry.stage();
    let plural = key.plural_nickname();

    let columns = match key {
        StageKey::WebVisits => {
            let mut columns = registry.pick([
                ColumnPick::from(ColumnId::RowTitle),
                ColumnPick::from(ColumnId::Cost),
                ColumnPick::with(
                    ColumnId::StageIndicator,
                    ColumnOverride::header(
                        registry.header_with_tooltip(&ColumnId::StageIndicator, plural),
                    ),
                ),
                ColumnPick::from(ColumnId::Efficiency),
            ])?;
            columns.extend(web_visits_columns.iter().cloned());
            columns.sort_by_key(|column| web_visits_rank(&column.id));
            columns
        }
        _ => {
            let mut columns = registry.pick([
                ColumnPick::from(ColumnId::RowTitle),
                ColumnPick::from(ColumnId::Cost),
                ColumnPick::with(
                    ColumnId::InfluencedStageIndicator,
                    ColumnOverride::header(registry.header_with_tooltip(
                        &ColumnId::InfluencedStageIndicator,
                        format!("Touched {plural}"),
                    )),
                ),
                ColumnPick::with(
                    ColumnId::StageIndicator,
                    ColumnOverride::header(registry.header_with_tooltip(
                        &ColumnId::StageIndicator,
                        format!("Attributed {plural}"),
                    )),
                ),
                ColumnPick::from(ColumnId::Efficiency),
            ])?;
            columns.extend(registry.pick(stage_specific_columns(key))?);
            columns
        }
    };

    Ok(StageDefinition {
        name: plural.to_string(),
        key,
        columns,
    })
}

fn stage_specific_columns(key: StageKey) -> Vec<ColumnId> {
    match key {
        StageKey::Opps => vec![ColumnId::Pipeline, ColumnId::PipelineRoi, ColumnId::OnClick],
        StageKey::Users => vec![
            ColumnId::InfluencedRevenue,
            ColumnId::Revenue,
            ColumnId::Roi,
            ColumnId::Arpa,
            ColumnId::Ltv,
            ColumnId::OnClick,
        ],
        StageKey::WebVisits => Vec::new(),
        StageKey::Mcl | StageKey::Mql | StageKey::Sql => vec![ColumnId::OnClick],
    }
}

fn web_visits_rank(id: &ColumnId) -> isize {
    WEB_VISITS_COLUMN_ORDER
        .iter()
        .position(|ordered| *ordered == id.as_str())
        .map_or(-1, |index| index as isize)
}
