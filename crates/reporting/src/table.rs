//! Attribution table. Composes the selected stage's columns with the
//! caller's columns, filters and sorts rows, and renders a [`TableView`].

use std::cmp::Ordering;

use funnel_core::config::TableConfig;
use funnel_core::format::format_number;
use funnel_core::types::{AttributionItem, StageKey};
use funnel_core::{AttributionError, AttributionResult};
use serde::Serialize;
use tracing::debug;

use crate::accessors::ItemAccessors;
use crate::columns::{Accessor, CellValue, ColumnDef, ColumnId, Footer, Header, RegistryOptions};
use crate::filter::{content_keys, retained_rows};
use crate::footer::{resolve_footers, sum_by};
use crate::stages::{CatalogOptions, StageCatalog, StageSummary};

/// Called with the clicked item and the stage selected at that moment.
pub type RowClickHandler<T> = Box<dyn Fn(&T, StageKey) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: ColumnId,
    pub descending: bool,
}

impl SortSpec {
    pub fn ascending(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::ascending(ColumnId::RowTitle)
    }
}

/// Options handed through to whatever draws the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOptions {
    pub height: u32,
    pub min_rows: usize,
    pub no_padding: bool,
    pub default_sorted: Vec<SortSpec>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            height: 440,
            min_rows: 0,
            no_padding: true,
            default_sorted: vec![SortSpec::default()],
        }
    }
}

/// User-driven state of one table instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSelection {
    pub selected_stage: StageKey,
    pub sort: SortSpec,
}

pub struct TableProps<T> {
    pub title: Option<String>,
    pub data_nickname: String,
    pub accessors: Box<dyn ItemAccessors<T>>,
    pub columns_before: Vec<ColumnDef>,
    pub columns_after: Vec<ColumnDef>,
    pub web_visits_columns: Vec<ColumnDef>,
    pub show_total_row: bool,
    pub show_cost_columns: bool,
    pub attribution_model: String,
    pub on_click: Option<RowClickHandler<T>>,
    pub default_stage: Option<StageKey>,
    pub options: TableOptions,
}

impl<T> TableProps<T> {
    pub fn new(data_nickname: impl Into<String>, accessors: impl ItemAccessors<T> + 'static) -> Self {
        let defaults = RegistryOptions::default();
        Self {
            title: None,
            data_nickname: data_nickname.into(),
            accessors: Box::new(accessors),
            columns_before: Vec::new(),
            columns_after: Vec::new(),
            web_visits_columns: Vec::new(),
            show_total_row: true,
            show_cost_columns: true,
            attribution_model: defaults.attribution_model,
            on_click: None,
            default_stage: None,
            options: TableOptions::default(),
        }
    }

    pub fn from_config(config: &TableConfig, accessors: impl ItemAccessors<T> + 'static) -> Self {
        let mut props = Self::new(config.data_nickname.clone(), accessors);
        props.title = config.title.clone();
        props.show_total_row = config.show_total_row;
        props.show_cost_columns = config.show_cost_columns;
        props.attribution_model = config.attribution_model.clone();
        props.default_stage = Some(config.default_stage);
        props.options.height = config.height;
        props.options.min_rows = config.min_rows;
        props
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn columns_before(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns_before = columns;
        self
    }

    pub fn columns_after(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns_after = columns;
        self
    }

    pub fn web_visits_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.web_visits_columns = columns;
        self
    }

    pub fn show_total_row(mut self, show: bool) -> Self {
        self.show_total_row = show;
        self
    }

    pub fn show_cost_columns(mut self, show: bool) -> Self {
        self.show_cost_columns = show;
        self
    }

    pub fn attribution_model(mut self, model: impl Into<String>) -> Self {
        self.attribution_model = model.into();
        self
    }

    pub fn default_stage(mut self, stage: StageKey) -> Self {
        self.default_stage = Some(stage);
        self
    }

    pub fn on_click(mut self, handler: impl Fn(&T, StageKey) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Box::new(handler));
        self
    }

    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            registry: RegistryOptions {
                data_nickname: self.data_nickname.clone(),
                attribution_model: self.attribution_model.clone(),
                show_total_row: self.show_total_row,
                leading_total: self
                    .columns_before
                    .iter()
                    .any(|column| column.footer.text() == "Total"),
            },
            web_visits_columns: self.web_visits_columns.clone(),
            show_cost_columns: self.show_cost_columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedColumn {
    pub id: ColumnId,
    pub header: Header,
    pub footer: String,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    /// Position of the item in the caller's dataset.
    pub item_index: usize,
    pub cells: Vec<String>,
}

/// Everything a host needs to draw the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: Option<String>,
    pub stages: Vec<StageSummary>,
    pub selected_stage: StageKey,
    pub columns: Vec<RenderedColumn>,
    pub rows: Vec<RenderedRow>,
    pub sorted: SortSpec,
    pub options: TableOptions,
}

impl TableView {
    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == id)
    }

    pub fn column_ids(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.id.as_str()).collect()
    }

    pub fn cell(&self, row: usize, id: &ColumnId) -> Option<&str> {
        let index = self.column_index(id)?;
        self.rows.get(row)?.cells.get(index).map(String::as_str)
    }

    pub fn footer(&self, id: &ColumnId) -> Option<&str> {
        let index = self.column_index(id)?;
        self.columns.get(index).map(|column| column.footer.as_str())
    }

    pub fn stage_name(&self) -> &str {
        self.stages
            .iter()
            .find(|stage| stage.key == self.selected_stage)
            .map_or("", |stage| stage.name.as_str())
    }
}

pub struct AttributionTable<'a, T> {
    data: &'a [T],
    props: TableProps<T>,
    selection: StageSelection,
}

impl<'a, T: AttributionItem> AttributionTable<'a, T> {
    pub fn new(data: &'a [T], props: TableProps<T>) -> Self {
        let selection = StageSelection {
            selected_stage: props.default_stage.unwrap_or_default(),
            sort: props
                .options
                .default_sorted
                .first()
                .cloned()
                .unwrap_or_default(),
        };
        Self {
            data,
            props,
            selection,
        }
    }

    pub fn selection(&self) -> &StageSelection {
        &self.selection
    }

    pub fn selected_stage(&self) -> StageKey {
        self.selection.selected_stage
    }

    pub fn props(&self) -> &TableProps<T> {
        &self.props
    }

    pub fn select_stage(&mut self, stage: StageKey) {
        debug!(from = %self.selection.selected_stage, to = %stage, "Stage selected");
        self.selection.selected_stage = stage;
    }

    /// Sorts by a sortable column of the current stage.
    pub fn sort_by(&mut self, column: impl Into<ColumnId>, descending: bool) -> AttributionResult<()> {
        let column = column.into();
        let columns = self.columns()?;
        let found = columns
            .iter()
            .find(|candidate| candidate.id == column)
            .ok_or_else(|| AttributionError::UnknownColumn(column.to_string()))?;
        if !found.sortable {
            return Err(AttributionError::NotSortable(column.to_string()));
        }
        self.selection.sort = SortSpec { column, descending };
        Ok(())
    }

    pub fn stage_catalog(&self) -> AttributionResult<StageCatalog> {
        StageCatalog::build(self.data, &*self.props.accessors, &self.props.catalog_options())
    }

    /// Stage selector entries with each stage's rounded total.
    pub fn stage_summaries(&self) -> Vec<StageSummary> {
        StageKey::ALL
            .into_iter()
            .map(|key| StageSummary {
                key,
                name: key.plural_nickname().to_string(),
                number: format_number(
                    sum_by(self.data, |item| item.metric(key.data_key())).round(),
                ),
            })
            .collect()
    }

    /// Dataset indices of the rows shown for the selected stage, in
    /// dataset order.
    pub fn visible_rows(&self) -> AttributionResult<Vec<usize>> {
        let catalog = self.stage_catalog()?;
        self.visible_rows_in(&catalog)
    }

    /// Final column list, footers resolved against the visible rows.
    pub fn columns(&self) -> AttributionResult<Vec<ColumnDef>> {
        let catalog = self.stage_catalog()?;
        let rows = self.visible_rows_in(&catalog)?;
        self.compose_columns(&catalog, &rows)
    }

    pub fn render(&self) -> AttributionResult<TableView> {
        let catalog = self.stage_catalog()?;
        let mut rows = self.visible_rows_in(&catalog)?;
        let columns = self.compose_columns(&catalog, &rows)?;

        let sorted = match columns
            .iter()
            .find(|column| column.id == self.selection.sort.column && column.sortable)
        {
            Some(column) => {
                self.sort_rows(&mut rows, &column.accessor, self.selection.sort.descending);
                self.selection.sort.clone()
            }
            None => {
                debug!(column = %self.selection.sort.column, "Sort column not shown, using row title");
                let fallback = SortSpec::default();
                if let Some(title) = columns.iter().find(|column| column.id == fallback.column) {
                    self.sort_rows(&mut rows, &title.accessor, false);
                }
                fallback
            }
        };

        let accessors = &*self.props.accessors;
        let rendered_rows: Vec<RenderedRow> = rows
            .iter()
            .map(|&item_index| {
                let item = &self.data[item_index];
                RenderedRow {
                    item_index,
                    cells: columns
                        .iter()
                        .map(|column| column.cell.render(&column.accessor.value(item, accessors)))
                        .collect(),
                }
            })
            .collect();

        debug!(
            stage = %self.selection.selected_stage,
            rows = rendered_rows.len(),
            hidden = self.data.len() - rendered_rows.len(),
            columns = columns.len(),
            "Rendered attribution table"
        );

        Ok(TableView {
            title: self.props.title.clone(),
            stages: self.stage_summaries(),
            selected_stage: self.selection.selected_stage,
            columns: columns
                .into_iter()
                .map(|column| RenderedColumn {
                    footer: column.footer.text().to_string(),
                    id: column.id,
                    header: column.header,
                    sortable: column.sortable,
                })
                .collect(),
            rows: rendered_rows,
            sorted,
            options: self.props.options.clone(),
        })
    }

    /// Invokes the click handler for the item at `item_index`.
    pub fn click_row(&self, item_index: usize) -> AttributionResult<()> {
        let item = self
            .data
            .get(item_index)
            .ok_or(AttributionError::RowOutOfRange {
                index: item_index,
                len: self.data.len(),
            })?;
        if let Some(handler) = &self.props.on_click {
            handler(item, self.selection.selected_stage);
        }
        Ok(())
    }

    fn selected_columns<'c>(&self, catalog: &'c StageCatalog) -> AttributionResult<&'c [ColumnDef]> {
        let stage = self.selection.selected_stage;
        catalog
            .find(stage)
            .map(|definition| definition.columns.as_slice())
            .ok_or_else(|| AttributionError::UnknownStage(stage.to_string()))
    }

    fn visible_rows_in(&self, catalog: &StageCatalog) -> AttributionResult<Vec<usize>> {
        let stage = self.selection.selected_stage;
        let registry = catalog
            .registry(stage)
            .ok_or_else(|| AttributionError::UnknownStage(stage.to_string()))?;
        let keys = content_keys(
            registry,
            &self.props.web_visits_columns,
            self.selected_columns(catalog)?,
        )?;
        Ok(retained_rows(self.data, &keys))
    }

    /// `[before, stage without on-click, after, on-click]`, footers resolved.
    fn compose_columns(&self, catalog: &StageCatalog, rows: &[usize]) -> AttributionResult<Vec<ColumnDef>> {
        let mut stage_columns = self.selected_columns(catalog)?.to_vec();
        let on_click = stage_columns
            .iter()
            .position(|column| column.id == ColumnId::OnClick)
            .map(|index| stage_columns.remove(index));

        let mut columns: Vec<ColumnDef> = self
            .props
            .columns_before
            .iter()
            .cloned()
            .chain(stage_columns)
            .chain(self.props.columns_after.iter().cloned())
            .chain(on_click)
            .collect();
        if !self.props.show_total_row {
            for column in &mut columns {
                column.footer = Footer::None;
            }
        }

        let items: Vec<&T> = rows.iter().map(|&index| &self.data[index]).collect();
        Ok(resolve_footers(columns, &items, &*self.props.accessors))
    }

    fn sort_rows(&self, rows: &mut [usize], accessor: &Accessor, descending: bool) {
        let accessors = &*self.props.accessors;
        let mut keyed: Vec<(usize, CellValue)> = rows
            .iter()
            .map(|&index| (index, accessor.value(&self.data[index], accessors)))
            .collect();
        keyed.sort_by(|(_, a), (_, b)| compare_values(a, b, descending));
        for (slot, (index, _)) in rows.iter_mut().zip(keyed) {
            *slot = index;
        }
    }
}

/// Titles compare case-insensitively on their plain text; numbers compare
/// with missing values as zero and NaN always last.
fn compare_values(a: &CellValue, b: &CellValue, descending: bool) -> Ordering {
    let ordering = match (a, b) {
        (CellValue::Title(a), CellValue::Title(b)) => {
            a.text.to_lowercase().cmp(&b.text.to_lowercase())
        }
        (CellValue::Number(a), CellValue::Number(b)) => {
            let (a, b) = (a.unwrap_or(0.0), b.unwrap_or(0.0));
            match (a.is_nan(), b.is_nan()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) => a.total_cmp(&b),
            }
        }
        _ => Ordering::Equal,
    };
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}
