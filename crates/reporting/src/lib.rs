//! Funnel attribution table: column registry, stage catalog, row filter,
//! footer totals, table composition and export.

pub mod accessors;
pub mod columns;
pub mod export;
pub mod filter;
pub mod footer;
pub mod stages;
pub mod table;
pub mod tooltip;

pub use accessors::{FnAccessors, ItemAccessors, RowAccessors};
pub use columns::{ColumnDef, ColumnId, ColumnRegistry};
pub use stages::{StageCatalog, StageDefinition};
pub use table::{AttributionTable, TableProps, TableView};
