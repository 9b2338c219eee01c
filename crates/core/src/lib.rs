//! Shared types for the funnel attribution table: configuration, errors,
//! funnel stages, attributed items and number formatting.

pub mod config;
pub mod error;
pub mod format;
pub mod types;

pub use config::AppConfig;
pub use error::{AttributionError, AttributionResult};
pub use types::{load_rows, read_rows, AttributionItem, AttributionRow, ItemTitle, StageKey};
