//! Explanatory header tooltips.

use funnel_core::types::StageKey;

use crate::columns::{ColumnId, Header};

/// What the tooltip texts refer to.
#[derive(Debug, Clone, Copy)]
pub struct TooltipContext<'a> {
    pub stage: StageKey,
    pub data_nickname: &'a str,
    pub attribution_model: &'a str,
}

impl TooltipContext<'_> {
    /// Tooltip for a column, if that column carries one.
    pub fn tooltip(&self, id: &ColumnId) -> Option<String> {
        let nickname = self.data_nickname.to_lowercase();
        let model = self.attribution_model;
        let volume = |what: &str| {
            format!("Total {what} generated by the {nickname}. Calculated by {model} model")
        };

        let text = match id {
            ColumnId::InfluencedStageIndicator => format!(
                "# of {} conversion journeys which the {nickname} took part in",
                self.stage.singular_nickname()
            ),
            ColumnId::StageIndicator => format!(
                "# of {} generated by the {nickname}. Calculated by {model} model",
                self.stage.plural_nickname()
            ),
            ColumnId::InfluencedRevenue => {
                format!("Total revenue generated from journeys which the {nickname} took part in")
            }
            ColumnId::Revenue => volume("revenue"),
            ColumnId::Pipeline => volume("pipeline"),
            ColumnId::Efficiency => format!("Cost per {}", self.stage.singular_nickname()),
            _ => return None,
        };
        Some(text)
    }

    /// Header label paired with the column's tooltip.
    pub fn header(&self, id: &ColumnId, label: impl Into<String>) -> Header {
        Header {
            label: label.into(),
            tooltip: self.tooltip(id),
        }
    }
}
