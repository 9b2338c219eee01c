//! Caller-supplied per-item accessors.

use funnel_core::types::{AttributionRow, ItemTitle};

/// Reads the values the table cannot take from an item's numeric fields:
/// its cost and its title.
pub trait ItemAccessors<T>: Send + Sync {
    fn cost(&self, item: &T) -> Option<f64>;
    fn title(&self, item: &T) -> ItemTitle;
}

/// Accessors backed by two closures.
pub struct FnAccessors<C, N> {
    cost: C,
    title: N,
}

impl<C, N> FnAccessors<C, N> {
    pub fn new(cost: C, title: N) -> Self {
        Self { cost, title }
    }
}

impl<T, C, N> ItemAccessors<T> for FnAccessors<C, N>
where
    C: Fn(&T) -> Option<f64> + Send + Sync,
    N: Fn(&T) -> ItemTitle + Send + Sync,
{
    fn cost(&self, item: &T) -> Option<f64> {
        (self.cost)(item)
    }

    fn title(&self, item: &T) -> ItemTitle {
        (self.title)(item)
    }
}

/// Accessors for [`AttributionRow`]: the row's own cost and title.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowAccessors;

impl ItemAccessors<AttributionRow> for RowAccessors {
    fn cost(&self, item: &AttributionRow) -> Option<f64> {
        item.cost
    }

    fn title(&self, item: &AttributionRow) -> ItemTitle {
        ItemTitle::plain(item.title.clone())
    }
}
