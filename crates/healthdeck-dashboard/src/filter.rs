//! Single-select category filter used as a rendering lens.

use serde::Serialize;

use crate::model::{HealthCategory, HealthCell};

/// Currently highlighted category, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterState {
    active: Option<HealthCategory>,
}

impl FilterState {
    /// Select `category`, or clear the filter when it is already selected.
    pub fn toggle(&mut self, category: HealthCategory) {
        self.active = if self.active == Some(category) {
            None
        } else {
            Some(category)
        };
    }

    /// Drop any selection.
    pub const fn clear(&mut self) {
        self.active = None;
    }

    /// Selected category.
    #[must_use]
    pub const fn active(&self) -> Option<HealthCategory> {
        self.active
    }

    /// A cell is dimmed when a filter is set and the cell falls outside it.
    #[must_use]
    pub fn is_dimmed(&self, cell: &HealthCell) -> bool {
        self.active
            .is_some_and(|category| cell.category() != category)
    }
}
