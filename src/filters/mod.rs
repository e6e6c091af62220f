pub mod criteria;
pub mod location;
pub mod pagination;

pub use criteria::{FilterCriteria, SortOrder};
pub use location::Location;
pub use pagination::{page_window, Pagination};

use tracing::info;

use crate::error::Result;

/// Editable filter form. The draft is seeded from the location and only
/// reaches the location on `apply`.
#[derive(Debug, Clone, Default)]
pub struct FilterBar {
    draft: FilterCriteria,
}

impl FilterBar {
    pub fn from_location(location: &Location) -> Self {
        Self {
            draft: location.criteria().without_page(),
        }
    }

    pub fn draft(&self) -> &FilterCriteria {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FilterCriteria {
        &mut self.draft
    }

    /// Input change by field name, as the form sends it
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        self.draft.set_field(name, value)
    }

    /// Write the draft to the location as a fresh query. Only set fields are
    /// written and the page indicator starts over.
    pub fn apply(&mut self, location: &mut Location) -> Result<FilterCriteria> {
        let applied = self.draft.without_page();
        let query = applied.to_query();
        let href = if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{query}")
        };

        info!("Applying filters: {}", applied);
        location.push(&href)?;
        Ok(applied)
    }

    /// Clear every field and return to the bare path
    pub fn reset(&mut self, location: &mut Location) -> Result<()> {
        self.draft = FilterCriteria::default();
        location.push("/")
    }
}
