use crate::catalog::{Category, QuestionCatalog};

/// How far the wizard is through one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category: Category,
    pub active: bool,
    pub completed: bool,
    pub current_step: usize,
    pub total_steps: usize,
}

impl CategoryProgress {
    /// Share of the category's bar to fill, in `[0, 1]`.
    pub fn fill_ratio(&self) -> f32 {
        if self.completed {
            return 1.0;
        }
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.current_step as f32 / self.total_steps as f32).clamp(0.0, 1.0)
    }

    /// Whether the bar is drawn at all.
    pub fn is_visible(&self) -> bool {
        self.active || self.completed
    }
}

pub fn category_progress(catalog: &QuestionCatalog, step_index: usize) -> Vec<CategoryProgress> {
    let active_category = catalog.step(step_index).map(|step| step.category);

    catalog
        .category_ranges()
        .iter()
        .map(|(category, range)| CategoryProgress {
            category: *category,
            active: active_category == Some(*category),
            completed: step_index > range.end,
            current_step: (step_index + 1).saturating_sub(range.start),
            total_steps: range.len(),
        })
        .collect()
}
