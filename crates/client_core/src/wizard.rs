//! Step-by-step answering of the question catalog, with optional autosave.

use std::{fmt, sync::Arc};

use shared::domain::{FieldKey, FieldKindMismatch, FieldValue, IntakeFormData};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{IntakeFormStep, QuestionCatalog},
    error::ClientError,
    progress::{category_progress, CategoryProgress},
    IntakeFormsApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Stayed,
    Moved,
    /// The last step was left going forward.
    Completed,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    FieldKind(#[from] FieldKindMismatch),
    #[error("step {field} needs an answer before moving on")]
    AnswerRequired { field: FieldKey },
    #[error("step {field} is not a multi-select question")]
    NotMultiSelect { field: FieldKey },
}

pub struct Wizard {
    api: Arc<dyn IntakeFormsApi>,
    catalog: Arc<QuestionCatalog>,
    step_index: usize,
    record: IntakeFormData,
    autosave_enabled: bool,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("step_index", &self.step_index)
            .field("record", &self.record)
            .field("autosave_enabled", &self.autosave_enabled)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    /// With `skip_answered`, starts at the first step whose field is still absent.
    pub fn new(
        api: Arc<dyn IntakeFormsApi>,
        catalog: Arc<QuestionCatalog>,
        record: IntakeFormData,
        autosave_enabled: bool,
        skip_answered: bool,
    ) -> Self {
        let step_index = if skip_answered {
            catalog.first_unanswered(&record).unwrap_or(0)
        } else {
            0
        };

        Self {
            api,
            catalog,
            step_index,
            record,
            autosave_enabled,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn step_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn current_step(&self) -> &IntakeFormStep {
        &self.catalog.steps()[self.step_index]
    }

    pub fn current_value(&self) -> Option<FieldValue> {
        self.record.get(self.current_step().field)
    }

    pub fn record(&self) -> &IntakeFormData {
        &self.record
    }

    pub fn into_record(self) -> IntakeFormData {
        self.record
    }

    pub fn autosave_enabled(&self) -> bool {
        self.autosave_enabled
    }

    pub fn can_retreat(&self) -> bool {
        self.step_index > 0
    }

    /// The explicit "Next" control is offered for optional steps and answered steps.
    pub fn shows_next(&self) -> bool {
        self.current_step().optional
            || self
                .current_value()
                .is_some_and(|value| !value.is_empty())
    }

    pub fn progress(&self) -> Vec<CategoryProgress> {
        category_progress(&self.catalog, self.step_index)
    }

    pub fn advance(&mut self) -> StepOutcome {
        let last = self.catalog.last_index();
        if self.step_index >= last {
            return StepOutcome::Completed;
        }
        self.step_index = (self.step_index + 1).min(last);
        StepOutcome::Moved
    }

    pub fn retreat(&mut self) -> StepOutcome {
        if self.step_index == 0 {
            return StepOutcome::Stayed;
        }
        self.step_index -= 1;
        StepOutcome::Moved
    }

    /// Records `value` for the current step. Single-select steps move on afterwards.
    pub async fn answer(&mut self, value: FieldValue) -> Result<StepOutcome, WizardError> {
        let field = self.current_step().field;
        let delta = IntakeFormData::with_field(field, value)?;
        self.record.merge(&delta);
        self.persist(&delta).await?;

        if self.current_step().multiselect {
            Ok(StepOutcome::Stayed)
        } else {
            Ok(self.advance())
        }
    }

    /// Selects or deselects one option of a multi-select step.
    pub async fn toggle_option(&mut self, option: &str) -> Result<StepOutcome, WizardError> {
        let step = self.current_step();
        if !step.multiselect {
            return Err(WizardError::NotMultiSelect { field: step.field });
        }

        let mut values = match self.current_value() {
            Some(FieldValue::Multi(values)) => values,
            _ => Vec::new(),
        };
        match values.iter().position(|v| v == option) {
            Some(pos) => {
                values.remove(pos);
            }
            None => values.push(option.to_string()),
        }

        self.answer(FieldValue::Multi(values)).await
    }

    /// The explicit "Next" control: saves whatever the step holds and moves on.
    pub async fn next(&mut self) -> Result<StepOutcome, WizardError> {
        let step = self.current_step();
        if !self.shows_next() {
            return Err(WizardError::AnswerRequired { field: step.field });
        }

        let field = step.field;
        let value = self
            .current_value()
            .or_else(|| step.multiselect.then(|| FieldValue::Multi(Vec::new())));
        if let Some(value) = value {
            let delta = IntakeFormData::with_field(field, value)?;
            self.record.merge(&delta);
            self.persist(&delta).await?;
        }

        Ok(self.advance())
    }

    /// Writes `delta` to the resource when autosave is on.
    ///
    /// Without an id the whole record is created and replaced by the server's copy;
    /// afterwards only deltas are sent.
    pub async fn persist(&mut self, delta: &IntakeFormData) -> Result<(), ClientError> {
        if !self.autosave_enabled {
            return Ok(());
        }

        match self.record.id.clone() {
            None => {
                let mut payload = self.record.clone();
                payload.merge(delta);
                let saved = self.api.create_intake_form(&payload).await?;
                info!(form_id = ?saved.id, "autosave created intake form");
                self.record = saved;
            }
            Some(form_id) => {
                self.api.update_intake_form(&form_id, delta).await?;
                debug!(%form_id, "autosave updated intake form");
            }
        }
        Ok(())
    }

    /// Turns autosave on and saves everything answered so far.
    pub async fn enable_autosave(&mut self) -> Result<(), ClientError> {
        self.autosave_enabled = true;
        let full = self.record.clone();
        self.persist(&full).await
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
