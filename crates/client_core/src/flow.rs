//! Screen sequencing: session list, intro, resume prompt, wizard, completion.

use std::{mem, sync::Arc};

use chrono::Utc;
use shared::domain::{FieldValue, FormId, IntakeFormData};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    catalog::QuestionCatalog,
    error::ClientError,
    wizard::{StepOutcome, Wizard, WizardError},
    IntakeFormsApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionListing {
    Loading,
    Loaded {
        open: Vec<IntakeFormData>,
        submitted: Vec<IntakeFormData>,
    },
    Failed(String),
}

impl SessionListing {
    fn from_records(records: Vec<IntakeFormData>) -> Self {
        let (submitted, open): (Vec<_>, Vec<_>) =
            records.into_iter().partition(IntakeFormData::is_submitted);
        SessionListing::Loaded { open, submitted }
    }
}

#[derive(Debug)]
pub enum Screen {
    OpenSessions {
        sessions: SessionListing,
        autosave: bool,
    },
    Intro {
        record: IntakeFormData,
        autosave: bool,
    },
    Resume {
        record: IntakeFormData,
    },
    Form(Wizard),
    Complete {
        record: IntakeFormData,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    OpenSessions,
    Intro,
    Resume,
    Form,
    Complete,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::OpenSessions { .. } => ScreenKind::OpenSessions,
            Screen::Intro { .. } => ScreenKind::Intro,
            Screen::Resume { .. } => ScreenKind::Resume,
            Screen::Form(_) => ScreenKind::Form,
            Screen::Complete { .. } => ScreenKind::Complete,
        }
    }

    fn session_list(autosave: bool) -> Self {
        Screen::OpenSessions {
            sessions: SessionListing::Loading,
            autosave,
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("'{action}' is not available on the {screen:?} screen")]
    InvalidAction {
        screen: ScreenKind,
        action: &'static str,
    },
    #[error("intake form {0} is not an open session")]
    UnknownSession(FormId),
    #[error("an email address is required to receive matches")]
    MissingEmail,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

pub struct ScreenFlow {
    api: Arc<dyn IntakeFormsApi>,
    catalog: Arc<QuestionCatalog>,
    screen: Screen,
}

impl ScreenFlow {
    /// Starts on the session list with autosave off. Call [`ScreenFlow::refresh_sessions`] to load it.
    pub fn new(api: Arc<dyn IntakeFormsApi>, catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            api,
            catalog,
            screen: Screen::session_list(false),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        match &self.screen {
            Screen::Form(wizard) => Some(wizard),
            _ => None,
        }
    }

    /// Fetches the listing. A failed fetch is shown on screen rather than returned.
    pub async fn refresh_sessions(&mut self) -> Result<(), FlowError> {
        if self.kind() != ScreenKind::OpenSessions {
            return Err(self.invalid("refresh sessions"));
        }

        let listing = match self.api.list_intake_forms().await {
            Ok(records) => SessionListing::from_records(records),
            Err(error) => {
                warn!(%error, "failed to load intake form sessions");
                SessionListing::Failed(error.to_string())
            }
        };
        if let Screen::OpenSessions { sessions, .. } = &mut self.screen {
            *sessions = listing;
        }
        Ok(())
    }

    pub fn create_new(&mut self) -> Result<(), FlowError> {
        let Screen::OpenSessions { autosave, .. } = self.screen else {
            return Err(self.invalid("create new session"));
        };

        self.screen = Screen::Intro {
            record: IntakeFormData::default(),
            autosave,
        };
        Ok(())
    }

    /// Picks an open session. Resuming always implies autosave.
    pub fn resume_session(&mut self, form_id: &FormId) -> Result<(), FlowError> {
        let Screen::OpenSessions { sessions, .. } = &self.screen else {
            return Err(self.invalid("resume session"));
        };

        let record = match sessions {
            SessionListing::Loaded { open, .. } => open
                .iter()
                .find(|record| record.id.as_ref() == Some(form_id))
                .cloned(),
            _ => None,
        }
        .ok_or_else(|| FlowError::UnknownSession(form_id.clone()))?;

        self.screen = Screen::Resume { record };
        Ok(())
    }

    pub fn set_autosave(&mut self, enabled: bool) -> Result<(), FlowError> {
        match &mut self.screen {
            Screen::Intro { autosave, .. } => {
                *autosave = enabled;
                Ok(())
            }
            _ => Err(self.invalid("toggle autosave")),
        }
    }

    /// Leaves the intro. With autosave on, the remote record is created up front.
    pub async fn start(&mut self) -> Result<(), FlowError> {
        let Screen::Intro { record, autosave } = &self.screen else {
            return Err(self.invalid("start"));
        };

        let autosave = *autosave;
        let record = if autosave && record.id.is_none() {
            let created = self.api.create_intake_form(record).await?;
            info!(form_id = ?created.id, "created intake form before first answer");
            created
        } else {
            record.clone()
        };

        self.screen = Screen::Form(self.wizard_for(record, autosave, false));
        Ok(())
    }

    pub fn review_answers(&mut self) -> Result<(), FlowError> {
        self.resume(false, "review saved answers")
    }

    pub fn skip_to_unanswered(&mut self) -> Result<(), FlowError> {
        self.resume(true, "go to next question")
    }

    fn resume(&mut self, skip_answered: bool, action: &'static str) -> Result<(), FlowError> {
        match self.take_screen() {
            Screen::Resume { record } => {
                self.screen = Screen::Form(self.wizard_for(record, true, skip_answered));
                Ok(())
            }
            other => {
                self.screen = other;
                Err(self.invalid(action))
            }
        }
    }

    pub async fn answer(&mut self, value: FieldValue) -> Result<(), FlowError> {
        let outcome = self.form_mut("answer")?.answer(value).await?;
        self.after_step(outcome);
        Ok(())
    }

    pub async fn toggle_option(&mut self, option: &str) -> Result<(), FlowError> {
        let outcome = self.form_mut("toggle option")?.toggle_option(option).await?;
        self.after_step(outcome);
        Ok(())
    }

    pub async fn next(&mut self) -> Result<(), FlowError> {
        let outcome = self.form_mut("next")?.next().await?;
        self.after_step(outcome);
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), FlowError> {
        self.form_mut("previous")?.retreat();
        Ok(())
    }

    pub async fn enable_autosave(&mut self) -> Result<(), FlowError> {
        self.form_mut("enable autosave")?.enable_autosave().await?;
        Ok(())
    }

    /// Final write: attaches email and submission time, then creates or updates.
    ///
    /// On failure the completion screen and its record are kept for a retry.
    pub async fn submit(&mut self, email: &str) -> Result<IntakeFormData, FlowError> {
        let Screen::Complete { record } = &self.screen else {
            return Err(self.invalid("submit"));
        };

        let email = email.trim();
        if email.is_empty() {
            return Err(FlowError::MissingEmail);
        }

        let mut finished = record.clone();
        finished.email = Some(email.to_string());
        finished.submitted_at = Some(Utc::now());

        let saved = match finished.id.clone() {
            Some(form_id) => self.api.update_intake_form(&form_id, &finished).await?,
            None => self.api.create_intake_form(&finished).await?,
        };
        info!(form_id = ?saved.id, "intake form submitted");

        self.screen = Screen::session_list(false);
        self.refresh_sessions().await?;
        Ok(saved)
    }

    fn wizard_for(&self, record: IntakeFormData, autosave: bool, skip_answered: bool) -> Wizard {
        Wizard::new(
            self.api.clone(),
            self.catalog.clone(),
            record,
            autosave,
            skip_answered,
        )
    }

    fn form_mut(&mut self, action: &'static str) -> Result<&mut Wizard, FlowError> {
        match &mut self.screen {
            Screen::Form(wizard) => Ok(wizard),
            other => Err(FlowError::InvalidAction {
                screen: other.kind(),
                action,
            }),
        }
    }

    fn after_step(&mut self, outcome: StepOutcome) {
        if outcome != StepOutcome::Completed {
            return;
        }
        self.screen = match self.take_screen() {
            Screen::Form(wizard) => Screen::Complete {
                record: wizard.into_record(),
            },
            other => other,
        };
    }

    fn take_screen(&mut self) -> Screen {
        mem::replace(&mut self.screen, Screen::session_list(false))
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidAction {
            screen: self.screen.kind(),
            action,
        }
    }
}

#[cfg(test)]
#[path = "tests/flow_tests.rs"]
mod tests;
