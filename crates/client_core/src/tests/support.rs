//! In-memory stand-in for the intake-form resource that records every call.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::domain::{FieldKey, FormId, IntakeFormData};
use tokio::sync::Mutex;

use crate::{
    catalog::{Category, IntakeFormStep, QuestionCatalog},
    ClientError, IntakeFormsApi,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    List,
    Create(IntakeFormData),
    Update(FormId, IntakeFormData),
}

#[derive(Default)]
pub(crate) struct RecordingApi {
    calls: Mutex<Vec<ApiCall>>,
    forms: Mutex<Vec<IntakeFormData>>,
    failing: AtomicBool,
}

impl RecordingApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_forms(forms: Vec<IntakeFormData>) -> Arc<Self> {
        Arc::new(Self {
            forms: Mutex::new(forms),
            ..Default::default()
        })
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    /// Creates and updates only.
    pub(crate) async fn writes(&self) -> Vec<ApiCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| !matches!(call, ApiCall::List))
            .collect()
    }

    async fn record(&self, call: ApiCall) -> Result<(), ClientError> {
        self.calls.lock().await.push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                url: "memory://intake-forms".into(),
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IntakeFormsApi for RecordingApi {
    async fn list_intake_forms(&self) -> Result<Vec<IntakeFormData>, ClientError> {
        self.record(ApiCall::List).await?;
        Ok(self.forms.lock().await.clone())
    }

    async fn create_intake_form(
        &self,
        form: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError> {
        self.record(ApiCall::Create(form.clone())).await?;
        let mut forms = self.forms.lock().await;
        let mut stored = form.clone();
        stored.id = Some(FormId::new(format!("form-{}", forms.len() + 1)));
        forms.push(stored.clone());
        Ok(stored)
    }

    async fn update_intake_form(
        &self,
        form_id: &FormId,
        changes: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError> {
        self.record(ApiCall::Update(form_id.clone(), changes.clone()))
            .await?;
        let mut forms = self.forms.lock().await;
        let stored = forms
            .iter_mut()
            .find(|form| form.id.as_ref() == Some(form_id))
            .ok_or_else(|| ClientError::Status {
                url: format!("memory://intake-forms/{form_id}"),
                status: 404,
                message: format!("intake form {form_id} not found"),
            })?;
        stored.merge(changes);
        Ok(stored.clone())
    }
}

/// Three single-select steps over two categories.
pub(crate) fn three_step_catalog() -> Arc<QuestionCatalog> {
    Arc::new(
        QuestionCatalog::new(vec![
            IntakeFormStep::new(Category::PersonalSituation, FieldKey::AgeGroup, "Age?")
                .plain_options(["18-25", "26-35"]),
            IntakeFormStep::new(
                Category::TherapistPreferences,
                FieldKey::TherapistGender,
                "Gender?",
            )
            .plain_options(["Woman", "Man", "Any"]),
            IntakeFormStep::new(
                Category::TherapistPreferences,
                FieldKey::SessionActiveness,
                "Activeness?",
            )
            .plain_options(["Active", "Passive", "Any"]),
        ])
        .expect("three step catalog"),
    )
}

pub(crate) fn standard_catalog() -> Arc<QuestionCatalog> {
    Arc::new(QuestionCatalog::standard().expect("standard catalog"))
}
