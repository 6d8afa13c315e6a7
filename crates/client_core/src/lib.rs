use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{FormId, IntakeFormData},
    error::ApiError,
    protocol::{IntakeFormResponse, ListIntakeFormsResponse},
};
use tracing::{debug, warn};
use url::Url;

pub mod catalog;
pub mod error;
pub mod flow;
pub mod progress;
pub mod wizard;

pub use catalog::{Category, CategoryRange, IntakeFormStep, QuestionCatalog, SelectOption};
pub use error::ClientError;
pub use flow::{FlowError, Screen, ScreenFlow, ScreenKind, SessionListing};
pub use progress::CategoryProgress;
pub use wizard::{StepOutcome, Wizard, WizardError};

const INTAKE_FORMS_PATH: &str = "api/intake-forms";

/// The intake-form resource as seen by the wizard.
#[async_trait]
pub trait IntakeFormsApi: Send + Sync {
    async fn list_intake_forms(&self) -> Result<Vec<IntakeFormData>, ClientError>;
    /// Creates a record; the returned representation carries the server-assigned id.
    async fn create_intake_form(
        &self,
        form: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError>;
    async fn update_intake_form(
        &self,
        form_id: &FormId,
        changes: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError>;
}

pub struct HttpIntakeFormsClient {
    http: Client,
    collection_url: Url,
}

impl HttpIntakeFormsClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(server_url, Client::new())
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                url: server_url.to_string(),
                source,
            })?;
        Self::with_http_client(server_url, http)
    }

    fn with_http_client(server_url: &str, http: Client) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: server_url.to_string(),
            reason,
        };

        let mut base = Url::parse(server_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(invalid("server_url must start with http:// or https://".into()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let collection_url = base
            .join(INTAKE_FORMS_PATH)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            http,
            collection_url,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, form_id: &FormId) -> Result<Url, ClientError> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.collection_url.to_string(),
                reason: "url cannot carry path segments".into(),
            })?
            .push(form_id.as_str());
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|api_error| api_error.message)
                .unwrap_or(body);
            warn!(%url, status = status.as_u16(), %message, "intake form request rejected");
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl IntakeFormsApi for HttpIntakeFormsClient {
    async fn list_intake_forms(&self) -> Result<Vec<IntakeFormData>, ClientError> {
        let url = self.collection_url.clone();
        debug!(%url, "listing intake forms");
        let body: ListIntakeFormsResponse = self.send(self.http.get(url.clone()), &url).await?;
        Ok(body.data)
    }

    async fn create_intake_form(
        &self,
        form: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError> {
        let url = self.collection_url.clone();
        debug!(%url, "creating intake form");
        let body: IntakeFormResponse = self
            .send(self.http.post(url.clone()).json(form), &url)
            .await?;
        Ok(body.data)
    }

    async fn update_intake_form(
        &self,
        form_id: &FormId,
        changes: &IntakeFormData,
    ) -> Result<IntakeFormData, ClientError> {
        let url = self.item_url(form_id)?;
        debug!(%url, "updating intake form");
        let body: IntakeFormResponse = self
            .send(self.http.patch(url.clone()).json(changes), &url)
            .await?;
        Ok(body.data)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
