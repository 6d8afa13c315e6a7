use shared::{
    domain::{FormId, IntakeFormData},
    error::{ApiError, ErrorCode},
};
use storage::Storage;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_intake_forms(ctx: &ApiContext) -> Result<Vec<IntakeFormData>, ApiError> {
    ctx.storage.list_intake_forms().await.map_err(internal)
}

/// Stores `form` under a server-assigned id and returns the stored representation.
pub async fn create_intake_form(
    ctx: &ApiContext,
    form: &IntakeFormData,
) -> Result<IntakeFormData, ApiError> {
    let form_id = ctx
        .storage
        .insert_intake_form(form)
        .await
        .map_err(internal)?;
    info!(%form_id, answered = form.answered_count(), "intake form created");
    load_intake_form(ctx, &form_id).await
}

/// Applies `changes` to an open form. Submitted forms are returned unchanged.
pub async fn update_intake_form(
    ctx: &ApiContext,
    form_id: &FormId,
    changes: &IntakeFormData,
) -> Result<IntakeFormData, ApiError> {
    let saved = load_intake_form(ctx, form_id).await?;
    if saved.is_submitted() {
        debug!(%form_id, "ignoring update to submitted intake form");
        return Ok(saved);
    }

    let matched = ctx
        .storage
        .update_intake_form(form_id, changes)
        .await
        .map_err(internal)?;
    if !matched {
        return Err(not_found(form_id));
    }
    if changes.is_submitted() {
        info!(%form_id, "intake form submitted");
    }
    load_intake_form(ctx, form_id).await
}

async fn load_intake_form(ctx: &ApiContext, form_id: &FormId) -> Result<IntakeFormData, ApiError> {
    ctx.storage
        .get_intake_form(form_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(form_id))
}

fn not_found(form_id: &FormId) -> ApiError {
    ApiError::not_found(format!("intake form {form_id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    #[tokio::test]
    async fn create_assigns_id_and_echoes_answers() {
        let ctx = setup().await;
        let form = IntakeFormData {
            age_group: Some("18-25".into()),
            ..Default::default()
        };
        let created = create_intake_form(&ctx, &form).await.expect("create");
        assert!(created.id.is_some());
        assert_eq!(created.age_group.as_deref(), Some("18-25"));
    }

    #[tokio::test]
    async fn update_merges_delta_into_stored_form() {
        let ctx = setup().await;
        let created = create_intake_form(&ctx, &IntakeFormData::default())
            .await
            .expect("create");
        let form_id = created.id.expect("id");

        let delta = IntakeFormData {
            goals_in_therapy: Some(vec!["Communication".into()]),
            ..Default::default()
        };
        let updated = update_intake_form(&ctx, &form_id, &delta)
            .await
            .expect("update");
        assert_eq!(
            updated.goals_in_therapy,
            Some(vec!["Communication".to_string()])
        );
        assert_eq!(updated.id, Some(form_id));
    }

    #[tokio::test]
    async fn submitted_forms_are_not_updated() {
        let ctx = setup().await;
        let submitted = IntakeFormData {
            email: Some("done@example.com".into()),
            submitted_at: Some(Utc::now()),
            ..Default::default()
        };
        let created = create_intake_form(&ctx, &submitted).await.expect("create");
        let form_id = created.id.clone().expect("id");

        let delta = IntakeFormData {
            email: Some("changed@example.com".into()),
            ..Default::default()
        };
        let after = update_intake_form(&ctx, &form_id, &delta)
            .await
            .expect("update");
        assert_eq!(after.email.as_deref(), Some("done@example.com"));
    }

    #[tokio::test]
    async fn update_of_unknown_form_is_not_found() {
        let ctx = setup().await;
        let err = update_intake_form(&ctx, &FormId::new("nope"), &IntakeFormData::default())
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_returns_every_form() {
        let ctx = setup().await;
        create_intake_form(&ctx, &IntakeFormData::default())
            .await
            .expect("first");
        create_intake_form(&ctx, &IntakeFormData::default())
            .await
            .expect("second");
        let forms = list_intake_forms(&ctx).await.expect("list");
        assert_eq!(forms.len(), 2);
    }
}
