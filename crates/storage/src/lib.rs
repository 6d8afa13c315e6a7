use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{FormId, IntakeFormData};

const SELECT_INTAKE_FORM_COLUMNS: &str = "SELECT id, email, submitted_at, reasons_for_therapy, \
     goals_in_therapy, age_group, therapist_knowledge, therapist_gender, session_activeness \
     FROM intake_forms";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        // Every connection to an in-memory database sees its own empty schema.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores a new form under a freshly generated id. Any id on `form` is ignored.
    pub async fn insert_intake_form(&self, form: &IntakeFormData) -> Result<FormId> {
        let form_id = FormId::new(Uuid::new_v4().to_string());

        sqlx::query(
            "INSERT INTO intake_forms (
                id, email, submitted_at, reasons_for_therapy, goals_in_therapy,
                age_group, therapist_knowledge, therapist_gender, session_activeness
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(form_id.as_str())
        .bind(form.email.as_deref())
        .bind(form.submitted_at)
        .bind(encode_string_list(form.reasons_for_therapy.as_deref())?)
        .bind(encode_string_list(form.goals_in_therapy.as_deref())?)
        .bind(form.age_group.as_deref())
        .bind(encode_string_list(form.therapist_knowledge.as_deref())?)
        .bind(form.therapist_gender.as_deref())
        .bind(form.session_activeness.as_deref())
        .execute(&self.pool)
        .await
        .context("failed to insert intake form")?;

        Ok(form_id)
    }

    /// Overwrites the columns present in `changes`. Returns `false` when no row matched.
    pub async fn update_intake_form(
        &self,
        form_id: &FormId,
        changes: &IntakeFormData,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE intake_forms SET
                email = COALESCE(?2, email),
                submitted_at = COALESCE(?3, submitted_at),
                reasons_for_therapy = COALESCE(?4, reasons_for_therapy),
                goals_in_therapy = COALESCE(?5, goals_in_therapy),
                age_group = COALESCE(?6, age_group),
                therapist_knowledge = COALESCE(?7, therapist_knowledge),
                therapist_gender = COALESCE(?8, therapist_gender),
                session_activeness = COALESCE(?9, session_activeness)
             WHERE id = ?1",
        )
        .bind(form_id.as_str())
        .bind(changes.email.as_deref())
        .bind(changes.submitted_at)
        .bind(encode_string_list(changes.reasons_for_therapy.as_deref())?)
        .bind(encode_string_list(changes.goals_in_therapy.as_deref())?)
        .bind(changes.age_group.as_deref())
        .bind(encode_string_list(changes.therapist_knowledge.as_deref())?)
        .bind(changes.therapist_gender.as_deref())
        .bind(changes.session_activeness.as_deref())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update intake form {form_id}"))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_intake_form(&self, form_id: &FormId) -> Result<Option<IntakeFormData>> {
        let row = sqlx::query(&format!("{SELECT_INTAKE_FORM_COLUMNS} WHERE id = ?"))
            .bind(form_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load intake form {form_id}"))?;

        row.as_ref().map(intake_form_from_row).transpose()
    }

    /// All forms in creation order.
    pub async fn list_intake_forms(&self) -> Result<Vec<IntakeFormData>> {
        let rows = sqlx::query(&format!(
            "{SELECT_INTAKE_FORM_COLUMNS} ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list intake forms")?;

        rows.iter().map(intake_form_from_row).collect()
    }
}

fn intake_form_from_row(row: &SqliteRow) -> Result<IntakeFormData> {
    Ok(IntakeFormData {
        id: Some(FormId::new(row.try_get::<String, _>("id")?)),
        email: row.try_get("email")?,
        submitted_at: row.try_get::<Option<DateTime<Utc>>, _>("submitted_at")?,
        reasons_for_therapy: decode_string_list(row.try_get("reasons_for_therapy")?)?,
        goals_in_therapy: decode_string_list(row.try_get("goals_in_therapy")?)?,
        age_group: row.try_get("age_group")?,
        therapist_knowledge: decode_string_list(row.try_get("therapist_knowledge")?)?,
        therapist_gender: row.try_get("therapist_gender")?,
        session_activeness: row.try_get("session_activeness")?,
    })
}

// Multi-select answers are kept as JSON arrays.
fn encode_string_list(values: Option<&[String]>) -> Result<Option<String>> {
    values
        .map(|values| serde_json::to_string(values).context("failed to encode answer list"))
        .transpose()
}

fn decode_string_list(raw: Option<String>) -> Result<Option<Vec<String>>> {
    raw.map(|raw| {
        serde_json::from_str(&raw).with_context(|| format!("malformed stored answer list '{raw}'"))
    })
    .transpose()
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
