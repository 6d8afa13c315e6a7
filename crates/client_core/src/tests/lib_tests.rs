use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use shared::{
    domain::{FieldKey, FieldValue},
    protocol::{intake_form_route, INTAKE_FORMS_ROUTE},
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    created: Arc<Mutex<Vec<IntakeFormData>>>,
    patched: Arc<Mutex<Vec<(String, IntakeFormData)>>>,
}

async fn list_forms() -> Json<ListIntakeFormsResponse> {
    let mut open = IntakeFormData::with_field(FieldKey::AgeGroup, FieldValue::Single("26-35".into()))
        .expect("single field");
    open.id = Some(FormId::new("open-1"));
    Json(ListIntakeFormsResponse { data: vec![open] })
}

async fn create_form(
    State(state): State<ServerState>,
    Json(form): Json<IntakeFormData>,
) -> (StatusCode, Json<IntakeFormResponse>) {
    state.created.lock().await.push(form.clone());
    let mut stored = form;
    stored.id = Some(FormId::new("srv-1"));
    (StatusCode::CREATED, Json(IntakeFormResponse { data: stored }))
}

async fn update_form(
    State(state): State<ServerState>,
    Path(form_id): Path<String>,
    Json(changes): Json<IntakeFormData>,
) -> Result<Json<IntakeFormResponse>, (StatusCode, Json<ApiError>)> {
    if form_id == "missing" {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found("intake form missing not found")),
        ));
    }
    state
        .patched
        .lock()
        .await
        .push((form_id.clone(), changes.clone()));
    let mut stored = changes;
    stored.id = Some(FormId::new(form_id));
    Ok(Json(IntakeFormResponse { data: stored }))
}

async fn spawn_intake_server() -> std::io::Result<(String, ServerState)> {
    let state = ServerState::default();
    let app = Router::new()
        .route(INTAKE_FORMS_ROUTE, get(list_forms).post(create_form))
        .route(&intake_form_route(":form_id"), patch(update_form))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

async fn spawn_raw_server(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route(INTAKE_FORMS_ROUTE, get(move || async move { (status, body) }));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[test]
fn collection_url_is_joined_under_server_path() {
    let client = HttpIntakeFormsClient::new("http://localhost:3005").expect("client");
    assert_eq!(
        client.collection_url().as_str(),
        "http://localhost:3005/api/intake-forms"
    );

    let prefixed = HttpIntakeFormsClient::new("https://example.test/intake").expect("client");
    assert_eq!(
        prefixed.collection_url().as_str(),
        "https://example.test/intake/api/intake-forms"
    );
}

#[test]
fn rejects_unusable_server_urls() {
    for raw in ["not a url", "ftp://example.test"] {
        let error = HttpIntakeFormsClient::new(raw).err().expect("invalid url");
        assert!(matches!(error, ClientError::InvalidUrl { .. }), "{raw}: {error}");
    }
}

#[tokio::test]
async fn lists_intake_forms_from_data_envelope() {
    let (server_url, _state) = spawn_intake_server().await.expect("spawn server");
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");

    let forms = client.list_intake_forms().await.expect("list");

    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].id, Some(FormId::new("open-1")));
    assert_eq!(forms[0].age_group.as_deref(), Some("26-35"));
}

#[tokio::test]
async fn create_posts_record_and_returns_server_copy() {
    let (server_url, state) = spawn_intake_server().await.expect("spawn server");
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");
    let form = IntakeFormData::with_field(
        FieldKey::ReasonsForTherapy,
        FieldValue::Multi(vec!["Anxiety".into(), "Trauma".into()]),
    )
    .expect("multi field");

    let created = client.create_intake_form(&form).await.expect("create");

    assert_eq!(created.id, Some(FormId::new("srv-1")));
    assert_eq!(created.reasons_for_therapy, form.reasons_for_therapy);
    assert_eq!(state.created.lock().await.as_slice(), &[form]);
}

#[tokio::test]
async fn update_patches_only_the_delta() {
    let (server_url, state) = spawn_intake_server().await.expect("spawn server");
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");
    let delta = IntakeFormData::with_field(FieldKey::TherapistGender, FieldValue::Single("Any".into()))
        .expect("single field");

    let updated = client
        .update_intake_form(&FormId::new("abc-123"), &delta)
        .await
        .expect("update");

    assert_eq!(updated.id, Some(FormId::new("abc-123")));
    let patched = state.patched.lock().await;
    assert_eq!(patched.len(), 1);
    assert_eq!(patched[0].0, "abc-123");
    assert_eq!(patched[0].1, delta);
    assert_eq!(patched[0].1.age_group, None);
}

#[tokio::test]
async fn unknown_form_surfaces_server_message() {
    let (server_url, _state) = spawn_intake_server().await.expect("spawn server");
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");

    let error = client
        .update_intake_form(&FormId::new("missing"), &IntakeFormData::default())
        .await
        .expect_err("missing form");

    assert_eq!(error.status(), Some(404));
    match error {
        ClientError::Status { message, .. } => {
            assert_eq!(message, "intake form missing not found")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn plain_text_failures_keep_the_raw_body() {
    let server_url = spawn_raw_server(StatusCode::BAD_GATEWAY, "upstream down").await;
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");

    let error = client.list_intake_forms().await.expect_err("bad gateway");

    match error {
        ClientError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server_url = spawn_raw_server(StatusCode::OK, "{\"data\": 42}").await;
    let client = HttpIntakeFormsClient::new(&server_url).expect("client");

    let error = client.list_intake_forms().await.expect_err("decode");

    assert!(matches!(error, ClientError::Decode { .. }), "{error}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = HttpIntakeFormsClient::with_timeout(
        &format!("http://{addr}"),
        Duration::from_secs(2),
    )
    .expect("client");

    let error = client.list_intake_forms().await.expect_err("transport");

    assert!(matches!(error, ClientError::Transport { .. }), "{error}");
    assert_eq!(error.status(), None);
}
