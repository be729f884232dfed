use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use webtoon_reader_rust::admin;
use webtoon_reader_rust::api::{
    ApiClient, CreateSeriesRequest, SeriesStatus, UnlockType, Visibility, error_message,
};
use webtoon_reader_rust::auth::{self, SignupForm};
use webtoon_reader_rust::catalog::{self, Localizer};
use webtoon_reader_rust::creator;
use webtoon_reader_rust::localized::MultilingualText;
use webtoon_reader_rust::messages::Messages;
use webtoon_reader_rust::models::{Role, User};
use webtoon_reader_rust::preferences::PreferenceStore;
use webtoon_reader_rust::{ApiError, ChapterState, ReaderSession};

#[derive(Default)]
struct Recorded {
    translate_bodies: Vec<Value>,
    authorization: Vec<Option<String>>,
    logins: Vec<Value>,
    uploads: Vec<(String, usize)>,
    mutations: Vec<Mutation>,
}

#[derive(Debug, Clone)]
struct Mutation {
    path: String,
    authorization: Option<String>,
    body: Value,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn record(recorded: &Shared, path: String, headers: &HeaderMap, body: Value) {
    recorded.lock().unwrap().mutations.push(Mutation {
        path,
        authorization: bearer(headers),
        body,
    });
}

type Shared = Arc<Mutex<Recorded>>;

fn chapter_json() -> Value {
    json!({
        "id": "ch-1",
        "title": "Arrival",
        "images": [
            {
                "id": "img-1",
                "image_url": "https://cdn.example.com/1.jpg",
                "order": 1,
                "text_layers": [
                    {
                        "id": "layer-1",
                        "original_text": "Hello",
                        "position_x": 10,
                        "position_y": 20,
                        "width": 30,
                        "height": 12,
                        "type": "bubble",
                        "translations": [
                            { "language_code": "th", "translated_text": "old" },
                            { "language_code": "th", "translated_text": "ฮัลโหล" }
                        ]
                    },
                    {
                        "id": "broken",
                        "original_text": "Crash",
                        "position_x": 50,
                        "position_y": 50,
                        "width": 20,
                        "height": 10,
                        "type": "sfx",
                        "translations": []
                    }
                ]
            }
        ]
    })
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

async fn get_chapter(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "ch-1" {
        return (StatusCode::OK, Json(chapter_json()));
    }
    error_body(StatusCode::NOT_FOUND, "Chapter not found")
}

async fn translate_layer(
    State(recorded): State<Shared>,
    Path(layer_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    {
        let mut recorded = recorded.lock().unwrap();
        recorded.translate_bodies.push(body.clone());
        recorded.authorization.push(bearer(&headers));
    }
    if layer_id == "broken" {
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "translator offline");
    }
    let lang = body["target_lang"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "id": format!("tr-{}", layer_id),
            "language_code": lang,
            "translated_text": format!("[{}] {}", lang, layer_id),
            "is_machine_translated": true
        })),
    )
}

async fn login(State(recorded): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    recorded.lock().unwrap().logins.push(body.clone());
    if body["password"] != "correct-horse" {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    (
        StatusCode::OK,
        Json(json!({
            "token": "tok-123",
            "user": {
                "id": "u-1",
                "username": "mali",
                "email": "mali@example.com",
                "role": "creator"
            }
        })),
    )
}

async fn signup(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "taken@example.com" {
        return error_body(StatusCode::CONFLICT, "Email already registered");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "id": "u-1", "email": body["email"] })),
    )
}

async fn get_series(Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    error_body(StatusCode::NOT_FOUND, "series missing")
}

async fn list_series(State(recorded): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&recorded, "GET /series".to_string(), &headers, Value::Null);
    Json(json!([
        { "id": "s-1", "title": { "en": "The Tower", "th": "หอคอย" }, "author": "Mali" },
        { "id": "s-2", "title": "Legacy Plain Title" }
    ]))
}

/// Mirrors the backend: the title must be an `{en, th}` object with an
/// English entry.
async fn create_series(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&recorded, "POST /creator/series".to_string(), &headers, body.clone());
    if bearer(&headers).is_none() {
        return error_body(StatusCode::UNAUTHORIZED, "Missing token");
    }
    let Some(title) = body["title"].as_object() else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid request");
    };
    let english = title.get("en").and_then(Value::as_str).unwrap_or_default();
    if english.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "English title is required");
    }
    if english == "Taken" {
        return error_body(StatusCode::CONFLICT, "Series already exists");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "id": "s-new", "title": body["title"], "status": body["status"] })),
    )
}

async fn become_creator(State(recorded): State<Shared>, headers: HeaderMap) -> StatusCode {
    record(&recorded, "POST /users/become-creator".to_string(), &headers, Value::Null);
    StatusCode::OK
}

async fn ban_user(
    State(recorded): State<Shared>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    record(&recorded, format!("POST /admin/users/{}/ban", user_id), &headers, Value::Null);
    StatusCode::OK
}

async fn upload(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    recorded.lock().unwrap().uploads.push((content_type, body.len()));
    (
        StatusCode::OK,
        Json(json!({ "url": "https://cdn.example.com/uploads/cover.png" })),
    )
}

async fn spawn_backend() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/api/chapters/:id", get(get_chapter))
        .route("/api/creator/layers/:id/translate", post(translate_layer))
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/series", get(list_series))
        .route("/api/series/:id", get(get_series))
        .route("/api/creator/series", post(create_series))
        .route("/api/users/become-creator", post(become_creator))
        .route("/api/admin/users/:id/ban", post(ban_user))
        .route("/api/upload", post(upload))
        .with_state(recorded.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), recorded)
}

fn supported() -> Vec<String> {
    vec!["en".to_string(), "th".to_string()]
}

#[tokio::test]
async fn reader_session_loads_and_translates_through_the_api() {
    let (base, recorded) = spawn_backend().await;
    let client = ApiClient::new(&base).unwrap().with_token(Some("tok-123".to_string()));
    let mut session = ReaderSession::new("ch-1", supported());
    assert!(matches!(session.load(&client).await, ChapterState::Loaded(_)));

    let layer = session.chapter().unwrap().find_layer("layer-1").unwrap();
    assert_eq!(layer.translations.len(), 1);
    assert_eq!(layer.translations[0].translated_text, "ฮัลโหล");

    session.set_language("en").unwrap();
    let translation = session.translate(&client, "layer-1").await.unwrap();
    assert_eq!(translation.translated_text, "[en] layer-1");
    assert!(translation.is_machine_translated);

    let view = session.view().unwrap();
    assert_eq!(
        view.region("layer-1").unwrap().content.text(),
        Some("[en] layer-1")
    );

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.translate_bodies, vec![json!({ "target_lang": "en" })]);
    assert_eq!(
        recorded.authorization,
        vec![Some("Bearer tok-123".to_string())]
    );
}

#[tokio::test]
async fn failed_translation_surfaces_backend_message() {
    let (base, _) = spawn_backend().await;
    let client = ApiClient::new(&base).unwrap();
    let mut session = ReaderSession::new("ch-1", supported());
    session.load(&client).await;
    session.set_language("th").unwrap();
    let before = session.chapter().cloned();

    let err = session.translate(&client, "broken").await.unwrap_err();
    let api = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api.status, Some(500));
    assert_eq!(error_message(&err), "translator offline");
    assert_eq!(session.chapter().cloned(), before);
    assert!(session.view().unwrap().region("broken").unwrap().content.needs_translation());
}

#[tokio::test]
async fn missing_chapter_is_terminal() {
    let (base, _) = spawn_backend().await;
    let client = ApiClient::new(&base).unwrap();
    let mut session = ReaderSession::new("ch-404", supported());
    assert_eq!(
        session.load(&client).await,
        &ChapterState::LoadFailed("Chapter not found".to_string())
    );
    assert!(session.view().is_none());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ApiClient::new(&format!("http://{}/api", addr)).unwrap();
    let err = client.get_chapter("ch-1").await.unwrap_err();
    let api = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api.status, None);
}

#[tokio::test]
async fn login_persists_session_and_rejects_bad_password() {
    let (base, recorded) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::in_dir(dir.path());
    let client = ApiClient::new(&base).unwrap();

    let err = auth::login(&client, &store, "mali", "wrong-pass").await.unwrap_err();
    assert_eq!(error_message(&err), "Invalid credentials");
    assert!(store.load().unwrap().session.is_none());

    let stored = auth::login(&client, &store, " mali ", "correct-horse").await.unwrap();
    assert_eq!(stored.token, "tok-123");
    assert_eq!(store.load().unwrap().token(), Some("tok-123".to_string()));
    assert_eq!(recorded.lock().unwrap().logins[1]["identifier"], "mali");

    assert!(auth::logout(&store).unwrap());
    assert!(store.load().unwrap().session.is_none());
}

#[tokio::test]
async fn signup_logs_in_with_the_new_email() {
    let (base, recorded) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::in_dir(dir.path());
    let client = ApiClient::new(&base).unwrap();
    let messages = Messages::load("en").unwrap();
    let form = SignupForm {
        username: "mali".to_string(),
        email: "mali@example.com".to_string(),
        password: "correct-horse".to_string(),
        confirm_password: "correct-horse".to_string(),
    };

    let stored = auth::signup(&client, &store, &form, &messages).await.unwrap();
    assert_eq!(stored.user.username.as_deref(), Some("mali"));
    assert_eq!(
        recorded.lock().unwrap().logins,
        vec![json!({ "identifier": "mali@example.com", "password": "correct-horse" })]
    );

    let taken = SignupForm {
        email: "taken@example.com".to_string(),
        ..form
    };
    let err = auth::signup(&client, &store, &taken, &messages).await.unwrap_err();
    assert_eq!(error_message(&err), "Email already registered");
}

#[tokio::test]
async fn missing_series_shows_not_found() {
    let (base, _) = spawn_backend().await;
    let client = ApiClient::new(&base).unwrap();
    let messages = Messages::load("en").unwrap();
    let localizer = Localizer {
        messages: &messages,
        default_language: "en",
    };
    let err = catalog::show_series(&client, "s-9", &localizer).await.unwrap_err();
    assert_eq!(err.to_string(), "Series Not Found");
}

#[tokio::test]
async fn upload_checks_file_before_sending() {
    let (base, recorded) = spawn_backend().await;
    let client = ApiClient::new(&base).unwrap().with_token(Some("tok-123".to_string()));
    let messages = Messages::load("en").unwrap();
    let dir = tempfile::tempdir().unwrap();

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();
    assert!(creator::upload_image(&client, &notes, &messages).await.is_err());
    assert!(recorded.lock().unwrap().uploads.is_empty());

    let cover = dir.path().join("cover.png");
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    std::fs::write(&cover, png).unwrap();
    let response = creator::upload_image(&client, &cover, &messages).await.unwrap();
    assert_eq!(response.url, "https://cdn.example.com/uploads/cover.png");
    let uploads = recorded.lock().unwrap().uploads.clone();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].0.starts_with("multipart/form-data"));
}

fn authorized(base: &str) -> ApiClient {
    ApiClient::new(base).unwrap().with_token(Some("tok-123".to_string()))
}

fn mutations(recorded: &Shared) -> Vec<Mutation> {
    recorded.lock().unwrap().mutations.clone()
}

fn publish_form(title: &str) -> CreateSeriesRequest {
    CreateSeriesRequest {
        title: MultilingualText::en_th(title, "หอคอย"),
        description: MultilingualText::en_th("A climb.", ""),
        author: " Mali ".to_string(),
        genres: vec!["Fantasy".to_string(), "Fantasy".to_string()],
        tags: creator::tags_from(&["magic".to_string()]),
        cover_image_url: "https://cdn.example.com/cover.png".to_string(),
        status: SeriesStatus::Ongoing,
        visibility: Visibility::Unlisted,
        monetization_enabled: true,
        monetization_type: UnlockType::Premium,
        ..CreateSeriesRequest::default()
    }
}

#[tokio::test]
async fn create_series_sends_the_publish_form() {
    let (base, recorded) = spawn_backend().await;
    let messages = Messages::load("en").unwrap();

    let series = creator::create_series(&authorized(&base), &publish_form("The Tower"), &messages)
        .await
        .unwrap();
    assert_eq!(series.id, "s-new");
    assert_eq!(series.title.resolve("th"), "หอคอย");

    let sent = mutations(&recorded);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, "POST /creator/series");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer tok-123"));
    let body = &sent[0].body;
    assert_eq!(body["title"], json!({ "en": "The Tower", "th": "หอคอย" }));
    assert_eq!(body["description"], json!({ "en": "A climb.", "th": "" }));
    assert_eq!(body["author"], "Mali");
    assert_eq!(body["genres"], json!(["Fantasy"]));
    assert_eq!(body["tags"], json!([{ "en": "magic", "th": "magic" }]));
    assert_eq!(body["cover_image_url"], "https://cdn.example.com/cover.png");
    assert_eq!(body["status"], "ongoing");
    assert_eq!(body["visibility"], "unlisted");
    assert_eq!(body["nsfw"], false);
    assert_eq!(body["monetization_enabled"], true);
    assert_eq!(body["monetization_type"], "premium");
    assert_eq!(body["default_unlock_type"], "free");
}

#[tokio::test]
async fn create_series_failures_are_reported_without_side_effects() {
    let (base, recorded) = spawn_backend().await;
    let messages = Messages::load("en").unwrap();

    let err = creator::create_series(&authorized(&base), &publish_form("Taken"), &messages)
        .await
        .unwrap_err();
    assert_eq!(error_message(&err), "Series already exists");

    let thai_only = CreateSeriesRequest {
        title: MultilingualText::en_th("", "หอคอย"),
        ..publish_form("")
    };
    let err = creator::create_series(&authorized(&base), &thai_only, &messages)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "English title is required");

    let anonymous = ApiClient::new(&base).unwrap();
    let err = creator::create_series(&anonymous, &publish_form("The Tower"), &messages)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please log in first");

    assert_eq!(mutations(&recorded).len(), 1);
}

#[tokio::test]
async fn local_cover_is_uploaded_before_use() {
    let (base, recorded) = spawn_backend().await;
    let messages = Messages::load("en").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    std::fs::write(&cover, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D]).unwrap();
    let client = authorized(&base);

    let url = creator::resolve_image(&client, cover.to_str().unwrap(), &messages)
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/uploads/cover.png");
    let remote = creator::resolve_image(&client, "https://img.example.com/b.jpg", &messages)
        .await
        .unwrap();
    assert_eq!(remote, "https://img.example.com/b.jpg");
    assert_eq!(recorded.lock().unwrap().uploads.len(), 1);
}

#[tokio::test]
async fn become_creator_and_list_series_hit_their_routes() {
    let (base, recorded) = spawn_backend().await;
    let messages = Messages::load("en").unwrap();
    let client = authorized(&base);

    creator::become_creator(&client, &messages).await.unwrap();
    let listing = catalog::list_series(
        &client,
        &Localizer {
            messages: &messages,
            default_language: "en",
        },
    )
    .await
    .unwrap();
    assert!(listing.contains("The Tower"));
    assert!(listing.contains("Legacy Plain Title"));

    let sent = mutations(&recorded);
    let paths = sent.iter().map(|call| call.path.as_str()).collect::<Vec<_>>();
    assert_eq!(paths, vec!["POST /users/become-creator", "GET /series"]);
    assert!(sent.iter().all(|call| call.authorization.as_deref() == Some("Bearer tok-123")));
}

#[tokio::test]
async fn ban_is_sent_only_for_admins() {
    let (base, recorded) = spawn_backend().await;
    let messages = Messages::load("en").unwrap();
    let client = authorized(&base);
    let user = |role| User {
        id: "u-1".to_string(),
        username: Some("staff".to_string()),
        email: "staff@example.com".to_string(),
        role,
    };

    let err = admin::ban_user(&client, Some(&user(Role::Creator)), "u-9", &messages)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Access Denied");
    assert!(admin::ban_user(&client, None, "u-9", &messages).await.is_err());
    assert!(mutations(&recorded).is_empty());

    admin::ban_user(&client, Some(&user(Role::Admin)), "u 9", &messages)
        .await
        .unwrap();
    let sent = mutations(&recorded);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, "POST /admin/users/u 9/ban");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn truncated_body_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"id\"";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = ApiClient::new(&format!("http://{}/api", addr)).unwrap();
    let err = client.get_chapter("ch-1").await.unwrap_err();
    let api = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api.status, None);
    assert!(api.message.starts_with("failed to read response body"));
}
