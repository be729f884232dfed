use anyhow::{Context, Result, anyhow};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{ErrorResponse, LanguageQuery, TranslateResponse};
use super::state::ServerState;
use crate::api::{Backend, error_message};
use crate::reader::{
    ChapterState, ChapterView, DisplayLanguage, HtmlOptions, ReaderSession, render_html,
    render_overlay,
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Loads the session's chapter, then serves the reader until the process stops.
pub async fn run_server<B: Backend>(state: ServerState<B>, addr: &str) -> Result<()> {
    {
        let mut session = state.session.write().await;
        if let ChapterState::LoadFailed(message) = session.load(&state.backend).await {
            return Err(anyhow!("{}: {}", state.messages.t("reader.not_found"), message));
        }
    }
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("reader preview on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router<B: Backend>(state: Arc<ServerState<B>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(reader_page::<B>))
        .route("/chapter.json", get(chapter_json::<B>))
        .route("/layers/:id/translate", post(translate::<B>))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn reader_page<B: Backend>(
    State(state): State<Arc<ServerState<B>>>,
    Query(query): Query<LanguageQuery>,
) -> Result<Html<String>, HandlerError> {
    let session = state.session.read().await;
    let view = current_view(&state, &session, query.lang.as_deref())?;
    let options = HtmlOptions {
        translate_action: true,
        languages: session.supported_languages().to_vec(),
    };
    render_html(&view, &state.messages, &options)
        .map(Html)
        .map_err(|err| error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}

async fn chapter_json<B: Backend>(
    State(state): State<Arc<ServerState<B>>>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<ChapterView>, HandlerError> {
    let session = state.session.read().await;
    current_view(&state, &session, query.lang.as_deref()).map(Json)
}

async fn translate<B: Backend>(
    State(state): State<Arc<ServerState<B>>>,
    Path(layer_id): Path<String>,
    Query(query): Query<LanguageQuery>,
    headers: HeaderMap,
) -> Result<axum::response::Response, HandlerError> {
    let language = {
        let session = state.session.read().await;
        let language = parse_language(&state, &session, query.lang.as_deref())?;
        let known = session
            .chapter()
            .is_some_and(|chapter| chapter.find_layer(&layer_id).is_some());
        if !known {
            return Err(error(
                StatusCode::NOT_FOUND,
                format!("unknown layer: {}", layer_id),
            ));
        }
        language
    };
    let Some(target) = language.target().map(str::to_string) else {
        return Err(error(
            StatusCode::BAD_REQUEST,
            state.messages.t("reader.needs_language"),
        ));
    };

    let mut translation = state
        .backend
        .translate_layer(&layer_id, &target)
        .await
        .map_err(|err| {
            warn!("layer {} failed to translate: {:#}", layer_id, err);
            error(
                StatusCode::BAD_GATEWAY,
                format!(
                    "{}: {}",
                    state.messages.t("reader.translation_failed"),
                    error_message(&err)
                ),
            )
        })?;
    if translation.language_code.trim().is_empty() {
        translation.language_code = target.clone();
    }
    state
        .session
        .write()
        .await
        .merge(&layer_id, translation.clone());

    if wants_json(&headers) {
        return Ok(Json(TranslateResponse {
            layer_id,
            translation,
        })
        .into_response());
    }
    Ok(Redirect::to(&format!("/?lang={}", target)).into_response())
}

fn current_view<B: Backend>(
    state: &ServerState<B>,
    session: &ReaderSession,
    lang: Option<&str>,
) -> Result<ChapterView, HandlerError> {
    let language = parse_language(state, session, lang)?;
    let chapter = session
        .chapter()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, state.messages.t("reader.not_found")))?;
    Ok(render_overlay(chapter, &language))
}

fn parse_language<B: Backend>(
    state: &ServerState<B>,
    session: &ReaderSession,
    lang: Option<&str>,
) -> Result<DisplayLanguage, HandlerError> {
    match lang {
        None => Ok(session.language().clone()),
        Some(code) => DisplayLanguage::parse(code, session.supported_languages()).map_err(|err| {
            error(
                StatusCode::BAD_REQUEST,
                format!("{}: {}", state.messages.t("reader.unknown_language"), err),
            )
        }),
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn error(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
