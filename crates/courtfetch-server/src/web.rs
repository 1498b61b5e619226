use crate::flash;
use crate::templates::render_index;
use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use courtfetch_core::document::DocumentKind;
use courtfetch_core::errors::FetchError;
use courtfetch_core::fetch::{FetchOutcome, FetchRequest, FetchService};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

#[derive(Clone)]
pub struct AppState {
    pub service: FetchService,
    pub history_limit: u32,
}

impl AppState {
    pub fn new(service: FetchService, history_limit: u32) -> Self {
        Self {
            service,
            history_limit: history_limit.max(1),
        }
    }
}

#[derive(Debug)]
struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(event = "request_error", error = %format!("{:#}", self.0));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "ok": false,
                "error": self.0.to_string()
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(value: E) -> Self {
        Self(value.into())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CauseListForm {
    court: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/fetch", post(fetch_case))
        .route("/download/:id", get(download))
        .route("/causelist", post(cause_list))
        .route("/api/queries", get(api_queries))
        .route("/health", get(health))
        .with_state(state)
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| anyhow!("task join error: {err}"))?
        .map_err(Into::into)
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let store = state.service.store.clone();
    let limit = state.history_limit;
    let rows = run_blocking(move || store.recent(limit)).await?;

    let flashes = flash::pending(&headers);
    let courts = state.service.registry.courts();
    let page = render_index(&flashes, &courts, &rows);

    let mut resp = Html(page).into_response();
    if !flashes.is_empty() {
        resp.headers_mut().insert(SET_COOKIE, flash::clear_cookie());
    }
    Ok(resp)
}

async fn fetch_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<FetchRequest>, FormRejection>,
) -> Result<Response, ApiError> {
    let req = match form {
        Ok(Form(req)) => req,
        Err(rejection) => {
            let e = FetchError::MissingFields;
            tracing::info!(event = "fetch_rejected", code = e.code(), reason = %rejection.body_text());
            return Ok(flash::redirect_with(&headers, "/", &e.to_string()));
        }
    };
    let message = match state.service.submit(req).await {
        Ok(FetchOutcome::Succeeded { .. }) => "Fetched successfully!".to_string(),
        Ok(FetchOutcome::Failed { message, .. }) => format!("Error: {message}"),
        Err(FetchError::Storage(e)) => return Err(ApiError(e)),
        Err(e) => {
            tracing::info!(event = "fetch_rejected", code = e.code(), reason = %e);
            e.to_string()
        }
    };
    Ok(flash::redirect_with(&headers, "/", &message))
}

async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let store = state.service.store.clone();
    let stored = run_blocking(move || -> Result<Option<PathBuf>> {
        Ok(store.get(id)?.and_then(|row| row.pdf_path).map(PathBuf::from))
    })
    .await?;

    let file = match stored {
        Some(path) => state
            .service
            .pdfs
            .open_reader(&path)
            .await?
            .map(|file| (path, file)),
        None => None,
    };
    let Some((path, file)) = file else {
        tracing::info!(event = "download_missing", id = id);
        return Ok(flash::redirect_with(&headers, "/", "PDF not available"));
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "_"))
        .unwrap_or_else(|| format!("query-{id}"));
    let kind = DocumentKind::from_path(&filename);
    let bytes = file.metadata().await.map(|m| m.len()).ok();
    tracing::info!(
        event = "download_served",
        id = id,
        bytes = ?bytes,
        kind = kind.extension()
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, kind.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

async fn cause_list(
    headers: HeaderMap,
    form: Result<Form<CauseListForm>, FormRejection>,
) -> Response {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let court = form
        .court
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "unknown court".to_string());
    tracing::info!(event = "cause_list_unavailable", court = %court, date = ?form.date);
    flash::redirect_with(
        &headers,
        "/",
        &format!("Cause list download is not available for {court}"),
    )
}

async fn api_queries(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(state.history_limit)
        .clamp(1, state.history_limit);
    let store = state.service.store.clone();
    let rows = run_blocking(move || store.recent(limit)).await?;

    let queries: Vec<Value> = rows
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "court": r.court,
                "case_type": r.case_type,
                "case_number": r.case_number,
                "year": r.year,
                "created_at": r.created_at,
                "status": r.status,
                "raw_response": r.raw_response,
                "parsed": r.metadata(),
                "has_pdf": r.pdf_path.is_some(),
            })
        })
        .collect();
    Ok(Json(json!({"ok": true, "queries": queries})))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "courts": state.service.registry.courts(),
    }))
}
