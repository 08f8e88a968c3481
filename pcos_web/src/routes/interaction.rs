use crate::{
    presenter::Phase,
    server::SharedState,
    ui::render_page,
    upload::{read_upload, UploadError},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("Interaction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self),
        )
            .into_response()
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<SharedState>) -> Html<String> {
    state.metrics.record_request("/");
    let presenter = state.presenter.lock().await;
    Html(render_page(&presenter))
}

#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, InteractionError> {
    state.metrics.record_request("/upload");

    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await,
        Err(rejection) => Err(UploadError::Multipart(rejection.body_text())),
    };

    let mut presenter = state.presenter.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || presenter.on_upload(upload)).await?;

    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn analyze(State(state): State<SharedState>) -> Result<Redirect, InteractionError> {
    state.metrics.record_request("/analyze");

    let mut presenter = state.presenter.clone().lock_owned().await;
    let started = Instant::now();
    let phase = tokio::task::spawn_blocking(move || {
        presenter.on_analyze();
        presenter.phase().clone()
    })
    .await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match phase {
        Phase::ResultReady(prediction) => state
            .metrics
            .record_prediction(prediction.diagnosis.as_str(), elapsed_ms),
        Phase::Failed(_) => state.metrics.record_prediction("failed", elapsed_ms),
        _ => {}
    }

    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn clear(State(state): State<SharedState>) -> Redirect {
    state.metrics.record_request("/clear");
    state.presenter.lock().await.on_clear();
    Redirect::to("/")
}

#[instrument(skip(state))]
pub async fn preview(State(state): State<SharedState>) -> Response {
    let presenter = state.presenter.lock().await;
    match presenter.image() {
        Some(loaded) => (
            [
                (header::CONTENT_TYPE, loaded.upload.image_type.mime()),
                (header::CACHE_CONTROL, "no-store"),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            loaded.upload.data.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
