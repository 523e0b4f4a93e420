//! API service routes

use std::io;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::PathRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use futures::TryStreamExt;
use media::{UploadRequest, VideoRecord};
use serde_json::json;
use tokio_util::io::StreamReader;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{CreateVideoRequest, VideoListResponse},
};

/// Multipart form field carrying the uploaded video
pub const VIDEO_FIELD: &str = "video";

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.max_upload_bytes).unwrap_or(usize::MAX);

    let protected_routes = Router::new()
        .route("/videos", get(list_videos).post(create_video))
        .route("/videos/:id", get(get_video))
        .route(
            "/videos/:id/upload",
            post(upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tubely-api"
    }))
}

/// Create an empty video record owned by the caller
pub async fn create_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateVideoRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let mut record = VideoRecord::draft(user.id, title);
    record.description = payload.description;
    state.records.create_video(&record).await?;

    info!(video_id = %record.id, user_id = %user.id, "Video record created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// List the caller's videos with signed URLs
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let records = state.records.list_videos_for_user(user.id).await?;

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        items.push(state.signer.sign_record(record).await?);
    }

    Ok(Json(VideoListResponse {
        total: items.len(),
        items,
    }))
}

/// Get one of the caller's videos with a signed URL
pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;

    let record = state
        .records
        .get_video(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    if record.user_id != user.id {
        return Err(ApiError::Unauthorized);
    }

    Ok(Json(state.signer.sign_record(record).await?))
}

/// Upload the content of a video through the ingestion pipeline.
///
/// Responds with the updated record; its `video_url` holds the stored
/// `bucket,key` reference.
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let Path(video_id) = id?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(io::Error::other)));

        let outcome = state
            .pipeline
            .ingest(UploadRequest {
                video_id,
                user_id: user.id,
                content_type,
                body,
            })
            .await?;

        return Ok(Json(outcome.record));
    }

    Err(ApiError::BadRequest(format!(
        "Missing form field {VIDEO_FIELD:?}"
    )))
}
