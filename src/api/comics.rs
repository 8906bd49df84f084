use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{parse_date, validate_custom, validate_daily, validate_media};
use super::{ApiError, ApiResponse, AppState, ComicDto, ComicQuery, PurgeResult, TaskCreated};
use crate::db::ComicStore;
use crate::domain::ComicFilter;
use crate::services::{CustomRequest, DailyRequest, MediaRequest, RunRequest};

pub async fn create_daily(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DailyRequest>,
) -> Result<Json<ApiResponse<TaskCreated>>, ApiError> {
    validate_daily(&request)?;
    let task_id = state.shared.spawn_run(RunRequest::Daily(request)).await;
    Ok(Json(ApiResponse::success(TaskCreated { task_id })))
}

pub async fn create_custom(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CustomRequest>,
) -> Result<Json<ApiResponse<TaskCreated>>, ApiError> {
    validate_custom(&request)?;
    let task_id = state.shared.spawn_run(RunRequest::Custom(request)).await;
    Ok(Json(ApiResponse::success(TaskCreated { task_id })))
}

pub async fn create_media(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MediaRequest>,
) -> Result<Json<ApiResponse<TaskCreated>>, ApiError> {
    validate_media(&request)?;
    let task_id = state.shared.spawn_run(RunRequest::Media(request)).await;
    Ok(Json(ApiResponse::success(TaskCreated { task_id })))
}

pub async fn list_comics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ComicQuery>,
) -> Result<Json<ApiResponse<Vec<ComicDto>>>, ApiError> {
    let filter = ComicFilter {
        start_date: parse_date(query.start_date.as_deref(), "start_date")?,
        end_date: parse_date(query.end_date.as_deref(), "end_date")?,
        location: query
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        owner_id: query.user_id,
    };

    let comics = state.store().list_by_filter(&filter).await?;
    Ok(Json(ApiResponse::success(
        comics.into_iter().map(ComicDto::from).collect(),
    )))
}

pub async fn get_comic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ComicDto>>, ApiError> {
    let comic = state
        .store()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comic", id))?;
    Ok(Json(ApiResponse::success(comic.into())))
}

pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let locations = state.store().unique_locations().await?;
    Ok(Json(ApiResponse::success(locations)))
}

pub async fn purge_comics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PurgeResult>>, ApiError> {
    let deleted = state.store().purge().await?;
    tracing::warn!(deleted, "Purged all comics");
    Ok(Json(ApiResponse::success(PurgeResult { deleted })))
}
