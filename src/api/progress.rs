use axum::{
    Json,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tracing::debug;

use super::{ApiError, ApiResponse, AppState};
use crate::services::TaskInfo;

/// Streams a task's progress as server-sent events, one JSON record per
/// event, ending with the terminal `{success, message, result?}` record.
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let updates = state
        .shared
        .tasks
        .stream_progress(&task_id)
        .await
        .ok_or_else(|| ApiError::task_not_found(&task_id))?;

    debug!(task_id = %task_id, "Progress stream opened");

    let stream = updates.map(|update| {
        let json = serde_json::to_string(&update).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// Snapshot of a running task, for clients that poll instead of streaming.
pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<TaskInfo>>, ApiError> {
    let info = state
        .shared
        .tasks
        .info(&task_id)
        .await
        .ok_or_else(|| ApiError::task_not_found(&task_id))?;
    Ok(Json(ApiResponse::success(info)))
}
