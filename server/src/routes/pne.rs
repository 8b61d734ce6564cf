// Plan-and-execute endpoints
// POST /pne/complete returns the final answer as JSON; POST /pne/stream
// returns progress as server-sent events and aborts the body on failure.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::post,
    BoxError, Router,
};
use futures::{Stream, StreamExt};

use planflow_lib::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/complete", post(complete))
        .route("/stream", post(stream))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = state.engine.complete(&request).await?;
    Ok(Json(ChatResponse {
        room_id: request.room_id,
        message,
    }))
}

async fn stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, BoxError>>> {
    log::info!("[server] Streaming request for room {}", request.room_id);

    let events = state.engine.clone().stream(request).map(|item| {
        let event = item?;
        let sse = Event::default()
            .event(event.name())
            .json_data(event.payload())?;
        Ok::<_, BoxError>(sse)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
