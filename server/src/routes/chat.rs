// Single-turn chat endpoint

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::post, Router};

use planflow_lib::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/main", post(main_chat))
}

async fn main_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    Ok(Json(state.chat.run(&request).await?))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::test_support::{test_state, Scripted};

    #[tokio::test]
    async fn test_main_chat() {
        let state = test_state(vec![Scripted::Proposal("Hi, how can I help?".to_string())]);

        let response = router(state)
            .oneshot(
                Request::post("/chat/main")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "question": "hello", "roomId": "r1" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "roomId": "r1", "message": "Hi, how can I help?" }));
    }
}
