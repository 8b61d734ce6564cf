// HTTP routes

pub mod chat;
pub mod pne;
pub mod tool;

use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest("/pne", pne::router())
        .nest("/chat", chat::router())
        .nest("/tool", tool::router())
        .with_state(state)
}

async fn ping() -> Json<Value> {
    Json(json!({ "ping": "Success" }))
}
