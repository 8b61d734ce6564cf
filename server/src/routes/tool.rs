// Tool listing endpoint
// GET /tool/list?tags=alpha,beta lists the tools discovered on the
// configured servers, filtered by tag when given.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use planflow_lib::AvailableTool;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ToolListQuery {
    /// Comma-separated tag list
    pub tags: Option<String>,
}

impl ToolListQuery {
    fn tags(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<AvailableTool>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/list", get(list_tools))
}

async fn list_tools(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ToolListQuery>,
) -> Result<Json<ToolListResponse>, ApiError> {
    let tools = state.tools.discover(&query.tags()).await?;
    Ok(Json(ToolListResponse { tools }))
}
