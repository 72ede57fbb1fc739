// rest/routes/graph.rs — Link-graph REST route.
//
// Input validation lives here, not in the builder: topic length and depth
// bounds come from `[limits]` in the config.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::graph::LinkGraph;
use crate::AppContext;

#[derive(Deserialize)]
pub struct GraphQuery {
    /// Recursion depth; defaults to 0 (root node only).
    pub depth: Option<u32>,
}

pub async fn get_graph(
    State(ctx): State<Arc<AppContext>>,
    Path(topic): Path<String>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<LinkGraph>, (StatusCode, Json<Value>)> {
    let limits = &ctx.config.limits;

    if topic.is_empty() || topic.chars().count() > limits.max_topic_len {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("topic must be between 1 and {} characters", limits.max_topic_len),
            })),
        ));
    }

    let depth = query.depth.unwrap_or(0);
    if depth > limits.max_depth {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("depth must be between 0 and {}", limits.max_depth),
            })),
        ));
    }

    match ctx.builder.build(&topic, depth).await {
        Ok(graph) => Ok(Json(graph)),
        Err(e) => {
            warn!(topic = %e.topic, cause = %e.source, "graph build failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string(), "topic": e.topic })),
            ))
        }
    }
}
