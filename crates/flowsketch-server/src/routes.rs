use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use flowsketch_core::canvas::CanvasSnapshot;
use flowsketch_core::GraphDescription;
use flowsketch_generate::Artifact;

use crate::error::ServerError;
use crate::session::DiagramSession;

#[derive(Debug, Deserialize)]
pub struct FlowchartRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct FlowchartResponse {
    pub files: Vec<Artifact>,
    pub graph: GraphDescription,
}

pub fn router(session: Arc<DiagramSession>) -> Router {
    Router::new()
        .route("/flowchart", post(create_flowchart))
        .route("/canvas", get(canvas))
        .route("/health", get(health))
        .with_state(session)
}

async fn create_flowchart(
    State(session): State<Arc<DiagramSession>>,
    body: Result<Json<FlowchartRequest>, JsonRejection>,
) -> Result<Json<FlowchartResponse>, ServerError> {
    let Json(request) = body.map_err(|rejection| ServerError::InvalidBody(rejection.body_text()))?;
    let flowchart = session.regenerate(&request.text).await?;
    Ok(Json(FlowchartResponse {
        files: flowchart.artifacts,
        graph: flowchart.graph,
    }))
}

async fn canvas(State(session): State<Arc<DiagramSession>>) -> Json<CanvasSnapshot> {
    Json(session.snapshot())
}

async fn health(State(session): State<Arc<DiagramSession>>) -> Json<Value> {
    Json(json!({ "status": "ok", "generating": session.is_generating() }))
}
