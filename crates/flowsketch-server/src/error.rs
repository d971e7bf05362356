use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

use flowsketch_generate::FlowchartError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("a flowchart is already being generated")]
    Busy,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Flowchart(#[from] FlowchartError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Busy => StatusCode::CONFLICT,
            ServerError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ServerError::Flowchart(err) => match err {
                FlowchartError::EmptyInput => StatusCode::BAD_REQUEST,
                FlowchartError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                FlowchartError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                FlowchartError::Upstream { .. }
                | FlowchartError::Generation(_)
                | FlowchartError::Parse { .. }
                | FlowchartError::Validation(_) => StatusCode::BAD_GATEWAY,
            },
            ServerError::Config(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to HTTP callers. Never includes upstream bodies or
    /// artifact content.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServerError::Busy => "A flowchart is already being generated",
            ServerError::InvalidBody(_) => "Invalid request body",
            ServerError::Flowchart(err) => match err {
                FlowchartError::EmptyInput => "No text provided",
                FlowchartError::Config(_) => "Generation service is not configured",
                FlowchartError::UpstreamTimeout(_) => "Generation service timed out",
                FlowchartError::Upstream { .. } => "Failed to generate flowchart",
                FlowchartError::Generation(_) => "AI failed to generate a file",
                FlowchartError::Parse { .. } => "Generated flowchart was not valid JSON",
                FlowchartError::Validation(_) => "Generated flowchart is missing nodes or edges",
            },
            ServerError::Config(_) | ServerError::Io(_) => "Internal server error",
        }
    }

    fn log(&self) {
        match self {
            ServerError::Flowchart(FlowchartError::Upstream { status, body }) => {
                error!(status:?, body = body.as_str(); "Generation service request failed");
            }
            ServerError::Flowchart(FlowchartError::Parse { content, .. }) => {
                error!(
                    error = self.to_string(),
                    content = content.as_str();
                    "Flowchart request failed"
                );
            }
            ServerError::Busy
            | ServerError::InvalidBody(_)
            | ServerError::Flowchart(FlowchartError::EmptyInput) => {
                warn!(error = self.to_string(); "Rejected flowchart request");
            }
            _ => error!(error = self.to_string(); "Flowchart request failed"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_input_maps_to_400_with_fixed_message() {
        let err = ServerError::from(FlowchartError::EmptyInput);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No text provided");
    }

    #[test]
    fn upstream_failures_map_to_gateway_statuses() {
        let timeout = ServerError::from(FlowchartError::UpstreamTimeout(Duration::from_secs(1)));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let upstream = ServerError::from(FlowchartError::Upstream {
            status: Some(401),
            body: "bad token".to_string(),
        });
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert!(!upstream.public_message().contains("bad token"));
    }

    #[test]
    fn busy_maps_to_conflict() {
        assert_eq!(ServerError::Busy.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_credential_maps_to_500() {
        let err = ServerError::from(FlowchartError::Config("no key".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
