use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong between user text and a graph description.
///
/// Display strings are safe to log; raw upstream bodies and unparsed
/// artifact content are carried in fields, never in the message.
#[derive(Debug, Error)]
pub enum FlowchartError {
    #[error("no text provided")]
    EmptyInput,

    #[error("generation service is not configured: {0}")]
    Config(String),

    #[error("generation service did not respond within {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    #[error("generation service request failed{}", status_suffix(.status))]
    Upstream { status: Option<u16>, body: String },

    #[error("{0}")]
    Generation(String),

    #[error("generated flowchart is not valid JSON: {source}")]
    Parse {
        content: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("generated flowchart is invalid: {0}")]
    Validation(String),
}

impl FlowchartError {
    pub(crate) fn no_output() -> Self {
        FlowchartError::Generation("no usable output produced".to_string())
    }

    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        FlowchartError::Upstream {
            status: None,
            body: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_includes_status_but_not_body() {
        let err = FlowchartError::Upstream {
            status: Some(503),
            body: "internal trace".to_string(),
        };
        let message = err.to_string();
        assert_eq!(message, "generation service request failed with status 503");
        assert!(!message.contains("internal trace"));
    }

    #[test]
    fn parse_message_omits_raw_content() {
        let source = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = FlowchartError::Parse {
            content: "{nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("generated flowchart is not valid JSON"));
        assert!(!err.to_string().contains("{nope"));
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = FlowchartError::UpstreamTimeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "generation service did not respond within 60s");
    }
}
