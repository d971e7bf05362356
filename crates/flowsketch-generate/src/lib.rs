pub mod engine;
mod error;
pub mod extract;
mod prompt;
mod settings;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use flowsketch_core::GraphDescription;

pub use engine::Generator;
pub use error::FlowchartError;
pub use extract::{Artifact, Flowchart};
pub use prompt::flowchart_prompt;
pub use settings::GeneratorSettings;

/// Turns user text into a [`GraphDescription`] through the configured
/// generation backend.
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl Orchestrator {
    /// Build an orchestrator for the backend named in `settings`. Only an
    /// unknown provider fails here; missing credentials surface per call.
    pub fn new(settings: &GeneratorSettings) -> Result<Self, FlowchartError> {
        Ok(Self::with_generator(
            engine::from_settings(settings)?,
            settings.timeout(),
        ))
    }

    pub fn with_generator(generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn generate(&self, user_text: &str) -> Result<GraphDescription, FlowchartError> {
        self.generate_flowchart(user_text)
            .await
            .map(|flowchart| flowchart.graph)
    }

    /// Run one generation cycle and keep the artifacts alongside the graph.
    pub async fn generate_flowchart(&self, user_text: &str) -> Result<Flowchart, FlowchartError> {
        if user_text.trim().is_empty() {
            return Err(FlowchartError::EmptyInput);
        }
        self.generator.ensure_configured()?;

        let prompt = flowchart_prompt(user_text);
        info!(
            chars = user_text.len(),
            timeout_secs = self.timeout.as_secs();
            "Requesting flowchart"
        );

        let payload = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| FlowchartError::UpstreamTimeout(self.timeout))??;
        debug!(payload = payload.to_string(); "Raw generator payload");

        let flowchart = extract::extract_flowchart(&payload)?;
        if flowchart.graph.is_empty() {
            warn!("Generator returned an empty flowchart");
        }
        info!(
            nodes = flowchart.graph.nodes.len(),
            edges = flowchart.graph.edges.len();
            "Flowchart extracted"
        );
        Ok(flowchart)
    }
}
