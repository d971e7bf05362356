//! HTTP service for the flowsketch pipeline.
//!
//! `POST /flowchart` turns a process description into a flowchart and
//! redraws the service's canvas with it; `GET /canvas` returns the shapes
//! currently on that canvas.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

mod args;

pub use args::Args;
pub use error::ServerError;
pub use routes::router;
pub use session::DiagramSession;

use std::sync::Arc;

use log::{info, warn};

use flowsketch_generate::Orchestrator;

/// Load configuration, build the pipeline and serve until shutdown.
///
/// # Errors
///
/// Returns `ServerError` for:
/// - Configuration loading errors
/// - An unknown generation provider
/// - Failing to bind or serve on the configured address
pub async fn run(args: &Args) -> Result<(), ServerError> {
    let mut config = config::load_config(args.config.as_deref())?;
    config.apply_env(|var| std::env::var(var).ok());
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }

    if !config.generator.is_configured() {
        warn!(
            provider = config.generator.provider.as_str();
            "Generator credential missing; requests will fail until one is configured"
        );
    }

    let orchestrator = Orchestrator::new(&config.generator)?;
    let session = Arc::new(DiagramSession::new(orchestrator));
    let app = router(session);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(
        bind = config.bind.as_str(),
        provider = config.generator.provider.as_str();
        "Listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
