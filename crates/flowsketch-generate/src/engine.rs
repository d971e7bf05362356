use std::sync::Arc;

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use log::debug;
use serde_json::{json, Value};

use flowsketch_core::schema::ARTIFACT_NAME;

use crate::error::FlowchartError;
use crate::settings::GeneratorSettings;

/// The external generation capability: prompt in, raw payload out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Fail fast when a required credential is missing. Called before any
    /// network traffic.
    fn ensure_configured(&self) -> Result<(), FlowchartError> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<Value, FlowchartError>;
}

fn map_backend(provider: &str) -> Result<LLMBackend, FlowchartError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(FlowchartError::Config(format!("unknown provider: {other}"))),
    }
}

/// Build the backend named by `settings.provider`.
pub fn from_settings(settings: &GeneratorSettings) -> Result<Arc<dyn Generator>, FlowchartError> {
    match settings.provider.as_str() {
        "v0" => Ok(Arc::new(V0Generator::new(settings))),
        provider => {
            map_backend(provider)?;
            Ok(Arc::new(LlmGenerator::new(settings)))
        }
    }
}

fn missing_key(provider: &str) -> FlowchartError {
    FlowchartError::Config(format!("no API key configured for provider {provider}"))
}

/// The v0 chat API. Its reply carries the generated files directly.
pub struct V0Generator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl V0Generator {
    pub fn new(settings: &GeneratorSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key().map(str::to_string),
        }
    }
}

#[async_trait]
impl Generator for V0Generator {
    fn ensure_configured(&self) -> Result<(), FlowchartError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(missing_key("v0")),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<Value, FlowchartError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| missing_key("v0"))?;

        debug!(endpoint = self.endpoint.as_str(); "Sending prompt to v0");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "message": prompt }))
            .send()
            .await
            .map_err(FlowchartError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(FlowchartError::transport)?;
        if !status.is_success() {
            return Err(FlowchartError::Upstream {
                status: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| FlowchartError::Upstream {
            status: Some(status.as_u16()),
            body,
        })
    }
}

/// Any chat provider supported by the `llm` crate. The reply text becomes a
/// single artifact, shaped like the v0 `files` list.
pub struct LlmGenerator {
    provider: String,
    model: String,
    api_key: Option<String>,
    requires_key: bool,
}

impl LlmGenerator {
    pub fn new(settings: &GeneratorSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key().map(str::to_string),
            requires_key: settings.requires_api_key(),
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    fn ensure_configured(&self) -> Result<(), FlowchartError> {
        if self.model.is_empty() {
            return Err(FlowchartError::Config(format!(
                "no model configured for provider {}",
                self.provider
            )));
        }
        if self.requires_key && self.api_key.is_none() {
            return Err(missing_key(&self.provider));
        }
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<Value, FlowchartError> {
        let backend = map_backend(&self.provider)?;

        let mut builder = LLMBuilder::new().backend(backend).model(&self.model);

        if let Some(api_key) = &self.api_key {
            builder = builder.api_key(api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| FlowchartError::Config(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        debug!(
            provider = self.provider.as_str(),
            model = self.model.as_str();
            "Sending prompt to LLM"
        );
        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| FlowchartError::transport(format!("chat: {e}")))?;

        let text = response.text().unwrap_or_default();
        Ok(json!({ "files": [{ "name": ARTIFACT_NAME, "content": text }] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    fn settings(provider: &str) -> GeneratorSettings {
        GeneratorSettings {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let err = from_settings(&settings("carrier-pigeon")).err().unwrap();
        assert!(matches!(err, FlowchartError::Config(ref m) if m.contains("carrier-pigeon")));
    }

    #[test]
    fn v0_without_key_is_not_configured() {
        let generator = from_settings(&settings("v0")).unwrap();
        assert!(matches!(
            generator.ensure_configured(),
            Err(FlowchartError::Config(_))
        ));
    }

    #[test]
    fn v0_with_key_is_configured() {
        let generator = from_settings(&GeneratorSettings {
            api_key: Some("secret".to_string()),
            ..settings("v0")
        })
        .unwrap();
        assert!(generator.ensure_configured().is_ok());
    }

    #[test]
    fn llm_provider_requires_model_and_key() {
        let no_model = from_settings(&GeneratorSettings {
            api_key: Some("secret".to_string()),
            ..settings("openai")
        })
        .unwrap();
        assert!(no_model.ensure_configured().is_err());

        let no_key = from_settings(&GeneratorSettings {
            model: "gpt-4o".to_string(),
            ..settings("anthropic")
        })
        .unwrap();
        assert!(no_key.ensure_configured().is_err());

        let local = from_settings(&GeneratorSettings {
            model: "llama3".to_string(),
            ..settings("ollama")
        })
        .unwrap();
        assert!(local.ensure_configured().is_ok());
    }

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Serve `status`/`body` for every `POST /chats` on a local port and
    /// record each request's authorization header and JSON body.
    async fn chat_stub(status: StatusCode, body: &'static str) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/chats",
            post(move |headers: HeaderMap, Json(request): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, request));
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/chats"), seen)
    }

    fn v0_at(endpoint: String) -> V0Generator {
        let generator = V0Generator::new(&GeneratorSettings {
            endpoint,
            api_key: Some("secret".to_string()),
            ..settings("v0")
        });
        // keep loopback traffic away from any proxy set in the environment
        V0Generator {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..generator
        }
    }

    #[tokio::test]
    async fn v0_sends_bearer_and_message() {
        let (endpoint, seen) = chat_stub(StatusCode::OK, r#"{"files":[]}"#).await;
        let payload = v0_at(endpoint).generate("draw it").await.unwrap();
        assert_eq!(payload, json!({ "files": [] }));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].1, json!({ "message": "draw it" }));
    }

    #[tokio::test]
    async fn v0_error_status_is_upstream_error_with_body() {
        let (endpoint, _) = chat_stub(StatusCode::UNAUTHORIZED, r#"{"error":"bad token"}"#).await;
        match v0_at(endpoint).generate("draw it").await {
            Err(FlowchartError::Upstream { status, body }) => {
                assert_eq!(status, Some(401));
                assert_eq!(body, r#"{"error":"bad token"}"#);
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn v0_non_json_success_is_upstream_error() {
        let (endpoint, _) = chat_stub(StatusCode::OK, "<html>maintenance</html>").await;
        match v0_at(endpoint).generate("draw it").await {
            Err(FlowchartError::Upstream { status, body }) => {
                assert_eq!(status, Some(200));
                assert_eq!(body, "<html>maintenance</html>");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn v0_unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = v0_at(format!("http://{addr}/chats"))
            .generate("draw it")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowchartError::Upstream { status: None, .. }));
    }
}
