use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::types::{AppError, AppResult, LLMMessage, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Model binding for one agent: `provider/model` name, endpoints and sampling.
/// Only the endpoint of the model's provider is used.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub ollama_base_url: String,
    pub openai_base_url: String,
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Base URL of the backend serving `provider`.
    pub fn endpoint(&self, provider: LLMProvider) -> &str {
        match provider {
            LLMProvider::Ollama => &self.ollama_base_url,
            LLMProvider::OpenAI => &self.openai_base_url,
        }
    }

    /// Point the endpoint of this model's provider at `url`.
    pub fn override_endpoint(&mut self, url: String) -> AppResult<()> {
        let (provider, _) = LLMProvider::parse_model(&self.model)?;
        match provider {
            LLMProvider::Ollama => self.ollama_base_url = url,
            LLMProvider::OpenAI => self.openai_base_url = url,
        }
        Ok(())
    }
}

pub(crate) fn http_client(timeout_secs: Option<u64>) -> AppResult<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// An LLM handle: the resolved settings plus the adapter that serves them.
#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
    model_id: String,
    settings: LlmSettings,
}

impl std::fmt::Debug for LLM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLM")
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url())
            .field("temperature", &self.settings.temperature)
            .finish()
    }
}

impl LLM {
    pub fn new(settings: LlmSettings) -> AppResult<Self> {
        let (provider, _) = LLMProvider::parse_model(&settings.model)?;
        let adapter: Arc<dyn LLMAdapter> = match provider {
            LLMProvider::Ollama => Arc::new(crate::llm::ollama::OllamaAdapter::new(
                settings.endpoint(provider),
                settings.timeout_secs,
            )?),
            LLMProvider::OpenAI => Arc::new(crate::llm::openai::OpenAICompatAdapter::new(
                settings.endpoint(provider),
                settings.api_key.as_deref(),
                settings.timeout_secs,
            )?),
        };
        Self::with_adapter(settings, adapter)
    }

    /// Bind `settings` to an explicit adapter instead of the one its provider
    /// prefix selects.
    pub fn with_adapter(settings: LlmSettings, adapter: Arc<dyn LLMAdapter>) -> AppResult<Self> {
        let (provider, model_id) = LLMProvider::parse_model(&settings.model)?;
        Ok(Self {
            adapter,
            provider,
            model_id,
            settings,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn base_url(&self) -> &str {
        self.settings.endpoint(self.provider)
    }

    /// Model id as sent to the backend (provider prefix stripped).
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub async fn complete(&self, messages: Vec<LLMMessage>) -> AppResult<LLMResponse> {
        let request = LLMRequest {
            model: self.model_id.clone(),
            messages,
            max_tokens: None,
            temperature: Some(self.settings.temperature),
        };
        self.adapter.create_chat_completion(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(model: &str) -> LlmSettings {
        LlmSettings {
            model: model.to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout_secs: None,
            api_key: None,
        }
    }

    #[test]
    fn test_llm_strips_provider_prefix() {
        let llm = LLM::new(settings("ollama/gemma3")).unwrap();
        assert_eq!(llm.provider(), LLMProvider::Ollama);
        assert_eq!(llm.model_id(), "gemma3");
        assert_eq!(llm.settings().model, "ollama/gemma3");
    }

    #[test]
    fn test_llm_openai_provider() {
        let llm = LLM::new(settings("openai/gpt-4o-mini")).unwrap();
        assert_eq!(llm.provider(), LLMProvider::OpenAI);
        assert_eq!(llm.model_id(), "gpt-4o-mini");
        assert_eq!(llm.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_endpoint_override_targets_model_provider() {
        let mut s = settings("openai/gpt-4o-mini");
        s.override_endpoint("http://localhost:11434/v1".to_string()).unwrap();
        assert_eq!(s.openai_base_url, "http://localhost:11434/v1");
        assert_eq!(s.ollama_base_url, "http://localhost:11434");

        let mut s = settings("gemma3");
        s.override_endpoint("http://gpu:11434".to_string()).unwrap();
        assert_eq!(s.endpoint(LLMProvider::Ollama), "http://gpu:11434");
        assert_eq!(s.endpoint(LLMProvider::OpenAI), "https://api.openai.com/v1");
    }

    #[test]
    fn test_llm_unknown_provider() {
        assert!(matches!(
            LLM::new(settings("vertex/gemini")),
            Err(AppError::UnsupportedProvider(_))
        ));
    }
}
