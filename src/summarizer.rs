//! Figure summaries: send a cropped figure to a vision model and return its
//! one-paragraph description.
//!
//! The request is a system message (the assistant persona) plus one user
//! turn carrying the fixed question and the PNG as a base64 attachment.

use crate::config::ConversionConfig;
use crate::error::Doc2MdError;
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, SUMMARY_QUESTION};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Model used when a provider is named without one.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// Describes an image file in natural language.
#[async_trait]
pub trait ImageSummarizer: Send + Sync {
    async fn summarize(&self, image_path: &Path) -> Result<String, Doc2MdError>;
}

/// [`ImageSummarizer`] backed by an `edgequake-llm` vision provider.
pub struct LlmImageSummarizer {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
}

impl LlmImageSummarizer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.1,
            max_tokens: 1024,
        }
    }

    /// Resolve the provider from `config` and copy its sampling settings.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Doc2MdError> {
        let provider = resolve_provider(config)?;
        Ok(Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ImageSummarizer for LlmImageSummarizer {
    async fn summarize(&self, image_path: &Path) -> Result<String, Doc2MdError> {
        let start = Instant::now();
        let fail = |detail: String| Doc2MdError::SummarizationFailed {
            path: image_path.to_path_buf(),
            detail,
        };

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| fail(e.to_string()))?;
        let image = encode_png(&bytes);

        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images(SUMMARY_QUESTION, vec![image]),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| fail(e.to_string()))?;

        debug!(
            "Summarised {}: {} input tokens, {} output tokens, {:?}",
            image_path.display(),
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Wrap raw PNG bytes as a high-detail image attachment.
fn encode_png(bytes: &[u8]) -> ImageData {
    ImageData::new(STANDARD.encode(bytes), "image/png").with_detail("high")
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Doc2MdError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Doc2MdError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision provider, most specific first:
///
/// 1. `config.provider`, used as-is.
/// 2. `config.provider_name` plus `config.model`.
/// 3. `EDGEQUAKE_LLM_PROVIDER` and `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI, when `OPENAI_API_KEY` is set.
/// 5. [`ProviderFactory::from_env`] auto-detection.
pub fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, Doc2MdError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Doc2MdError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
