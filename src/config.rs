//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds the settings of all
//! four collaborators (analysis service, figure renderer, vision model,
//! format converter) plus the batch policy.

use crate::error::Doc2MdError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the analysis service endpoint.
pub const ENV_ENDPOINT: &str = "DI_ENDPOINT";
/// Environment variable holding the analysis service key.
pub const ENV_KEY: &str = "DI_KEY";

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`], [`ConversionConfig::from_env()`]
/// or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use docintel2md::{ConversionConfig, FigureRegionPolicy};
///
/// let config = ConversionConfig::builder()
///     .endpoint("https://my-resource.cognitiveservices.azure.com")
///     .key("secret")
///     .figure_regions(FigureRegionPolicy::All)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    // ── Document analysis ────────────────────────────────────────────────
    /// Analysis service endpoint, e.g. `https://<resource>.cognitiveservices.azure.com`.
    pub endpoint: Option<String>,

    /// Analysis service subscription key.
    pub key: Option<String>,

    /// Analysis model. Default: `prebuilt-layout`.
    pub model_id: String,

    /// REST API version. Default: `2024-11-30`.
    pub api_version: String,

    /// Delay between polls of a running analysis, in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,

    /// Give up on an analysis after this many seconds. Default: 600.
    pub analysis_timeout_secs: u64,

    // ── Figure summaries ─────────────────────────────────────────────────
    /// LLM model identifier for figure summaries. If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "azure", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for summaries. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens per summary. Default: 1024.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// DPI figure crops are rendered at. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Which bounding regions of a figure are summarised. Default: first only.
    pub figure_regions: FigureRegionPolicy,

    // ── Format conversion ────────────────────────────────────────────────
    /// Office suite binary used for DOCX → PDF. Default: `soffice`.
    pub converter_program: String,

    /// Kill the converter after this many seconds. Default: no limit.
    pub converter_timeout_secs: Option<u64>,

    // ── Batch policy ─────────────────────────────────────────────────────
    /// Abort the batch on the first failing file. Default: false.
    pub fail_fast: bool,

    /// Optional progress callback for batch events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            model_id: "prebuilt-layout".to_string(),
            api_version: "2024-11-30".to_string(),
            poll_interval_ms: 1000,
            analysis_timeout_secs: 600,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 1024,
            system_prompt: None,
            dpi: crate::geometry::RENDER_DPI,
            figure_regions: FigureRegionPolicy::default(),
            converter_program: "soffice".to_string(),
            converter_timeout_secs: None,
            fail_fast: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("dpi", &self.dpi)
            .field("figure_regions", &self.figure_regions)
            .field("converter_program", &self.converter_program)
            .field("converter_timeout_secs", &self.converter_timeout_secs)
            .field("fail_fast", &self.fail_fast)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with `DI_ENDPOINT` / `DI_KEY` from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.endpoint = non_empty_var(ENV_ENDPOINT);
        config.key = non_empty_var(ENV_KEY);
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.config.key = Some(key.into());
        self
    }

    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.config.model_id = id.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(10);
        self
    }

    pub fn analysis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.analysis_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn figure_regions(mut self, policy: FigureRegionPolicy) -> Self {
        self.config.figure_regions = policy;
        self
    }

    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.config.converter_program = program.into();
        self
    }

    pub fn converter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.converter_timeout_secs = Some(secs);
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2MdError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Doc2MdError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.model_id.trim().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "Analysis model id must not be empty".into(),
            ));
        }
        if c.converter_program.trim().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "Converter program must not be empty".into(),
            ));
        }
        if c.analysis_timeout_secs == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "Analysis timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which bounding regions of a figure get cropped and summarised.
///
/// A figure that spans a page break has one region per page. Summarising
/// only the first keeps one caption per figure; `All` produces one caption
/// per region at the cost of more vision calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FigureRegionPolicy {
    /// Summarise `boundingRegions[0]` only. (default)
    #[default]
    First,
    /// Summarise every region, one caption each.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.model_id, "prebuilt-layout");
        assert_eq!(c.figure_regions, FigureRegionPolicy::First);
        assert_eq!(c.converter_program, "soffice");
        assert!(!c.fail_fast);
    }

    #[test]
    fn builder_clamps() {
        let c = ConversionConfig::builder()
            .dpi(10_000)
            .temperature(9.0)
            .poll_interval_ms(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 600);
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.poll_interval_ms, 10);
    }

    #[test]
    fn builder_rejects_empty_model_id() {
        let err = ConversionConfig::builder().model_id("  ").build().unwrap_err();
        assert!(matches!(err, Doc2MdError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let c = ConversionConfig::builder().key("super-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
