//! Model backends
//!
//! ## Architecture
//!
//! Every backend implements [`Provider`]:
//! - `GenaiProvider` uses the `genai` crate for OpenAI, Groq, Gemini and
//!   Anthropic, with explicit auth and endpoint resolution
//! - `OpenAiCompatProvider` posts to any `/chat/completions` endpoint
//! - `MockProvider` plays back scripted replies for tests and offline runs
//!
//! The backend is picked from `BridgeConfig::backend`; nothing is inferred
//! from key formats.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
pub mod openai_compat;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{to_genai_tool, to_genai_tools};
pub use genai_provider::GenaiProvider;
pub use mock::{MockMode, MockProvider, MockReply, RecordedRequest};
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};

use std::sync::Arc;

use crate::config::{Backend, BridgeConfig};
use crate::logging::SharedLogger;

/// Build the configured backend
pub fn create_provider(config: &BridgeConfig, logger: SharedLogger) -> Arc<dyn Provider> {
    match config.backend {
        Backend::Genai => Arc::new(GenaiProvider::new(config.provider, logger)),
        Backend::OpenaiCompat => Arc::new(OpenAiCompatProvider::new(
            config.effective_base_url().unwrap_or_default(),
            logger,
        )),
        Backend::Mock => Arc::new(MockProvider::echo(logger)),
    }
}

/// Per-call model settings derived from the configuration
pub fn model_config(config: &BridgeConfig) -> ProviderModelConfig {
    let mut model = ProviderModelConfig::new(config.model.clone()).with_timeout(config.timeout());
    if let Some(key) = &config.api_key {
        model = model.with_api_key(key.clone());
    }
    if let Some(base) = &config.base_url {
        model = model.with_api_base(base.clone());
    }
    model
}
