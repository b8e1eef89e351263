//! On-device generation using mistral.rs

use crate::config::{GenerationSettings, QuantizationType};
use crate::llm::generator::{GenerationRequest, Generator};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use mistralrs::{IsqType, RequestBuilder, TextMessageRole, TextModelBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Local model wrapping a mistral.rs runner
pub struct LocalGenerator {
    model_id: String,
    model: Arc<mistralrs::Model>,
}

impl LocalGenerator {
    /// Load the model described by `settings`
    pub async fn load(settings: &GenerationSettings) -> Result<Self> {
        info!("Loading local model: {}", settings.local_model_id);

        let isq_type = match settings.quantization {
            QuantizationType::None => None,
            QuantizationType::Q4K => Some(IsqType::Q4K),
            QuantizationType::Q8_0 => Some(IsqType::Q8_0),
            QuantizationType::Q4_0 => Some(IsqType::Q4_0),
        };

        let mut builder = TextModelBuilder::new(&settings.local_model_id);

        if let Some(isq) = isq_type {
            builder = builder.with_isq(isq);
        }

        if settings.enable_logging {
            builder = builder.with_logging();
        }

        let model = builder
            .build()
            .await
            .map_err(|e| ParleyError::ModelLoadError(format!("Failed to load model: {}", e)))?;

        info!("Local model ready");

        Ok(Self {
            model_id: settings.local_model_id.clone(),
            model: Arc::new(model),
        })
    }

    /// Get the model ID
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl Generator for LocalGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut builder = RequestBuilder::new();

        if !request.instructions.is_empty() {
            builder = builder.add_message(TextMessageRole::System, &request.instructions);
        }
        builder = builder.add_message(TextMessageRole::User, &request.prompt);

        if let Some(temperature) = request.options.temperature {
            builder = builder.set_sampler_temperature(temperature as f64);
        }
        if let Some(max_tokens) = request.options.max_tokens {
            builder = builder.set_sampler_max_len(max_tokens);
        }

        let response = self
            .model
            .send_chat_request(builder)
            .await
            .map_err(|e| ParleyError::GenerationFailure(format!("Chat request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!(
            "Generated response: {} tokens @ {:.1} tok/s",
            response.usage.completion_tokens, response.usage.avg_compl_tok_per_sec
        );

        Ok(content.trim().to_string())
    }

    fn name(&self) -> &str {
        "local"
    }
}
