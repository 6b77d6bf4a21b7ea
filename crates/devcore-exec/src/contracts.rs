use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde::Serialize;

use devcore_core::config::ModelConfig;

use crate::error::ModelError;

pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const STRUCTURED_TEMPERATURE: f32 = 0.2;

/// Inline binary input (e.g. a screenshot for the UI-to-code panel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        let defaults = ModelConfig::default();
        Self {
            model: defaults.default_model,
            prompt: prompt.into(),
            system_instruction: None,
            temperature: DEFAULT_TEMPERATURE,
            attachment: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Applies the configured model name. Requests still on a built-in
    /// temperature pick up the configured one.
    pub fn configured(mut self, config: &ModelConfig) -> Self {
        self.model = config.default_model.clone();
        if self.temperature == DEFAULT_TEMPERATURE {
            self.temperature = config.default_temperature;
        } else if self.temperature == STRUCTURED_TEMPERATURE {
            self.temperature = config.structured_temperature;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    pub base64: String,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

pub type FragmentStream = BoxStream<'static, Result<String, ModelError>>;

/// A tool the model may call instead of answering in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Reply to a request that offered function declarations. Either part may
/// be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

/// Text/image generation backend. Implementations own transport and auth.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError>;

    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;

    /// Single-shot generation constrained to `schema`; returns the parsed JSON.
    async fn generate_structured(
        &self,
        request: &ModelRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ModelError>;

    /// Single-shot generation offering `functions` as tools.
    async fn infer(
        &self,
        request: &ModelRequest,
        functions: &[FunctionDeclaration],
    ) -> Result<InferenceReply, ModelError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn request_defaults_and_builders() {
        let request = ModelRequest::new("explain this")
            .with_system_instruction("be brief")
            .with_temperature(STRUCTURED_TEMPERATURE);
        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.system_instruction.as_deref(), Some("be brief"));
        assert_eq!(request.temperature, 0.2);
        assert!(request.attachment.is_none());
    }

    #[test]
    fn configured_overrides_only_builtin_temperatures() {
        let config = ModelConfig {
            default_model: "local".to_string(),
            default_temperature: 0.9,
            ..ModelConfig::default()
        };
        let plain = ModelRequest::new("a").configured(&config);
        assert_eq!(plain.model, "local");
        assert_eq!(plain.temperature, 0.9);

        let structured = ModelRequest::new("b")
            .with_temperature(STRUCTURED_TEMPERATURE)
            .configured(&config);
        assert_eq!(structured.temperature, 0.2);

        let explicit = ModelRequest::new("c").with_temperature(0.8).configured(&config);
        assert_eq!(explicit.temperature, 0.8);
    }

    #[test]
    fn inference_reply_tolerates_missing_parts() {
        let reply: InferenceReply = serde_json::from_str(
            r#"{"functionCalls":[{"name":"navigateTo","args":{"featureId":"settings"}}]}"#,
        )
        .expect("parse");
        assert_eq!(reply.text, "");
        assert_eq!(reply.function_calls[0].name, "navigateTo");
        assert_eq!(reply.function_calls[0].args["featureId"], "settings");
    }

    #[test]
    fn image_data_url() {
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            base64: "AAAA".to_string(),
        };
        assert_eq!(image.data_url(), "data:image/png;base64,AAAA");
    }
}
