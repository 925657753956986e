use serde::Serialize;

use crate::error::{LlmError, Result};
use crate::providers::ProviderKind;
use crate::resilient::FallbackTarget;

/// Capability card for one selectable model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub provider: ProviderKind,
    pub supports_image: bool,
    #[serde(rename = "default")]
    pub is_default: bool,
}

/// Outcome of model selection. `overridden` is the only trace a caller gets
/// when a capability mismatch silently rerouted the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub model: String,
    pub provider: ProviderKind,
    pub overridden: bool,
}

/// Static model table, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    multimodal_default: String,
}

pub const MULTIMODAL_DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

impl ModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>, multimodal_default: impl Into<String>) -> Self {
        Self {
            models,
            multimodal_default: multimodal_default.into(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            vec![
                ModelDescriptor {
                    id: "deepseek-ai/DeepSeek-V2.5".to_string(),
                    name: "DeepSeek-V2.5".to_string(),
                    provider: ProviderKind::SiliconFlow,
                    supports_image: false,
                    is_default: true,
                },
                ModelDescriptor {
                    id: "Qwen/Qwen2.5-7B-Instruct".to_string(),
                    name: "Qwen2.5-7B-Instruct".to_string(),
                    provider: ProviderKind::SiliconFlow,
                    supports_image: false,
                    is_default: false,
                },
                ModelDescriptor {
                    id: MULTIMODAL_DEFAULT_MODEL.to_string(),
                    name: "Llama-4-Scout-17B".to_string(),
                    provider: ProviderKind::Groq,
                    supports_image: true,
                    is_default: false,
                },
            ],
            MULTIMODAL_DEFAULT_MODEL,
        )
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn default_model(&self) -> &ModelDescriptor {
        self.models
            .iter()
            .find(|m| m.is_default)
            .unwrap_or(&self.models[0])
    }

    fn multimodal_default(&self) -> &ModelDescriptor {
        self.get(&self.multimodal_default)
            .unwrap_or_else(|| self.default_model())
    }

    /// Resolves the model and provider for a turn. A model that cannot see
    /// images is overridden to the multimodal default whenever the
    /// conversation carries an image, or audio/video whose text annotations
    /// deserve the stronger model.
    pub fn select(
        &self,
        requested: Option<&str>,
        has_image: bool,
        has_other_media: bool,
    ) -> Result<Selection> {
        let id = match requested {
            Some(id) => id,
            None => self.default_model().id.as_str(),
        };
        let descriptor = self
            .get(id)
            .ok_or_else(|| LlmError::UnknownModel(id.to_string()))?;

        if (has_image || has_other_media) && !descriptor.supports_image {
            let vision = self.multimodal_default();
            return Ok(Selection {
                model: vision.id.clone(),
                provider: vision.provider,
                overridden: vision.id != descriptor.id,
            });
        }

        Ok(Selection {
            model: descriptor.id.clone(),
            provider: descriptor.provider,
            overridden: false,
        })
    }

    /// Secondary target on the other chat provider, used when the primary
    /// exhausts its retries.
    pub fn fallback_for(&self, primary: ProviderKind) -> Option<FallbackTarget> {
        self.models
            .iter()
            .find(|m| m.provider != primary)
            .map(|m| FallbackTarget {
                provider: m.provider,
                model: m.id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_an_error() {
        let registry = ModelRegistry::builtin();
        let err = registry.select(Some("no-such-model"), false, false).unwrap_err();
        assert!(matches!(err, LlmError::UnknownModel(id) if id == "no-such-model"));
    }

    #[test]
    fn image_forces_multimodal_model() {
        let registry = ModelRegistry::builtin();
        let selection = registry
            .select(Some("deepseek-ai/DeepSeek-V2.5"), true, false)
            .unwrap();
        assert_eq!(selection.model, MULTIMODAL_DEFAULT_MODEL);
        assert_eq!(selection.provider, ProviderKind::Groq);
        assert!(selection.overridden);
        assert!(registry.get(&selection.model).unwrap().supports_image);
    }

    #[test]
    fn audio_or_video_also_forces_multimodal_model() {
        let registry = ModelRegistry::builtin();
        let selection = registry
            .select(Some("Qwen/Qwen2.5-7B-Instruct"), false, true)
            .unwrap();
        assert_eq!(selection.provider, ProviderKind::Groq);
        assert!(selection.overridden);
    }

    #[test]
    fn capable_model_is_kept_as_requested() {
        let registry = ModelRegistry::builtin();
        let selection = registry
            .select(Some(MULTIMODAL_DEFAULT_MODEL), true, false)
            .unwrap();
        assert_eq!(selection.model, MULTIMODAL_DEFAULT_MODEL);
        assert!(!selection.overridden);
    }

    #[test]
    fn text_only_turn_uses_requested_model() {
        let registry = ModelRegistry::builtin();
        let selection = registry
            .select(Some("deepseek-ai/DeepSeek-V2.5"), false, false)
            .unwrap();
        assert_eq!(selection.model, "deepseek-ai/DeepSeek-V2.5");
        assert_eq!(selection.provider, ProviderKind::SiliconFlow);
    }

    #[test]
    fn missing_model_falls_back_to_default() {
        let registry = ModelRegistry::builtin();
        let selection = registry.select(None, false, false).unwrap();
        assert_eq!(selection.model, registry.default_model().id);
    }

    #[test]
    fn fallback_targets_the_other_provider() {
        let registry = ModelRegistry::builtin();
        let target = registry.fallback_for(ProviderKind::SiliconFlow).unwrap();
        assert_eq!(target.provider, ProviderKind::Groq);

        let target = registry.fallback_for(ProviderKind::Groq).unwrap();
        assert_eq!(target.provider, ProviderKind::SiliconFlow);
    }
}
