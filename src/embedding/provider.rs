use std::sync::Arc;

use log::{error, info};
use ndarray::Array1;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoder::TextEncoder;
use super::EmbeddingProvider;
use crate::classifier::ClassifierError;
use crate::model_manager::ModelManager;
use crate::models::{BuiltinModel, ModelCharacteristics};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A thread-safe embedding provider backed by an ONNX model.
///
/// All fields are either plain data or behind `Arc`, so the type is
/// `Send + Sync` and independent instances are fully isolated; construct
/// one per test if you need isolation. The ONNX environment itself is
/// initialized once per process by the runtime module.
#[derive(Debug)]
pub struct Embedder {
    pub model_path: String,
    pub tokenizer_path: String,
    tokenizer: Arc<Tokenizer>,
    session: Arc<Session>,
    characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Embedder>();
    }
};

/// A snapshot of the provider's configuration, for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct EmbedderInfo {
    pub model_path: String,
    pub tokenizer_path: String,
    pub embedding_size: usize,
    pub max_sequence_length: usize,
}

impl TextEncoder for Embedder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.characteristics.max_sequence_length)
    }
}

impl EmbeddingProvider for Embedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>, ClassifierError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            vectors.push(self.embed_text(text)?);
            if (i + 1) % 100 == 0 {
                info!("Embedded {}/{} texts", i + 1, texts.len());
            }
        }
        Ok(vectors)
    }
}

impl Embedder {
    /// Creates a new EmbedderBuilder for fluent construction
    pub fn builder() -> EmbedderBuilder {
        EmbedderBuilder::new()
    }

    pub fn info(&self) -> EmbedderInfo {
        EmbedderInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            embedding_size: self.characteristics.embedding_size,
            max_sequence_length: self.characteristics.max_sequence_length,
        }
    }

    pub fn embedding_size(&self) -> usize {
        self.characteristics.embedding_size
    }
}

/// A builder for constructing an [`Embedder`] with a fluent interface.
#[derive(Default, Debug)]
pub struct EmbedderBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl TextEncoder for EmbedderBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.model_characteristics
            .as_ref()
            .map(|c| c.max_sequence_length)
    }
}

impl EmbedderBuilder {
    pub fn new() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            tokenizer: None,
            session: None,
            model_characteristics: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the local model cache.
    ///
    /// # Errors
    /// Fails if paths were already set, the model is not downloaded, the
    /// tokenizer or model fails to load, or the model graph looks wrong.
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }

        let manager = ModelManager::new_default().map_err(|e| {
            ClassifierError::BuildError(format!("Failed to create model manager: {}", e))
        })?;

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_characteristics = Some(model.characteristics());
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Loads a custom model and tokenizer from explicit paths.
    ///
    /// The embedding size is inferred by running a probe input through the
    /// model; `max_sequence_length` defaults to 128 when not provided.
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }

        if !std::path::Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if !std::path::Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Tokenizer file not found: {}",
                tokenizer_path
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        // Sequence length must be in place before the probe run below
        self.model_characteristics = Some(ModelCharacteristics {
            embedding_size: 0,
            max_sequence_length: max_sequence_length.unwrap_or(128),
            model_size_mb: 0,
        });

        let probe = "Probe input to infer embedding size";
        let embedding = self.embed_text(probe)?;
        info!("Inferred embedding size from model: {}", embedding.len());

        if let Some(characteristics) = self.model_characteristics.as_mut() {
            characteristics.embedding_size = embedding.len();
        }

        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Builds the final [`Embedder`] instance.
    pub fn build(mut self) -> Result<Embedder, ClassifierError> {
        let model_path = self
            .model_path
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Model path must be set".to_string()))?;
        let tokenizer_path = self
            .tokenizer_path
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Tokenizer path must be set".to_string()))?;
        let characteristics = self
            .model_characteristics
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;
        let tokenizer = Arc::new(
            self.tokenizer
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?,
        );
        let session = Arc::new(
            self.session
                .take()
                .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?,
        );

        Ok(Embedder {
            model_path,
            tokenizer_path,
            tokenizer,
            session,
            characteristics,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for embeddings".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_model_fails() {
        let result = EmbedderBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_custom_model_rejects_empty_paths() {
        let result = EmbedderBuilder::new().with_custom_model("", "", None);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_custom_model_rejects_missing_files() {
        let result = EmbedderBuilder::new().with_custom_model(
            "/nonexistent/model.onnx",
            "/nonexistent/tokenizer.json",
            None,
        );
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }
}
