/// Built-in embedding models that can be used without manual path wiring.
///
/// Each variant maps to a hosted ONNX export plus its tokenizer file, with
/// pinned hashes so downloads are verifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Multilingual MiniLM-L12-v2 paraphrase model. 384-dimensional
    /// embeddings, good German/multilingual coverage, small enough to run
    /// comfortably on CPU.
    MultilingualMiniLM,
}

/// Static characteristics of an embedding model.
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Dimensionality of the produced embedding vectors
    pub embedding_size: usize,
    /// Maximum number of tokens the model accepts per input
    pub max_sequence_length: usize,
    /// Approximate on-disk size, for logging and cache planning
    pub model_size_mb: usize,
}

/// Download metadata for a built-in model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Directory name under the models cache
    pub name: String,
    pub model_url: String,
    pub model_hash: String,
    pub tokenizer_url: String,
    pub tokenizer_hash: String,
}

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::MultilingualMiniLM => ModelCharacteristics {
                embedding_size: 384,
                max_sequence_length: 128,
                model_size_mb: 449,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::MultilingualMiniLM => ModelInfo {
                name: "multilingual-minilm".to_string(),
                model_url: "https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main/onnx/model.onnx".to_string(),
                model_hash: "b5f92bd2bdff5361024e71f9c465b2e8bcc2e8f4b9db3d2a4a30dbbd4a4206cf".to_string(),
                tokenizer_url: "https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main/tokenizer.json".to_string(),
                tokenizer_hash: "f59925fcb90c92b894cb93e51bb9b4a6105c5c249fe54ce1c704420ac39b81af".to_string(),
            },
        }
    }
}
