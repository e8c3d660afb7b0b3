//! Text embedding: the `embed(texts) -> vectors` collaborator.
//!
//! The classifier core never touches this module; only the orchestrator
//! does, through the [`EmbeddingProvider`] seam. Production code uses the
//! ONNX-backed [`Embedder`]; tests substitute deterministic stubs.

pub mod encoder;
pub mod provider;

use ndarray::Array1;

use crate::classifier::ClassifierError;

pub use encoder::TextEncoder;
pub use provider::{Embedder, EmbedderBuilder, EmbedderInfo};

/// Maps a batch of texts to one vector each, same order, with a single fixed
/// dimensionality for every call within a run.
pub trait EmbeddingProvider {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Array1<f32>>, ClassifierError>;
}
