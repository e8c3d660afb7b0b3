//! Multi-label baseline classification and evaluation over text embeddings.
//!
//! Free-text items are embedded (ONNX MiniLM by default), labeled with one of
//! two interchangeable classifiers (neighbor voting or one-vs-rest logistic
//! regression), and scored against held-out ground truth with a standard
//! multi-label metrics suite.
//!
//! # Basic Usage
//!
//! The classifiers work on raw vectors, so they can be used without any
//! embedding model at all:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labelkit::{KnnClassifier, MultiLabelClassifier};
//! use ndarray::Array1;
//! use std::collections::HashSet;
//!
//! let vectors = vec![
//!     Array1::from_vec(vec![1.0, 0.0]),
//!     Array1::from_vec(vec![0.9, 0.1]),
//!     Array1::from_vec(vec![0.0, 1.0]),
//! ];
//! let labels: Vec<HashSet<String>> = vec![
//!     HashSet::from(["news".to_string()]),
//!     HashSet::from(["news".to_string()]),
//!     HashSet::from(["sports".to_string()]),
//! ];
//!
//! let mut classifier = KnnClassifier::new(2);
//! classifier.fit(&vectors, &labels)?;
//!
//! let (predicted, ranked) = classifier.predict(&[Array1::from_vec(vec![1.0, 0.05])], None)?;
//! assert!(predicted[0].contains("news"));
//! assert_eq!(ranked[0][0], "news");
//! # Ok(())
//! # }
//! ```
//!
//! # End to End
//!
//! The `labelkit_bin` binary reproduces the full baseline flow: load a JSONL
//! export, embed, train, evaluate, and optionally POST the results to a
//! callback endpoint. See [`runner::run_training`] for the library entry
//! point; any [`embedding::EmbeddingProvider`] can stand in for the ONNX
//! embedder, which is how the tests run without model downloads.

pub mod classifier;
pub mod data;
pub mod embedding;
pub mod metrics;
pub mod model_manager;
pub mod models;
pub mod report;
pub mod runner;
mod runtime;

pub use classifier::{
    ClassifierError, KnnClassifier, LabelSet, MultiLabelClassifier, OneVsRestClassifier,
    RankedLabels, SimilarityIndex, DEFAULT_PREDICT_THRESHOLD,
};
pub use embedding::{Embedder, EmbedderBuilder, EmbedderInfo, EmbeddingProvider};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use report::{RunMetrics, RunOutcome};
pub use runner::{run_training, Method, RunConfig, EVAL_TOP_K, MIN_TRAINING_SAMPLES};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
