//! Multi-label classifiers over embedding vectors.
//!
//! Two interchangeable strategies share one contract: [`KnnClassifier`]
//! votes with the labels of the nearest training examples (open label
//! vocabulary: any label a neighbor carries can be predicted), while
//! [`OneVsRestClassifier`] fits one logistic estimator per label seen at
//! training time (closed vocabulary: unseen labels can never be predicted).
//! That vocabulary difference is part of the contract, not an accident.

pub mod error;
pub mod knn;
pub mod one_vs_rest;

use std::collections::{HashMap, HashSet};

use ndarray::Array1;

pub use error::ClassifierError;
pub use knn::{KnnClassifier, SimilarityIndex};
pub use one_vs_rest::OneVsRestClassifier;

/// The set of labels attached to a single item, ground truth or predicted.
pub type LabelSet = HashSet<String>;

/// Labels for one query ordered highest-confidence first. Every label in the
/// item's thresholded [`LabelSet`] also appears here.
pub type RankedLabels = Vec<String>;

/// Fraction-of-support a label needs before it makes the thresholded set,
/// when the caller doesn't override it.
pub const DEFAULT_PREDICT_THRESHOLD: f32 = 0.5;

/// Shared contract for both classification strategies, so the orchestrator
/// can pick one by name and drive it through a trait object.
///
/// Lifecycle: a classifier is created empty, populated by exactly one
/// successful `fit` call, then queried any number of times. Querying before
/// `fit`, or fitting twice, is an [`ClassifierError::InvalidState`].
pub trait MultiLabelClassifier {
    /// Fits the classifier on index-aligned training vectors and label sets.
    fn fit(
        &mut self,
        vectors: &[Array1<f32>],
        label_sets: &[LabelSet],
    ) -> Result<(), ClassifierError>;

    /// Predicts a thresholded label set and a full ranking per query vector.
    ///
    /// `threshold: None` uses the classifier's default. Results are
    /// index-aligned with `vectors`; an empty query batch yields empty
    /// results, not an error.
    fn predict(
        &self,
        vectors: &[Array1<f32>],
        threshold: Option<f32>,
    ) -> Result<(Vec<LabelSet>, Vec<RankedLabels>), ClassifierError>;

    /// Per-query mapping from label to probability in [0, 1].
    fn predict_proba(
        &self,
        vectors: &[Array1<f32>],
    ) -> Result<Vec<HashMap<String, f32>>, ClassifierError>;
}
