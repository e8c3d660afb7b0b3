//! The training orchestrator: split, embed, fit, predict, evaluate.

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::classifier::{
    ClassifierError, KnnClassifier, LabelSet, MultiLabelClassifier, OneVsRestClassifier,
};
use crate::data::{extract_labels, train_test_split, ExportRecord};
use crate::embedding::EmbeddingProvider;
use crate::metrics::{label_distribution, macro_f1, per_label_recall, top_k_accuracy};
use crate::report::{RunMetrics, RunOutcome};

/// Below this many labeled records a run is reported as failed instead of
/// trained. Cold-start labeling systems hit this routinely, so it is a soft,
/// reportable condition rather than a hard error.
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// How many ranked predictions count for the accuracy metric.
pub const EVAL_TOP_K: usize = 3;

/// Which classification strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Method {
    /// Neighbor voting over embedding similarity
    Knn,
    /// One-vs-rest logistic regression
    Logreg,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Knn => write!(f, "knn"),
            Method::Logreg => write!(f, "logreg"),
        }
    }
}

/// Parameters for one training run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub method: Method,
    pub k: usize,
    pub threshold: f32,
    pub test_split: f64,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            method: Method::Knn,
            k: 5,
            threshold: crate::classifier::DEFAULT_PREDICT_THRESHOLD,
            test_split: 0.2,
            seed: 42,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Trains the selected classifier on an embedded split of `records` and
/// scores it on the held-out portion.
///
/// Too little data yields `Ok(RunOutcome::Failed { .. })` so the caller can
/// still deliver a failure report; invalid state or input fails hard.
pub fn run_training<P: EmbeddingProvider>(
    records: &[ExportRecord],
    provider: &P,
    config: &RunConfig,
) -> Result<RunOutcome, ClassifierError> {
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let labels: Vec<LabelSet> = records.iter().map(extract_labels).collect();

    let all_labels: Vec<String> = labels
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    info!("Found {} unique labels", all_labels.len());

    if records.len() < MIN_TRAINING_SAMPLES {
        return Ok(RunOutcome::Failed {
            reason: format!(
                "Insufficient data: {} samples (minimum {} required)",
                records.len(),
                MIN_TRAINING_SAMPLES
            ),
        });
    }

    let (texts_train, texts_test, labels_train, labels_test) =
        train_test_split(texts, labels, config.test_split, config.seed);
    info!("Training samples: {}", texts_train.len());
    info!("Test samples: {}", texts_test.len());

    info!("Generating embeddings...");
    let train_vectors = provider.embed_batch(&texts_train)?;
    let test_vectors = provider.embed_batch(&texts_test)?;

    info!("Training {} classifier...", config.method);
    let mut classifier: Box<dyn MultiLabelClassifier> = match config.method {
        Method::Knn => Box::new(KnnClassifier::new(config.k)),
        Method::Logreg => Box::new(OneVsRestClassifier::new(config.threshold)),
    };
    classifier.fit(&train_vectors, &labels_train)?;

    let threshold_override = match config.method {
        Method::Knn => Some(config.threshold),
        Method::Logreg => None, // construction-time default applies
    };
    let (predictions, ranked_predictions) =
        classifier.predict(&test_vectors, threshold_override)?;

    info!("Calculating metrics...");
    let top3 = top_k_accuracy(&labels_test, &ranked_predictions, EVAL_TOP_K);
    let macro_f1_score = macro_f1(&labels_test, &predictions, &all_labels);
    let recall_by_label: BTreeMap<String, f64> =
        per_label_recall(&labels_test, &predictions, &all_labels)
            .into_iter()
            .map(|(label, recall)| (label, round4(recall)))
            .collect();
    let train_distribution: BTreeMap<String, usize> =
        label_distribution(&labels_train).into_iter().collect();

    Ok(RunOutcome::Completed(RunMetrics {
        top3_accuracy: round4(top3),
        macro_f1: round4(macro_f1_score),
        per_label_recall: recall_by_label,
        train_samples: texts_train.len(),
        test_samples: texts_test.len(),
        unique_labels: all_labels.len(),
        label_distribution: train_distribution,
    }))
}
