//! Evaluation metrics for multi-label classification.
//!
//! Pure functions over in-memory label sets and rankings. Every metric is
//! total: zero denominators yield 0.0 rather than an error, so zero-support
//! labels and empty inputs are safe to score.

use std::collections::HashMap;

use crate::classifier::{LabelSet, RankedLabels};

/// Fraction of items whose true label set intersects the first `k` entries
/// of the ranked prediction. 0.0 for empty input.
pub fn top_k_accuracy(y_true: &[LabelSet], y_pred_ranked: &[RankedLabels], k: usize) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred_ranked)
        .filter(|(true_labels, ranked)| {
            ranked
                .iter()
                .take(k)
                .any(|label| true_labels.contains(label))
        })
        .count();
    correct as f64 / y_true.len() as f64
}

fn label_counts(y_true: &[LabelSet], y_pred: &[LabelSet], label: &str) -> (usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut fn_ = 0;
    for (truth, pred) in y_true.iter().zip(y_pred) {
        match (truth.contains(label), pred.contains(label)) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    (tp, fp, fn_)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Unweighted mean F1 over `all_labels`.
///
/// A label with no true and no predicted occurrences still contributes an F1
/// of 0 to the average: the evaluation vocabulary decides what counts, not
/// the classifier's output.
pub fn macro_f1(y_true: &[LabelSet], y_pred: &[LabelSet], all_labels: &[String]) -> f64 {
    if all_labels.is_empty() {
        return 0.0;
    }
    let total: f64 = all_labels
        .iter()
        .map(|label| {
            let (tp, fp, fn_) = label_counts(y_true, y_pred, label);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            }
        })
        .sum();
    total / all_labels.len() as f64
}

/// Per-label precision `TP / (TP + FP)`, 0.0 when the label was never predicted.
pub fn per_label_precision(
    y_true: &[LabelSet],
    y_pred: &[LabelSet],
    all_labels: &[String],
) -> HashMap<String, f64> {
    all_labels
        .iter()
        .map(|label| {
            let (tp, fp, _) = label_counts(y_true, y_pred, label);
            (label.clone(), ratio(tp, tp + fp))
        })
        .collect()
}

/// Per-label recall `TP / (TP + FN)`, 0.0 when the label never occurs in truth.
pub fn per_label_recall(
    y_true: &[LabelSet],
    y_pred: &[LabelSet],
    all_labels: &[String],
) -> HashMap<String, f64> {
    all_labels
        .iter()
        .map(|label| {
            let (tp, _, fn_) = label_counts(y_true, y_pred, label);
            (label.clone(), ratio(tp, tp + fn_))
        })
        .collect()
}

/// Occurrence count per label across all items. Labels that never occur are
/// absent from the mapping, not present with 0.
pub fn label_distribution(label_sets: &[LabelSet]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for labels in label_sets {
        for label in labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
    }
    counts
}
