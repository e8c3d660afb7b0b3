use std::collections::{BTreeSet, HashMap};

use log::debug;
use ndarray::{Array1, Array2};

use super::error::ClassifierError;
use super::{LabelSet, MultiLabelClassifier, RankedLabels};

/// Iteration cap for the per-label logistic estimators.
pub const DEFAULT_MAX_ITER: usize = 1000;

const LEARNING_RATE: f32 = 0.1;
const GRADIENT_TOLERANCE: f32 = 1e-6;

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Binary logistic estimator trained with batch gradient descent on the
/// log-loss. Stops early once the gradient infinity-norm drops below
/// tolerance, otherwise runs to the iteration cap.
#[derive(Debug)]
struct LogisticRegression {
    weights: Array1<f32>,
    bias: f32,
}

impl LogisticRegression {
    fn fit(x: &Array2<f32>, targets: &Array1<f32>, max_iter: usize) -> Self {
        let n = x.nrows() as f32;
        let mut weights: Array1<f32> = Array1::zeros(x.ncols());
        let mut bias = 0.0f32;

        for _ in 0..max_iter {
            let logits = x.dot(&weights) + bias;
            let probs = logits.mapv(sigmoid);
            let errors = &probs - targets;
            let grad_w = x.t().dot(&errors) / n;
            let grad_b = errors.sum() / n;

            weights.scaled_add(-LEARNING_RATE, &grad_w);
            bias -= LEARNING_RATE * grad_b;

            let max_grad = grad_w.iter().fold(grad_b.abs(), |m, g| m.max(g.abs()));
            if max_grad < GRADIENT_TOLERANCE {
                break;
            }
        }

        Self { weights, bias }
    }

    /// P(label | vector). A sigmoid output, so always within [0, 1].
    fn predict_proba(&self, vector: &Array1<f32>) -> f32 {
        sigmoid(self.weights.dot(vector) + self.bias)
    }
}

/// Multi-label classifier built from one independent binary logistic
/// estimator per label (one-vs-rest decomposition).
///
/// The label vocabulary is closed: it is the sorted set of labels observed at
/// fit time, and a label outside it can never be predicted nor appear in
/// `predict_proba` output. Estimators share no decision boundary, which makes
/// non-exclusive multi-label output natural at the cost of ignoring label
/// correlation. Contrast with [`super::KnnClassifier`]'s open vocabulary.
#[derive(Debug)]
pub struct OneVsRestClassifier {
    threshold: f32,
    max_iter: usize,
    state: Option<FittedOneVsRest>,
}

#[derive(Debug)]
struct FittedOneVsRest {
    vocabulary: Vec<String>,
    estimators: Vec<LogisticRegression>,
    dim: usize,
}

impl OneVsRestClassifier {
    /// Creates an unfitted classifier. `threshold` becomes the default for
    /// `predict` calls that don't override it.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            max_iter: DEFAULT_MAX_ITER,
            state: None,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The sorted label vocabulary observed at fit time, if fitted.
    pub fn vocabulary(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.vocabulary.as_slice())
    }

    fn fitted(&self) -> Result<&FittedOneVsRest, ClassifierError> {
        self.state.as_ref().ok_or_else(|| {
            ClassifierError::InvalidState("OneVsRestClassifier has not been fitted".into())
        })
    }

    /// Probability per vocabulary label, positionally aligned with the
    /// vocabulary ordering.
    fn probabilities(
        &self,
        fitted: &FittedOneVsRest,
        query: &Array1<f32>,
    ) -> Result<Vec<f32>, ClassifierError> {
        if query.len() != fitted.dim {
            return Err(ClassifierError::ValidationError(format!(
                "Query vector has dimension {} but the classifier was fitted with {}",
                query.len(),
                fitted.dim
            )));
        }
        Ok(fitted
            .estimators
            .iter()
            .map(|estimator| estimator.predict_proba(query))
            .collect())
    }
}

impl MultiLabelClassifier for OneVsRestClassifier {
    fn fit(
        &mut self,
        vectors: &[Array1<f32>],
        label_sets: &[LabelSet],
    ) -> Result<(), ClassifierError> {
        if self.state.is_some() {
            return Err(ClassifierError::InvalidState(
                "OneVsRestClassifier is already fitted".into(),
            ));
        }
        if vectors.len() != label_sets.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} vectors but {} label sets",
                vectors.len(),
                label_sets.len()
            )));
        }

        // Sorted so the label ordering is reproducible regardless of input
        // iteration order; probability vectors are zipped against it
        // positionally downstream.
        let vocabulary: Vec<String> = label_sets
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        if vocabulary.is_empty() {
            return Err(ClassifierError::ValidationError(
                "No labels observed in the training data".into(),
            ));
        }

        let dim = vectors[0].len();
        let mut flat = Vec::with_capacity(vectors.len() * dim);
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dim {
                return Err(ClassifierError::ValidationError(format!(
                    "Training vector {} has dimension {} but vector 0 has {}",
                    i,
                    vector.len(),
                    dim
                )));
            }
            flat.extend(vector.iter().copied());
        }
        let x = Array2::from_shape_vec((vectors.len(), dim), flat).map_err(|e| {
            ClassifierError::ValidationError(format!("Failed to assemble training matrix: {}", e))
        })?;

        let mut estimators = Vec::with_capacity(vocabulary.len());
        for label in &vocabulary {
            let targets: Array1<f32> = label_sets
                .iter()
                .map(|set| if set.contains(label) { 1.0 } else { 0.0 })
                .collect();
            estimators.push(LogisticRegression::fit(&x, &targets, self.max_iter));
        }
        debug!(
            "Fitted one-vs-rest classifier: {} labels, {} examples, dim {}",
            vocabulary.len(),
            vectors.len(),
            dim
        );

        self.state = Some(FittedOneVsRest {
            vocabulary,
            estimators,
            dim,
        });
        Ok(())
    }

    fn predict(
        &self,
        vectors: &[Array1<f32>],
        threshold: Option<f32>,
    ) -> Result<(Vec<LabelSet>, Vec<RankedLabels>), ClassifierError> {
        let fitted = self.fitted()?;
        let threshold = threshold.unwrap_or(self.threshold);

        let mut predictions = Vec::with_capacity(vectors.len());
        let mut ranked_predictions = Vec::with_capacity(vectors.len());

        for query in vectors {
            let probs = self.probabilities(fitted, query)?;

            let predicted: LabelSet = fitted
                .vocabulary
                .iter()
                .zip(&probs)
                .filter(|(_, prob)| **prob >= threshold)
                .map(|(label, _)| label.clone())
                .collect();

            // Stable sort: exactly-tied probabilities keep vocabulary order
            let mut order: Vec<usize> = (0..fitted.vocabulary.len()).collect();
            order.sort_by(|&a, &b| {
                probs[b]
                    .partial_cmp(&probs[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let ranked: RankedLabels = order
                .into_iter()
                .map(|i| fitted.vocabulary[i].clone())
                .collect();

            predictions.push(predicted);
            ranked_predictions.push(ranked);
        }

        Ok((predictions, ranked_predictions))
    }

    fn predict_proba(
        &self,
        vectors: &[Array1<f32>],
    ) -> Result<Vec<HashMap<String, f32>>, ClassifierError> {
        let fitted = self.fitted()?;

        let mut probabilities = Vec::with_capacity(vectors.len());
        for query in vectors {
            let probs = self.probabilities(fitted, query)?;
            // Closed vocabulary: every label gets an explicit value
            probabilities.push(
                fitted
                    .vocabulary
                    .iter()
                    .cloned()
                    .zip(probs)
                    .collect::<HashMap<String, f32>>(),
            );
        }

        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds_and_monotonicity() {
        assert!(sigmoid(-20.0) > 0.0);
        assert!(sigmoid(20.0) < 1.0);
        assert!(sigmoid(-1.0) < sigmoid(0.0));
        assert!(sigmoid(0.0) < sigmoid(1.0));
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_logistic_regression_separates_classes() {
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 0.0, 0.9, 0.1, 0.0, 1.0, 0.1, 0.9],
        )
        .unwrap();
        let targets = Array1::from_vec(vec![1.0, 1.0, 0.0, 0.0]);
        let estimator = LogisticRegression::fit(&x, &targets, DEFAULT_MAX_ITER);

        let positive = estimator.predict_proba(&Array1::from_vec(vec![1.0, 0.0]));
        let negative = estimator.predict_proba(&Array1::from_vec(vec![0.0, 1.0]));
        assert!(positive > 0.7, "expected confident positive, got {}", positive);
        assert!(negative < 0.3, "expected confident negative, got {}", negative);
    }

    #[test]
    fn test_constant_target_converges_toward_one() {
        let x = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let targets = Array1::from_vec(vec![1.0, 1.0]);
        let estimator = LogisticRegression::fit(&x, &targets, DEFAULT_MAX_ITER);
        assert!(estimator.predict_proba(&Array1::from_vec(vec![0.5, 0.5])) > 0.5);
    }
}
