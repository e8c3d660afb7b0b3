use std::collections::HashMap;

use log::debug;
use ndarray::Array1;

use super::error::ClassifierError;
use super::{LabelSet, MultiLabelClassifier, RankedLabels, DEFAULT_PREDICT_THRESHOLD};

/// Brute-force nearest-neighbor index over embedding vectors.
///
/// Answers "which `k` training vectors are closest to this query by cosine
/// distance" (`1 - cosine_similarity`). Distance ties are broken by insertion
/// index, lower index first, so results are deterministic for identical
/// input. A substitute approximate index would have to preserve that
/// tie-break to keep behavior observable-equivalent.
#[derive(Debug)]
pub struct SimilarityIndex {
    k: usize,
    vectors: Vec<Array1<f32>>,
    norms: Vec<f32>,
}

impl SimilarityIndex {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            vectors: Vec::new(),
            norms: Vec::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of fitted vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Stores the training vectors. All vectors must share one dimensionality
    /// and have nonzero norm, and there must be at least `k` of them.
    pub fn fit(&mut self, vectors: &[Array1<f32>]) -> Result<(), ClassifierError> {
        if self.k == 0 {
            return Err(ClassifierError::ValidationError(
                "k must be at least 1".into(),
            ));
        }
        if vectors.len() < self.k {
            return Err(ClassifierError::ValidationError(format!(
                "Cannot fit index with {} vectors when k is {}",
                vectors.len(),
                self.k
            )));
        }

        let dim = vectors[0].len();
        let mut norms = Vec::with_capacity(vectors.len());
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dim {
                return Err(ClassifierError::ValidationError(format!(
                    "Training vector {} has dimension {} but vector 0 has {}",
                    i,
                    vector.len(),
                    dim
                )));
            }
            let norm = vector.dot(vector).sqrt();
            if norm <= f32::EPSILON {
                return Err(ClassifierError::ValidationError(format!(
                    "Training vector {} has zero norm; cosine distance is undefined",
                    i
                )));
            }
            norms.push(norm);
        }

        self.vectors = vectors.to_vec();
        self.norms = norms;
        debug!("Fitted similarity index: {} vectors, k={}", self.len(), self.k);
        Ok(())
    }

    /// Returns the indices of the `k` nearest fitted vectors, nearest first.
    pub fn nearest(&self, query: &Array1<f32>) -> Result<Vec<usize>, ClassifierError> {
        if self.is_empty() {
            return Err(ClassifierError::InvalidState(
                "Similarity index has not been fitted".into(),
            ));
        }
        let dim = self.vectors[0].len();
        if query.len() != dim {
            return Err(ClassifierError::ValidationError(format!(
                "Query vector has dimension {} but the index was fitted with {}",
                query.len(),
                dim
            )));
        }
        let query_norm = query.dot(query).sqrt();
        if query_norm <= f32::EPSILON {
            return Err(ClassifierError::ValidationError(
                "Query vector has zero norm; cosine distance is undefined".into(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (vector, norm))| {
                let distance = 1.0 - query.dot(vector) / (query_norm * norm);
                (i, distance)
            })
            .collect();

        // Equal distances fall back to insertion order
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(self.k);

        Ok(scored.into_iter().map(|(i, _)| i).collect())
    }
}

/// Multi-label classifier that votes with the labels of the `k` nearest
/// training examples.
///
/// The label vocabulary is open: any label carried by a neighbor can show up
/// in a prediction, including labels absent from most of the training set.
/// Contrast with [`super::OneVsRestClassifier`], which is closed over the
/// vocabulary observed at fit time.
#[derive(Debug)]
pub struct KnnClassifier {
    k: usize,
    state: Option<FittedKnn>,
}

#[derive(Debug)]
struct FittedKnn {
    index: SimilarityIndex,
    label_sets: Vec<LabelSet>,
}

impl KnnClassifier {
    /// Creates an unfitted classifier that will vote over `k` neighbors.
    pub fn new(k: usize) -> Self {
        Self { k, state: None }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn fitted(&self) -> Result<&FittedKnn, ClassifierError> {
        self.state.as_ref().ok_or_else(|| {
            ClassifierError::InvalidState("KnnClassifier has not been fitted".into())
        })
    }

    /// Tallies, per label, how many of the query's neighbors carry it.
    /// A neighbor contributes at most 1 to each of its own labels.
    ///
    /// Returned pairs are in first-encounter order scanning neighbors
    /// nearest to farthest; a neighbor's own labels are scanned in sorted
    /// order so the encounter order does not depend on hash seeding.
    fn tally(&self, fitted: &FittedKnn, query: &Array1<f32>) -> Result<Vec<(String, usize)>, ClassifierError> {
        let neighbors = fitted.index.nearest(query)?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for idx in neighbors {
            let mut labels: Vec<&str> = fitted.label_sets[idx].iter().map(String::as_str).collect();
            labels.sort_unstable();
            for label in labels {
                let count = counts.entry(label).or_insert(0);
                if *count == 0 {
                    order.push(label);
                }
                *count += 1;
            }
        }

        Ok(order
            .into_iter()
            .map(|label| (label.to_string(), counts[label]))
            .collect())
    }
}

impl MultiLabelClassifier for KnnClassifier {
    fn fit(
        &mut self,
        vectors: &[Array1<f32>],
        label_sets: &[LabelSet],
    ) -> Result<(), ClassifierError> {
        if self.state.is_some() {
            return Err(ClassifierError::InvalidState(
                "KnnClassifier is already fitted".into(),
            ));
        }
        if vectors.len() != label_sets.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} vectors but {} label sets",
                vectors.len(),
                label_sets.len()
            )));
        }

        let mut index = SimilarityIndex::new(self.k);
        index.fit(vectors)?;

        self.state = Some(FittedKnn {
            index,
            label_sets: label_sets.to_vec(),
        });
        Ok(())
    }

    fn predict(
        &self,
        vectors: &[Array1<f32>],
        threshold: Option<f32>,
    ) -> Result<(Vec<LabelSet>, Vec<RankedLabels>), ClassifierError> {
        let fitted = self.fitted()?;
        let threshold = threshold.unwrap_or(DEFAULT_PREDICT_THRESHOLD);
        // Negative products saturate to 0 on the cast, so the floor of 1 holds
        let min_count = std::cmp::max(1, (self.k as f32 * threshold).floor() as usize);

        let mut predictions = Vec::with_capacity(vectors.len());
        let mut ranked_predictions = Vec::with_capacity(vectors.len());

        for query in vectors {
            let mut tallies = self.tally(fitted, query)?;
            // Stable sort keeps first-encounter order among equal tallies
            tallies.sort_by(|a, b| b.1.cmp(&a.1));

            let predicted: LabelSet = tallies
                .iter()
                .filter(|(_, count)| *count >= min_count)
                .map(|(label, _)| label.clone())
                .collect();
            let ranked: RankedLabels = tallies.into_iter().map(|(label, _)| label).collect();

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
            // Labels with zero tally never enter the tally, so they are
            // omitted from the mapping rather than reported as 0.0
            let probs: HashMap<String, f32> = self
                .tally(fitted, query)?
                .into_iter()
                .map(|(label, count)| (label, count as f32 / self.k as f32))
                .collect();
            probabilities.push(probs);
        }

        Ok(probabilities)
    }
}
