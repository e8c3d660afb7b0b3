//! Ingest of line-delimited JSON exports from the labelling portal.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::classifier::LabelSet;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed record on line {line}: {source}")]
    ParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One exported item: the free text plus its primary category labels.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRecord {
    pub text: String,
    #[serde(default)]
    pub labels_main: Vec<LabelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    pub key: String,
}

/// Loads records from a JSONL file, skipping blank lines.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<ExportRecord>, DataError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| DataError::ParseError { line: i + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

/// Extracts the primary category label set from a record.
pub fn extract_labels(record: &ExportRecord) -> LabelSet {
    record
        .labels_main
        .iter()
        .map(|entry| entry.key.clone())
        .collect()
}

/// Splits index-aligned texts and label sets into train and test portions.
///
/// The shuffle is driven by a seeded RNG so a given (data, seed) pair always
/// produces the same split. Test size is `ceil(n * test_split)`.
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    texts: Vec<String>,
    labels: Vec<LabelSet>,
    test_split: f64,
    seed: u64,
) -> (Vec<String>, Vec<String>, Vec<LabelSet>, Vec<LabelSet>) {
    debug_assert_eq!(texts.len(), labels.len());
    let n = texts.len();
    let n_test = (((n as f64) * test_split).ceil() as usize).min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices: std::collections::HashSet<usize> =
        indices.into_iter().take(n_test).collect();

    let mut texts_train = Vec::with_capacity(n - n_test);
    let mut texts_test = Vec::with_capacity(n_test);
    let mut labels_train = Vec::with_capacity(n - n_test);
    let mut labels_test = Vec::with_capacity(n_test);

    for (i, (text, label_set)) in texts.into_iter().zip(labels).enumerate() {
        if test_indices.contains(&i) {
            texts_test.push(text);
            labels_test.push(label_set);
        } else {
            texts_train.push(text);
            labels_train.push(label_set);
        }
    }

    (texts_train, texts_test, labels_train, labels_test)
}
