use labelkit::{ClassifierError, KnnClassifier, MultiLabelClassifier};
use ndarray::Array1;
use std::collections::HashSet;

fn labels(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn vec2(x: f32, y: f32) -> Array1<f32> {
    Array1::from_vec(vec![x, y])
}

/// Training set from the news/sports voting scenario: two "news" vectors
/// clustered near the x axis, two "sports" vectors near the y axis.
fn news_sports_fixture() -> (Vec<Array1<f32>>, Vec<HashSet<String>>) {
    let vectors = vec![
        vec2(1.0, 0.0),  // v1 news
        vec2(0.95, 0.1), // v2 news
        vec2(0.5, 0.6),  // v3 sports, still closer to the query than v4
        vec2(0.0, 1.0),  // v4 sports
    ];
    let label_sets = vec![
        labels(&["news"]),
        labels(&["news"]),
        labels(&["sports"]),
        labels(&["sports"]),
    ];
    (vectors, label_sets)
}

#[test]
fn test_neighbor_vote_tally_and_thresholds() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(3);
    classifier.fit(&vectors, &label_sets)?;

    // Nearest three to this query are v1, v2, v3 -> tally news:2, sports:1
    let query = vec![vec2(1.0, 0.05)];

    let (predicted, ranked) = classifier.predict(&query, Some(0.5))?;
    // min_count = max(1, floor(3 * 0.5)) = 1: both labels make the cut
    assert_eq!(predicted[0], labels(&["news", "sports"]));
    assert_eq!(ranked[0], vec!["news".to_string(), "sports".to_string()]);

    let (predicted, _) = classifier.predict(&query, Some(0.9))?;
    // min_count = max(1, floor(3 * 0.9)) = 2: only news survives
    assert_eq!(predicted[0], labels(&["news"]));

    Ok(())
}

#[test]
fn test_thresholded_set_is_subset_of_ranking() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(3);
    classifier.fit(&vectors, &label_sets)?;

    let queries = vec![vec2(1.0, 0.0), vec2(0.1, 1.0), vec2(0.7, 0.7)];
    let (predicted, ranked) = classifier.predict(&queries, Some(0.3))?;

    for (set, ranking) in predicted.iter().zip(&ranked) {
        for label in set {
            assert!(
                ranking.contains(label),
                "label {:?} predicted but missing from ranking {:?}",
                label,
                ranking
            );
        }
    }
    Ok(())
}

#[test]
fn test_threshold_monotonicity() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(3);
    classifier.fit(&vectors, &label_sets)?;

    let queries = vec![vec2(1.0, 0.05), vec2(0.3, 0.9)];
    let (loose, _) = classifier.predict(&queries, Some(0.2))?;
    let (strict, _) = classifier.predict(&queries, Some(0.8))?;

    for (loose_set, strict_set) in loose.iter().zip(&strict) {
        assert!(
            strict_set.is_subset(loose_set),
            "higher threshold must predict a subset: {:?} vs {:?}",
            strict_set,
            loose_set
        );
    }
    Ok(())
}

#[test]
fn test_predict_proba_fractions_and_omissions() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(3);
    classifier.fit(&vectors, &label_sets)?;

    let probs = classifier.predict_proba(&[vec2(1.0, 0.05)])?;
    assert_eq!(probs[0]["news"], 2.0 / 3.0);
    assert_eq!(probs[0]["sports"], 1.0 / 3.0);

    // A query deep in news territory with k=1 sees only news neighbors;
    // sports gets no entry at all rather than an explicit zero
    let mut single = KnnClassifier::new(1);
    let (vectors, label_sets) = news_sports_fixture();
    single.fit(&vectors, &label_sets)?;
    let probs = single.predict_proba(&[vec2(1.0, 0.0)])?;
    assert_eq!(probs[0].get("news"), Some(&1.0));
    assert_eq!(probs[0].get("sports"), None);

    Ok(())
}

#[test]
fn test_open_vocabulary_keeps_rare_neighbor_labels() -> Result<(), Box<dyn std::error::Error>> {
    // One neighbor carries a label no other example has; with a low
    // threshold a single supporting neighbor is enough to predict it
    let vectors = vec![vec2(1.0, 0.0), vec2(0.9, 0.2), vec2(0.0, 1.0)];
    let label_sets = vec![
        labels(&["news", "exclusive"]),
        labels(&["news"]),
        labels(&["sports"]),
    ];
    let mut classifier = KnnClassifier::new(2);
    classifier.fit(&vectors, &label_sets)?;

    let (predicted, ranked) = classifier.predict(&[vec2(1.0, 0.1)], Some(0.1))?;
    assert!(predicted[0].contains("exclusive"));
    assert!(ranked[0].contains(&"exclusive".to_string()));
    Ok(())
}

#[test]
fn test_predict_before_fit_is_invalid_state() {
    let classifier = KnnClassifier::new(3);
    let result = classifier.predict(&[vec2(1.0, 0.0)], None);
    assert!(matches!(result, Err(ClassifierError::InvalidState(_))));

    let result = classifier.predict_proba(&[vec2(1.0, 0.0)]);
    assert!(matches!(result, Err(ClassifierError::InvalidState(_))));
}

#[test]
fn test_double_fit_is_invalid_state() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(2);
    classifier.fit(&vectors, &label_sets)?;

    let result = classifier.fit(&vectors, &label_sets);
    assert!(matches!(result, Err(ClassifierError::InvalidState(_))));
    Ok(())
}

#[test]
fn test_fit_with_fewer_examples_than_k_fails() {
    let mut classifier = KnnClassifier::new(10);
    let (vectors, label_sets) = news_sports_fixture();
    let result = classifier.fit(&vectors, &label_sets);
    assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
}

#[test]
fn test_empty_query_batch_yields_empty_results() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(2);
    classifier.fit(&vectors, &label_sets)?;

    let (predicted, ranked) = classifier.predict(&[], None)?;
    assert!(predicted.is_empty());
    assert!(ranked.is_empty());

    let probs = classifier.predict_proba(&[])?;
    assert!(probs.is_empty());
    Ok(())
}

#[test]
fn test_zero_norm_query_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (vectors, label_sets) = news_sports_fixture();
    let mut classifier = KnnClassifier::new(2);
    classifier.fit(&vectors, &label_sets)?;

    let result = classifier.predict(&[vec2(0.0, 0.0)], None);
    assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    Ok(())
}

#[test]
fn test_prediction_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    // All four training vectors are equidistant from the query; tie-breaks
    // (insertion index, then first-seen label order) must make repeated
    // calls agree exactly
    let vectors = vec![vec2(1.0, 1.0), vec2(1.0, 1.0), vec2(1.0, 1.0), vec2(1.0, 1.0)];
    let label_sets = vec![
        labels(&["a", "b"]),
        labels(&["c"]),
        labels(&["b"]),
        labels(&["d"]),
    ];
    let mut classifier = KnnClassifier::new(3);
    classifier.fit(&vectors, &label_sets)?;

    let (first_sets, first_ranked) = classifier.predict(&[vec2(2.0, 2.0)], Some(0.4))?;
    for _ in 0..5 {
        let (sets, ranked) = classifier.predict(&[vec2(2.0, 2.0)], Some(0.4))?;
        assert_eq!(sets, first_sets);
        assert_eq!(ranked, first_ranked);
    }
    // b leads: two of the three nearest neighbors carry it
    assert_eq!(first_ranked[0][0], "b");
    Ok(())
}
