//! Run results: the serializable metrics report and the status callback.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{error, info};
use serde::Serialize;

/// Metrics and run metadata for one completed training run.
///
/// `BTreeMap`s keep the serialized key order reproducible across runs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunMetrics {
    pub top3_accuracy: f64,
    pub macro_f1: f64,
    pub per_label_recall: BTreeMap<String, f64>,
    pub train_samples: usize,
    pub test_samples: usize,
    pub unique_labels: usize,
    pub label_distribution: BTreeMap<String, usize>,
}

/// Outcome of a training run: metrics on success, a human-readable reason on
/// failure. Soft failures (e.g. not enough data) land here too, so the
/// caller can always report something.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunMetrics),
    Failed { reason: String },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CallbackStatus {
    Completed,
    Failed,
}

#[derive(Debug, Serialize)]
struct CallbackPayload<'a> {
    #[serde(rename = "runId")]
    run_id: &'a str,
    status: CallbackStatus,
    metrics: Option<&'a RunMetrics>,
    error: Option<&'a str>,
}

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts the run outcome to a status-tracking endpoint.
///
/// Returns `Ok(false)` when the delivery failed; the run itself is not
/// invalidated by an unreachable callback target.
pub async fn send_callback(
    callback_url: &str,
    run_id: &str,
    outcome: &RunOutcome,
) -> Result<bool, reqwest::Error> {
    let payload = match outcome {
        RunOutcome::Completed(metrics) => CallbackPayload {
            run_id,
            status: CallbackStatus::Completed,
            metrics: Some(metrics),
            error: None,
        },
        RunOutcome::Failed { reason } => CallbackPayload {
            run_id,
            status: CallbackStatus::Failed,
            metrics: None,
            error: Some(reason),
        },
    };

    let client = reqwest::Client::builder()
        .timeout(CALLBACK_TIMEOUT)
        .build()?;

    match client.post(callback_url).json(&payload).send().await {
        Ok(response) => match response.error_for_status() {
            Ok(_) => {
                info!("Callback sent successfully: {:?}", payload.status);
                Ok(true)
            }
            Err(e) => {
                error!("Callback rejected by {}: {}", callback_url, e);
                Ok(false)
            }
        },
        Err(e) => {
            error!("Failed to send callback: {}", e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> RunMetrics {
        RunMetrics {
            top3_accuracy: 0.75,
            macro_f1: 0.5,
            per_label_recall: BTreeMap::from([("news".to_string(), 1.0)]),
            train_samples: 8,
            test_samples: 2,
            unique_labels: 1,
            label_distribution: BTreeMap::from([("news".to_string(), 8)]),
        }
    }

    #[test]
    fn test_completed_payload_shape() {
        let metrics = sample_metrics();
        let payload = CallbackPayload {
            run_id: "run-1",
            status: CallbackStatus::Completed,
            metrics: Some(&metrics),
            error: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["runId"], "run-1");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["metrics"]["top3_accuracy"], 0.75);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_failed_payload_shape() {
        let payload = CallbackPayload {
            run_id: "run-2",
            status: CallbackStatus::Failed,
            metrics: None,
            error: Some("Insufficient data: 3 samples (minimum 10 required)"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json["metrics"].is_null());
        assert!(json["error"].as_str().unwrap().contains("Insufficient data"));
    }
}
