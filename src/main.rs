use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use labelkit::{
    data, report, run_training, BuiltinModel, Embedder, Method, ModelManager, RunConfig,
    RunOutcome,
};

#[derive(Parser)]
#[command(author, version, about = "Run a baseline classifier training over a labelling export", long_about = None)]
struct Args {
    /// Path to the JSONL export file
    #[arg(long)]
    input: PathBuf,

    /// Classification method
    #[arg(long, value_enum, default_value_t = Method::Knn)]
    method: Method,

    /// Number of neighbors for k-NN
    #[arg(long, default_value_t = 5)]
    k: usize,

    /// Prediction threshold
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,

    /// Fraction of data held out for testing
    #[arg(long, default_value_t = 0.2)]
    test_split: f64,

    /// Random seed for the train/test split
    #[arg(long, default_value_t = 42)]
    random_seed: u64,

    /// Callback URL for results
    #[arg(long)]
    callback: Option<String>,

    /// Output file for metrics JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,
}

async fn ensure_model_downloaded(fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::MultilingualMiniLM;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }

    manager.ensure_model_downloaded(model).await?;
    Ok(())
}

async fn deliver_outcome(args: &Args, run_id: &str, outcome: &RunOutcome) {
    if let Some(callback_url) = &args.callback {
        match report::send_callback(callback_url, run_id, outcome).await {
            Ok(true) => {}
            Ok(false) => error!("Callback delivery to {} did not succeed", callback_url),
            Err(e) => error!("Could not construct callback client: {}", e),
        }
    }
}

fn write_metrics(path: &Path, metrics: &report::RunMetrics) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(metrics)?;
    std::fs::write(path, json)?;
    info!("Metrics saved to: {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let run_id = std::env::var("MODEL_RUN_ID").unwrap_or_else(|_| "unknown".to_string());

    info!("Model Run ID: {}", run_id);
    info!("Input file: {}", args.input.display());
    info!("Method: {}", args.method);
    info!(
        "Parameters: k={}, threshold={}, test_split={}",
        args.k, args.threshold, args.test_split
    );

    if !args.input.exists() {
        let reason = format!("Input file not found: {}", args.input.display());
        error!("{}", reason);
        deliver_outcome(&args, &run_id, &RunOutcome::Failed { reason }).await;
        std::process::exit(1);
    }

    let records = match data::load_jsonl(&args.input) {
        Ok(records) => records,
        Err(e) => {
            let reason = format!("Failed to load input: {}", e);
            error!("{}", reason);
            deliver_outcome(&args, &run_id, &RunOutcome::Failed { reason }).await;
            std::process::exit(1);
        }
    };
    info!("Loaded {} samples", records.len());

    if let Err(e) = ensure_model_downloaded(args.fresh).await {
        let reason = format!("Model setup failed: {}", e);
        error!("{}", reason);
        deliver_outcome(&args, &run_id, &RunOutcome::Failed { reason }).await;
        std::process::exit(1);
    }

    let start_time = Instant::now();
    info!("Building embedder...");
    let embedder = match Embedder::builder()
        .with_model(BuiltinModel::MultilingualMiniLM)
        .and_then(|builder| builder.build())
    {
        Ok(embedder) => embedder,
        Err(e) => {
            let reason = format!("Embedder setup failed: {}", e);
            error!("{}", reason);
            deliver_outcome(&args, &run_id, &RunOutcome::Failed { reason }).await;
            std::process::exit(1);
        }
    };
    info!(
        "Embedder ready ({}d embeddings, took {:.2?})",
        embedder.embedding_size(),
        start_time.elapsed()
    );

    let config = RunConfig {
        method: args.method,
        k: args.k,
        threshold: args.threshold,
        test_split: args.test_split,
        seed: args.random_seed,
    };

    let outcome = match run_training(&records, &embedder, &config) {
        Ok(outcome) => outcome,
        Err(e) => RunOutcome::Failed {
            reason: format!("Training failed: {}", e),
        },
    };

    match &outcome {
        RunOutcome::Completed(metrics) => {
            println!("\nResults:");
            println!("  Top-3 Accuracy: {:.2}%", metrics.top3_accuracy * 100.0);
            println!("  Macro F1: {:.2}%", metrics.macro_f1 * 100.0);
            println!("  Per-label recall:");
            let mut recalls: Vec<_> = metrics.per_label_recall.iter().collect();
            recalls.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
            for (label, recall) in recalls {
                println!("    {}: {:.2}%", label, recall * 100.0);
            }

            if let Some(output) = &args.output {
                write_metrics(output, metrics)?;
            }

            deliver_outcome(&args, &run_id, &outcome).await;
            info!("Done! Total time: {:.2?}", start_time.elapsed());
            Ok(())
        }
        RunOutcome::Failed { reason } => {
            error!("Run failed: {}", reason);
            deliver_outcome(&args, &run_id, &outcome).await;
            std::process::exit(1);
        }
    }
}
