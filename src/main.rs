use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use emotion_net::config::TrainSettings;
use emotion_net::inference::Classifier;
use emotion_net::progress::{JsonFileStore, LoadOutcome, ProgressStore};
use emotion_net::train::run_session;

#[derive(Debug, Parser)]
#[command(name = "emotion-net", version, about = "Train and run a facial-expression classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train on a directory of labelled face images.
    Train(TrainArgs),
    /// Classify one or more images with a trained model.
    Predict {
        #[arg(long, default_value = "face_emotion_model.json")]
        model: PathBuf,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Print the state of the current (or last) training run.
    Status {
        #[arg(long, default_value = "training_progress.json")]
        progress: PathBuf,
    },
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// JSON settings file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective settings here and exit.
    #[arg(long)]
    write_config: Option<PathBuf>,
    #[arg(long)]
    train_dir: Option<PathBuf>,
    #[arg(long)]
    val_dir: Option<PathBuf>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    learning_rate: Option<f64>,
    /// Hidden layer widths, e.g. `--hidden 256,128`.
    #[arg(long, value_delimiter = ',')]
    hidden: Option<Vec<usize>>,
    #[arg(long)]
    progress: Option<PathBuf>,
    #[arg(long)]
    model: Option<PathBuf>,
}

impl TrainArgs {
    fn settings(self) -> anyhow::Result<TrainSettings> {
        let mut s = match &self.config {
            Some(path) => TrainSettings::load_json(path)?,
            None => TrainSettings::default(),
        };
        if let Some(v) = self.train_dir { s.train_dir = v; }
        if let Some(v) = self.val_dir { s.val_dir = v; }
        if let Some(v) = self.epochs { s.epochs = v; }
        if let Some(v) = self.batch_size { s.batch_size = v; }
        if let Some(v) = self.learning_rate { s.learning_rate = v; }
        if let Some(v) = self.hidden { s.hidden_layers = v; }
        if let Some(v) = self.progress { s.progress_path = v; }
        if let Some(v) = self.model { s.model_path = v; }
        s.validate()?;
        Ok(s)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::Predict { model, images } => predict(&model, &images),
        Command::Status { progress } => status(progress),
    }
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let write_config = args.write_config.clone();
    let settings = args.settings()?;

    if let Some(path) = write_config {
        settings.save_json(&path)?;
        info!(path = %path.display(), "settings written");
        return Ok(());
    }

    let outcome = run_session(&settings).context("training failed")?;
    println!(
        "trained {} epochs on {} images ({} validation){}; model saved to {}",
        outcome.summary.epochs_run,
        outcome.train_samples,
        outcome.val_samples,
        if outcome.summary.stopped_early { ", stopped early" } else { "" },
        outcome.model_path.display(),
    );
    if let Some(best) = outcome.summary.best_val_loss {
        println!(
            "best val_loss {:.4}{}",
            best,
            if outcome.summary.restored_best_weights { " (weights restored)" } else { "" },
        );
    }
    match outcome.validation {
        Some(eval) => println!(
            "final validation: accuracy {:.2}%, loss {:.4}",
            eval.accuracy * 100.0,
            eval.loss
        ),
        None => println!("final validation: no validation images"),
    }
    Ok(())
}

fn predict(model: &Path, images: &[PathBuf]) -> anyhow::Result<()> {
    let classifier = Classifier::load(model)?;
    for path in images {
        match classifier.classify_file(path) {
            Ok(p) => println!("{}: {} ({:.1}%)", path.display(), p.label, p.confidence),
            Err(e) => eprintln!("{}: {e}", path.display()),
        }
    }
    Ok(())
}

fn status(progress: PathBuf) -> anyhow::Result<()> {
    match JsonFileStore::new(progress).load() {
        LoadOutcome::Loaded(record) => println!("{}", record.summary()),
        LoadOutcome::Missing => println!("idle - no training run recorded"),
        LoadOutcome::Corrupt(e) => return Err(e).context("progress file is unreadable"),
    }
    Ok(())
}
