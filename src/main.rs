use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use grove_cart::{CartLearner, SplitCriterion};
use grove_forest::{EnsembleConfig, Matrix, RandomForest};
use grove_io::{Dataset, DatasetReader, ExperimentName, ResultWriter};

type Forest = RandomForest<CartLearner, String>;

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Bagged CART forests: train on CSV tables, predict class probabilities")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Maximum number of trees trained or queried at once (defaults to all cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

/// Split quality criterion for the CART trees.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum CriterionArg {
    Gini,
    Entropy,
}

impl From<CriterionArg> for SplitCriterion {
    fn from(arg: CriterionArg) -> Self {
        match arg {
            CriterionArg::Gini => SplitCriterion::Gini,
            CriterionArg::Entropy => SplitCriterion::Entropy,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest on a labelled CSV table and save the model
    Fit {
        /// Path to the training CSV file (id column first)
        #[arg(long)]
        data: PathBuf,

        /// Name of the column holding class labels
        #[arg(long)]
        label_column: String,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 100)]
        n_trees: usize,

        /// Number of feature columns sampled for each tree
        #[arg(long)]
        max_features: usize,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Split quality criterion
        #[arg(long, value_enum, default_value_t = CriterionArg::Gini)]
        criterion: CriterionArg,

        /// Minimum number of samples in each leaf
        #[arg(long, default_value_t = 1)]
        min_samples_leaf: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Predict classes for a CSV table with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file to classify (id column first)
        #[arg(long)]
        data: PathBuf,

        /// Column holding known labels; excluded from features and used to report accuracy
        #[arg(long)]
        label_column: Option<String>,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    experiment: String,
    n_samples: usize,
    n_features: usize,
    n_trees: usize,
    classes: Vec<String>,
    training_accuracy: f64,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_samples: usize,
    model_n_trees: usize,
    model_n_features: usize,
    model_n_classes: usize,
    accuracy: Option<f64>,
    predictions_path: PathBuf,
}

fn feature_matrix(dataset: &Dataset) -> Result<Matrix> {
    Matrix::from_rows(dataset.features()).context("feature table is not rectangular")
}

fn accuracy(predicted: &[String], expected: &[String]) -> f64 {
    let correct = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    correct as f64 / expected.len() as f64
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let workers = cli.workers.unwrap_or_else(|| {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    });
    info!(workers, "worker limit configured");

    match cli.command {
        Command::Fit {
            data,
            label_column,
            n_trees,
            max_features,
            max_depth,
            criterion,
            min_samples_leaf,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read labelled table
            let dataset = DatasetReader::new(&data)
                .with_label_column(&label_column)
                .read()
                .context("failed to read training CSV")?;
            let Some(labels) = dataset.labels() else {
                bail!("training table has no labels");
            };
            let features = feature_matrix(&dataset)?;

            // 2. Train
            let config = EnsembleConfig::new(n_trees, max_features)?
                .with_max_depth(max_depth)?
                .with_seed(cli.seed);
            let learner = CartLearner::new()
                .with_criterion(criterion.into())
                .with_min_samples_leaf(min_samples_leaf);
            let mut forest: Forest = RandomForest::new(config, learner);
            forest
                .fit(&features, labels, workers)
                .context("forest training failed")?;

            // 3. Save model
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let model_path = writer.model_path();
            forest.save(&model_path)?;

            // 4. Build and print stdout summary
            let predicted = forest.predict(&features, workers)?;
            let output = FitOutput {
                experiment,
                n_samples: dataset.n_samples(),
                n_features: dataset.n_features(),
                n_trees: forest.n_trees(),
                classes: forest
                    .classes()
                    .map(|c| c.classes().to_vec())
                    .unwrap_or_default(),
                training_accuracy: accuracy(&predicted, labels),
                model_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            label_column,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = Forest::load(&model, CartLearner::new())
                .with_context(|| format!("failed to load model from {}", model.display()))?;
            info!(n_trees = forest.n_trees(), "model loaded");

            // 2. Read table
            let mut reader = DatasetReader::new(&data);
            if let Some(column) = label_column {
                reader = reader.with_label_column(column);
            }
            let dataset = reader.read().context("failed to read prediction CSV")?;
            let features = feature_matrix(&dataset)?;

            // 3. Predict
            let (predicted, proba) = forest
                .predict_with_proba(&features, workers)
                .context("prediction failed")?;
            let classes = forest
                .classes()
                .map(|c| c.classes().to_vec())
                .unwrap_or_default();
            let rows: Vec<Vec<f64>> = proba.rows().map(<[f64]>::to_vec).collect();

            // 4. Write JSON artifact
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let predictions_path =
                writer.write_predictions(dataset.ids(), &classes, &predicted, &rows)?;

            // 5. Build and print stdout summary
            let output = PredictOutput {
                experiment,
                n_samples: dataset.n_samples(),
                model_n_trees: forest.n_trees(),
                model_n_features: forest.n_features().unwrap_or(0),
                model_n_classes: classes.len(),
                accuracy: dataset.labels().map(|labels| accuracy(&predicted, labels)),
                predictions_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
