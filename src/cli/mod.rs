//! Estate predictor CLI
//!
//! Command-line interface for training, one-off predictions, serving and
//! dataset inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::bundle::ModelBundle;
use crate::predictor::Predictor;
use crate::server::{parse_feature_row, round_price, run_server, ServerConfig};
use crate::training::TrainingConfig;
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "estate-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-estate price prediction: train, predict and serve")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the ensemble and write the model bundle
    Train {
        /// Housing dataset (CSV)
        #[arg(short, long, default_value = "dataset.csv")]
        data: PathBuf,

        /// Directory the bundle is written to
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Random seed for the split and every estimator
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Cross-validation folds for the grid search
        #[arg(long, default_value = "3")]
        cv_folds: usize,
    },

    /// Predict the price of one property described as a JSON object
    Predict {
        /// Directory holding the model bundle
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,

        /// JSON file with feature values, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Start the HTTP server, training first if no bundle exists
    Serve {
        /// Server host (defaults to API_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Server port (defaults to API_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bundle directory (defaults to MODEL_DIR)
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Dataset used for training (defaults to DATASET_PATH)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Show dataset information
    Info {
        /// Housing dataset (CSV)
        #[arg(short, long, default_value = "dataset.csv")]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    model_dir: &Path,
    test_size: f64,
    seed: u64,
    cv_folds: usize,
) -> anyhow::Result<()> {
    section("Train");

    let config = TrainingConfig::default()
        .with_dataset_path(data_path)
        .with_model_dir(model_dir)
        .with_test_size(test_size)
        .with_random_state(seed)
        .with_cv_folds(cv_folds);

    step_run("Training ensemble");
    let start = Instant::now();
    let predictor = Predictor::train(&config)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    if let Some(report) = predictor.report() {
        println!();
        println!("  {:<20} {}", muted("Rows"), format!("{} train / {} test", report.n_train, report.n_test).white());
        println!("  {:<20} {}", muted("Features"), format!("{} → {} components", report.n_features, report.n_components).white());
        println!(
            "  {:<20} {}",
            muted("Random forest"),
            format!(
                "n_estimators={} max_depth={} cv R²={:.4}",
                report.random_forest_params.n_estimators,
                report.random_forest_params.max_depth,
                report.random_forest_cv_r2
            )
            .white()
        );
        println!(
            "  {:<20} {}",
            muted("Boosting"),
            format!(
                "n_estimators={} max_depth={} lr={} cv R²={:.4}",
                report.boosting_params.n_estimators,
                report.boosting_params.max_depth,
                report.boosting_params.learning_rate,
                report.boosting_cv_r2
            )
            .white()
        );
        println!();
        println!("  {:<20} {}", muted("R²"), format!("{:.4}", report.metrics.r2).white().bold());
        println!("  {:<20} {}", muted("RMSE"), format!("{:.2}", report.metrics.rmse).white());
        println!("  {:<20} {}", muted("MAE"), format!("{:.2}", report.metrics.mae).white());
    }

    println!();
    println!("  {} bundle written to {}", ok("✓"), model_dir.display());
    println!();
    Ok(())
}

pub fn cmd_predict(model_dir: &Path, input: &str) -> anyhow::Result<()> {
    section("Predict");

    let body = if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(input)?
    };
    let row = parse_feature_row(&body)?;

    step_run("Loading bundle");
    let start = Instant::now();
    let predictor = Predictor::load(model_dir)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    let price = predictor.predict(&row)?;

    println!();
    println!("  {:<16} {}", muted("Price"), format!("{:.2}", round_price(price)).white().bold());
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let info = DataLoader::new().describe(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), info.n_rows);
    println!("  {:<12} {}", muted("Columns"), info.columns.len());
    println!();

    println!("  {:<24} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(44)));

    for col in &info.columns {
        println!(
            "  {:<24} {:<12} {:>6}",
            col.name,
            col.dtype.truecolor(140, 140, 140),
            col.null_count,
        );
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model_dir: Option<PathBuf>,
    data: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = model_dir {
        config = config.with_model_dir(dir);
    }
    if let Some(path) = data {
        config = config.with_dataset_path(path);
    }

    let source = if ModelBundle::exists(&config.model_dir) { "bundle" } else { "training" };

    let training = config.training_config();
    let predictor = tokio::task::spawn_blocking(move || Predictor::load_or_train(&training)).await??;

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Estate Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Health ", &format!("http://{}:{}/", config.host, config.port)));
    line_box(&kv("Predict", &format!("http://{}:{}/predict", config.host, config.port)));
    line_box(&kv("Model  ", &format!("{} ({})", config.model_dir.display(), source)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config, predictor).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_args() {
        let cli = Cli::parse_from(["estate-predictor", "train", "--data", "houses.csv", "--seed", "7"]);
        match cli.command {
            Commands::Train { data, seed, cv_folds, test_size, .. } => {
                assert_eq!(data, PathBuf::from("houses.csv"));
                assert_eq!(seed, 7);
                assert_eq!(cv_folds, 3);
                assert_eq!(test_size, 0.2);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_serve_args_are_optional() {
        let cli = Cli::parse_from(["estate-predictor", "serve", "--port", "8000"]);
        match cli.command {
            Commands::Serve { host, port, model_dir, data } => {
                assert!(host.is_none());
                assert_eq!(port, Some(8000));
                assert!(model_dir.is_none());
                assert!(data.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_strip_ansi() {
        colored::control::set_override(true);
        let styled = format!("{}", ok("done"));
        assert_eq!(strip_ansi(&styled), "done");
    }
}
