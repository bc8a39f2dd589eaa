//! Surge pricing prediction CLI.
//!
//! Loads the fitted classifier and frozen encoders once, runs one uploaded
//! CSV through the pipeline, prints a preview, the prediction counts, and a
//! feature-importance chart, and writes the submission file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use surgecast::data;
use surgecast::encode::UnknownPolicy;
use surgecast::service::{ServiceConfig, SurgeReport, SurgeService};

#[derive(Parser, Debug)]
#[command(name = "surgecast", about = "Predict surge pricing type for cab trip records")]
struct Cli {
    /// Input CSV of trip records (must include the contracted columns).
    #[arg(long)]
    input: PathBuf,

    /// XGBoost JSON model artifact.
    #[arg(long, default_value = "artifacts/surge_model.json")]
    model: PathBuf,

    /// Directory of frozen encoder artifacts, one `{column}.json` each.
    #[arg(long, default_value = "artifacts/encoders")]
    encoders: PathBuf,

    /// Where to write the predictions CSV.
    #[arg(long, default_value = "submission.csv")]
    out: PathBuf,

    /// Rows of the validated input to preview.
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Drop rows with unknown categories instead of rejecting the file.
    #[arg(long)]
    drop_unknown_rows: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let unknown_policy = if cli.drop_unknown_rows {
        UnknownPolicy::DropRow
    } else {
        UnknownPolicy::RejectFile
    };
    let config = ServiceConfig::builder()
        .model_path(cli.model)
        .encoder_dir(cli.encoders)
        .unknown_policy(unknown_policy)
        .build();

    let service = SurgeService::load(config).context("failed to initialize prediction service")?;

    let table = data::read_csv(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let report = service
        .predict_table(&table)
        .context("upload rejected")?;

    print_preview(&report, cli.preview);
    print_counts(&report);
    print_importance(&report);

    report
        .write_csv(&cli.out)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    println!("\nWrote {} predictions to {}", report.n_rows(), cli.out.display());
    if !report.dropped_rows().is_empty() {
        println!(
            "Dropped {} row(s) with unknown categories: {:?}",
            report.dropped_rows().len(),
            report.dropped_rows()
        );
    }

    Ok(())
}

fn print_preview(report: &SurgeReport, n: usize) {
    let table = report.selected();
    let display = report.display_labels();
    println!("Data preview ({} rows total):", table.n_rows());
    println!(
        "  {} | prediction",
        table.headers().join(", ")
    );
    for row in 0..table.n_rows().min(n) {
        println!("  {} | {}", table.row(row).join(", "), display[row]);
    }
}

fn print_counts(report: &SurgeReport) {
    println!("\nPrediction counts:");
    for (label, count) in report.class_counts() {
        println!("  surge type {label}: {count}");
    }
}

/// Text rendition of the importance bar chart, ascending like the original
/// dashboard.
fn print_importance(report: &SurgeReport) {
    const WIDTH: usize = 40;

    let mut scores: Vec<_> = report.importances().to_vec();
    scores.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let max = scores.last().map(|(_, s)| *s).unwrap_or(0.0);
    let name_width = scores.iter().map(|(n, _)| n.len()).max().unwrap_or(0);

    println!("\nFeature importance:");
    for (name, score) in &scores {
        let bar = if max > 0.0 {
            ((score / max) * WIDTH as f32).round() as usize
        } else {
            0
        };
        println!("  {name:>name_width$} {:<WIDTH$} {score:.4}", "#".repeat(bar));
    }
}
