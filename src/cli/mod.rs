//! Command-line parsing for the bid award-rate predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the scoring/inference code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::BidKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bidrate", version, about = "Procurement bid award-rate predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict rates, candidate award amounts, and (in evaluation mode)
    /// award-band classifications for one bid.
    Predict(PredictArgs),
    /// Score a free-text field against the frozen vocabulary.
    Score(ScoreArgs),
    /// Predict a JSON-lines batch of bids and optionally export results to CSV.
    Batch(BatchArgs),
}

/// Where the frozen artifacts live and which version to serve.
#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Artifact directory (vocabulary, scaler, models, config.json).
    #[arg(long, default_value = "res")]
    pub artifacts: PathBuf,

    /// Artifact version to load; defaults to the version named in config.json.
    #[arg(long)]
    pub model_version: Option<String>,
}

/// One bid, spelled out as flags.
#[derive(Debug, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Procurement kind (decides the frozen feature layout).
    #[arg(long, value_enum, default_value_t = BidKind::Construction)]
    pub kind: BidKind,

    /// Base (estimated) amount, won.
    #[arg(long)]
    pub base_amount: i64,

    /// Regulatory minimum acceptable bid ratio.
    #[arg(long)]
    pub lower_bound_ratio: f64,

    /// Number of participating companies.
    #[arg(long, default_value_t = 0)]
    pub participant_count: u32,

    /// Indirect cost (construction bids).
    #[arg(long)]
    pub indirect_cost: Option<i64>,

    /// Net construction cost (construction bids).
    #[arg(long)]
    pub net_construction_cost: Option<i64>,

    /// License restriction code.
    #[arg(long, default_value = "")]
    pub license_code: String,

    /// Announcing institution name.
    #[arg(long, default_value = "")]
    pub institution: String,

    /// Work region.
    #[arg(long, default_value = "")]
    pub region: String,

    /// Free-text keywords.
    #[arg(long, default_value = "")]
    pub keyword: String,

    /// Bid identifier (temporal features come from an embedded YYYYMMDD).
    #[arg(long)]
    pub bid_no: Option<String>,

    /// Observed minimum bid amount (evaluation mode).
    #[arg(long)]
    pub minimum_bid_amount: Option<i64>,

    /// Observed actual award amount (evaluation mode).
    #[arg(long)]
    pub actual_award_amount: Option<i64>,

    /// Print the outcome record as JSON instead of the formatted report.
    #[arg(long)]
    pub json: bool,
}

/// Options for scoring one text field.
#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Text to score.
    pub text: String,
}

/// Options for batch prediction.
#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON-lines file with one bid record per line.
    pub input: PathBuf,

    /// Export per-record results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
