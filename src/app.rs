//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - loads the frozen artifact bundle
//! - runs the inference pipeline
//! - prints reports / writes exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Command, PredictArgs, ScoreArgs, StoreArgs};
use crate::domain::BidRecord;
use crate::error::PredictError;
use crate::io::{ArtifactStore, ModelBundle, read_records_jsonl, write_results_csv};
use crate::text::{ScriptTokenizer, content_tokens};

pub mod pipeline;

/// Entry point for the `bidrate` binary.
pub fn run() -> Result<(), PredictError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Score(args) => handle_score(args),
        Command::Batch(args) => handle_batch(args),
    }
}

/// Resolve the artifact version: an explicit flag wins, otherwise the
/// version the installation's config names.
fn resolve_version(store: &ArtifactStore, args: &StoreArgs) -> Result<String, PredictError> {
    match &args.model_version {
        Some(v) => Ok(v.clone()),
        None => Ok(store.load_config()?.artifact_version),
    }
}

fn load_bundle(args: &StoreArgs) -> Result<ModelBundle, PredictError> {
    let store = ArtifactStore::new(&args.artifacts);
    let version = resolve_version(&store, args)?;
    store.load_bundle(&version)
}

fn handle_predict(args: PredictArgs) -> Result<(), PredictError> {
    let bundle = load_bundle(&args.store)?;
    let record = record_from_args(&args);

    let outcome = pipeline::predict_record(&bundle, &ScriptTokenizer, &record)?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| PredictError::Usage(format!("failed to serialize outcome: {e}")))?;
        println!("{json}");
    } else {
        println!("{}", crate::report::format_outcome(&record, &outcome));
    }
    Ok(())
}

fn handle_score(args: ScoreArgs) -> Result<(), PredictError> {
    let store = ArtifactStore::new(&args.store.artifacts);
    let version = resolve_version(&store, &args.store)?;
    let scorer = store.load_scorer(&version)?;

    let tokens = content_tokens(&ScriptTokenizer, &args.text);
    let score = scorer.score(&tokens);
    println!("{score:.6}");
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), PredictError> {
    let bundle = load_bundle(&args.store)?;
    let records = read_records_jsonl(&args.input)?;
    info!(records = records.len(), "batch loaded");

    let outcomes = pipeline::predict_batch(&bundle, &ScriptTokenizer, &records);

    let mut ok = Vec::new();
    let mut failures = Vec::new();
    for (i, (record, result)) in records.iter().zip(&outcomes).enumerate() {
        match result {
            Ok(outcome) => ok.push((i + 1, record, outcome)),
            Err(err) => failures.push((i + 1, err)),
        }
    }

    println!("{}", crate::report::format_batch_summary(&ok, &failures));

    if let Some(path) = &args.export {
        let rows: Vec<(BidRecord, crate::domain::OutcomeRecord)> = ok
            .iter()
            .map(|(_, r, o)| ((*r).clone(), (*o).clone()))
            .collect();
        write_results_csv(path, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "results exported");
    }

    Ok(())
}

fn record_from_args(args: &PredictArgs) -> BidRecord {
    BidRecord {
        kind: args.kind,
        base_amount: args.base_amount,
        lower_bound_ratio: args.lower_bound_ratio,
        participant_count: args.participant_count,
        indirect_cost: args.indirect_cost,
        net_construction_cost: args.net_construction_cost,
        license_code: args.license_code.clone(),
        institution_text: args.institution.clone(),
        region_text: args.region.clone(),
        keyword_text: args.keyword.clone(),
        bid_no: args.bid_no.clone(),
        minimum_bid_amount: args.minimum_bid_amount,
        actual_award_amount: args.actual_award_amount,
    }
}
