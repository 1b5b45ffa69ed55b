//! Shared inference pipeline used by both the single-record and batch
//! front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! text scoring -> base frame -> feature engineering -> scaling ->
//! ensemble inference -> post-processing
//!
//! The front-ends then focus on presentation (printing vs CSV export).
//!
//! The whole path is deterministic: the same record against the same frozen
//! bundle produces bit-identical output, in single and batch mode alike.

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{BidKind, BidRecord, OutcomeRecord};
use crate::error::PredictError;
use crate::features::{
    FeatureFrame, categorical_text_features, interaction_features, ratio_features,
    statistical_features, temporal_features,
};
use crate::features::{
    BASE_AMOUNT, INDIRECT_COST, INSTITUTION_SCORE, KEYWORD_SCORE, LICENSE_CODE,
    LOWER_BOUND_RATIO, NET_CONSTRUCTION_COST, PARTICIPANT_COUNT, REGION_SCORE,
};
use crate::io::ModelBundle;
use crate::outcome::post_process;
use crate::text::{Tokenizer, content_tokens};

/// Frozen base layouts, one per procurement kind. The scaler for a trained
/// version was fit on exactly one of these orderings.
const CONSTRUCTION_COLUMNS: [&str; 9] = [
    BASE_AMOUNT,
    LOWER_BOUND_RATIO,
    PARTICIPANT_COUNT,
    INDIRECT_COST,
    NET_CONSTRUCTION_COST,
    LICENSE_CODE,
    INSTITUTION_SCORE,
    REGION_SCORE,
    KEYWORD_SCORE,
];
const COMPACT_COLUMNS: [&str; 7] = [
    BASE_AMOUNT,
    LOWER_BOUND_RATIO,
    PARTICIPANT_COUNT,
    LICENSE_CODE,
    INSTITUTION_SCORE,
    REGION_SCORE,
    KEYWORD_SCORE,
];

/// The frozen inference layout for a procurement kind.
pub fn base_columns(kind: BidKind) -> &'static [&'static str] {
    if kind.has_cost_columns() {
        &CONSTRUCTION_COLUMNS
    } else {
        &COMPACT_COLUMNS
    }
}

/// Fold a categorical code into a bounded integer feature.
///
/// FNV-1a over the trimmed string, reduced mod 1_000_000. A keyed or
/// process-seeded hash would break train/infer agreement across processes,
/// so the fold is fixed. Empty codes map to 0.
pub fn categorical_code_hash(code: &str) -> f64 {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in trimmed.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % 1_000_000) as f64
}

/// Score the three free-text fields of a record.
pub fn text_scores(
    bundle: &ModelBundle,
    tokenizer: &dyn Tokenizer,
    record: &BidRecord,
) -> (f64, f64, f64) {
    let score = |text: &str| {
        let tokens = content_tokens(tokenizer, text);
        bundle.scorer.score(&tokens)
    };
    (
        score(&record.institution_text),
        score(&record.region_text),
        score(&record.keyword_text),
    )
}

/// Build the single-record frame: frozen base columns first, engineered
/// columns appended after, exactly as at training time.
fn build_frame(record: &BidRecord, scores: (f64, f64, f64)) -> Result<FeatureFrame, PredictError> {
    let (institution_score, region_score, keyword_score) = scores;

    let mut frame = FeatureFrame::new(1);
    frame.append(BASE_AMOUNT, vec![record.base_amount as f64])?;
    frame.append(LOWER_BOUND_RATIO, vec![record.lower_bound_ratio])?;
    frame.append(PARTICIPANT_COUNT, vec![f64::from(record.participant_count)])?;
    if record.kind.has_cost_columns() {
        frame.append(INDIRECT_COST, vec![record.indirect_cost.unwrap_or(0) as f64])?;
        frame.append(
            NET_CONSTRUCTION_COST,
            vec![record.net_construction_cost.unwrap_or(0) as f64],
        )?;
    }
    frame.append(LICENSE_CODE, vec![categorical_code_hash(&record.license_code)])?;
    frame.append(INSTITUTION_SCORE, vec![institution_score])?;
    frame.append(REGION_SCORE, vec![region_score])?;
    frame.append(KEYWORD_SCORE, vec![keyword_score])?;

    interaction_features(&mut frame)?;
    ratio_features(&mut frame)?;
    categorical_text_features(&mut frame, "keyword", std::slice::from_ref(&record.keyword_text))?;
    categorical_text_features(
        &mut frame,
        "institution",
        std::slice::from_ref(&record.institution_text),
    )?;
    categorical_text_features(&mut frame, "region", std::slice::from_ref(&record.region_text))?;
    statistical_features(&mut frame)?;
    temporal_features(&mut frame, std::slice::from_ref(&record.bid_no))?;

    // Engineered cells with undefined values behave as zeros downstream.
    frame.fill_non_finite(0.0);

    Ok(frame)
}

/// Run the full pipeline for one record.
pub fn predict_record(
    bundle: &ModelBundle,
    tokenizer: &dyn Tokenizer,
    record: &BidRecord,
) -> Result<OutcomeRecord, PredictError> {
    record.validate()?;

    let scores = text_scores(bundle, tokenizer, record);
    let frame = build_frame(record, scores)?;
    debug!(
        engineered = frame.width(),
        base = record.kind.base_column_count(),
        "feature frame built"
    );

    // The frozen inference set is the base layout; engineered columns feed
    // training experiments, not the shipped scaler.
    let row = frame.select_row(base_columns(record.kind), 0)?;
    let scaled = bundle.scaler.transform_row(&row)?;

    let prediction = bundle.ensemble.predict(&scaled)?;
    post_process(record, prediction, bundle.config.avg_diff_ratio)
}

/// Predict a batch of independent records in parallel.
///
/// Results come back in input order; each record is processed end-to-end on
/// its own logical thread against the shared frozen bundle.
pub fn predict_batch(
    bundle: &ModelBundle,
    tokenizer: &dyn Tokenizer,
    records: &[BidRecord],
) -> Vec<Result<OutcomeRecord, PredictError>> {
    records
        .par_iter()
        .map(|record| predict_record(bundle, tokenizer, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::domain::{OutcomeClassification, PipelineConfig};
    use crate::model::{Ensemble, LayerSpec, MlpRegressor, MlpSpec};
    use crate::scale::Scaler;
    use crate::text::{ScriptTokenizer, TextScorer};

    /// A single-layer identity-ish MLP: weighted sum of the scaled inputs.
    fn linear_model(weights: Vec<f64>, bias: f64) -> MlpRegressor {
        MlpRegressor::from_spec(&MlpSpec {
            layers: vec![LayerSpec {
                weights: vec![weights],
                bias: vec![bias],
            }],
        })
        .unwrap()
    }

    fn fixture_bundle() -> ModelBundle {
        let vocabulary: HashMap<String, usize> = [("건물", 0usize), ("공사", 1), ("seoul", 2)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        let scorer = TextScorer::new(vocabulary, vec![1.2, 1.0, 1.5]).unwrap();

        // Fit the scaler on a tiny plausible goods-bid matrix (7 columns).
        let training_rows = vec![
            vec![1.0e8, 0.85, 4.0, 100.0, 1.0, 0.5, 1.2],
            vec![2.0e8, 0.87, 6.0, 200.0, 1.5, 0.8, 1.6],
            vec![1.5e8, 0.86, 5.0, 150.0, 1.2, 0.6, 1.4],
        ];
        let scaler = Scaler::fit(&training_rows).unwrap();

        // Rate models pinned near realistic outputs.
        let bidder = linear_model(vec![0.01, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.85);
        let reference = linear_model(vec![0.0, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0], 0.87);
        let count = linear_model(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 5.0);

        ModelBundle::from_parts(
            scorer,
            scaler,
            Ensemble::new(Box::new(bidder), Box::new(reference), Box::new(count)),
            PipelineConfig {
                avg_diff_ratio: 0.1,
                artifact_version: "v-test".to_string(),
            },
        )
        .unwrap()
    }

    fn record() -> BidRecord {
        BidRecord {
            kind: BidKind::Goods,
            base_amount: 100_000_000,
            lower_bound_ratio: 0.87,
            participant_count: 5,
            indirect_cost: None,
            net_construction_cost: None,
            license_code: "6000".to_string(),
            institution_text: "서울시청".to_string(),
            region_text: "Seoul".to_string(),
            keyword_text: "건물 신축 공사".to_string(),
            bid_no: Some("20240601-001".to_string()),
            minimum_bid_amount: None,
            actual_award_amount: None,
        }
    }

    #[test]
    fn pipeline_is_bit_reproducible() {
        let bundle = fixture_bundle();
        let tokenizer = ScriptTokenizer;
        let a = predict_record(&bundle, &tokenizer, &record()).unwrap();
        let b = predict_record(&bundle, &tokenizer, &record()).unwrap();

        assert_eq!(a.prediction, b.prediction);
        assert_eq!(a.price_samples, b.price_samples);
        assert_eq!(a.bidder_predicted_amount, b.bidder_predicted_amount);
    }

    #[test]
    fn batch_matches_single_record_output() {
        let bundle = fixture_bundle();
        let tokenizer = ScriptTokenizer;
        let records = vec![record(), record()];

        let single = predict_record(&bundle, &tokenizer, &records[0]).unwrap();
        let batch = predict_batch(&bundle, &tokenizer, &records);
        assert_eq!(batch.len(), 2);
        for result in batch {
            let out = result.unwrap();
            assert_eq!(out.prediction, single.prediction);
        }
    }

    #[test]
    fn pipeline_emits_ten_samples_and_classifications() {
        let bundle = fixture_bundle();
        let mut r = record();
        r.minimum_bid_amount = Some(80_000_000);
        r.actual_award_amount = Some(90_000_000);

        let out = predict_record(&bundle, &ScriptTokenizer, &r).unwrap();
        assert_eq!(out.price_samples.len(), 10);
        let band = out.classifications.unwrap();
        assert_ne!(band.bidder, OutcomeClassification::BelowMinimum);
    }

    #[test]
    fn invalid_record_aborts_before_inference() {
        let bundle = fixture_bundle();
        let mut r = record();
        r.base_amount = 0;
        let err = predict_record(&bundle, &ScriptTokenizer, &r).unwrap_err();
        assert!(matches!(err, PredictError::InvalidBidRecord(_)));
    }

    #[test]
    fn kind_with_wrong_layout_is_a_shape_mismatch() {
        // The fixture scaler was fit on the 7-column goods layout; a
        // construction record engineers 9 base columns.
        let bundle = fixture_bundle();
        let mut r = record();
        r.kind = BidKind::Construction;
        r.indirect_cost = Some(1_000_000);
        r.net_construction_cost = Some(50_000_000);

        let err = predict_record(&bundle, &ScriptTokenizer, &r).unwrap_err();
        assert!(matches!(err, PredictError::FeatureShapeMismatch { .. }));
    }

    #[test]
    fn categorical_code_hash_is_stable_and_bounded() {
        let a = categorical_code_hash("6000");
        assert_eq!(a, categorical_code_hash("6000"));
        assert_eq!(a, categorical_code_hash("  6000  "));
        assert!(a >= 0.0 && a < 1_000_000.0);
        assert_eq!(categorical_code_hash(""), 0.0);
        assert_ne!(categorical_code_hash("6000"), categorical_code_hash("7000"));
    }
}
