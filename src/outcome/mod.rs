//! Post-processing business rules: price sampling and award-band
//! classification.
//!
//! These turn raw regressor outputs into priced, classified decisions. The
//! numeric paths (including the reference-rate round-trip through the lower
//! bound ratio) are compatibility contracts with the trained artifacts.

use crate::domain::{
    AwardBand, BandOutcome, BidRecord, OutcomeClassification, OutcomeRecord, PredictionTriple,
};
use crate::error::PredictError;

/// Deviation coefficients, most-conservative to least-conservative.
const SAMPLE_COEFFICIENTS: [f64; 5] = [1.0, 0.5, 0.0, -0.5, -1.0];

/// Candidate award amounts around one predicted rate:
/// `round(base_amount × (rate + avg_diff_ratio × coefficient))` per
/// coefficient.
pub fn price_samples(base_amount: i64, avg_diff_ratio: f64, rate: f64) -> [i64; 5] {
    let mut out = [0i64; 5];
    for (slot, c) in out.iter_mut().zip(SAMPLE_COEFFICIENTS) {
        *slot = (base_amount as f64 * (rate + avg_diff_ratio * c)).round() as i64;
    }
    out
}

/// Classify a predicted amount against the award band
/// `[minimum_bid_amount, actual_award_amount)`.
///
/// The lower bound is inclusive (`predicted == minimum` is a plausible win),
/// the upper bound exclusive (`predicted == actual` is not).
pub fn classify(predicted_amount: f64, minimum_bid_amount: f64, actual_award_amount: f64) -> OutcomeClassification {
    if predicted_amount < minimum_bid_amount {
        OutcomeClassification::BelowMinimum
    } else if predicted_amount < actual_award_amount {
        OutcomeClassification::Awarded
    } else {
        OutcomeClassification::Other
    }
}

/// Derive the full outcome record from the prediction triple and the
/// original monetary fields.
///
/// Division guards are explicit: a zero `base_amount` or `lower_bound_ratio`
/// is `InvalidBidRecord`, never NaN/Infinity in the output.
pub fn post_process(
    record: &BidRecord,
    prediction: PredictionTriple,
    avg_diff_ratio: f64,
) -> Result<OutcomeRecord, PredictError> {
    if record.base_amount <= 0 {
        return Err(PredictError::InvalidBidRecord(format!(
            "base_amount must be > 0 to derive amounts (got {})",
            record.base_amount
        )));
    }
    if !(record.lower_bound_ratio.is_finite() && record.lower_bound_ratio > 0.0) {
        return Err(PredictError::InvalidBidRecord(format!(
            "lower_bound_ratio must be finite and > 0 to derive amounts (got {})",
            record.lower_bound_ratio
        )));
    }

    let base = record.base_amount as f64;

    let bidder_predicted_amount = (base * prediction.bidder_rate).round() as i64;
    let reference_predicted_amount = (base * prediction.reference_rate).round() as i64;
    let reference_plan_estimate = prediction.reference_rate * base / record.lower_bound_ratio;

    let mut samples = Vec::with_capacity(10);
    samples.extend(price_samples(record.base_amount, avg_diff_ratio, prediction.bidder_rate));
    samples.extend(price_samples(record.base_amount, avg_diff_ratio, prediction.reference_rate));

    let classifications = record.award_band().map(|band| classify_both(&prediction, base, record.lower_bound_ratio, band));

    Ok(OutcomeRecord {
        prediction,
        bidder_predicted_amount,
        reference_predicted_amount,
        reference_plan_estimate,
        price_samples: samples,
        classifications,
        avg_diff_ratio,
    })
}

/// The two classifications, one per rate basis.
///
/// The bidder path uses `bidder_rate × base`. The reference path goes
/// through the plan estimate and back: `(reference_rate / lower_bound_ratio)
/// × base × lower_bound_ratio`. Both factors may carry floating rounding the
/// trained thresholds were calibrated against, so the round-trip is kept
/// as-is rather than cancelled.
fn classify_both(
    prediction: &PredictionTriple,
    base: f64,
    lower_bound_ratio: f64,
    band: AwardBand,
) -> BandOutcome {
    let minimum = band.minimum_bid_amount as f64;
    let actual = band.actual_award_amount as f64;

    let bidder_amount = prediction.bidder_rate * base;
    let reference_amount = (prediction.reference_rate / lower_bound_ratio) * base * lower_bound_ratio;

    BandOutcome {
        bidder: classify(bidder_amount, minimum, actual),
        reference: classify(reference_amount, minimum, actual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BidKind;

    fn record() -> BidRecord {
        BidRecord {
            kind: BidKind::Goods,
            base_amount: 100_000_000,
            lower_bound_ratio: 0.87,
            participant_count: 5,
            indirect_cost: None,
            net_construction_cost: None,
            license_code: "6000".to_string(),
            institution_text: String::new(),
            region_text: String::new(),
            keyword_text: String::new(),
            bid_no: None,
            minimum_bid_amount: None,
            actual_award_amount: None,
        }
    }

    fn triple() -> PredictionTriple {
        PredictionTriple {
            bidder_rate: 0.85,
            reference_rate: 0.87,
            bidder_count: 5.4,
        }
    }

    #[test]
    fn price_samples_match_fixed_coefficients() {
        // rate 0.85 with band width 0.1 spans effective rates
        // 0.95, 0.90, 0.85, 0.80, 0.75.
        assert_eq!(
            price_samples(100_000_000, 0.1, 0.85),
            [95_000_000, 90_000_000, 85_000_000, 80_000_000, 75_000_000]
        );
    }

    #[test]
    fn classify_boundaries_are_half_open() {
        // Lower bound inclusive.
        assert_eq!(classify(87_000_000.0, 87_000_000.0, 88_000_000.0), OutcomeClassification::Awarded);
        // Upper bound exclusive.
        assert_eq!(classify(88_000_000.0, 87_000_000.0, 88_000_000.0), OutcomeClassification::Other);
        assert_eq!(classify(86_999_999.0, 87_000_000.0, 88_000_000.0), OutcomeClassification::BelowMinimum);
    }

    #[test]
    fn post_process_produces_ten_samples_and_amounts() {
        let out = post_process(&record(), triple(), 0.1).unwrap();
        assert_eq!(out.price_samples.len(), 10);
        assert_eq!(out.price_samples[0], 95_000_000);
        assert_eq!(out.price_samples[5], 97_000_000);
        assert_eq!(out.bidder_predicted_amount, 85_000_000);
        assert_eq!(out.reference_predicted_amount, 87_000_000);
        assert!((out.reference_plan_estimate - 100_000_000.0).abs() < 1e-6);
        assert!(out.classifications.is_none());
    }

    #[test]
    fn post_process_classifies_when_band_is_present() {
        let mut r = record();
        r.minimum_bid_amount = Some(85_000_000);
        r.actual_award_amount = Some(86_000_000);
        let out = post_process(&r, triple(), 0.1).unwrap();
        let band = out.classifications.unwrap();
        // 0.85 × 100M = 85M: on the inclusive lower bound.
        assert_eq!(band.bidder, OutcomeClassification::Awarded);
        // Reference round-trip lands at 87M, above the band.
        assert_eq!(band.reference, OutcomeClassification::Other);
    }

    #[test]
    fn zero_amounts_are_guarded() {
        let mut r = record();
        r.base_amount = 0;
        assert!(matches!(
            post_process(&r, triple(), 0.1),
            Err(PredictError::InvalidBidRecord(_))
        ));

        let mut r = record();
        r.lower_bound_ratio = 0.0;
        assert!(matches!(
            post_process(&r, triple(), 0.1),
            Err(PredictError::InvalidBidRecord(_))
        ));
    }

    #[test]
    fn outputs_are_always_finite() {
        let out = post_process(&record(), triple(), 0.1).unwrap();
        assert!(out.reference_plan_estimate.is_finite());
        assert!(out.price_samples.iter().all(|p| *p > 0));
    }
}
