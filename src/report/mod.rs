//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the scoring/inference code stays clean and testable
//! - output changes are localized

use crate::domain::{BidRecord, OutcomeRecord};
use crate::error::PredictError;

/// Format the full outcome report for one bid.
pub fn format_outcome(record: &BidRecord, outcome: &OutcomeRecord) -> String {
    let mut out = String::new();

    out.push_str("=== bidrate - award-rate prediction ===\n");
    out.push_str(&format!("Kind: {}\n", record.kind.display_name()));
    if let Some(bid_no) = &record.bid_no {
        out.push_str(&format!("Bid no: {bid_no}\n"));
    }
    out.push_str(&format!(
        "Base amount: {} | lower bound ratio: {:.4} | participants: {}\n",
        record.base_amount, record.lower_bound_ratio, record.participant_count
    ));

    out.push_str("\nPredictions:\n");
    out.push_str(&format!(
        "- bidder rate:    {:.6}  -> amount {}\n",
        outcome.prediction.bidder_rate, outcome.bidder_predicted_amount
    ));
    out.push_str(&format!(
        "- reference rate: {:.6}  -> amount {}\n",
        outcome.prediction.reference_rate, outcome.reference_predicted_amount
    ));
    out.push_str(&format!(
        "- bidder count:   {:.2}\n",
        outcome.prediction.bidder_count
    ));
    out.push_str(&format!(
        "- reference plan estimate: {:.0}\n",
        outcome.reference_plan_estimate
    ));

    out.push_str(&format!(
        "\nCandidate award amounts (avg diff ratio {:.4}):\n",
        outcome.avg_diff_ratio
    ));
    out.push_str(&format!(
        "- bidder basis:    {}\n",
        fmt_amounts(&outcome.price_samples[..5])
    ));
    out.push_str(&format!(
        "- reference basis: {}\n",
        fmt_amounts(&outcome.price_samples[5..])
    ));

    if let Some(band) = outcome.classifications {
        out.push_str("\nAward-band classification:\n");
        out.push_str(&format!("- bidder basis:    {}\n", band.bidder.display_name()));
        out.push_str(&format!(
            "- reference basis: {}\n",
            band.reference.display_name()
        ));
    }

    out
}

/// Format the one-line-per-record batch summary plus aggregate stats.
pub fn format_batch_summary(
    results: &[(usize, &BidRecord, &OutcomeRecord)],
    failures: &[(usize, &PredictError)],
) -> String {
    let mut out = String::new();

    out.push_str("=== bidrate - batch prediction ===\n");
    out.push_str(&format!(
        "Records: {} ok, {} failed\n",
        results.len(),
        failures.len()
    ));

    if !results.is_empty() {
        let n = results.len() as f64;
        let mean_bidder = results
            .iter()
            .map(|(_, _, o)| o.prediction.bidder_rate)
            .sum::<f64>()
            / n;
        let mean_reference = results
            .iter()
            .map(|(_, _, o)| o.prediction.reference_rate)
            .sum::<f64>()
            / n;
        let mean_count = results
            .iter()
            .map(|(_, _, o)| o.prediction.bidder_count)
            .sum::<f64>()
            / n;
        out.push_str(&format!(
            "Mean bidder rate: {mean_bidder:.4} | mean reference rate: {mean_reference:.4} | mean bidder count: {mean_count:.1}\n"
        ));
    }

    for (line, err) in failures {
        out.push_str(&format!("  (failed record {line}) {err}\n"));
    }

    out
}

fn fmt_amounts(amounts: &[i64]) -> String {
    amounts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BidKind, PredictionTriple};

    #[test]
    fn outcome_report_contains_key_figures() {
        let record = BidRecord {
            kind: BidKind::Goods,
            base_amount: 100_000_000,
            lower_bound_ratio: 0.87,
            participant_count: 5,
            indirect_cost: None,
            net_construction_cost: None,
            license_code: String::new(),
            institution_text: String::new(),
            region_text: String::new(),
            keyword_text: String::new(),
            bid_no: None,
            minimum_bid_amount: None,
            actual_award_amount: None,
        };
        let outcome = OutcomeRecord {
            prediction: PredictionTriple {
                bidder_rate: 0.85,
                reference_rate: 0.87,
                bidder_count: 5.2,
            },
            bidder_predicted_amount: 85_000_000,
            reference_predicted_amount: 87_000_000,
            reference_plan_estimate: 100_000_000.0,
            price_samples: vec![
                95_000_000, 90_000_000, 85_000_000, 80_000_000, 75_000_000, 97_000_000,
                92_000_000, 87_000_000, 82_000_000, 77_000_000,
            ],
            classifications: None,
            avg_diff_ratio: 0.1,
        };

        let report = format_outcome(&record, &outcome);
        assert!(report.contains("bidder rate:    0.850000"));
        assert!(report.contains("95000000, 90000000, 85000000, 80000000, 75000000"));
        assert!(!report.contains("Award-band"));
    }
}
