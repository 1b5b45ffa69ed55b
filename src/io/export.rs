//! Export batch prediction results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per record, predictions and derived amounts flattened,
//! the ten price samples in order.

use std::path::Path;

use crate::domain::{BidRecord, OutcomeRecord};
use crate::error::PredictError;

/// Write per-record results to a CSV file.
pub fn write_results_csv(
    path: &Path,
    results: &[(BidRecord, OutcomeRecord)],
) -> Result<(), PredictError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        PredictError::Usage(format!("failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut header: Vec<String> = [
        "bid_no",
        "kind",
        "base_amount",
        "lower_bound_ratio",
        "participant_count",
        "license_code",
        "bidder_rate_pred",
        "reference_rate_pred",
        "bidder_count_pred",
        "bidder_predicted_amount",
        "reference_predicted_amount",
        "reference_plan_estimate",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for i in 1..=10 {
        header.push(format!("sample_{i}"));
    }
    header.push("classification_bidder".to_string());
    header.push("classification_reference".to_string());

    writer
        .write_record(&header)
        .map_err(|e| PredictError::Usage(format!("failed to write export CSV header: {e}")))?;

    for (record, outcome) in results {
        let mut row: Vec<String> = vec![
            record.bid_no.clone().unwrap_or_default(),
            record.kind.display_name().to_string(),
            record.base_amount.to_string(),
            format!("{:.6}", record.lower_bound_ratio),
            record.participant_count.to_string(),
            record.license_code.clone(),
            format!("{:.6}", outcome.prediction.bidder_rate),
            format!("{:.6}", outcome.prediction.reference_rate),
            format!("{:.6}", outcome.prediction.bidder_count),
            outcome.bidder_predicted_amount.to_string(),
            outcome.reference_predicted_amount.to_string(),
            format!("{:.6}", outcome.reference_plan_estimate),
        ];
        for sample in &outcome.price_samples {
            row.push(sample.to_string());
        }
        match outcome.classifications {
            Some(band) => {
                row.push(band.bidder.display_name().to_string());
                row.push(band.reference.display_name().to_string());
            }
            None => {
                row.push(String::new());
                row.push(String::new());
            }
        }

        writer
            .write_record(&row)
            .map_err(|e| PredictError::Usage(format!("failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| PredictError::Usage(format!("failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BidKind, PredictionTriple};

    #[test]
    fn export_writes_header_and_rows() {
        let record = BidRecord {
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
            bid_no: Some("20240601-01".to_string()),
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
            price_samples: vec![1; 10],
            classifications: None,
            avg_diff_ratio: 0.1,
        };

        let path = std::env::temp_dir().join("bidrate_export_test.csv");
        write_results_csv(&path, &[(record, outcome)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("bid_no,kind,base_amount"));
        assert!(header.ends_with("classification_bidder,classification_reference"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("20240601-01,goods,100000000,0.870000,5,6000,0.850000"));
        std::fs::remove_file(&path).ok();
    }
}
