//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during inference
//! - read from JSON-lines batch files
//! - exported to CSV result tables

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Procurement variant.
///
/// Each kind implies one frozen base-column layout per trained model version:
/// construction bids carry the two cost fields, goods/service bids do not.
/// The layout is decided by the variant, never probed from column presence,
/// so the scaler sees the same index layout it was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BidKind {
    Construction,
    Goods,
    Service,
}

impl BidKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            BidKind::Construction => "construction",
            BidKind::Goods => "goods",
            BidKind::Service => "service",
        }
    }

    /// Whether this kind carries the cost columns
    /// (`indirect_cost`, `net_construction_cost`).
    pub fn has_cost_columns(self) -> bool {
        matches!(self, BidKind::Construction)
    }

    /// Width of the frozen base feature layout for this kind.
    pub fn base_column_count(self) -> usize {
        if self.has_cost_columns() { 9 } else { 7 }
    }
}

/// Which of the three ensemble regressors a value or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTarget {
    BidderRate,
    ReferenceRate,
    BidderCount,
}

impl std::fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelTarget::BidderRate => "bidder-rate model",
            ModelTarget::ReferenceRate => "reference-rate model",
            ModelTarget::BidderCount => "bidder-count model",
        };
        write!(f, "{s}")
    }
}

/// The unit of work: one procurement bid as submitted for inference.
///
/// `minimum_bid_amount` / `actual_award_amount` are evaluation-mode fields:
/// when both are present the pipeline also classifies the predicted amounts
/// against the observed award band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRecord {
    pub kind: BidKind,

    /// Base (estimated) amount in won. Must be > 0 for any ratio-derived
    /// amount to be computed.
    pub base_amount: i64,

    /// Regulatory minimum acceptable bid ratio, conventionally in (0, 1].
    pub lower_bound_ratio: f64,

    /// Number of participating companies known at announcement time.
    pub participant_count: u32,

    /// Construction-only cost fields.
    #[serde(default)]
    pub indirect_cost: Option<i64>,
    #[serde(default)]
    pub net_construction_cost: Option<i64>,

    /// License restriction code, hashed to a bounded integer feature.
    pub license_code: String,

    /// Free-text fields reduced to relevance scores by the text scorer.
    pub institution_text: String,
    pub region_text: String,
    pub keyword_text: String,

    /// Bid identifier; when it embeds a valid `YYYYMMDD` date the temporal
    /// features are derived from it.
    #[serde(default)]
    pub bid_no: Option<String>,

    /// Observed award band (evaluation mode only).
    #[serde(default)]
    pub minimum_bid_amount: Option<i64>,
    #[serde(default)]
    pub actual_award_amount: Option<i64>,
}

impl BidRecord {
    /// Validate the invariants every downstream division relies on.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.base_amount <= 0 {
            return Err(PredictError::InvalidBidRecord(format!(
                "base_amount must be > 0 (got {})",
                self.base_amount
            )));
        }
        if !(self.lower_bound_ratio.is_finite() && self.lower_bound_ratio > 0.0) {
            return Err(PredictError::InvalidBidRecord(format!(
                "lower_bound_ratio must be finite and > 0 (got {})",
                self.lower_bound_ratio
            )));
        }
        if self.kind.has_cost_columns()
            && (self.indirect_cost.is_none() || self.net_construction_cost.is_none())
        {
            return Err(PredictError::InvalidBidRecord(
                "construction bids require indirect_cost and net_construction_cost".to_string(),
            ));
        }
        Ok(())
    }

    /// Observed award band, when both evaluation fields are present.
    pub fn award_band(&self) -> Option<AwardBand> {
        match (self.minimum_bid_amount, self.actual_award_amount) {
            (Some(minimum), Some(actual)) => Some(AwardBand {
                minimum_bid_amount: minimum,
                actual_award_amount: actual,
            }),
            _ => None,
        }
    }
}

/// The half-open interval `[minimum_bid_amount, actual_award_amount)` a
/// predicted amount is classified against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AwardBand {
    pub minimum_bid_amount: i64,
    pub actual_award_amount: i64,
}

/// Ensemble output for one record: the three regressor predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionTriple {
    /// Predicted ratio of the winning bid to the base amount.
    pub bidder_rate: f64,
    /// Predicted ratio against the official reference/plan amount.
    pub reference_rate: f64,
    /// Predicted number of participating companies.
    pub bidder_count: f64,
}

/// Award-band classification of a predicted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeClassification {
    /// Predicted amount falls below the regulatory minimum.
    BelowMinimum,
    /// Predicted amount lies inside `[minimum, actual)` — a plausible win.
    Awarded,
    /// Predicted amount is at or above the actual award amount.
    Other,
}

impl OutcomeClassification {
    /// Short label for tables and CSV export.
    pub fn display_name(self) -> &'static str {
        match self {
            OutcomeClassification::BelowMinimum => "below-minimum",
            OutcomeClassification::Awarded => "awarded",
            OutcomeClassification::Other => "-",
        }
    }
}

/// The two classifications produced per bid, one per rate basis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandOutcome {
    /// Classification of `bidder_rate × base_amount`.
    pub bidder: OutcomeClassification,
    /// Classification of the reference-rate round-trip amount.
    pub reference: OutcomeClassification,
}

/// Caller-facing output record for one bid.
///
/// No field is mutated after creation; serving/persistence layers consume
/// this as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub prediction: PredictionTriple,

    /// `round(base_amount × bidder_rate)`.
    pub bidder_predicted_amount: i64,
    /// `round(base_amount × reference_rate)`.
    pub reference_predicted_amount: i64,
    /// Reference-plan amount estimate:
    /// `reference_rate × base_amount / lower_bound_ratio`.
    pub reference_plan_estimate: f64,

    /// Ten candidate award amounts: five per rate basis, most-conservative
    /// to least-conservative.
    pub price_samples: Vec<i64>,

    /// Present only when the record carried an observed award band.
    pub classifications: Option<BandOutcome>,

    /// Deviation-band width used for sampling, echoed for the caller.
    pub avg_diff_ratio: f64,
}

/// Pipeline configuration consumed (not owned) by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Average difference ratio: the deviation-band width applied around a
    /// predicted rate when sampling candidate award amounts.
    pub avg_diff_ratio: f64,
    /// Version key of the trained artifact set this config belongs to.
    pub artifact_version: String,
}
