//! Deterministic feature-engineering sub-transforms.
//!
//! Every sub-transform is pure, presence-guarded, and append-only:
//!
//! - it silently skips when its required source columns are absent, so
//!   heterogeneous record shapes across procurement kinds share one code path
//! - an already-present target column is left untouched (idempotence)
//! - existing columns are never reordered, since the scaler addresses the
//!   frozen layout by index
//!
//! The identity ratio in `ratio_features` and the exact operation order are
//! compatibility contracts with the trained artifacts.

use chrono::{Datelike, NaiveDate};

use crate::error::PredictError;
use crate::features::frame::{FeatureFrame, mean, quantile, sample_std};

/// Frozen base-column names, in scaler layout order.
pub const BASE_AMOUNT: &str = "base_amount";
pub const LOWER_BOUND_RATIO: &str = "lower_bound_ratio";
pub const PARTICIPANT_COUNT: &str = "participant_count";
pub const INDIRECT_COST: &str = "indirect_cost";
pub const NET_CONSTRUCTION_COST: &str = "net_construction_cost";
pub const LICENSE_CODE: &str = "license_code";
pub const INSTITUTION_SCORE: &str = "institution_score";
pub const REGION_SCORE: &str = "region_score";
pub const KEYWORD_SCORE: &str = "keyword_score";

/// Interaction features: products and squares of monetary/ratio/count
/// fields, plus pairwise products among the three text scores.
pub fn interaction_features(frame: &mut FeatureFrame) -> Result<(), PredictError> {
    if frame.contains(BASE_AMOUNT) && frame.contains(LOWER_BOUND_RATIO) {
        let prod = col_product(frame, BASE_AMOUNT, LOWER_BOUND_RATIO);
        frame.append("base_amount_lower_bound_ratio", prod)?;
        let sq = col_square(frame, BASE_AMOUNT);
        frame.append("base_amount_sq", sq)?;
        let sq = col_square(frame, LOWER_BOUND_RATIO);
        frame.append("lower_bound_ratio_sq", sq)?;
    }

    if frame.contains(PARTICIPANT_COUNT) && frame.contains(BASE_AMOUNT) {
        let prod = col_product(frame, PARTICIPANT_COUNT, BASE_AMOUNT);
        frame.append("participant_count_base_amount", prod)?;
        let sq = col_square(frame, PARTICIPANT_COUNT);
        frame.append("participant_count_sq", sq)?;
    }

    if frame.contains(LICENSE_CODE) && frame.contains(BASE_AMOUNT) {
        let prod = col_product(frame, LICENSE_CODE, BASE_AMOUNT);
        frame.append("license_code_base_amount", prod)?;
    }

    let score_cols = [INSTITUTION_SCORE, REGION_SCORE, KEYWORD_SCORE];
    for (i, &a) in score_cols.iter().enumerate() {
        for &b in &score_cols[i + 1..] {
            if frame.contains(a) && frame.contains(b) {
                let prod = col_product(frame, a, b);
                frame.append(format!("{a}_{b}"), prod)?;
            }
        }
    }

    Ok(())
}

/// Ratio features: log1p of monetary/count fields and the identity ratio
/// `base_amount × lower_bound_ratio / base_amount`.
///
/// The identity ratio is mathematically redundant but preserved exactly: the
/// trained artifacts saw its specific floating-point path.
pub fn ratio_features(frame: &mut FeatureFrame) -> Result<(), PredictError> {
    if frame.contains(BASE_AMOUNT) && frame.contains(LOWER_BOUND_RATIO) {
        let base = frame.column(BASE_AMOUNT).expect("presence checked");
        let lower = frame.column(LOWER_BOUND_RATIO).expect("presence checked");
        let ratio: Vec<f64> = base
            .iter()
            .zip(lower)
            .map(|(&b, &l)| b * l / b)
            .collect();
        frame.append("lower_bound_amount_ratio", ratio)?;
    }

    if frame.contains(PARTICIPANT_COUNT) {
        let log: Vec<f64> = frame
            .column(PARTICIPANT_COUNT)
            .expect("presence checked")
            .iter()
            .map(|&v| v.ln_1p())
            .collect();
        frame.append("participant_count_log", log)?;
    }

    if frame.contains(BASE_AMOUNT) {
        let log: Vec<f64> = frame
            .column(BASE_AMOUNT)
            .expect("presence checked")
            .iter()
            .map(|&v| v.ln_1p())
            .collect();
        frame.append("base_amount_log", log)?;
    }

    Ok(())
}

/// Text-derived categorical features for one free-text field.
///
/// Five columns per field: character length, word count, count of characters
/// outside Hangul/ASCII-alphanumeric/whitespace, digit count, and uppercase
/// ratio (zero-length divisor coerced to 1).
pub fn categorical_text_features(
    frame: &mut FeatureFrame,
    field: &str,
    texts: &[String],
) -> Result<(), PredictError> {
    let lens: Vec<f64> = texts.iter().map(|t| t.chars().count() as f64).collect();
    let words: Vec<f64> = texts
        .iter()
        .map(|t| t.split_whitespace().count() as f64)
        .collect();
    let symbols: Vec<f64> = texts
        .iter()
        .map(|t| {
            t.chars()
                .filter(|&c| {
                    !(('\u{AC00}'..='\u{D7A3}').contains(&c)
                        || c.is_ascii_alphanumeric()
                        || c.is_whitespace())
                })
                .count() as f64
        })
        .collect();
    let digits: Vec<f64> = texts
        .iter()
        .map(|t| t.chars().filter(char::is_ascii_digit).count() as f64)
        .collect();
    let upper_ratio: Vec<f64> = texts
        .iter()
        .zip(&lens)
        .map(|(t, &len)| {
            let upper = t.chars().filter(char::is_ascii_uppercase).count() as f64;
            upper / if len == 0.0 { 1.0 } else { len }
        })
        .collect();

    frame.append(format!("{field}_len"), lens)?;
    frame.append(format!("{field}_word_count"), words)?;
    frame.append(format!("{field}_symbol_count"), symbols)?;
    frame.append(format!("{field}_digit_count"), digits)?;
    frame.append(format!("{field}_upper_ratio"), upper_ratio)?;
    Ok(())
}

/// Statistical features over every numeric column present at entry:
/// deviation from mean, z-score (only when the sample stddev is positive),
/// deviation from median, and IQR position (only when Q3 > Q1).
///
/// Stats are computed over the frame's rows, so a single-record frame yields
/// zero deviations and no z-score/IQR columns — the same degenerate shape
/// the training frame produces for one row.
pub fn statistical_features(frame: &mut FeatureFrame) -> Result<(), PredictError> {
    // Snapshot: the loop must not see the columns it appends.
    let names: Vec<String> = frame.names().to_vec();

    for name in names {
        let values = frame.column(&name).expect("snapshot of existing names").to_vec();

        let m = mean(&values);
        let mean_diff: Vec<f64> = values.iter().map(|v| v - m).collect();
        frame.append(format!("{name}_mean_diff"), mean_diff)?;

        if let Some(std) = sample_std(&values) {
            if std > 0.0 {
                let z: Vec<f64> = values.iter().map(|v| (v - m) / std).collect();
                frame.append(format!("{name}_zscore"), z)?;
            }
        }

        let median = quantile(&values, 0.5);
        let median_diff: Vec<f64> = values.iter().map(|v| v - median).collect();
        frame.append(format!("{name}_median_diff"), median_diff)?;

        let q1 = quantile(&values, 0.25);
        let q3 = quantile(&values, 0.75);
        if q3 > q1 {
            let iqr: Vec<f64> = values.iter().map(|v| (v - q1) / (q3 - q1)).collect();
            frame.append(format!("{name}_iqr_pos"), iqr)?;
        }
    }

    Ok(())
}

/// Extract the first valid embedded `YYYYMMDD` date from a bid identifier.
///
/// The first run of 8+ digits is probed; the leading 8 digits must form an
/// actual calendar date with year 2020–2030.
pub fn date_from_bid_no(bid_no: &str) -> Option<NaiveDate> {
    let mut digits = String::new();
    let mut runs: Vec<String> = Vec::new();
    for c in bid_no.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            runs.push(std::mem::take(&mut digits));
        }
    }
    if !digits.is_empty() {
        runs.push(digits);
    }

    for run in runs {
        if run.len() < 8 {
            continue;
        }
        let year: i32 = run[0..4].parse().ok()?;
        let month: u32 = run[4..6].parse().ok()?;
        let day: u32 = run[6..8].parse().ok()?;
        if (2020..=2030).contains(&year) && (1..=12).contains(&month) && (1..=31).contains(&day) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }
    None
}

/// Temporal features from per-row bid identifiers.
///
/// Columns appear only when at least one row carries a valid embedded date;
/// rows without one get NaN cells (filled to 0 by the pipeline's fill step,
/// like every other missing engineered cell).
pub fn temporal_features(
    frame: &mut FeatureFrame,
    bid_nos: &[Option<String>],
) -> Result<(), PredictError> {
    let dates: Vec<Option<NaiveDate>> = bid_nos
        .iter()
        .map(|n| n.as_deref().and_then(date_from_bid_no))
        .collect();

    if dates.iter().all(Option::is_none) {
        return Ok(());
    }

    let pick = |f: fn(NaiveDate) -> f64| -> Vec<f64> {
        dates.iter().map(|d| d.map_or(f64::NAN, f)).collect()
    };

    frame.append("bid_year", pick(|d| d.year() as f64))?;
    frame.append("bid_month", pick(|d| d.month() as f64))?;
    frame.append("bid_day", pick(|d| d.day() as f64))?;
    // Monday = 0, matching the training frame's weekday convention.
    frame.append(
        "bid_weekday",
        pick(|d| d.weekday().num_days_from_monday() as f64),
    )?;
    frame.append("bid_quarter", pick(|d| ((d.month() - 1) / 3 + 1) as f64))?;
    frame.append("bid_season", pick(|d| season_number(d.month())))?;

    Ok(())
}

/// Season as a number: Mar–May 1, Jun–Aug 2, Sep–Nov 3, Dec–Feb 4.
fn season_number(month: u32) -> f64 {
    match month {
        3..=5 => 1.0,
        6..=8 => 2.0,
        9..=11 => 3.0,
        _ => 4.0,
    }
}

fn col_product(frame: &FeatureFrame, a: &str, b: &str) -> Vec<f64> {
    let ca = frame.column(a).expect("presence checked by caller");
    let cb = frame.column(b).expect("presence checked by caller");
    ca.iter().zip(cb).map(|(&x, &y)| x * y).collect()
}

fn col_square(frame: &FeatureFrame, a: &str) -> Vec<f64> {
    let ca = frame.column(a).expect("presence checked by caller");
    ca.iter().map(|&x| x * x).collect()
}
