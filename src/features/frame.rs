//! The ordered feature table.
//!
//! Downstream scaling addresses columns by index layout, not by name lookup,
//! so the frame's ordering contract is part of the numeric contract:
//!
//! - columns are append-only; an append under an existing name leaves the
//!   existing column untouched (this is what makes re-applied sub-transforms
//!   idempotent)
//! - existing columns are never reordered

use crate::error::PredictError;

/// A column-ordered table of named `f64` columns with a fixed row count.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    rows: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Append a column. Returns `Ok(false)` (and leaves the frame unchanged)
    /// when a column of that name already exists.
    pub fn append(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<bool, PredictError> {
        let name = name.into();
        if values.len() != self.rows {
            return Err(PredictError::Usage(format!(
                "column '{name}' has {} values for a {}-row frame",
                values.len(),
                self.rows
            )));
        }
        if self.contains(&name) {
            return Ok(false);
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(true)
    }

    /// One row in frame column order.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[i]).collect()
    }

    /// One row restricted to the given columns, in the given order.
    ///
    /// A missing column is a hard failure: the caller is selecting the frozen
    /// layout the scaler was fit on.
    pub fn select_row(&self, names: &[&str], i: usize) -> Result<Vec<f64>, PredictError> {
        names
            .iter()
            .map(|name| {
                self.column(name)
                    .map(|c| c[i])
                    .ok_or_else(|| PredictError::InvalidBidRecord(format!("missing feature column '{name}'")))
            })
            .collect()
    }

    /// Replace every NaN/infinite cell with `value` (the batch-path
    /// equivalent of filling missing engineered cells with 0).
    pub fn fill_non_finite(&mut self, value: f64) {
        for column in &mut self.columns {
            for cell in column {
                if !cell.is_finite() {
                    *cell = value;
                }
            }
        }
    }
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). `None` for fewer than two
/// observations, mirroring the training-frame semantics where a z-score is
/// only emitted when the spread is defined and positive.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolation quantile over an unsorted slice, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order_and_guards_duplicates() {
        let mut f = FeatureFrame::new(2);
        assert!(f.append("a", vec![1.0, 2.0]).unwrap());
        assert!(f.append("b", vec![3.0, 4.0]).unwrap());

        // Re-append under an existing name: untouched, not replaced.
        assert!(!f.append("a", vec![9.0, 9.0]).unwrap());
        assert_eq!(f.column("a").unwrap(), &[1.0, 2.0]);
        assert_eq!(f.names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn append_rejects_wrong_row_count() {
        let mut f = FeatureFrame::new(2);
        assert!(f.append("a", vec![1.0]).is_err());
    }

    #[test]
    fn select_row_errors_on_missing_column() {
        let mut f = FeatureFrame::new(1);
        f.append("a", vec![1.0]).unwrap();
        assert!(f.select_row(&["a", "b"], 0).is_err());
        assert_eq!(f.select_row(&["a"], 0).unwrap(), vec![1.0]);
    }

    #[test]
    fn fill_non_finite_replaces_nan_and_inf() {
        let mut f = FeatureFrame::new(3);
        f.append("a", vec![1.0, f64::NAN, f64::INFINITY]).unwrap();
        f.fill_non_finite(0.0);
        assert_eq!(f.column("a").unwrap(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
    }

    #[test]
    fn sample_std_is_none_for_single_row() {
        assert!(sample_std(&[5.0]).is_none());
        let s = sample_std(&[2.0, 4.0]).unwrap();
        assert!((s - std::f64::consts::SQRT_2).abs() < 1e-12);
    }
}
