//! Training-time feature exploration utilities.
//!
//! Clustering, polynomial expansion, univariate selection, and
//! variance-preserving projection exist to produce experimental training
//! features. None of them run on the inference path: the shipped models are
//! trained on the frozen base layout, and nothing here may change that
//! contract.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PredictError;
use crate::features::engineer::{BASE_AMOUNT, LOWER_BOUND_RATIO, PARTICIPANT_COUNT};
use crate::features::frame::FeatureFrame;
use crate::scale::Scaler;

/// Columns the clustering/polynomial utilities operate on.
const CORE_COLUMNS: [&str; 3] = [BASE_AMOUNT, LOWER_BOUND_RATIO, PARTICIPANT_COUNT];

/// A fitted k-means model (centroids in scaled space).
#[derive(Debug, Clone)]
pub struct KMeans {
    pub centroids: Vec<Vec<f64>>,
}

impl KMeans {
    /// Index of the nearest centroid.
    pub fn assign(&self, row: &[f64]) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, c) in self.centroids.iter().enumerate() {
            let d = squared_distance(row, c);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Euclidean distance to every centroid, in centroid order.
    pub fn distances(&self, row: &[f64]) -> Vec<f64> {
        self.centroids
            .iter()
            .map(|c| squared_distance(row, c).sqrt())
            .collect()
    }
}

/// Fit k-means with k-means++ seeding and Lloyd iterations.
///
/// Deterministic for a fixed seed; iteration stops when assignments are
/// stable or after `max_iter` rounds.
pub fn kmeans_fit(
    rows: &[Vec<f64>],
    k: usize,
    seed: u64,
    max_iter: usize,
) -> Result<KMeans, PredictError> {
    if rows.is_empty() || k == 0 {
        return Err(PredictError::Usage(
            "k-means requires at least one row and k >= 1".to_string(),
        ));
    }
    let k = k.min(rows.len());
    let dim = rows[0].len();
    let mut rng = StdRng::seed_from_u64(seed);

    // k-means++ seeding.
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..rows.len())].clone());
    while centroids.len() < k {
        let dists: Vec<f64> = rows
            .iter()
            .map(|r| {
                centroids
                    .iter()
                    .map(|c| squared_distance(r, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = dists.iter().sum();
        if total <= 0.0 {
            // All points coincide with a centroid; duplicate one.
            centroids.push(rows[0].clone());
            continue;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = rows.len() - 1;
        for (i, d) in dists.iter().enumerate() {
            target -= d;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(rows[chosen].clone());
    }

    let mut assignments = vec![usize::MAX; rows.len()];
    for _ in 0..max_iter {
        let model = KMeans {
            centroids: centroids.clone(),
        };
        let new_assignments: Vec<usize> = rows.iter().map(|r| model.assign(r)).collect();
        if new_assignments == assignments {
            break;
        }
        assignments = new_assignments;

        // Recompute centroids; an empty cluster keeps its previous centroid.
        for (ci, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f64>> = rows
                .iter()
                .zip(&assignments)
                .filter(|&(_, &a)| a == ci)
                .map(|(r, _)| r)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut sum = vec![0.0; dim];
            for m in &members {
                for (s, v) in sum.iter_mut().zip(m.iter()) {
                    *s += v;
                }
            }
            for s in &mut sum {
                *s /= members.len() as f64;
            }
            *centroid = sum;
        }
    }

    Ok(KMeans { centroids })
}

/// Append a cluster-id column and per-centroid distance columns derived from
/// the standardized core numeric columns.
///
/// Skips (like every sub-transform) unless at least two of the core columns
/// are present.
pub fn clustering_features(
    frame: &mut FeatureFrame,
    k: usize,
    seed: u64,
) -> Result<(), PredictError> {
    let available: Vec<&str> = CORE_COLUMNS
        .iter()
        .copied()
        .filter(|c| frame.contains(c))
        .collect();
    if available.len() < 2 {
        return Ok(());
    }

    let rows: Vec<Vec<f64>> = (0..frame.rows())
        .map(|i| frame.select_row(&available, i))
        .collect::<Result<_, _>>()?;
    let scaler = Scaler::fit(&rows)?;
    let scaled = scaler.transform(&rows)?;

    let model = kmeans_fit(&scaled, k, seed, 300)?;

    let ids: Vec<f64> = scaled.iter().map(|r| model.assign(r) as f64).collect();
    frame.append("cluster", ids)?;
    for ci in 0..model.centroids.len() {
        let dist: Vec<f64> = scaled.iter().map(|r| model.distances(r)[ci]).collect();
        frame.append(format!("cluster_{ci}_dist"), dist)?;
    }
    Ok(())
}

/// Degree-2 polynomial expansion of the core numeric columns (squares and
/// pairwise products; degree-1 terms already exist and are not duplicated).
pub fn polynomial_features(frame: &mut FeatureFrame) -> Result<(), PredictError> {
    let available: Vec<&str> = CORE_COLUMNS
        .iter()
        .copied()
        .filter(|c| frame.contains(c))
        .collect();
    if available.len() < 2 {
        return Ok(());
    }

    for (i, &a) in available.iter().enumerate() {
        let sq: Vec<f64> = frame
            .column(a)
            .expect("filtered on presence")
            .iter()
            .map(|&v| v * v)
            .collect();
        frame.append(format!("poly_{a}_sq"), sq)?;

        for &b in &available[i + 1..] {
            let ca = frame.column(a).expect("filtered on presence");
            let cb = frame.column(b).expect("filtered on presence");
            let prod: Vec<f64> = ca.iter().zip(cb).map(|(&x, &y)| x * y).collect();
            frame.append(format!("poly_{a}_{b}"), prod)?;
        }
    }
    Ok(())
}

/// Univariate F-statistic of a simple linear fit per column
/// (`F = r² / (1 - r²) × (n - 2)`); constant columns score 0.
pub fn f_regression_scores(frame: &FeatureFrame, target: &[f64]) -> Vec<(String, f64)> {
    frame
        .names()
        .iter()
        .map(|name| {
            let x = frame.column(name).expect("iterating frame names");
            (name.clone(), f_statistic(x, target))
        })
        .collect()
}

/// Names of the `k` columns with the highest F-statistic against `target`,
/// returned in original frame order (a mask, not a ranking).
pub fn select_k_best(frame: &FeatureFrame, target: &[f64], k: usize) -> Vec<String> {
    let mut scored = f_regression_scores(frame, target);
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let keep: Vec<&String> = scored.iter().take(k).map(|(n, _)| n).collect();

    frame
        .names()
        .iter()
        .filter(|n| keep.contains(n))
        .cloned()
        .collect()
}

fn f_statistic(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 3 || y.len() != n {
        return 0.0;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        sxx += (xi - mx) * (xi - mx);
        syy += (yi - my) * (yi - my);
        sxy += (xi - mx) * (yi - my);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    let r2 = (sxy * sxy) / (sxx * syy);
    if r2 >= 1.0 {
        return f64::INFINITY;
    }
    r2 / (1.0 - r2) * (n as f64 - 2.0)
}

/// A fitted variance-preserving projection.
#[derive(Debug, Clone)]
pub struct Projection {
    means: Vec<f64>,
    /// Component rows (each of input width).
    components: Vec<Vec<f64>>,
    pub explained_variance_ratio: Vec<f64>,
}

impl Projection {
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Project one row into component space.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        self.components
            .iter()
            .map(|comp| {
                comp.iter()
                    .zip(row.iter().zip(&self.means))
                    .map(|(&c, (&v, &m))| c * (v - m))
                    .sum()
            })
            .collect()
    }
}

/// Fit a principal-component projection keeping the smallest number of
/// components whose explained-variance ratios sum to `variance_fraction`.
pub fn pca_fit(rows: &[Vec<f64>], variance_fraction: f64) -> Result<Projection, PredictError> {
    if rows.len() < 2 {
        return Err(PredictError::Usage(
            "projection requires at least two rows".to_string(),
        ));
    }
    let n = rows.len();
    let dim = rows[0].len();

    let mut means = vec![0.0; dim];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n as f64;
    }

    let centered = DMatrix::from_fn(n, dim, |i, j| rows[i][j] - means[j]);
    let svd = centered.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| PredictError::Usage("projection SVD did not converge".to_string()))?;

    let variances: Vec<f64> = svd
        .singular_values
        .iter()
        .map(|s| s * s / (n as f64 - 1.0))
        .collect();
    let total: f64 = variances.iter().sum();
    if total <= 0.0 {
        return Err(PredictError::Usage(
            "projection input has zero variance".to_string(),
        ));
    }

    let ratios: Vec<f64> = variances.iter().map(|v| v / total).collect();
    let mut keep = 0;
    let mut cum = 0.0;
    for r in &ratios {
        keep += 1;
        cum += r;
        if cum >= variance_fraction {
            break;
        }
    }

    let components: Vec<Vec<f64>> = (0..keep)
        .map(|ci| v_t.row(ci).iter().copied().collect())
        .collect();

    Ok(Projection {
        means,
        components,
        explained_variance_ratio: ratios[..keep].to_vec(),
    })
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> FeatureFrame {
        let mut f = FeatureFrame::new(6);
        f.append(
            BASE_AMOUNT,
            vec![1.0e8, 1.1e8, 1.2e8, 9.0e8, 9.1e8, 9.2e8],
        )
        .unwrap();
        f.append(
            LOWER_BOUND_RATIO,
            vec![0.85, 0.86, 0.85, 0.87, 0.88, 0.87],
        )
        .unwrap();
        f.append(PARTICIPANT_COUNT, vec![3.0, 4.0, 3.0, 20.0, 21.0, 22.0])
            .unwrap();
        f
    }

    #[test]
    fn kmeans_separates_obvious_clusters() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ];
        let model = kmeans_fit(&rows, 2, 42, 100).unwrap();
        let a = model.assign(&rows[0]);
        let b = model.assign(&rows[3]);
        assert_ne!(a, b);
        assert_eq!(model.assign(&rows[1]), a);
        assert_eq!(model.assign(&rows[4]), b);
    }

    #[test]
    fn kmeans_is_deterministic_for_a_seed() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * 7 % 5) as f64]).collect();
        let m1 = kmeans_fit(&rows, 3, 7, 100).unwrap();
        let m2 = kmeans_fit(&rows, 3, 7, 100).unwrap();
        assert_eq!(m1.centroids, m2.centroids);
    }

    #[test]
    fn clustering_features_appends_id_and_distances() {
        let mut f = training_frame();
        clustering_features(&mut f, 2, 42).unwrap();
        assert!(f.contains("cluster"));
        assert!(f.contains("cluster_0_dist"));
        assert!(f.contains("cluster_1_dist"));

        // The two amount regimes land in different clusters.
        let ids = f.column("cluster").unwrap();
        assert_ne!(ids[0], ids[3]);
    }

    #[test]
    fn clustering_skips_without_two_core_columns() {
        let mut f = FeatureFrame::new(3);
        f.append(BASE_AMOUNT, vec![1.0, 2.0, 3.0]).unwrap();
        clustering_features(&mut f, 2, 42).unwrap();
        assert_eq!(f.width(), 1);
    }

    #[test]
    fn polynomial_appends_squares_and_products() {
        let mut f = training_frame();
        polynomial_features(&mut f).unwrap();
        assert!(f.contains("poly_base_amount_sq"));
        assert!(f.contains("poly_base_amount_lower_bound_ratio"));
        assert!(f.contains("poly_lower_bound_ratio_participant_count"));

        let prod = f.column("poly_base_amount_lower_bound_ratio").unwrap();
        assert!((prod[0] - 1.0e8 * 0.85).abs() < 1.0);
    }

    #[test]
    fn select_k_best_prefers_correlated_columns() {
        let mut f = FeatureFrame::new(8);
        let y: Vec<f64> = (0..8).map(|i| i as f64).collect();
        f.append("signal", y.clone()).unwrap();
        f.append("noise", vec![5.0, -3.0, 4.0, -1.0, 2.0, -2.0, 0.0, 1.0])
            .unwrap();
        f.append("constant", vec![1.0; 8]).unwrap();

        let selected = select_k_best(&f, &y, 1);
        assert_eq!(selected, vec!["signal".to_string()]);
    }

    #[test]
    fn pca_recovers_dominant_direction() {
        // Points along y = x with tiny orthogonal noise.
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let t = i as f64;
                vec![t + 0.01 * (i % 2) as f64, t - 0.01 * (i % 2) as f64]
            })
            .collect();
        let proj = pca_fit(&rows, 0.95).unwrap();
        assert_eq!(proj.n_components(), 1);
        assert!(proj.explained_variance_ratio[0] > 0.99);

        // The leading component weights both axes near-equally.
        let p0 = proj.transform_row(&rows[0]);
        let p9 = proj.transform_row(&rows[9]);
        assert!((p9[0] - p0[0]).abs() > 10.0);
    }
}
