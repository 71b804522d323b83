//! Kernel SHAP
//!
//! Model-agnostic Shapley value estimation against a background sample.
//! A coalition `z` keeps the instance's value for the features it contains
//! and takes background values for the rest; the model output for `z` is
//! averaged over all background rows. Shapley values are the solution of a
//! weighted least squares fit of those averages under the efficiency
//! constraint `Σφ = f(x) − E[f(background)]`.
//!
//! Features whose value equals the background in every row cannot move the
//! output and get exactly zero. When few features vary, every coalition is
//! enumerated and the result is exact; otherwise `nsamples` coalitions are
//! drawn in complementary pairs from a fixed seed, so equal inputs give
//! equal attributions.

use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::engine::AttributionMethod;
use super::shape::RawAttribution;
use crate::logic::config::PipelineConfig;
use crate::logic::error::ExplanationError;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::model::Classifier;
use crate::logic::resources::BackgroundSample;

/// Singular values below this are treated as zero by the SVD fallback
const SVD_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
struct Coalition {
    /// One flag per varying feature
    mask: Vec<bool>,
    weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelExplainer {
    nsamples: usize,
    max_background_rows: usize,
    seed: u64,
}

impl KernelExplainer {
    pub fn new(nsamples: usize, max_background_rows: usize, seed: u64) -> Self {
        Self {
            nsamples: nsamples.max(2),
            max_background_rows: max_background_rows.max(1),
            seed,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.nsamples, config.max_background_rows, config.seed)
    }

    /// Shapley values of one row, `FEATURE_COUNT × classes`
    pub fn shap_values(
        &self,
        classifier: &dyn Classifier,
        background: &BackgroundSample,
        x: &[f32; FEATURE_COUNT],
    ) -> Result<Array2<f64>, ExplanationError> {
        let background = background.truncated(self.max_background_rows);
        if background.is_empty() {
            return Err(ExplanationError::Unavailable("background sample is empty".to_string()));
        }
        let bg = background.to_array();
        let n_bg = bg.nrows();

        let instance = Array2::from_shape_vec((1, FEATURE_COUNT), x.to_vec())
            .map_err(|e| ExplanationError::Unavailable(format!("Array error: {}", e)))?;
        let fx = classifier.predict_proba(instance.view())?;
        let classes = fx.ncols();
        if fx.nrows() != 1 || classes == 0 {
            return Err(ExplanationError::Unavailable(format!(
                "classifier returned {:?} for one row",
                fx.dim()
            )));
        }
        let fx: Vec<f64> = fx.row(0).iter().map(|v| *v as f64).collect();

        let f_bg = classifier.predict_proba(bg.view())?;
        if f_bg.dim() != (n_bg, classes) {
            return Err(ExplanationError::Unavailable(format!(
                "classifier returned {:?} for {} background rows",
                f_bg.dim(),
                n_bg
            )));
        }
        let expected: Vec<f64> = f_bg
            .mapv(|v| v as f64)
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .ok_or_else(|| ExplanationError::Unavailable("empty background output".to_string()))?;

        let varying: Vec<usize> = (0..FEATURE_COUNT)
            .filter(|&j| bg.column(j).iter().any(|v| *v != x[j]))
            .collect();

        let mut phi = Array2::<f64>::zeros((FEATURE_COUNT, classes));
        match varying.len() {
            0 => {}
            1 => {
                for c in 0..classes {
                    phi[[varying[0], c]] = fx[c] - expected[c];
                }
            }
            d => {
                let coalitions = self.coalitions(d);
                let ey = evaluate(classifier, &bg, x, &varying, &coalitions, classes)?;

                for c in 0..classes {
                    let solved = solve_constrained(
                        &coalitions,
                        ey.column(c),
                        expected[c],
                        fx[c] - expected[c],
                    )?;
                    for (slot, &j) in varying.iter().enumerate() {
                        phi[[j, c]] = solved[slot];
                    }
                }
                log::debug!(
                    "Kernel SHAP: {} varying features, {} coalitions, {} background rows",
                    d,
                    coalitions.len(),
                    n_bg
                );
            }
        }

        Ok(phi)
    }

    fn coalitions(&self, d: usize) -> Vec<Coalition> {
        let proper_subsets = if d < 63 { (1u64 << d) - 2 } else { u64::MAX };
        if proper_subsets <= self.nsamples as u64 {
            enumerate_coalitions(d)
        } else {
            self.sample_coalitions(d)
        }
    }

    /// Subset sizes drawn with the total kernel mass of each size, members
    /// uniform within a size; every draw is paired with its complement
    fn sample_coalitions(&self, d: usize) -> Vec<Coalition> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let size_weights: Vec<f64> = (1..d)
            .map(|s| (d - 1) as f64 / (s * (d - s)) as f64)
            .collect();
        let total: f64 = size_weights.iter().sum();

        let pairs = (self.nsamples / 2).max(1);
        let mut out = Vec::with_capacity(pairs * 2);
        for _ in 0..pairs {
            let mut r = rng.gen::<f64>() * total;
            let mut size = d - 1;
            for (i, w) in size_weights.iter().enumerate() {
                if r < *w {
                    size = i + 1;
                    break;
                }
                r -= w;
            }

            let mut mask = vec![false; d];
            for j in rand::seq::index::sample(&mut rng, d, size).iter() {
                mask[j] = true;
            }
            let complement = mask.iter().map(|m| !m).collect();

            out.push(Coalition { mask, weight: 1.0 });
            out.push(Coalition { mask: complement, weight: 1.0 });
        }
        out
    }
}

impl AttributionMethod for KernelExplainer {
    fn attribute(
        &self,
        classifier: &dyn Classifier,
        background: &BackgroundSample,
        vector: &FeatureVector,
    ) -> Result<RawAttribution, ExplanationError> {
        let phi = self.shap_values(classifier, background, &vector.values)?;

        // 1 × features per class
        let mut per_class: Vec<_> = phi
            .columns()
            .into_iter()
            .map(|col| col.to_owned().insert_axis(Axis(0)).into_dyn())
            .collect();

        if per_class.len() == 1 {
            Ok(RawAttribution::Array(per_class.remove(0)))
        } else {
            Ok(RawAttribution::PerClass(per_class))
        }
    }

    fn name(&self) -> &str {
        "kernel_shap"
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Every proper non-empty subset with its exact Shapley kernel weight
fn enumerate_coalitions(d: usize) -> Vec<Coalition> {
    (1u64..(1u64 << d) - 1)
        .map(|bits| {
            let mask: Vec<bool> = (0..d).map(|j| bits & (1 << j) != 0).collect();
            let s = bits.count_ones() as usize;
            let weight = (d - 1) as f64 / (binomial(d, s) * (s * (d - s)) as f64);
            Coalition { mask, weight }
        })
        .collect()
}

/// Mean model output per coalition, one batched classifier call
fn evaluate(
    classifier: &dyn Classifier,
    bg: &Array2<f32>,
    x: &[f32; FEATURE_COUNT],
    varying: &[usize],
    coalitions: &[Coalition],
    classes: usize,
) -> Result<Array2<f64>, ExplanationError> {
    let n_bg = bg.nrows();
    let mut synthetic = Array2::<f32>::zeros((coalitions.len() * n_bg, FEATURE_COUNT));

    for (i, coalition) in coalitions.iter().enumerate() {
        for b in 0..n_bg {
            let mut row = synthetic.row_mut(i * n_bg + b);
            row.assign(&bg.row(b));
            for (slot, &j) in varying.iter().enumerate() {
                if coalition.mask[slot] {
                    row[j] = x[j];
                }
            }
        }
    }

    let out = classifier.predict_proba(synthetic.view())?;
    if out.dim() != (synthetic.nrows(), classes) {
        return Err(ExplanationError::Unavailable(format!(
            "classifier returned {:?} for {} coalition rows",
            out.dim(),
            synthetic.nrows()
        )));
    }

    let mut ey = Array2::<f64>::zeros((coalitions.len(), classes));
    for i in 0..coalitions.len() {
        let block = out.slice(s![i * n_bg..(i + 1) * n_bg, ..]);
        for c in 0..classes {
            ey[[i, c]] = block.column(c).iter().map(|v| *v as f64).sum::<f64>() / n_bg as f64;
        }
    }
    Ok(ey)
}

/// Weighted least squares with `Σφ = total`, enforced by substituting the
/// last feature out of the system
fn solve_constrained(
    coalitions: &[Coalition],
    ey: ArrayView1<'_, f64>,
    base: f64,
    total: f64,
) -> Result<Vec<f64>, ExplanationError> {
    let d = coalitions.first().map(|c| c.mask.len()).unwrap_or(0);
    if d < 2 {
        return Err(ExplanationError::Unavailable("not enough varying features".to_string()));
    }
    let last = d - 1;
    let p = d - 1;

    let mut xtwx = DMatrix::<f64>::zeros(p, p);
    let mut xtwy = DVector::<f64>::zeros(p);
    let mut row = vec![0.0f64; p];

    for (i, coalition) in coalitions.iter().enumerate() {
        let z_last = if coalition.mask[last] { 1.0 } else { 0.0 };
        let y = ey[i] - base - z_last * total;
        for (j, r) in row.iter_mut().enumerate() {
            *r = (if coalition.mask[j] { 1.0 } else { 0.0 }) - z_last;
        }
        for a in 0..p {
            xtwy[a] += coalition.weight * row[a] * y;
            for b in 0..p {
                xtwx[(a, b)] += coalition.weight * row[a] * row[b];
            }
        }
    }

    let beta = solve_linear(xtwx, xtwy)
        .ok_or_else(|| ExplanationError::Unavailable("singular attribution system".to_string()))?;

    let mut phi: Vec<f64> = beta.iter().copied().collect();
    phi.push(total - beta.sum());
    Ok(phi)
}

/// Cholesky on the normal equations, SVD pseudo-inverse when the matrix is
/// not positive definite
fn solve_linear(a: DMatrix<f64>, b: DVector<f64>) -> Option<DVector<f64>> {
    if a.iter().any(|v| !v.is_finite()) || a.iter().all(|v| *v == 0.0) {
        return None;
    }

    if let Some(chol) = a.clone().cholesky() {
        let x = chol.solve(&b);
        if x.iter().all(|v| v.is_finite()) {
            return Some(x);
        }
    }

    log::debug!("Normal matrix not positive definite, using SVD");
    a.svd(true, true)
        .solve(&b, SVD_EPSILON)
        .ok()
        .filter(|x| x.iter().all(|v| v.is_finite()))
}
