//! Implicit-feedback Alternating Least Squares.
//!
//! Every watched cell carries confidence `c = alpha`, every other cell
//! confidence 1 and preference 0. With the movie factors `Y` fixed, each user
//! row solves
//!
//! ```text
//! (YᵀY + Σᵢ (c − 1) yᵢyᵢᵀ + λI) x = Σᵢ c yᵢ      (i over watched movies)
//! ```
//!
//! and then the same with users and movies swapped. `YᵀY` is computed once per
//! half-step and shared by every row.
//!
//! ## Learning Goals
//! - Flat `Vec<f64>` matrices with `chunks`/`par_chunks_mut` rows
//! - A small Cholesky solver with explicit failure instead of panics
//! - Seeded randomness for reproducible training

use crate::error::{RecommendError, Result};
use crate::interactions::InteractionMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Pivots at or below this are treated as a singular system
const MIN_PIVOT: f64 = 1e-12;

/// Hyperparameters of one training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlsParams {
    pub factors: usize,
    pub regularization: f64,
    pub iterations: usize,
    pub alpha: f64,
    pub seed: u64,
}

impl Default for AlsParams {
    fn default() -> Self {
        Self {
            factors: 64,
            regularization: 0.1,
            iterations: 15,
            alpha: 80.0,
            seed: 42,
        }
    }
}

/// Trained user and movie factors, row-major, `factors` columns each
#[derive(Debug, Clone, PartialEq)]
pub struct FactorModel {
    factors: usize,
    user_factors: Vec<f64>,
    movie_factors: Vec<f64>,
}

impl FactorModel {
    pub fn user_vector(&self, user: usize) -> Option<&[f64]> {
        self.user_factors.chunks(self.factors).nth(user)
    }

    /// Predicted preference of `user` for every movie, in movie index order
    pub fn score_all(&self, user: usize) -> Option<Vec<f64>> {
        let x = self.user_vector(user)?;
        Some(self.movie_factors.chunks(self.factors).map(|y| dot(x, y)).collect())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Factor a binary watch matrix
#[instrument(skip(matrix), fields(users = matrix.n_users(), movies = matrix.n_movies()))]
pub fn fit(matrix: &InteractionMatrix, params: &AlsParams) -> Result<FactorModel> {
    let k = params.factors;
    if k == 0 {
        return Err(RecommendError::Fit("factor count must be positive".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut user_factors: Vec<f64> = (0..matrix.n_users() * k)
        .map(|_| rng.random::<f64>() * 0.01)
        .collect();
    let mut movie_factors: Vec<f64> = (0..matrix.n_movies() * k)
        .map(|_| rng.random::<f64>() * 0.01)
        .collect();

    for iteration in 0..params.iterations {
        solve_side(&mut user_factors, &movie_factors, matrix.user_rows(), params)?;
        solve_side(&mut movie_factors, &user_factors, matrix.item_rows(), params)?;
        debug!("ALS iteration {} done", iteration + 1);
    }

    Ok(FactorModel {
        factors: k,
        user_factors,
        movie_factors,
    })
}

/// Recompute every row of `target` with `fixed` held constant
fn solve_side(target: &mut [f64], fixed: &[f64], rows: &[Vec<usize>], params: &AlsParams) -> Result<()> {
    let k = params.factors;
    let gram = gramian(fixed, k);
    let weight = params.alpha - 1.0;

    target
        .par_chunks_mut(k)
        .zip(rows.par_iter())
        .try_for_each(|(x, positives)| {
            let mut a = gram.clone();
            for i in 0..k {
                a[i * k + i] += params.regularization;
            }
            let mut b = vec![0.0; k];

            for &p in positives {
                let y = &fixed[p * k..(p + 1) * k];
                for i in 0..k {
                    b[i] += params.alpha * y[i];
                    let wy = weight * y[i];
                    for j in 0..k {
                        a[i * k + j] += wy * y[j];
                    }
                }
            }

            let solution = cholesky_solve(&mut a, &b, k)?;
            x.copy_from_slice(&solution);
            Ok(())
        })
}

/// `FᵀF` for a row-major `n x k` factor matrix
fn gramian(factors: &[f64], k: usize) -> Vec<f64> {
    let mut gram = vec![0.0; k * k];
    for row in factors.chunks(k) {
        for i in 0..k {
            for j in i..k {
                gram[i * k + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            gram[i * k + j] = gram[j * k + i];
        }
    }
    gram
}

/// Solve `A x = b` for symmetric positive-definite `A` (overwritten with L)
fn cholesky_solve(a: &mut [f64], b: &[f64], k: usize) -> Result<Vec<f64>> {
    for j in 0..k {
        let mut diag = a[j * k + j];
        for p in 0..j {
            diag -= a[j * k + p] * a[j * k + p];
        }
        if !(diag > MIN_PIVOT) || !diag.is_finite() {
            return Err(RecommendError::Fit(format!(
                "system is not positive definite (pivot {} = {})",
                j, diag
            )));
        }
        let l_jj = diag.sqrt();
        a[j * k + j] = l_jj;

        for i in (j + 1)..k {
            let mut sum = a[i * k + j];
            for p in 0..j {
                sum -= a[i * k + p] * a[j * k + p];
            }
            a[i * k + j] = sum / l_jj;
        }
    }

    // Forward: L z = b
    let mut z = vec![0.0; k];
    for i in 0..k {
        let mut sum = b[i];
        for p in 0..i {
            sum -= a[i * k + p] * z[p];
        }
        z[i] = sum / a[i * k + i];
    }

    // Backward: Lᵀ x = z
    let mut x = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = z[i];
        for p in (i + 1)..k {
            sum -= a[p * k + i] * x[p];
        }
        x[i] = sum / a[i * k + i];
    }
    Ok(x)
}
