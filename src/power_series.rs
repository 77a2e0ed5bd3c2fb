//! Closed-form T-step transition.
//!
//! Unrolling `x_{t+1} = A·x_t + b` gives
//!
//! ```text
//! x_T = A^T·x_0 + Σ_{k=0}^{T-1} A^k·b = F·x_0 + j
//! ```
//!
//! `F` is computed by exponentiation by squaring. `j` is accumulated term by
//! term, advancing the running term `A^k·b` with one matrix-vector product
//! per step.

use crate::dynamics::DynamicsMatrix;
use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};

/// Integer power of a 4x4 matrix by repeated squaring, `O(log n)` products.
///
/// `matrix_power(a, 0)` is the identity.
pub fn matrix_power(a: &Matrix4<f64>, n: usize) -> Matrix4<f64> {
    let mut result = Matrix4::identity();
    let mut base = *a;
    let mut exp = n;

    while exp > 0 {
        if exp & 1 == 1 {
            result *= base;
        }
        exp >>= 1;
        if exp > 0 {
            base = base * base;
        }
    }

    result
}

/// `Σ_{k=0}^{n-1} A^k·b`
pub fn forcing_sum(a: &Matrix4<f64>, b: &Vector4<f64>, n: usize) -> Vector4<f64> {
    let mut sum = Vector4::zeros();
    let mut term = *b;
    for _ in 0..n {
        sum += term;
        term = a * term;
    }
    sum
}

/// `F = A^T` and `j = Σ A^k·b` for a fixed horizon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSeries {
    pub horizon: usize,
    pub f: Matrix4<f64>,
    pub j: Vector4<f64>,
}

impl PowerSeries {
    /// State after `horizon` steps from `x0`
    pub fn closed_form_state(&self, x0: &Vector4<f64>) -> Vector4<f64> {
        self.f * x0 + self.j
    }

    /// `F[0..2, 2..4]`: final position per unit initial velocity
    pub fn sensitivity(&self) -> Matrix2<f64> {
        self.f.fixed_view::<2, 2>(0, 2).into_owned()
    }

    /// Final position with zero initial velocity: `F[0..2, 0..2]·p0 + j[0..2]`
    pub fn free_response(&self, p0: &Vector2<f64>) -> Vector2<f64> {
        self.f.fixed_view::<2, 2>(0, 0) * p0 + self.j.fixed_rows::<2>(0)
    }
}

/// Compute `(F, j)` for `horizon` steps of `dynamics`
pub fn accumulate(dynamics: &DynamicsMatrix, horizon: usize) -> PowerSeries {
    PowerSeries {
        horizon,
        f: matrix_power(&dynamics.a, horizon),
        j: forcing_sum(&dynamics.a, &dynamics.b, horizon),
    }
}
