//! State-space form of the linear-drag point-mass model.
//!
//! Over the state `x = [p; v]` one step of size `h` is
//!
//! ```text
//! p' = p + h·v
//! v' = (1 - h·eta/m)·v + h·(g + (eta/m)·w)
//! ```
//!
//! i.e. `x' = A·x + b` with
//!
//! ```text
//! A = [[ I,  h·I ],          b = [ 0,
//!      [ 0,  d·I ]]                h·(g + (eta/m)·w) ]
//! ```
//!
//! where `d = 1 - h·eta/m` is the drag factor.

use crate::constants::MARGINAL_STABILITY_TOLERANCE;
use crate::params::SimulationParameters;
use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};

/// Classification of the velocity sub-system by its drag factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// `|d| < 1`: velocity relaxes toward terminal velocity
    Stable,
    /// `|d| == 1`: no decay (drag-free, or the `d = -1` flip)
    Marginal,
    /// `|d| > 1`: velocity oscillates with growing amplitude
    Unstable,
}

impl Stability {
    pub fn from_drag_factor(d: f64) -> Self {
        let magnitude = d.abs();
        if (magnitude - 1.0).abs() <= MARGINAL_STABILITY_TOLERANCE {
            Stability::Marginal
        } else if magnitude < 1.0 {
            Stability::Stable
        } else {
            Stability::Unstable
        }
    }
}

/// One-step transition `(A, b)` derived from a parameter record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsMatrix {
    pub a: Matrix4<f64>,
    pub b: Vector4<f64>,
}

impl DynamicsMatrix {
    /// Advance a state by one step
    #[inline]
    pub fn step(&self, x: &Vector4<f64>) -> Vector4<f64> {
        self.a * x + self.b
    }

    /// Velocity retention factor, read back from the lower-right block
    pub fn drag_factor(&self) -> f64 {
        self.a[(2, 2)]
    }

    pub fn stability(&self) -> Stability {
        Stability::from_drag_factor(self.drag_factor())
    }
}

/// Derive `(A, b)` in closed form.
///
/// `m > 0` and `h > 0` are preconditions; the record is not re-validated here.
pub fn build(params: &SimulationParameters) -> DynamicsMatrix {
    let h = params.h;
    let drag_per_mass = params.eta / params.m;
    let drag_factor = 1.0 - h * drag_per_mass;

    let identity = Matrix2::<f64>::identity();
    let mut a = Matrix4::<f64>::identity();
    a.fixed_view_mut::<2, 2>(0, 2).copy_from(&(identity * h));
    a.fixed_view_mut::<2, 2>(2, 2).copy_from(&(identity * drag_factor));

    let forcing: Vector2<f64> = (params.g + params.w * drag_per_mass) * h;
    let b = Vector4::new(0.0, 0.0, forcing.x, forcing.y);

    tracing::debug!(
        drag_factor,
        forcing_x = forcing.x,
        forcing_y = forcing.y,
        "built state-space dynamics"
    );

    DynamicsMatrix { a, b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_params() -> SimulationParameters {
        SimulationParameters::default()
            .with_wind(-10.0, 2.0)
            .with_drag(0.05)
            .with_mass(5.0)
            .with_time_step(0.1)
    }

    #[test]
    fn test_block_structure() {
        let dynamics = build(&test_params());
        let a = dynamics.a;

        // Upper-left identity, lower-left zero
        assert_eq!(a.fixed_view::<2, 2>(0, 0).into_owned(), Matrix2::identity());
        assert_eq!(a.fixed_view::<2, 2>(2, 0).into_owned(), Matrix2::zeros());

        // Upper-right h·I
        assert_relative_eq!(a[(0, 2)], 0.1);
        assert_relative_eq!(a[(1, 3)], 0.1);
        assert_eq!(a[(0, 3)], 0.0);
        assert_eq!(a[(1, 2)], 0.0);

        // Lower-right d·I
        assert_relative_eq!(a[(2, 2)], 0.999, epsilon = 1e-15);
        assert_relative_eq!(a[(3, 3)], 0.999, epsilon = 1e-15);
        assert_eq!(a[(2, 3)], 0.0);
        assert_eq!(a[(3, 2)], 0.0);
    }

    #[test]
    fn test_forcing_vector() {
        let dynamics = build(&test_params());
        // h·(g + (eta/m)·w) = 0.1·((0, -9.8) + 0.01·(-10, 2))
        assert_eq!(dynamics.b[0], 0.0);
        assert_eq!(dynamics.b[1], 0.0);
        assert_relative_eq!(dynamics.b[2], -0.01, epsilon = 1e-15);
        assert_relative_eq!(dynamics.b[3], -0.978, epsilon = 1e-15);
    }

    #[test]
    fn test_no_drag_ignores_wind() {
        let params = test_params().with_drag(0.0).with_wind(100.0, -50.0);
        let dynamics = build(&params);
        assert_eq!(dynamics.drag_factor(), 1.0);
        assert_eq!(dynamics.b[2], 0.0);
        assert_relative_eq!(dynamics.b[3], -0.98, epsilon = 1e-15);
        assert_eq!(dynamics.stability(), Stability::Marginal);
    }

    #[test]
    fn test_step_matches_hand_update() {
        let params = test_params();
        let dynamics = build(&params);
        let x = Vector4::new(1.0, 2.0, 30.0, 40.0);
        let next = dynamics.step(&x);

        assert_relative_eq!(next[0], 1.0 + 0.1 * 30.0, epsilon = 1e-12);
        assert_relative_eq!(next[1], 2.0 + 0.1 * 40.0, epsilon = 1e-12);
        assert_relative_eq!(next[2], 0.999 * 30.0 - 0.01, epsilon = 1e-12);
        assert_relative_eq!(next[3], 0.999 * 40.0 - 0.978, epsilon = 1e-12);
    }

    #[test]
    fn test_unstable_drag_factor_is_not_clamped() {
        let params = test_params().with_drag(30.0).with_mass(1.0);
        let dynamics = build(&params);
        assert_relative_eq!(dynamics.drag_factor(), -2.0, epsilon = 1e-12);
        assert_eq!(dynamics.stability(), Stability::Unstable);
    }

    #[test]
    fn test_stability_classification() {
        assert_eq!(Stability::from_drag_factor(0.5), Stability::Stable);
        assert_eq!(Stability::from_drag_factor(-0.5), Stability::Stable);
        assert_eq!(Stability::from_drag_factor(1.0), Stability::Marginal);
        assert_eq!(Stability::from_drag_factor(-1.0), Stability::Marginal);
        assert_eq!(Stability::from_drag_factor(1.5), Stability::Unstable);
        assert_eq!(Stability::from_drag_factor(-1.01), Stability::Unstable);
    }
}
