//! Launch-velocity inversion.
//!
//! Splitting `x_T = F·x_0 + j` into position/velocity blocks, the final
//! position is
//!
//! ```text
//! p_T = F11·p0 + F12·v0 + j[0..2] = d + C·v0
//! ```
//!
//! so the `v0` that lands on `target` solves the 2x2 system `C·v0 = target - d`.

use crate::constants::SINGULARITY_TOLERANCE;
use crate::dynamics::build;
use crate::error::{BallisticsError, Result};
use crate::params::{vector_to_polar, SimulationParameters};
use crate::power_series::accumulate;
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

/// Solved launch velocity in Cartesian and polar form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaunchSolution {
    pub velocity: Vector2<f64>,
    /// `‖v0‖` (m/s)
    pub speed: f64,
    /// `atan2(vy, vx)` in degrees
    pub angle_deg: f64,
}

impl From<Vector2<f64>> for LaunchSolution {
    fn from(velocity: Vector2<f64>) -> Self {
        let (speed, angle_deg) = vector_to_polar(&velocity);
        LaunchSolution {
            velocity,
            speed,
            angle_deg,
        }
    }
}

fn check_conditioning(c: &Matrix2<f64>, reference: f64, horizon: usize) -> Result<f64> {
    let determinant = c.determinant();

    tracing::debug!(determinant, reference, horizon, "sensitivity block conditioning");

    if !determinant.is_finite()
        || c.amax() == 0.0
        || determinant.abs() < SINGULARITY_TOLERANCE * reference * reference
    {
        return Err(BallisticsError::TargetUnreachable {
            determinant,
            horizon,
        });
    }
    Ok(determinant)
}

/// Initial velocity that puts the position at `target` after exactly `T` steps.
///
/// `params.v0` is ignored. Fails with `TargetUnreachable` when the
/// velocity-to-position block of `A^T` is singular or ill-conditioned.
pub fn solve(params: &SimulationParameters, target: &Vector2<f64>) -> Result<Vector2<f64>> {
    let horizon = params.steps;
    let series = accumulate(&build(params), horizon);

    // Drag-free sensitivity h·T sets the scale C is measured against
    let c = series.sensitivity();
    let determinant = check_conditioning(&c, params.h * horizon as f64, horizon)?;
    let inverse = c
        .try_inverse()
        .ok_or(BallisticsError::TargetUnreachable {
            determinant,
            horizon,
        })?;

    let d = series.free_response(&params.p0);
    let v0 = inverse * (target - d);

    if !v0.iter().all(|component| component.is_finite()) {
        return Err(BallisticsError::TargetUnreachable {
            determinant,
            horizon,
        });
    }

    tracing::debug!(vx = v0.x, vy = v0.y, horizon, "solved launch velocity");
    Ok(v0)
}

/// [`solve`], also expressed as speed and elevation
pub fn solve_launch(
    params: &SimulationParameters,
    target: &Vector2<f64>,
) -> Result<LaunchSolution> {
    solve(params, target).map(LaunchSolution::from)
}

/// Copy of `params` re-aimed at `target`, labelled with its launch velocity.
///
/// This is the record a caller keeps after solving, e.g. to add it to a
/// [`SimulationRegistry`](crate::registry::SimulationRegistry).
pub fn aim(params: &SimulationParameters, target: &Vector2<f64>) -> Result<SimulationParameters> {
    let v0 = solve(params, target)?;
    let mut aimed = params.clone();
    aimed.v0 = v0;
    aimed.label = Some(format!("v0=({:.1}, {:.1})", v0.x, v0.y));
    Ok(aimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagator::simulate;
    use approx::assert_abs_diff_eq;

    fn reference_params() -> SimulationParameters {
        SimulationParameters::default()
            .with_position(0.0, 0.0)
            .with_wind(0.0, 0.0)
            .with_drag(0.0)
            .with_mass(1.0)
            .with_gravity(0.0, -9.8)
            .with_time_step(0.1)
            .with_steps(10)
    }

    #[test]
    fn test_reference_scenario_hits_target() {
        let params = reference_params();
        let target = Vector2::new(5.0, 5.0);
        let v0 = solve(&params, &target).unwrap();

        // No drag: 5 = 1.0·vx and 5 = 1.0·vy - 0.01·45·9.8
        assert_abs_diff_eq!(v0.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v0.y, 5.0 + 4.41, epsilon = 1e-9);

        let end = simulate(&params.with_velocity(v0.x, v0.y)).final_position();
        assert_abs_diff_eq!(end.x, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(end.y, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_with_drag_and_wind() {
        let params = SimulationParameters::default()
            .with_position(-3.0, 1.0)
            .with_wind(-10.0, 0.0)
            .with_drag(0.05)
            .with_mass(5.0)
            .with_steps(100);

        for target in [
            Vector2::new(120.0, 0.0),
            Vector2::new(-40.0, 25.0),
            Vector2::new(0.0, -300.0),
        ] {
            let v0 = solve(&params, &target).unwrap();
            let end = simulate(&params.clone().with_velocity(v0.x, v0.y)).final_position();
            assert_abs_diff_eq!(end.x, target.x, epsilon = 1e-6);
            assert_abs_diff_eq!(end.y, target.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_existing_velocity_is_ignored() {
        let target = Vector2::new(8.0, 2.0);
        let a = solve(&reference_params(), &target).unwrap();
        let b = solve(&reference_params().with_velocity(1e3, -1e3), &target).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collapsed_sensitivity_is_unreachable() {
        // h·eta/m = 2 gives d = -1; over an even horizon Σ d^k = 0, so C = 0
        let params = reference_params()
            .with_drag(4.0)
            .with_mass(1.0)
            .with_time_step(0.5)
            .with_steps(2);

        match solve(&params, &Vector2::new(1.0, 1.0)) {
            Err(BallisticsError::TargetUnreachable { determinant, horizon }) => {
                assert_eq!(determinant, 0.0);
                assert_eq!(horizon, 2);
            }
            other => panic!("expected TargetUnreachable, got {other:?}"),
        }

        // Same parameters, odd horizon: C = h·I is fine
        assert!(solve(&params.with_steps(3), &Vector2::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn test_near_collapsed_sensitivity_is_unreachable() {
        // d = -1 + 1e-14: C = h·(1 + d) is nonzero but vanishing against h·T
        let params = reference_params()
            .with_drag((2.0 - 1e-14) / 0.5)
            .with_mass(1.0)
            .with_time_step(0.5)
            .with_steps(2);
        assert_abs_diff_eq!(params.drag_factor(), -1.0 + 1e-14, epsilon = 1e-15);

        let err = solve(&params, &Vector2::new(10.0, 0.0)).unwrap_err();
        match err {
            BallisticsError::TargetUnreachable { determinant, horizon } => {
                assert!(determinant != 0.0);
                assert_eq!(horizon, 2);
            }
            other => panic!("expected TargetUnreachable, got {other:?}"),
        }
    }

    #[test]
    fn test_heavy_drag_long_horizon_is_solvable() {
        // d = 0: C = h·I for every T, far above tolerance against h·T
        let params = reference_params()
            .with_drag(10.0)
            .with_mass(1.0)
            .with_time_step(0.1)
            .with_steps(500);
        assert_eq!(params.drag_factor(), 0.0);

        let target = Vector2::new(30.0, -20.0);
        let v0 = solve(&params, &target).unwrap();
        let end = simulate(&params.with_velocity(v0.x, v0.y)).final_position();
        assert_abs_diff_eq!(end.x, target.x, epsilon = 1e-6);
        assert_abs_diff_eq!(end.y, target.y, epsilon = 1e-6);
    }

    #[test]
    fn test_overflowing_dynamics_is_unreachable() {
        // d = -999: A^T overflows long before 200 steps
        let params = reference_params()
            .with_drag(10_000.0)
            .with_mass(1.0)
            .with_time_step(0.1)
            .with_steps(200);
        let err = solve(&params, &Vector2::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, BallisticsError::TargetUnreachable { .. }));
    }

    #[test]
    fn test_solve_launch_polar_form() {
        let solution = solve_launch(&reference_params(), &Vector2::new(5.0, 5.0)).unwrap();
        let expected_speed = (25.0_f64 + 9.41 * 9.41).sqrt();
        assert_abs_diff_eq!(solution.speed, expected_speed, epsilon = 1e-9);
        assert_abs_diff_eq!(
            solution.angle_deg,
            9.41_f64.atan2(5.0).to_degrees(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_aim_sets_velocity_and_label() {
        let aimed = aim(&reference_params(), &Vector2::new(5.0, 5.0)).unwrap();
        assert_abs_diff_eq!(aimed.v0.x, 5.0, epsilon = 1e-9);
        assert_eq!(aimed.label.as_deref(), Some("v0=(5.0, 9.4)"));
        assert_eq!(aimed.steps, 10);
    }
}
