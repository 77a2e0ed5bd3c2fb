use crate::dynamics::{build, DynamicsMatrix, Stability};
use crate::params::SimulationParameters;
use nalgebra::{Vector2, Vector4};
use serde::Serialize;

/// Position sequence of length `T + 1`; index 0 is `p0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    time_step: f64,
    points: Vec<Vector2<f64>>,
}

impl Trajectory {
    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    /// Number of positions, always `T + 1`
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Elapsed time at step `index`
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.time_step
    }

    pub fn initial_position(&self) -> Vector2<f64> {
        self.points[0]
    }

    /// Position after `T` steps
    pub fn final_position(&self) -> Vector2<f64> {
        self.points[self.points.len() - 1]
    }

    /// Highest point as `(step index, position)`; the first one wins on ties
    pub fn apex(&self) -> (usize, Vector2<f64>) {
        self.points
            .iter()
            .enumerate()
            .fold((0, self.points[0]), |best, (i, p)| {
                if p.y > best.1.y {
                    (i, *p)
                } else {
                    best
                }
            })
    }

    /// Horizontal displacement from `p0` to the final position
    pub fn range(&self) -> f64 {
        self.final_position().x - self.initial_position().x
    }

    /// Plain `(x, y)` pairs for consumers that do not use nalgebra
    pub fn to_pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector2<f64>> {
        self.points.iter()
    }
}

/// Headline numbers for a trajectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub steps: usize,
    pub duration: f64,
    pub final_position: (f64, f64),
    pub max_height: f64,
    pub apex_step: usize,
    pub range: f64,
}

impl From<&Trajectory> for TrajectorySummary {
    fn from(trajectory: &Trajectory) -> Self {
        let (apex_step, apex) = trajectory.apex();
        let end = trajectory.final_position();
        let steps = trajectory.len() - 1;
        TrajectorySummary {
            steps,
            duration: trajectory.time_at(steps),
            final_position: (end.x, end.y),
            max_height: apex.y,
            apex_step,
            range: trajectory.range(),
        }
    }
}

fn warn_if_unstable(dynamics: &DynamicsMatrix, params: &SimulationParameters) {
    if dynamics.stability() == Stability::Unstable {
        tracing::warn!(
            drag_factor = dynamics.drag_factor(),
            steps = params.steps,
            "drag factor outside [-1, 1]; positions will diverge"
        );
    }
}

/// Full `[p; v]` state after each of `0..=T` steps
pub fn propagate_states(params: &SimulationParameters) -> Vec<Vector4<f64>> {
    let dynamics = build(params);
    warn_if_unstable(&dynamics, params);

    let mut states = Vec::with_capacity(params.steps + 1);
    let mut x = params.initial_state();
    states.push(x);
    for _ in 0..params.steps {
        x = dynamics.step(&x);
        states.push(x);
    }
    states
}

/// Iterate the recurrence `x_t = A·x_{t-1} + b` for `T` steps.
///
/// The result is returned as-is even when the drag factor makes it diverge.
pub fn simulate(params: &SimulationParameters) -> Trajectory {
    let dynamics = build(params);
    warn_if_unstable(&dynamics, params);

    let mut points = Vec::with_capacity(params.steps + 1);
    points.push(params.p0);

    let mut x = params.initial_state();
    for _ in 0..params.steps {
        x = dynamics.step(&x);
        points.push(Vector2::new(x[0], x[1]));
    }

    Trajectory {
        time_step: params.h,
        points,
    }
}
