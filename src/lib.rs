//! # Ballistic Dynamics
//!
//! Point-mass projectile motion under constant gravity, linear drag and wind,
//! modelled as the discrete-time linear system `x_{t+1} = A·x_t + b` over the
//! state `[position; velocity]`.
//!
//! The crate propagates that system into trajectories and inverts it: given a
//! target point and a fixed horizon, [`solve`] returns the launch velocity
//! that lands on it.
//!
//! ```
//! use ballistic_dynamics::{simulate, solve, SimulationParameters};
//! use nalgebra::Vector2;
//!
//! let params = SimulationParameters::default()
//!     .with_wind(0.0, 0.0)
//!     .with_drag(0.0)
//!     .with_mass(1.0)
//!     .with_time_step(0.1)
//!     .with_steps(10);
//!
//! let target = Vector2::new(5.0, 5.0);
//! let v0 = solve(&params, &target)?;
//!
//! let trajectory = simulate(&params.with_velocity(v0.x, v0.y));
//! assert_eq!(trajectory.len(), 11);
//! assert!((trajectory.final_position() - target).norm() < 1e-6);
//! # Ok::<(), ballistic_dynamics::BallisticsError>(())
//! ```

// Re-export the main types and functions
pub use dispersion::{run_dispersion, DispersionParams, DispersionResults};
pub use dynamics::{build, DynamicsMatrix, Stability};
pub use error::{BallisticsError, Result};
pub use params::{polar_to_vector, vector_to_polar, ParameterRecord, SimulationParameters};
pub use power_series::{accumulate, forcing_sum, matrix_power, PowerSeries};
pub use propagator::{propagate_states, simulate, Trajectory, TrajectorySummary};
pub use registry::{SharedRegistry, SimulationRegistry};
pub use solver::{aim, solve, solve_launch, LaunchSolution};

// Module declarations
pub mod constants;
mod dispersion;
mod dynamics;
mod error;
mod params;
mod power_series;
mod propagator;
mod registry;
mod solver;
