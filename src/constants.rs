//! Physical and numerical constants used by the dynamics engine

/// Gravitational acceleration in m/s²
///
/// Gravity is a full 2D vector on the record; this only seeds the default
/// record and the CLI.
pub const G_ACCEL_MPS2: f64 = 9.8;

// Default simulation record (drag factor 1 - 0.1*0.05/5 = 0.999)

/// Default launch speed (m/s)
pub const DEFAULT_LAUNCH_SPEED_MPS: f64 = 50.0;

/// Default launch elevation (degrees above the +x axis)
pub const DEFAULT_LAUNCH_ANGLE_DEG: f64 = 45.0;

/// Default wind (m/s), a 10 m/s headwind along -x
pub const DEFAULT_WIND_MPS: (f64, f64) = (-10.0, 0.0);

/// Default linear drag coefficient (kg/s)
pub const DEFAULT_DRAG_COEFFICIENT: f64 = 0.05;

/// Default projectile mass (kg)
pub const DEFAULT_MASS_KG: f64 = 5.0;

/// Default integration step (s)
pub const DEFAULT_TIME_STEP_S: f64 = 0.1;

/// Default horizon (number of steps)
pub const DEFAULT_STEPS: usize = 100;

// Numerical stability constants

/// Conditioning threshold for the 2x2 sensitivity block
///
/// The solver rejects `C` when `|det C| < SINGULARITY_TOLERANCE · (h·T)²`,
/// i.e. when `C` has collapsed relative to the drag-free sensitivity `h·T·I`.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Tolerance for classifying a drag factor as exactly on the unit circle
pub const MARGINAL_STABILITY_TOLERANCE: f64 = 1e-12;

/// Circular error probable scale factor for a circular normal distribution
///
/// CEP = sqrt(2 ln 2) * sigma ≈ 1.1774 * sigma
pub const CEP_SIGMA_FACTOR: f64 = 1.1774;
