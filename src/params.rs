use crate::constants::{
    DEFAULT_DRAG_COEFFICIENT, DEFAULT_LAUNCH_ANGLE_DEG, DEFAULT_LAUNCH_SPEED_MPS, DEFAULT_MASS_KG,
    DEFAULT_STEPS, DEFAULT_TIME_STEP_S, DEFAULT_WIND_MPS, G_ACCEL_MPS2,
};
use crate::error::{BallisticsError, Result};
use nalgebra::{Vector2, Vector4};
use serde::{Deserialize, Serialize};

/// Convert a launch speed and elevation (degrees from +x) into a velocity vector
pub fn polar_to_vector(speed: f64, angle_deg: f64) -> Vector2<f64> {
    let theta = angle_deg.to_radians();
    Vector2::new(speed * theta.cos(), speed * theta.sin())
}

/// Express a velocity vector as (speed, angle in degrees)
pub fn vector_to_polar(v: &Vector2<f64>) -> (f64, f64) {
    (v.norm(), v.y.atan2(v.x).to_degrees())
}

/// One trajectory request
///
/// Serializes as a flat record with the keys `p0, v0, w, eta, m, g, h, T, label`;
/// 2D quantities are two-element arrays. Decoding goes through
/// [`ParameterRecord`], which validates; the engine never coerces values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationParameters {
    /// Initial position (m)
    pub p0: Vector2<f64>,
    /// Initial velocity (m/s); ignored by the velocity solver
    pub v0: Vector2<f64>,
    /// Wind velocity (m/s)
    pub w: Vector2<f64>,
    /// Linear drag coefficient (kg/s), >= 0
    pub eta: f64,
    /// Mass (kg), > 0
    pub m: f64,
    /// Gravitational acceleration (m/s²)
    pub g: Vector2<f64>,
    /// Time step (s), > 0
    pub h: f64,
    /// Horizon in steps, >= 1
    #[serde(rename = "T")]
    pub steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            p0: Vector2::zeros(),
            v0: polar_to_vector(DEFAULT_LAUNCH_SPEED_MPS, DEFAULT_LAUNCH_ANGLE_DEG),
            w: Vector2::new(DEFAULT_WIND_MPS.0, DEFAULT_WIND_MPS.1),
            eta: DEFAULT_DRAG_COEFFICIENT,
            m: DEFAULT_MASS_KG,
            g: Vector2::new(0.0, -G_ACCEL_MPS2),
            h: DEFAULT_TIME_STEP_S,
            steps: DEFAULT_STEPS,
            label: None,
        }
    }
}

impl SimulationParameters {
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.p0 = Vector2::new(x, y);
        self
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.v0 = Vector2::new(vx, vy);
        self
    }

    /// Set `v0` from a launch speed and elevation in degrees
    pub fn with_launch(mut self, speed: f64, angle_deg: f64) -> Self {
        self.v0 = polar_to_vector(speed, angle_deg);
        self
    }

    pub fn with_wind(mut self, wx: f64, wy: f64) -> Self {
        self.w = Vector2::new(wx, wy);
        self
    }

    pub fn with_drag(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_mass(mut self, m: f64) -> Self {
        self.m = m;
        self
    }

    pub fn with_gravity(mut self, gx: f64, gy: f64) -> Self {
        self.g = Vector2::new(gx, gy);
        self
    }

    pub fn with_time_step(mut self, h: f64) -> Self {
        self.h = h;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Combined initial state `[p0; v0]`
    pub fn initial_state(&self) -> Vector4<f64> {
        Vector4::new(self.p0.x, self.p0.y, self.v0.x, self.v0.y)
    }

    /// Per-step velocity retention `1 - h·eta/m`
    pub fn drag_factor(&self) -> f64 {
        1.0 - self.h * self.eta / self.m
    }

    /// Total simulated time `h·T` (s)
    pub fn duration(&self) -> f64 {
        self.h * self.steps as f64
    }

    /// Check the record against its declared domain.
    ///
    /// Out-of-range values are reported, never adjusted.
    pub fn validate(&self) -> Result<()> {
        check_finite_vec("p0", &self.p0)?;
        check_finite_vec("v0", &self.v0)?;
        check_finite_vec("w", &self.w)?;
        check_finite_vec("g", &self.g)?;

        if !self.eta.is_finite() || self.eta < 0.0 {
            return Err(BallisticsError::invalid(
                "eta",
                format!("drag coefficient must be finite and >= 0, got {}", self.eta),
            ));
        }
        if !self.m.is_finite() || self.m <= 0.0 {
            return Err(BallisticsError::invalid(
                "m",
                format!("mass must be finite and > 0, got {}", self.m),
            ));
        }
        if !self.h.is_finite() || self.h <= 0.0 {
            return Err(BallisticsError::invalid(
                "h",
                format!("time step must be finite and > 0, got {}", self.h),
            ));
        }
        if self.steps < 1 {
            return Err(BallisticsError::invalid(
                "T",
                format!("step count must be >= 1, got {}", self.steps),
            ));
        }
        Ok(())
    }
}

fn check_finite_vec(field: &'static str, v: &Vector2<f64>) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(BallisticsError::invalid(
            field,
            format!("components must be finite, got ({}, {})", v.x, v.y),
        ))
    }
}

/// Flat input record as produced by a form or read from an export file
///
/// Every field is optional and `T` is a signed integer so that a missing key
/// or a negative horizon is reported as `InvalidParameter` naming the field,
/// rather than as an opaque decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub p0: Option<(f64, f64)>,
    pub v0: Option<(f64, f64)>,
    pub w: Option<(f64, f64)>,
    pub eta: Option<f64>,
    pub m: Option<f64>,
    pub g: Option<(f64, f64)>,
    pub h: Option<f64>,
    #[serde(rename = "T")]
    pub steps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or_else(|| BallisticsError::invalid(field, "required field is missing"))
}

impl TryFrom<ParameterRecord> for SimulationParameters {
    type Error = BallisticsError;

    fn try_from(record: ParameterRecord) -> Result<Self> {
        let p0 = required(record.p0, "p0")?;
        let v0 = required(record.v0, "v0")?;
        let w = required(record.w, "w")?;
        let g = required(record.g, "g")?;
        let raw_steps = required(record.steps, "T")?;
        let steps = usize::try_from(raw_steps).map_err(|_| {
            BallisticsError::invalid("T", format!("step count must be >= 1, got {raw_steps}"))
        })?;

        let params = SimulationParameters {
            p0: Vector2::new(p0.0, p0.1),
            v0: Vector2::new(v0.0, v0.1),
            w: Vector2::new(w.0, w.1),
            eta: required(record.eta, "eta")?,
            m: required(record.m, "m")?,
            g: Vector2::new(g.0, g.1),
            h: required(record.h, "h")?,
            steps,
            label: record.label,
        };
        params.validate()?;
        Ok(params)
    }
}

impl From<&SimulationParameters> for ParameterRecord {
    fn from(params: &SimulationParameters) -> Self {
        ParameterRecord {
            p0: Some((params.p0.x, params.p0.y)),
            v0: Some((params.v0.x, params.v0.y)),
            w: Some((params.w.x, params.w.y)),
            eta: Some(params.eta),
            m: Some(params.m),
            g: Some((params.g.x, params.g.y)),
            h: Some(params.h),
            steps: i64::try_from(params.steps).ok(),
            label: params.label.clone(),
        }
    }
}
