//! Monte Carlo dispersion of the impact point at the horizon.
//!
//! Launch speed, launch elevation and both wind components are perturbed
//! with independent normal noise around the nominal record; every sample is
//! propagated with the same linear model and the spread of the final
//! positions is summarised.

use crate::constants::CEP_SIGMA_FACTOR;
use crate::error::{BallisticsError, Result};
use crate::params::{polar_to_vector, vector_to_polar, SimulationParameters};
use crate::propagator::simulate;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::Serialize;

/// Monte Carlo settings
#[derive(Debug, Clone)]
pub struct DispersionParams {
    pub num_simulations: usize,
    /// Launch speed standard deviation (m/s)
    pub speed_std_dev: f64,
    /// Launch elevation standard deviation (degrees)
    pub angle_std_dev_deg: f64,
    /// Per-component wind standard deviation (m/s)
    pub wind_std_dev: f64,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for DispersionParams {
    fn default() -> Self {
        Self {
            num_simulations: 1000,
            speed_std_dev: 1.0,
            angle_std_dev_deg: 0.5,
            wind_std_dev: 1.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispersionResults {
    pub num_simulations: usize,
    /// Final position of the unperturbed record
    pub nominal_impact: Vector2<f64>,
    pub mean_impact: Vector2<f64>,
    /// Sample standard deviation of the impact point per axis
    pub std_dev: Vector2<f64>,
    /// Circular error probable around the mean impact
    pub cep: f64,
    pub impacts: Vec<Vector2<f64>>,
}

fn normal(field: &'static str, mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| {
        BallisticsError::invalid(field, format!("invalid distribution (std dev {std_dev}): {e}"))
    })
}

fn impact_statistics(impacts: &[Vector2<f64>]) -> (Vector2<f64>, Vector2<f64>) {
    let n = impacts.len() as f64;
    let mean = impacts.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n;

    if impacts.len() < 2 {
        return (mean, Vector2::zeros());
    }

    let sum_sq = impacts.iter().fold(Vector2::<f64>::zeros(), |acc, p| {
        let dev = p - mean;
        acc + dev.component_mul(&dev)
    });
    let variance = sum_sq / (n - 1.0);
    (mean, variance.map(f64::sqrt))
}

/// Perturb `params` `num_simulations` times and summarise the impact spread
pub fn run_dispersion(
    params: &SimulationParameters,
    dispersion: &DispersionParams,
) -> Result<DispersionResults> {
    if dispersion.num_simulations == 0 {
        return Err(BallisticsError::invalid(
            "num_simulations",
            "at least one simulation is required",
        ));
    }

    let (speed, angle_deg) = vector_to_polar(&params.v0);
    let speed_dist = normal("speed_std_dev", speed, dispersion.speed_std_dev)?;
    let angle_dist = normal("angle_std_dev_deg", angle_deg, dispersion.angle_std_dev_deg)?;
    let wind_x_dist = normal("wind_std_dev", params.w.x, dispersion.wind_std_dev)?;
    let wind_y_dist = normal("wind_std_dev", params.w.y, dispersion.wind_std_dev)?;

    let mut rng = match dispersion.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Draw sequentially so a seed fixes the samples regardless of thread count
    let samples: Vec<SimulationParameters> = (0..dispersion.num_simulations)
        .map(|_| {
            let mut sample = params.clone();
            let speed = speed_dist.sample(&mut rng);
            let angle_deg = angle_dist.sample(&mut rng);
            sample.v0 = polar_to_vector(speed, angle_deg);
            sample.w = Vector2::new(wind_x_dist.sample(&mut rng), wind_y_dist.sample(&mut rng));
            sample
        })
        .collect();

    let impacts: Vec<Vector2<f64>> = samples
        .par_iter()
        .map(|sample| simulate(sample).final_position())
        .collect();

    let (mean_impact, std_dev) = impact_statistics(&impacts);
    let cep = CEP_SIGMA_FACTOR * ((std_dev.x.powi(2) + std_dev.y.powi(2)) / 2.0).sqrt();

    tracing::info!(
        runs = impacts.len(),
        mean_x = mean_impact.x,
        mean_y = mean_impact.y,
        cep,
        "dispersion analysis complete"
    );

    Ok(DispersionResults {
        num_simulations: impacts.len(),
        nominal_impact: simulate(params).final_position(),
        mean_impact,
        std_dev,
        cep,
        impacts,
    })
}
