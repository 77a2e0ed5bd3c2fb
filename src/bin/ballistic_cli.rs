use ballistic_dynamics::constants::{
    DEFAULT_DRAG_COEFFICIENT, DEFAULT_LAUNCH_ANGLE_DEG, DEFAULT_LAUNCH_SPEED_MPS, DEFAULT_MASS_KG,
    DEFAULT_STEPS, DEFAULT_TIME_STEP_S, DEFAULT_WIND_MPS, G_ACCEL_MPS2,
};
use ballistic_dynamics::{
    aim, run_dispersion, simulate, DispersionParams, DispersionResults, LaunchSolution,
    SimulationParameters, SimulationRegistry, Stability, Trajectory, TrajectorySummary,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nalgebra::Vector2;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ballistic-cli")]
#[command(version)]
#[command(about = "Linear-drag projectile simulator and launch velocity solver", long_about = None)]
struct Cli {
    /// Emit debug-level diagnostics on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propagate a single trajectory
    Simulate {
        #[command(flatten)]
        params: ParamArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// Show every trajectory point in table output
        #[arg(long)]
        full: bool,
    },

    /// Solve for the launch velocity that hits a target after T steps
    Solve {
        #[command(flatten)]
        params: ParamArgs,

        /// Target x (m)
        #[arg(long, allow_negative_numbers = true)]
        target_x: f64,

        /// Target y (m)
        #[arg(long, allow_negative_numbers = true)]
        target_y: f64,

        /// Append the aimed record to this registry file (created if missing)
        #[arg(long)]
        append: Option<PathBuf>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Re-simulate every record in a registry file
    Batch {
        /// Registry file (JSON array of parameter records)
        file: PathBuf,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Run a Monte Carlo dispersion analysis
    Dispersion {
        #[command(flatten)]
        params: ParamArgs,

        /// Number of simulations
        #[arg(short = 'n', long, default_value = "1000")]
        num_sims: usize,

        /// Launch speed standard deviation (m/s)
        #[arg(long, default_value = "1.0")]
        speed_std: f64,

        /// Launch angle standard deviation (degrees)
        #[arg(long, default_value = "0.5")]
        angle_std: f64,

        /// Wind standard deviation per component (m/s)
        #[arg(long, default_value = "1.0")]
        wind_std: f64,

        /// Random seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short = 'o', long, default_value = "summary")]
        output: DispersionOutput,
    },

    /// Display engine information
    Info,
}

#[derive(Args, Debug, Clone)]
struct ParamArgs {
    /// Initial x position (m)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    p0_x: f64,

    /// Initial y position (m)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    p0_y: f64,

    /// Launch speed (m/s)
    #[arg(short = 'v', long, default_value_t = DEFAULT_LAUNCH_SPEED_MPS)]
    speed: f64,

    /// Launch angle above the +x axis (degrees)
    #[arg(
        short = 'a',
        long,
        default_value_t = DEFAULT_LAUNCH_ANGLE_DEG,
        allow_negative_numbers = true
    )]
    angle: f64,

    /// Wind x component (m/s)
    #[arg(long, default_value_t = DEFAULT_WIND_MPS.0, allow_negative_numbers = true)]
    wind_x: f64,

    /// Wind y component (m/s)
    #[arg(long, default_value_t = DEFAULT_WIND_MPS.1, allow_negative_numbers = true)]
    wind_y: f64,

    /// Linear drag coefficient (kg/s)
    #[arg(long, default_value_t = DEFAULT_DRAG_COEFFICIENT, allow_negative_numbers = true)]
    eta: f64,

    /// Mass (kg)
    #[arg(short = 'm', long, default_value_t = DEFAULT_MASS_KG, allow_negative_numbers = true)]
    mass: f64,

    /// Downward gravitational acceleration (m/s²)
    #[arg(short = 'g', long, default_value_t = G_ACCEL_MPS2, allow_negative_numbers = true)]
    gravity: f64,

    /// Horizontal gravitational acceleration (m/s²)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    gravity_x: f64,

    /// Time step (s)
    #[arg(long, default_value_t = DEFAULT_TIME_STEP_S, allow_negative_numbers = true)]
    time_step: f64,

    /// Number of steps (horizon T)
    #[arg(short = 't', long, default_value_t = DEFAULT_STEPS)]
    steps: usize,

    /// Display label
    #[arg(long)]
    label: Option<String>,
}

impl ParamArgs {
    fn into_params(self) -> SimulationParameters {
        let mut params = SimulationParameters::default()
            .with_position(self.p0_x, self.p0_y)
            .with_launch(self.speed, self.angle)
            .with_wind(self.wind_x, self.wind_y)
            .with_drag(self.eta)
            .with_mass(self.mass)
            .with_gravity(self.gravity_x, -self.gravity)
            .with_time_step(self.time_step)
            .with_steps(self.steps);
        params.label = self.label;
        params
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DispersionOutput {
    Summary,
    Full,
    Statistics,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    parameters: &'a SimulationParameters,
    drag_factor: f64,
    summary: TrajectorySummary,
    trajectory: Vec<(f64, f64)>,
}

#[derive(Serialize)]
struct SolveReport<'a> {
    target: (f64, f64),
    solution: LaunchSolution,
    parameters: &'a SimulationParameters,
    final_position: (f64, f64),
}

#[derive(Serialize)]
struct BatchEntry {
    index: usize,
    label: String,
    summary: TrajectorySummary,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Simulate { params, output, full } => {
            let params = params.into_params();
            params.validate()?;

            let trajectory = simulate(&params);
            display_trajectory(&params, &trajectory, output, full)?;
        }

        Commands::Solve {
            params,
            target_x,
            target_y,
            append,
            output,
        } => {
            let params = params.into_params();
            params.validate()?;

            let target = Vector2::new(target_x, target_y);
            let aimed = aim(&params, &target)?;
            let solution = LaunchSolution::from(aimed.v0);
            let end = simulate(&aimed).final_position();

            display_solution(&aimed, &target, &solution, &end, output)?;

            if let Some(path) = append {
                append_to_registry(&path, aimed)?;
            }
        }

        Commands::Batch { file, output } => {
            let registry = SimulationRegistry::load(&file)?;
            display_batch(&registry, output)?;
        }

        Commands::Dispersion {
            params,
            num_sims,
            speed_std,
            angle_std,
            wind_std,
            seed,
            output,
        } => {
            let params = params.into_params();
            params.validate()?;

            let dispersion = DispersionParams {
                num_simulations: num_sims,
                speed_std_dev: speed_std,
                angle_std_dev_deg: angle_std,
                wind_std_dev: wind_std,
                seed,
            };
            let results = run_dispersion(&params, &dispersion)?;
            display_dispersion(&results, output)?;
        }

        Commands::Info => {
            println!("╔════════════════════════════════════════╗");
            println!("║      BALLISTIC DYNAMICS ENGINE         ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Linear-drag point-mass projectile      ║");
            println!("║ model in discrete state-space form.    ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Features:                              ║");
            println!("║ • Trajectory propagation               ║");
            println!("║ • Closed-form T-step transition        ║");
            println!("║ • Launch velocity inversion            ║");
            println!("║ • Registry batch re-simulation         ║");
            println!("║ • Monte Carlo dispersion               ║");
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn append_to_registry(path: &Path, params: SimulationParameters) -> Result<(), Box<dyn Error>> {
    let mut registry = if path.exists() {
        SimulationRegistry::load(path)?
    } else {
        SimulationRegistry::new()
    };
    registry.add(params);
    registry.save(path)?;
    Ok(())
}

fn stability_note(params: &SimulationParameters) -> &'static str {
    match Stability::from_drag_factor(params.drag_factor()) {
        Stability::Stable => "stable",
        Stability::Marginal => "marginal",
        Stability::Unstable => "UNSTABLE",
    }
}

fn display_trajectory(
    params: &SimulationParameters,
    trajectory: &Trajectory,
    format: OutputFormat,
    full: bool,
) -> Result<(), Box<dyn Error>> {
    let summary = TrajectorySummary::from(trajectory);

    match format {
        OutputFormat::Json => {
            let report = SimulationReport {
                parameters: params,
                drag_factor: params.drag_factor(),
                summary,
                trajectory: trajectory.to_pairs(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        OutputFormat::Csv => {
            println!("step,time,x,y");
            for (i, p) in trajectory.iter().enumerate() {
                println!("{},{:.4},{:.6},{:.6}", i, trajectory.time_at(i), p.x, p.y);
            }
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║         TRAJECTORY RESULTS             ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Steps:             {:>8}            ║", summary.steps);
            println!("║ Duration:          {:>8.3} s          ║", summary.duration);
            println!("║ Final X:           {:>8.2} m          ║", summary.final_position.0);
            println!("║ Final Y:           {:>8.2} m          ║", summary.final_position.1);
            println!("║ Max Height:        {:>8.2} m          ║", summary.max_height);
            println!("║ Range:             {:>8.2} m          ║", summary.range);
            println!(
                "║ Drag Factor:       {:>8.5} ({:<8})║",
                params.drag_factor(),
                stability_note(params)
            );
            println!("╚════════════════════════════════════════╝");

            let step = if full { 1 } else { (trajectory.len() / 10).max(1) };
            println!();
            println!("┌──────┬──────────┬──────────┬──────────┐");
            println!("│ Step │ Time (s) │  X (m)   │  Y (m)   │");
            println!("├──────┼──────────┼──────────┼──────────┤");
            let last = trajectory.len() - 1;
            for (i, p) in trajectory.iter().enumerate() {
                if i % step == 0 || i == last {
                    println!(
                        "│ {:>4} │ {:>8.3} │ {:>8.2} │ {:>8.2} │",
                        i,
                        trajectory.time_at(i),
                        p.x,
                        p.y
                    );
                }
            }
            println!("└──────┴──────────┴──────────┴──────────┘");
        }
    }

    Ok(())
}

fn display_solution(
    params: &SimulationParameters,
    target: &Vector2<f64>,
    solution: &LaunchSolution,
    end: &Vector2<f64>,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            let report = SolveReport {
                target: (target.x, target.y),
                solution: *solution,
                parameters: params,
                final_position: (end.x, end.y),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        OutputFormat::Csv => {
            println!("vx,vy,speed,angle_deg,final_x,final_y");
            println!(
                "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
                solution.velocity.x,
                solution.velocity.y,
                solution.speed,
                solution.angle_deg,
                end.x,
                end.y
            );
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║        OPTIMAL LAUNCH VELOCITY         ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Target:      ({:>9.2}, {:>9.2}) m   ║", target.x, target.y);
            println!("║ Horizon:     {:>8} steps            ║", params.steps);
            println!("╠════════════════════════════════════════╣");
            println!("║ Vx:                {:>10.3} m/s      ║", solution.velocity.x);
            println!("║ Vy:                {:>10.3} m/s      ║", solution.velocity.y);
            println!("║ Speed:             {:>10.3} m/s      ║", solution.speed);
            println!("║ Angle:             {:>10.3} deg      ║", solution.angle_deg);
            println!("╠════════════════════════════════════════╣");
            println!("║ Check:       ({:>9.4}, {:>9.4}) m   ║", end.x, end.y);
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn display_batch(
    registry: &SimulationRegistry,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let entries: Vec<BatchEntry> = registry
        .simulate_all()
        .iter()
        .enumerate()
        .map(|(index, trajectory)| BatchEntry {
            index,
            label: registry
                .display_label(index)
                .unwrap_or_else(|| format!("Trajectory {}", index + 1)),
            summary: TrajectorySummary::from(trajectory),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }

        OutputFormat::Csv => {
            println!("index,label,steps,final_x,final_y,max_height,range");
            for e in &entries {
                println!(
                    "{},{},{},{:.6},{:.6},{:.6},{:.6}",
                    e.index,
                    e.label,
                    e.summary.steps,
                    e.summary.final_position.0,
                    e.summary.final_position.1,
                    e.summary.max_height,
                    e.summary.range
                );
            }
        }

        OutputFormat::Table => {
            println!("Registry: {} trajectories", entries.len());
            println!("┌─────┬──────────────────────┬──────────┬──────────┬──────────┐");
            println!("│  #  │ Label                │ Final X  │ Final Y  │ Max H    │");
            println!("├─────┼──────────────────────┼──────────┼──────────┼──────────┤");
            for e in &entries {
                println!(
                    "│ {:>3} │ {:<20} │ {:>8.2} │ {:>8.2} │ {:>8.2} │",
                    e.index + 1,
                    e.label,
                    e.summary.final_position.0,
                    e.summary.final_position.1,
                    e.summary.max_height
                );
            }
            println!("└─────┴──────────────────────┴──────────┴──────────┴──────────┘");
        }
    }

    Ok(())
}

fn display_dispersion(
    results: &DispersionResults,
    format: DispersionOutput,
) -> Result<(), Box<dyn Error>> {
    match format {
        DispersionOutput::Summary => {
            println!("╔════════════════════════════════════════╗");
            println!("║      MONTE CARLO DISPERSION            ║");
            println!("║      {:>6} simulations               ║", results.num_simulations);
            println!("╠════════════════════════════════════════╣");
            println!("║ NOMINAL IMPACT                         ║");
            println!("║ X:                 {:>8.2} m          ║", results.nominal_impact.x);
            println!("║ Y:                 {:>8.2} m          ║", results.nominal_impact.y);
            println!("╠════════════════════════════════════════╣");
            println!("║ MEAN IMPACT                            ║");
            println!("║ X:                 {:>8.2} m          ║", results.mean_impact.x);
            println!("║ Y:                 {:>8.2} m          ║", results.mean_impact.y);
            println!("║ Std Dev X:         {:>8.2} m          ║", results.std_dev.x);
            println!("║ Std Dev Y:         {:>8.2} m          ║", results.std_dev.y);
            println!("║ CEP:               {:>8.2} m          ║", results.cep);
            println!("╚════════════════════════════════════════╝");
        }

        DispersionOutput::Full => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }

        DispersionOutput::Statistics => {
            println!("metric,value");
            println!("num_simulations,{}", results.num_simulations);
            println!("nominal_x,{:.4}", results.nominal_impact.x);
            println!("nominal_y,{:.4}", results.nominal_impact.y);
            println!("mean_x,{:.4}", results.mean_impact.x);
            println!("mean_y,{:.4}", results.mean_impact.y);
            println!("std_x,{:.4}", results.std_dev.x);
            println!("std_y,{:.4}", results.std_dev.y);
            println!("cep,{:.4}", results.cep);
        }
    }

    Ok(())
}
