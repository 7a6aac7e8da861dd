use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tl_app::{
    AppError, AppResult, BoundsPolicyConfig, ModeConfig, RunConfig, RunProgressEvent, TrimRunResponse,
    load_catalog, run_service,
};
use tl_results::{MatrixFormat, format_matrix};
use tl_solver::PARAMETER_NAMES;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(about = "trimlin - aircraft trim and linearization", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim a model and write its linear model script
    Trim(TrimArgs),
    /// List the models in the catalog
    Models {
        /// Extra model catalog (YAML)
        #[arg(long)]
        models_file: Option<PathBuf>,
    },
    /// List stored trim runs
    Runs {
        /// Output directory the runs were written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Only runs of this model
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show a stored trim run
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Output directory the run was written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    NonTurning,
    Rolling,
    Pitching,
    Turning,
}

impl From<ModeArg> for ModeConfig {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::NonTurning => ModeConfig::NonTurning,
            ModeArg::Rolling => ModeConfig::Rolling,
            ModeArg::Pitching => ModeConfig::Pitching,
            ModeArg::Turning => ModeConfig::Turning,
        }
    }
}

/// Flags override the run config file, which overrides the defaults.
#[derive(Args)]
struct TrimArgs {
    /// Run configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Model identifier
    #[arg(short, long)]
    model: Option<String>,
    /// Extra model catalog (YAML)
    #[arg(long)]
    models_file: Option<PathBuf>,
    /// Altitude (ft)
    #[arg(long)]
    altitude: Option<f64>,
    /// True airspeed (ft/s)
    #[arg(long)]
    velocity: Option<f64>,
    /// Flight path angle (deg)
    #[arg(long)]
    gamma: Option<f64>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Roll rate for rolling trims (deg/s)
    #[arg(long)]
    roll_rate: Option<f64>,
    /// Roll about the stability x axis
    #[arg(long)]
    stability_axis: bool,
    /// Pitch rate for pitching trims (deg/s)
    #[arg(long)]
    pitch_rate: Option<f64>,
    /// Bank angle for turning trims (deg)
    #[arg(long)]
    bank: Option<f64>,
    /// Turn rate (deg/s), replaces the rate derived from the bank angle
    #[arg(long)]
    yaw_rate: Option<f64>,
    #[arg(long)]
    rel_tol: Option<f64>,
    #[arg(long)]
    abs_tol: Option<f64>,
    #[arg(long)]
    max_iter: Option<usize>,
    /// Expansion factor; contraction is its reciprocal
    #[arg(long)]
    speed: Option<f64>,
    /// Relative noise added to every cost evaluation
    #[arg(long)]
    random_scale: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Give out-of-bounds candidates infinite cost instead of clamping them
    #[arg(long)]
    reject_out_of_bounds: bool,
    /// Log the simplex spread every iteration
    #[arg(long)]
    show_convergence: bool,
    /// Log every ranked simplex vertex (debug level)
    #[arg(long)]
    show_simplex: bool,
    /// Output directory for the script and the run store
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Script file extension
    #[arg(long)]
    extension: Option<String>,
    /// Do not record the run
    #[arg(long)]
    no_store: bool,
    /// Print the effective run config and exit
    #[arg(long)]
    print_config: bool,
}

impl TrimArgs {
    fn into_config(self) -> AppResult<(RunConfig, bool)> {
        let mut c = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(v) = self.model {
            c.model = v;
        }
        if self.models_file.is_some() {
            c.models_file = self.models_file;
        }

        let f = &mut c.flight;
        if let Some(v) = self.altitude {
            f.altitude_ft = v;
            f.altitude_m = None;
        }
        if let Some(v) = self.velocity {
            f.velocity_fps = v;
            f.velocity_kts = None;
        }
        if let Some(v) = self.gamma {
            f.gamma_deg = v;
        }
        if let Some(v) = self.mode {
            f.mode = v.into();
        }
        if let Some(v) = self.roll_rate {
            f.roll_rate_dps = v;
        }
        f.stability_axis_roll |= self.stability_axis;
        if let Some(v) = self.pitch_rate {
            f.pitch_rate_dps = v;
        }
        if let Some(v) = self.bank {
            f.bank_deg = v;
        }
        if self.yaw_rate.is_some() {
            f.yaw_rate_dps = self.yaw_rate;
        }

        let s = &mut c.solver;
        if let Some(v) = self.rel_tol {
            s.rel_tol = v;
        }
        if let Some(v) = self.abs_tol {
            s.abs_tol = v;
        }
        if let Some(v) = self.max_iter {
            s.max_iterations = v;
        }
        if let Some(v) = self.speed {
            s.speed = v;
        }
        if let Some(v) = self.random_scale {
            s.random_scale = v;
        }
        if self.seed.is_some() {
            s.seed = self.seed;
        }
        if self.reject_out_of_bounds {
            s.bounds_policy = BoundsPolicyConfig::Reject;
        }
        s.show_convergence |= self.show_convergence;
        s.show_simplex |= self.show_simplex;

        if let Some(v) = self.output {
            c.output.dir = v;
        }
        if let Some(v) = self.extension {
            c.output.extension = v;
        }
        if self.no_store {
            c.output.store_runs = false;
        }
        Ok((c, self.print_config))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Trim(args) => cmd_trim(args),
        Commands::Models { models_file } => cmd_models(models_file.as_deref()),
        Commands::Runs { output, model } => cmd_runs(&output, model.as_deref()),
        Commands::ShowRun { run_id, output } => cmd_show_run(&output, &run_id),
    }
}

fn cmd_trim(args: TrimArgs) -> AppResult<()> {
    let (config, print_config) = args.into_config()?;
    if print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    println!(
        "Trimming {} ({:?}) at {:.1} ft/s, {:.0} ft",
        config.model,
        config.flight.mode,
        config.flight.velocity(),
        config.flight.altitude()
    );

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let result = run_service::run_trim_with_progress(
        &config,
        Some(&mut |event| {
            let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();

    if let Err(AppError::TrimFault {
        what,
        best: Some(best),
    }) = &result
    {
        println!("✗ Trim aborted after {} iterations: {what}", best.iterations);
        println!("\nBest point before the fault:");
        for (name, value) in PARAMETER_NAMES.iter().zip(&best.params) {
            println!("  {name:<10} {value:>14.6e}");
        }
        println!("  cost       {:>14.6e}", best.cost);
    }
    let response = result?;

    print_trim(&response);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(t) = &event.trim {
        line.push_str(&format!(
            "  iter={}/{}  evals={}  cost={:.3e}",
            t.iteration, t.max_iterations, t.evaluations, t.best_cost
        ));
    } else if let Some(msg) = &event.message {
        line.push_str(&format!("  {msg}"));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}

fn print_trim(response: &TrimRunResponse) {
    let s = &response.solution;
    if response.converged() {
        println!("✓ Trim converged: {} iterations, {} evaluations", s.iterations, s.evaluations);
    } else {
        println!("✗ Trim stopped ({}): {} iterations", s.status, s.iterations);
    }

    println!("\nTrim parameters:");
    for (name, value) in response.parameters() {
        println!("  {name:<10} {value:>14.6e}");
    }
    let p = &response.point;
    println!("  {:<10} {:>14.6e}", "theta", p.theta);
    println!("  {:<10} {:>14.6e}", "phi", p.phi);
    println!("  cost       {:>14.6e}", s.cost);

    let m = &response.linear_model;
    let fmt = MatrixFormat::console();
    println!("\nx = {}", m.x_names.join(" "));
    println!("u = {}", m.u_names.join(" "));
    println!("y = {}", m.y_names.join(" "));
    for (label, mat) in [("A", &m.a), ("B", &m.b), ("C", &m.c), ("D", &m.d)] {
        println!("\n{label} =\n{}", format_matrix(mat, &fmt));
    }

    println!("\nScript: {}", response.script_path.display());
    if response.manifest.is_some() {
        println!("Run:    {}", response.run_id);
    }
    for w in &response.warnings {
        println!("warning: {w}");
    }
    println!("Total:  {:.3}s", response.total_time_s);
}

fn cmd_models(models_file: Option<&Path>) -> AppResult<()> {
    let catalog = load_catalog(models_file)?;
    println!("Models:");
    for def in catalog.models() {
        let lag = if def.actuators.any() { ", actuator lag" } else { "" };
        println!(
            "  {} - {} ({} engines{lag})",
            def.name,
            def.description,
            def.engines.len()
        );
    }
    Ok(())
}

fn cmd_runs(output: &Path, model: Option<&str>) -> AppResult<()> {
    let runs = run_service::list_runs(output, model)?;

    if runs.is_empty() {
        println!("No stored runs under {}", output.display());
    } else {
        println!("Stored runs:");
        for m in runs {
            println!(
                "  {} {} {} ({}, cost {:.3e}, {})",
                m.run_id, m.model, m.constraints.mode, m.status, m.cost, m.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(output: &Path, run_id: &str) -> AppResult<()> {
    let (manifest, checkpoints) = run_service::load_run(output, run_id)?;
    print!("{}", manifest.to_yaml()?);

    println!("\nCheckpoints: {}", checkpoints.len());
    if let Some(last) = checkpoints.last() {
        println!(
            "  last: iteration {} cost {:.3e} spread {:.3e}",
            last.iteration, last.cost, last.relative_spread
        );
    }
    Ok(())
}
