//! Trim, linearize and record a run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tl_plant::{Plant, Quantity, StateVector};
use tl_results::{
    CheckpointRecord, ConstraintsRecord, ParameterValue, RunManifest, RunStore, SolverRecord,
    compute_run_id, write_scilab_script,
};
use tl_sim::{Aircraft, Catalog, Channel};
use tl_solver::{
    BoundsPolicy, Constraints, CostFunction, IterationReport, LinearModel, NelderMead,
    PARAMETER_NAMES, SimplexConfig, SolverError, StateSpace, TrimPoint, TrimSolution, Trimmer,
};

use crate::config::{RunConfig, parse_vector};
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage, TrimProgress};

/// Recorded in every manifest and mixed into the run id.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of [`run_trim`].
#[derive(Debug, Clone)]
pub struct TrimRunResponse {
    pub run_id: String,
    pub model: String,
    pub solution: TrimSolution,
    pub point: TrimPoint,
    pub linear_model: LinearModel,
    pub script_path: PathBuf,
    /// `None` when run storage is disabled.
    pub manifest: Option<RunManifest>,
    pub warnings: Vec<String>,
    pub total_time_s: f64,
}

impl TrimRunResponse {
    pub fn converged(&self) -> bool {
        self.solution.converged()
    }

    /// Parameter names paired with their trimmed values.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        PARAMETER_NAMES
            .iter()
            .copied()
            .zip(self.point.params.to_array())
            .collect()
    }
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Built-in models, optionally extended from a YAML file.
pub fn load_catalog(models_file: Option<&Path>) -> AppResult<Catalog> {
    let mut catalog = Catalog::builtin()?;
    if let Some(path) = models_file {
        catalog.extend(Catalog::from_path(path)?);
    }
    Ok(catalog)
}

/// States of the default linear model: longitudinal, engine, lateral, then
/// the positions of surfaces that lag their commands.
pub fn default_states(aircraft: &Aircraft) -> Vec<Quantity> {
    let mut states = vec![Quantity::Vt, Quantity::Alpha, Quantity::Theta, Quantity::Q];
    states.extend((0..aircraft.engine_count()).map(Quantity::Rpm));
    states.extend([Quantity::Beta, Quantity::Phi, Quantity::P, Quantity::R]);
    for (channel, position) in [
        (Channel::Throttle, Quantity::ThrottlePos),
        (Channel::Aileron, Quantity::DaPos),
        (Channel::Elevator, Quantity::DePos),
        (Channel::Rudder, Quantity::DrPos),
    ] {
        if aircraft.def().actuators.get(channel).is_some() {
            states.push(position);
        }
    }
    states
}

pub fn default_inputs() -> Vec<Quantity> {
    vec![
        Quantity::ThrottleCmd,
        Quantity::DaCmd,
        Quantity::DeCmd,
        Quantity::DrCmd,
    ]
}

fn state_space(config: &RunConfig, aircraft: &Aircraft) -> AppResult<StateSpace> {
    let lin = &config.linearization;
    let x = if lin.states.is_empty() {
        StateVector::from_quantities(default_states(aircraft))?
    } else {
        parse_vector(&lin.states)?
    };
    let u = if lin.inputs.is_empty() {
        StateVector::from_quantities(default_inputs())?
    } else {
        parse_vector(&lin.inputs)?
    };
    let y = if lin.outputs.is_empty() {
        x.clone()
    } else {
        parse_vector(&lin.outputs)?
    };
    Ok(StateSpace::new(x, u, y).with_step(lin.perturbation))
}

fn solver_record(s: &SimplexConfig) -> SolverRecord {
    SolverRecord {
        max_iterations: s.max_iterations,
        rel_tol: s.rel_tol,
        abs_tol: s.abs_tol,
        speed: s.speed,
        random_scale: s.random_scale,
        seed: s.seed,
        bounds_policy: match s.bounds_policy {
            BoundsPolicy::Clamp => "clamp",
            BoundsPolicy::Reject => "reject",
        }
        .to_string(),
    }
}

/// Run the search to a terminal state. A fatal fault surfaces as
/// [`AppError::TrimFault`] carrying the best vertex found before it.
fn drive_simplex<C: CostFunction>(nm: &mut NelderMead<'_, C>) -> AppResult<TrimSolution> {
    match nm.run() {
        Ok(solution) => Ok(solution),
        Err(SolverError::Fatal { what }) => {
            let best = nm.solution().ok();
            tracing::error!(
                %what,
                best_cost = ?best.as_ref().map(|b| b.cost),
                iterations = nm.iterations(),
                "trim aborted"
            );
            Err(AppError::TrimFault { what, best })
        }
        Err(e) => Err(e.into()),
    }
}

fn constraints_record(c: &Constraints, phi: Option<f64>) -> ConstraintsRecord {
    ConstraintsRecord {
        mode: c.mode.to_string(),
        velocity_fps: c.velocity,
        altitude_ft: c.altitude,
        gamma_rad: c.gamma,
        roll_rate_rps: c.roll_rate,
        pitch_rate_rps: c.pitch_rate,
        yaw_rate_rps: c.yaw_rate,
        phi_rad: phi,
        stability_axis_roll: c.stability_axis_roll,
    }
}

fn run_manifest(
    config: &RunConfig,
    run_id: &str,
    constraints: ConstraintsRecord,
    solver: SolverRecord,
    solution: &TrimSolution,
    script_path: Option<&Path>,
    warnings: Vec<String>,
) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        model: config.model.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: SOLVER_VERSION.to_string(),
        constraints,
        solver,
        status: solution.status.to_string(),
        cost: solution.cost,
        iterations: solution.iterations,
        evaluations: solution.evaluations,
        parameters: PARAMETER_NAMES
            .iter()
            .zip(&solution.params)
            .map(|(name, value)| ParameterValue {
                name: (*name).to_string(),
                value: *value,
            })
            .collect(),
        script_path: script_path.map(|p| p.display().to_string()),
        warnings,
    }
}

/// What one run shares across its stages.
struct RunContext<'a> {
    config: &'a RunConfig,
    run_id: &'a str,
    store: Option<&'a RunStore>,
    started: Instant,
}

struct TrimOutcome {
    solution: TrimSolution,
    point: TrimPoint,
    solver: SolverRecord,
}

/// Trim `plant` and load the solution into it. Every iteration is
/// checkpointed and reported; a fatal fault records a failed manifest with the
/// best vertex before returning [`AppError::TrimFault`].
fn trim_plant<P: Plant + ?Sized>(
    ctx: &RunContext<'_>,
    plant: &mut P,
    constraints: Constraints,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<TrimOutcome> {
    let started = ctx.started;
    let trimmer = Trimmer::new(plant, constraints)?;
    let simplex_config = ctx.config.solver.simplex_config(trimmer.bounds());
    let solver = solver_record(&simplex_config);
    let max_iterations = simplex_config.max_iterations;

    let (outcome, mut trimmer) = {
        let store = ctx.store;
        let run_id = ctx.run_id;
        let cb = &mut *progress_cb;
        let on_iteration = move |report: &IterationReport| {
            if let Some(store) = store {
                let record = CheckpointRecord {
                    iteration: report.iteration,
                    evaluations: report.evaluations,
                    cost: report.best_cost,
                    params: report.best.clone(),
                    relative_spread: report.relative_spread,
                };
                if let Err(e) = store.append_checkpoint(run_id, &record) {
                    tracing::warn!(error = %e, "failed to write checkpoint");
                }
            }
            if let Some(f) = cb.as_deref_mut() {
                f(RunProgressEvent {
                    stage: RunStage::Trimming,
                    elapsed_wall_s: started.elapsed().as_secs_f64(),
                    message: None,
                    trim: Some(TrimProgress {
                        iteration: report.iteration,
                        max_iterations,
                        evaluations: report.evaluations,
                        best_cost: report.best_cost,
                        relative_spread: report.relative_spread,
                    }),
                });
            }
        };
        let mut nm = NelderMead::new(trimmer, simplex_config)?.with_callback(on_iteration);
        let outcome = drive_simplex(&mut nm);
        (outcome, nm.into_cost_function())
    };
    let solution = match outcome {
        Ok(solution) => solution,
        Err(AppError::TrimFault { what, best }) => {
            if let (Some(store), Some(best)) = (ctx.store, &best) {
                let manifest = run_manifest(
                    ctx.config,
                    ctx.run_id,
                    constraints_record(&constraints, None),
                    solver,
                    best,
                    None,
                    vec![format!("trim aborted: {what}")],
                );
                if let Err(e) = store.save_manifest(&manifest) {
                    tracing::warn!(error = %e, "failed to record the aborted run");
                }
            }
            return Err(AppError::TrimFault { what, best });
        }
        Err(e) => return Err(e),
    };

    emit_progress(progress_cb, RunStage::ApplyingTrim, started, None);
    let point = trimmer.apply(&solution.params)?;
    Ok(TrimOutcome {
        solution,
        point,
        solver,
    })
}

/// Trim the configured model, linearize about the trim and write the script.
pub fn run_trim(config: &RunConfig) -> AppResult<TrimRunResponse> {
    run_trim_with_progress(config, None)
}

/// [`run_trim`] streaming stage and per-iteration progress events.
pub fn run_trim_with_progress(
    config: &RunConfig,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<TrimRunResponse> {
    let started = Instant::now();
    let mut warnings = Vec::new();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingModel,
        started,
        Some(format!("Loading model {}", config.model)),
    );
    let catalog = load_catalog(config.models_file.as_deref())?;
    let mut plant = catalog.build(&config.model)?;

    plant.set(&Quantity::Alt, config.flight.altitude())?;
    let gravity = plant.get(&Quantity::Gravity)?;
    let constraints = config.flight.to_constraints(gravity)?;

    let run_id = compute_run_id(config, SOLVER_VERSION);
    let store = if config.output.store_runs {
        let store = RunStore::for_output_dir(&config.output.dir)?;
        store.reset_checkpoints(&run_id)?;
        Some(store)
    } else {
        None
    };
    tracing::info!(run_id = %run_id, model = %config.model, mode = %constraints.mode, "starting trim");

    emit_progress(
        &mut progress_cb,
        RunStage::Trimming,
        started,
        Some(format!("Trimming for {} flight", constraints.mode)),
    );
    let ctx = RunContext {
        config,
        run_id: &run_id,
        store: store.as_ref(),
        started,
    };
    let TrimOutcome {
        solution,
        point,
        solver,
    } = trim_plant(&ctx, &mut plant, constraints, &mut progress_cb)?;

    if !solution.converged() {
        let msg = format!(
            "trim did not converge ({}) after {} iterations, cost {:e}; using the best point found",
            solution.status, solution.iterations, solution.cost
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    emit_progress(&mut progress_cb, RunStage::Linearizing, started, None);
    let ss = state_space(config, &plant)?;
    let reference = ss.reference_point(&plant)?;
    let linear_model = ss.linearize(&mut plant, &reference)?;
    if !linear_model.is_finite() {
        let msg = "linear model has non-finite entries (plant diverged under perturbation)".to_string();
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    emit_progress(&mut progress_cb, RunStage::WritingScript, started, None);
    let script_path = write_scilab_script(
        &config.output.dir,
        &config.model,
        &config.output.extension,
        &linear_model,
    )?;

    let manifest = match &store {
        Some(store) => {
            emit_progress(&mut progress_cb, RunStage::SavingResults, started, None);
            let manifest = run_manifest(
                config,
                &run_id,
                constraints_record(&constraints, Some(point.phi)),
                solver,
                &solution,
                Some(&script_path),
                warnings.clone(),
            );
            store.save_manifest(&manifest)?;
            Some(manifest)
        }
        None => None,
    };

    let total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some(format!("Run completed in {total_time_s:.2} s")),
    );

    Ok(TrimRunResponse {
        run_id,
        model: config.model.clone(),
        solution,
        point,
        linear_model,
        script_path,
        manifest,
        warnings,
        total_time_s,
    })
}

/// Stored runs under `output_dir`, newest first.
pub fn list_runs(output_dir: &Path, model: Option<&str>) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_output_dir(output_dir)?;
    Ok(store.list_runs(model)?)
}

/// Manifest and checkpoints of one stored run.
pub fn load_run(
    output_dir: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<CheckpointRecord>)> {
    let store = RunStore::for_output_dir(output_dir)?;
    let manifest = store.load_manifest(run_id)?;
    let checkpoints = match store.load_checkpoints(run_id) {
        Ok(checkpoints) => checkpoints,
        Err(e) => {
            tracing::warn!(run_id, error = %e, "unreadable checkpoints, showing none");
            Vec::new()
        }
    };
    Ok((manifest, checkpoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_plant::{PlantError, TablePlant};
    use tl_solver::SimplexStatus;

    /// Trimmable table plant whose speed rate follows the throttle, losing
    /// its model after `healthy_steps` steps.
    fn failing_plant(healthy_steps: usize) -> TablePlant {
        let mut plant = TablePlant::new(0.01);
        for q in [
            Quantity::ThrottleCmd,
            Quantity::DaCmd,
            Quantity::DeCmd,
            Quantity::DrCmd,
            Quantity::Vt,
            Quantity::Alpha,
            Quantity::Beta,
            Quantity::Phi,
            Quantity::Theta,
            Quantity::P,
            Quantity::Q,
            Quantity::R,
            Quantity::Alt,
        ] {
            plant = plant.with_value(q, 0.0);
        }
        let mut steps = 0usize;
        plant.with_step(move |v, dt| {
            steps += 1;
            if steps > healthy_steps {
                return Err(PlantError::UnknownQuantity {
                    name: "engine model".to_string(),
                });
            }
            let throttle = v[&Quantity::ThrottleCmd];
            if let Some(vt) = v.get_mut(&Quantity::Vt) {
                *vt += dt * (throttle - 0.3);
            }
            Ok(())
        })
    }

    #[test]
    fn fatal_fault_keeps_best_vertex() {
        let calls = std::cell::Cell::new(0usize);
        let cost = |x: &[f64]| -> tl_solver::EvalResult<f64> {
            calls.set(calls.get() + 1);
            if calls.get() > 12 {
                return Err(tl_solver::EvalError::Fatal {
                    what: "plant lost".to_string(),
                });
            }
            Ok(x.iter().map(|v| v * v).sum())
        };
        let config = SimplexConfig {
            initial_guess: vec![0.5, 0.5],
            lower: vec![-1.0, -1.0],
            upper: vec![1.0, 1.0],
            initial_step: vec![0.1, 0.1],
            ..SimplexConfig::default()
        };
        let mut nm = NelderMead::new(cost, config).unwrap();
        match drive_simplex(&mut nm) {
            Err(AppError::TrimFault { what, best }) => {
                assert_eq!(what, "plant lost");
                let best = best.unwrap();
                assert_eq!(best.status, SimplexStatus::Failed);
                assert!(best.cost.is_finite());
                assert!(best.cost < 0.5);
            }
            other => panic!("expected a trim fault, got {other:?}"),
        }
    }

    #[test]
    fn fatal_plant_fault_is_recorded() {
        let dir = std::env::temp_dir().join(format!("tl_app_fault_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let store = RunStore::for_output_dir(&dir).unwrap();
        let mut config = RunConfig::default();
        config.output.dir = dir.clone();
        let ctx = RunContext {
            config: &config,
            run_id: "faulted",
            store: Some(&store),
            started: Instant::now(),
        };

        let mut plant = failing_plant(30);
        let constraints = Constraints::level(200.0, 1000.0, 0.0);
        let mut events = 0usize;
        let mut on_event = |_: RunProgressEvent| events += 1;
        let mut cb: Option<&mut dyn FnMut(RunProgressEvent)> = Some(&mut on_event);
        let (what, best) = match trim_plant(&ctx, &mut plant, constraints, &mut cb) {
            Err(AppError::TrimFault { what, best }) => (what, best),
            Err(e) => panic!("expected a trim fault, got {e:?}"),
            Ok(_) => panic!("trim should abort on the plant fault"),
        };
        assert!(what.contains("engine model"));
        let best = best.unwrap();
        assert_eq!(best.params.len(), PARAMETER_NAMES.len());
        assert!(best.cost.is_finite());

        let manifest = store.load_manifest("faulted").unwrap();
        assert_eq!(manifest.status, "failed");
        assert_eq!(manifest.cost, best.cost);
        assert_eq!(manifest.constraints.phi_rad, None);
        assert!(manifest.script_path.is_none());
        assert!(manifest.warnings[0].contains("engine model"));
        let checkpoints = store.load_checkpoints("faulted").unwrap();
        assert_eq!(checkpoints.len(), best.iterations);
        assert_eq!(events, best.iterations);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_checkpoints_still_load_the_manifest() {
        let dir = std::env::temp_dir().join(format!("tl_app_corrupt_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let store = RunStore::for_output_dir(&dir).unwrap();
        let config = RunConfig::default();
        let solution = TrimSolution {
            params: vec![0.13, 0.036, 0.005, 0.0, 0.0, 0.0],
            cost: 1e-9,
            status: SimplexStatus::Converged,
            iterations: 3,
            evaluations: 12,
        };
        let constraints = Constraints::level(200.0, 1000.0, 0.0);
        let manifest = run_manifest(
            &config,
            "corrupt",
            constraints_record(&constraints, Some(0.0)),
            solver_record(&SimplexConfig::default()),
            &solution,
            None,
            Vec::new(),
        );
        store.save_manifest(&manifest).unwrap();
        std::fs::write(store.run_dir("corrupt").join("checkpoints.jsonl"), "{not json\n").unwrap();

        let (loaded, checkpoints) = load_run(&dir, "corrupt").unwrap();
        assert_eq!(loaded.parameters.len(), 6);
        assert_eq!(loaded.constraints.phi_rad, Some(0.0));
        assert!(checkpoints.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
