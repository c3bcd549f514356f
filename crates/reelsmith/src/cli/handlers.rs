//! Command handlers.

use super::{Cli, Commands};
use reelsmith::{
    AlignmentTrack, CaptionRenderer, ChunkPlanner, ConfigError, DispatchRecord,
    FileSystemRunStore, JsonError, ReelsmithConfig, ReelsmithResult, RunController, RunInputs,
    RunState, RunStatus, RunStore, StorageError, StorageErrorKind, local_services, read_alignment,
    read_beats,
};
use std::future::Future;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs the parsed command.
///
/// # Errors
///
/// Returns the first error that stops the command. A run that ends FAILED is
/// reported and mapped to a failing exit code instead.
pub async fn dispatch(cli: Cli) -> ReelsmithResult<ExitCode> {
    let config = ReelsmithConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan {
            beats,
            alignment,
            provider,
        } => plan(&config, &beats, alignment.as_deref(), provider.as_deref()).await,

        Commands::Run {
            beats,
            narration,
            alignment,
            music,
            article,
            provider,
            output,
            overrides,
        } => {
            let mut inputs = RunInputs::new(read_beats(&beats).await?, narration);
            if let Some(path) = alignment {
                inputs = inputs.with_alignment(read_alignment(&path).await?);
            }
            if let Some(path) = music {
                inputs = inputs.with_music(path);
            }
            if let Some(name) = output {
                inputs = inputs.with_output_name(name);
            }
            let dispatch = overrides
                .into_iter()
                .fold(DispatchRecord::now(article), |dispatch, (key, value)| {
                    dispatch.with_override(key, value)
                });

            let controller = controller(&config, provider.as_deref())?;
            let run_id = controller.admit(dispatch, inputs).await?;
            println!("{}", run_id);
            let run = supervise(&controller, run_id, controller.execute(run_id)).await?;
            Ok(report(&run))
        }

        Commands::Resume { run_id } => {
            let controller = controller_for_run(&config, run_id).await?;
            let run = supervise(&controller, run_id, controller.resume(run_id)).await?;
            Ok(report(&run))
        }

        Commands::Reopen { run_id } => {
            let controller = controller_for_run(&config, run_id).await?;
            let run = supervise(&controller, run_id, controller.reopen(run_id)).await?;
            Ok(report(&run))
        }

        Commands::Status { run_id } => {
            let run = run_store(&config)?.load(run_id).await?;
            println!("{}", to_json(&run)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::List => {
            let store = run_store(&config)?;
            for run_id in store.list().await? {
                match store.load(run_id).await {
                    Ok(run) => println!(
                        "{}  {:<9}  {}",
                        run_id,
                        run.status(),
                        run.dispatch().source_article_ref()
                    ),
                    Err(e) => warn!(run_id = %run_id, error = %e, "Skipping unreadable run"),
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Captions {
            alignment,
            output,
            beats,
        } => captions(&config, &alignment, &output, beats.as_deref()).await,

        Commands::Config => {
            let text = toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)))?;
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn plan(
    config: &ReelsmithConfig,
    beats: &Path,
    alignment: Option<&Path>,
    provider: Option<&str>,
) -> ReelsmithResult<ExitCode> {
    let profile = config.provider(provider)?;
    let planner = ChunkPlanner::new(config.planning_for(&profile))?;
    let beats = read_beats(beats).await?;
    let segments = match alignment {
        Some(path) => planner.plan_with_alignment(&beats, &read_alignment(path).await?)?,
        None => planner.plan(&beats)?,
    };
    println!("{}", to_json(&segments)?);
    Ok(ExitCode::SUCCESS)
}

async fn captions(
    config: &ReelsmithConfig,
    alignment: &Path,
    output: &Path,
    beats: Option<&Path>,
) -> ReelsmithResult<ExitCode> {
    let track: AlignmentTrack = read_alignment(alignment).await?;
    let segments = match beats {
        Some(path) => {
            let profile = config.provider(None)?;
            ChunkPlanner::new(config.planning_for(&profile))?
                .plan_with_alignment(&read_beats(path).await?, &track)?
        }
        None => Vec::new(),
    };

    let renderer = CaptionRenderer::new(config.assembly.captions().clone());
    let script = renderer.render_alignment(&track, &segments)?;
    tokio::fs::write(output, script).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", output.display(), e)))
    })?;
    info!(output = %output.display(), words = track.len(), "Wrote captions");
    Ok(ExitCode::SUCCESS)
}

fn run_store(config: &ReelsmithConfig) -> ReelsmithResult<FileSystemRunStore> {
    FileSystemRunStore::new(&config.runs_dir)
}

fn controller(config: &ReelsmithConfig, provider: Option<&str>) -> ReelsmithResult<RunController> {
    let profile = config.provider(provider)?;
    RunController::from_config(local_services(config, &profile)?, config, provider)
}

/// Controller for the provider a stored run was started with.
async fn controller_for_run(config: &ReelsmithConfig, run_id: Uuid) -> ReelsmithResult<RunController> {
    let run = run_store(config)?.load(run_id).await?;
    controller(config, Some(run.provider().as_str()))
}

/// Awaits an execution, cancelling the run on Ctrl-C.
async fn supervise<F>(
    controller: &RunController,
    run_id: Uuid,
    execution: F,
) -> ReelsmithResult<RunState>
where
    F: Future<Output = ReelsmithResult<RunState>>,
{
    tokio::pin!(execution);
    tokio::select! {
        run = &mut execution => run,
        _ = tokio::signal::ctrl_c() => {
            warn!(run_id = %run_id, "Interrupted, cancelling run");
            controller.cancel(run_id);
            execution.await
        }
    }
}

fn report(run: &RunState) -> ExitCode {
    match (run.status(), run.failure()) {
        (RunStatus::Completed, _) => {
            println!(
                "{} COMPLETED {}",
                run.run_id(),
                run.output().as_deref().unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        (status, Some(failure)) => {
            println!(
                "{} {} at {} [{}]{}: {}",
                run.run_id(),
                status,
                failure.stage(),
                failure.reason_code(),
                failure
                    .segment_id()
                    .as_deref()
                    .map(|id| format!(" segment {}", id))
                    .unwrap_or_default(),
                failure.message()
            );
            ExitCode::FAILURE
        }
        (status, None) => {
            println!("{} {}", run.run_id(), status);
            ExitCode::FAILURE
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> ReelsmithResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}
