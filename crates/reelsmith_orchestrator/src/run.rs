//! Run lifecycle: admission, the planning → generation → assembly pipeline,
//! cancellation and reopening.

use crate::lease::SegmentLeases;
use crate::media::{GenerationReport, MediaOrchestrator};
use reelsmith_assembly::Assembler;
use reelsmith_core::{
    AssemblyConfig, DispatchRecord, PlanningConfig, RunInputs, RunState, RunStatus, Stage,
};
use reelsmith_error::{ConfigError, ReelsmithError, ReelsmithResult, RunError, RunErrorKind};
use reelsmith_interface::{ClipStorage, MediaProbe, MediaProvider, Muxer, RunStore};
use reelsmith_planner::ChunkPlanner;
use reelsmith_throttle::{ProviderProfile, ReelsmithConfig, SubmissionThrottle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// External collaborators a run needs.
#[derive(Clone)]
pub struct RunServices {
    /// Media generation provider
    pub provider: Arc<dyn MediaProvider>,
    /// Durable run records
    pub store: Arc<dyn RunStore>,
    /// Clip payload storage
    pub storage: Arc<dyn ClipStorage>,
    /// Media duration probe
    pub probe: Arc<dyn MediaProbe>,
    /// Final video muxer
    pub muxer: Arc<dyn Muxer>,
}

impl std::fmt::Debug for RunServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunServices").finish_non_exhaustive()
    }
}

/// Fatal failure of one stage.
struct StageFailure {
    stage: Stage,
    segment_id: Option<String>,
    error: ReelsmithError,
}

impl StageFailure {
    fn new(stage: Stage, segment_id: Option<String>, error: impl Into<ReelsmithError>) -> Self {
        Self {
            stage,
            segment_id,
            error: error.into(),
        }
    }
}

/// Removes a run's cancellation token when its execution ends.
struct ActiveRun {
    run_id: Uuid,
    active: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.run_id);
    }
}

/// Drives runs through `PENDING → QUEUED → RUNNING → COMPLETED | FAILED`.
///
/// Every stage is restartable from the persisted run: planning happens once,
/// generation only touches segments without an artifact, and assembly is
/// repeated from stored clips. A FAILED run keeps its artifacts and can be
/// reopened.
///
/// # Example
///
/// ```rust,ignore
/// let controller = RunController::from_config(services, &config, None)?;
/// let run_id = controller.admit(DispatchRecord::now("article-17"), inputs).await?;
/// let run = controller.execute(run_id).await?;
/// println!("{} -> {:?}", run.status(), run.output());
/// ```
#[derive(Clone)]
pub struct RunController {
    services: RunServices,
    profile: ProviderProfile,
    planning: PlanningConfig,
    assembly: AssemblyConfig,
    throttle: SubmissionThrottle,
    workers: Arc<Semaphore>,
    leases: SegmentLeases,
    active: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("provider", &self.profile.name)
            .field("workers_free", &self.workers.available_permits())
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

impl RunController {
    /// Creates a controller running at most `max_parallel_runs` runs at once.
    pub fn new(
        services: RunServices,
        profile: ProviderProfile,
        planning: PlanningConfig,
        assembly: AssemblyConfig,
        max_parallel_runs: usize,
    ) -> Self {
        let throttle = SubmissionThrottle::new(&profile);
        Self {
            services,
            profile,
            planning,
            assembly,
            throttle,
            workers: Arc::new(Semaphore::new(max_parallel_runs.max(1))),
            leases: SegmentLeases::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a controller from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the provider is unknown or its profile
    /// is invalid.
    pub fn from_config(
        services: RunServices,
        config: &ReelsmithConfig,
        provider: Option<&str>,
    ) -> ReelsmithResult<Self> {
        let profile = config.provider(provider)?;
        profile.validate()?;
        Ok(Self::new(
            services,
            profile,
            config.planning.clone(),
            config.assembly.clone(),
            config.max_parallel_runs as usize,
        ))
    }

    /// Provider profile runs use before per-run overrides.
    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Records a new PENDING run and returns its id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the run cannot be saved.
    #[instrument(skip(self, dispatch, inputs), fields(article = %dispatch.source_article_ref()))]
    pub async fn admit(&self, dispatch: DispatchRecord, inputs: RunInputs) -> ReelsmithResult<Uuid> {
        let mut run = RunState::new(dispatch, self.profile.name.clone());
        run.set_inputs(inputs);
        self.services.store.save(&run).await?;
        info!(run_id = %run.run_id(), "Admitted run");
        Ok(*run.run_id())
    }

    /// Moves a PENDING run to QUEUED.
    ///
    /// # Errors
    ///
    /// Returns a run error if the run is in any other status.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        let mut run = self.services.store.load(run_id).await?;
        run.transition(RunStatus::Queued)?;
        self.services.store.save(&run).await?;
        Ok(run)
    }

    /// Runs every remaining stage and returns the final run record.
    ///
    /// A stage failure is not an error: the run is recorded FAILED with its
    /// first failure and returned. A COMPLETED run is returned untouched.
    ///
    /// # Errors
    ///
    /// - a storage error if the run cannot be loaded or saved
    /// - [`RunErrorKind::InvalidTransition`] for a FAILED run, which must be
    ///   reopened first
    #[instrument(skip(self), fields(provider = %self.profile.name))]
    pub async fn execute(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        let _worker = self.workers.clone().acquire_owned().await.map_err(|_| {
            RunError::new(RunErrorKind::Cancelled(run_id.to_string()))
        })?;

        let mut run = self.services.store.load(run_id).await?;
        match run.status() {
            RunStatus::Completed => {
                info!("Run already completed");
                return Ok(run);
            }
            RunStatus::Failed => {
                return Err(RunError::new(RunErrorKind::InvalidTransition {
                    from: RunStatus::Failed.to_string(),
                    to: RunStatus::Running.to_string(),
                })
                .into());
            }
            RunStatus::Pending => run.transition(RunStatus::Queued)?,
            RunStatus::Queued | RunStatus::Running => {}
        }
        run.transition(RunStatus::Running)?;
        self.services.store.save(&run).await?;

        let cancel = CancellationToken::new();
        let _active = self.register(run_id, cancel.clone());

        match self.run_stages(&mut run, &cancel).await {
            Ok(output) => {
                run.record_output(output.display().to_string());
                run.transition(RunStatus::Completed)?;
                info!(output = %output.display(), "Run completed");
            }
            Err(failure) => {
                warn!(
                    stage = %failure.stage,
                    segment_id = ?failure.segment_id,
                    reason = failure.error.reason_code(),
                    error = %failure.error,
                    "Run failed"
                );
                run.record_failure(
                    failure.stage,
                    failure.segment_id,
                    failure.error.reason_code(),
                    failure.error.to_string(),
                );
                run.transition(RunStatus::Failed)?;
            }
        }
        self.services.store.save(&run).await?;
        Ok(run)
    }

    /// Continues a run after a restart. Same as [`RunController::execute`].
    ///
    /// # Errors
    ///
    /// See [`RunController::execute`].
    pub async fn resume(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        self.execute(run_id).await
    }

    /// Reopens a FAILED run and executes it again, keeping its artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`RunErrorKind::InvalidTransition`] unless the run is FAILED.
    #[instrument(skip(self))]
    pub async fn reopen(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        let mut run = self.services.store.load(run_id).await?;
        run.reopen()?;
        self.services.store.save(&run).await?;
        info!(artifacts = run.artifacts().len(), "Reopened run");
        self.execute(run_id).await
    }

    /// Signals a running run to stop. Returns whether it was running here.
    ///
    /// In-flight jobs are marked cancelled and the run ends FAILED with
    /// reason `cancelled`; artifacts already attached are kept.
    pub fn cancel(&self, run_id: Uuid) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.get(&run_id) {
            Some(token) => {
                info!(run_id = %run_id, "Cancelling run");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Loads the persisted record of a run.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the run is unknown.
    pub async fn status(&self, run_id: Uuid) -> ReelsmithResult<RunState> {
        self.services.store.load(run_id).await
    }

    /// Ids of every persisted run.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be listed.
    pub async fn list(&self) -> ReelsmithResult<Vec<Uuid>> {
        self.services.store.list().await
    }

    fn register(&self, run_id: Uuid, token: CancellationToken) -> ActiveRun {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(run_id, token);
        ActiveRun {
            run_id,
            active: self.active.clone(),
        }
    }

    async fn run_stages(
        &self,
        run: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, StageFailure> {
        let run_id = *run.run_id();
        let inputs = run.inputs().clone().ok_or_else(|| {
            StageFailure::new(
                Stage::Planning,
                None,
                ConfigError::new(format!("Run {} has no recorded inputs", run_id)),
            )
        })?;
        let profile = self
            .profile
            .with_overrides(run.dispatch().provider_overrides())
            .map_err(|e| StageFailure::new(Stage::Planning, None, e))?;

        self.plan(run, &inputs, &profile)
            .await
            .map_err(|e| StageFailure::new(Stage::Planning, None, e))?;

        let report = self
            .generate(run.clone(), profile, cancel)
            .await
            .map_err(|e| StageFailure::new(Stage::Generation, None, e))?;
        let GenerationReport {
            run: generated,
            mut failures,
            cancelled,
            ..
        } = report;
        *run = generated;

        if cancelled || cancel.is_cancelled() {
            return Err(StageFailure::new(
                Stage::Generation,
                None,
                RunError::new(RunErrorKind::Cancelled(run_id.to_string())),
            ));
        }
        let position = |segment_id: &str| {
            run.segments()
                .iter()
                .position(|s| s.id() == segment_id)
                .unwrap_or(usize::MAX)
        };
        failures.sort_by_key(|f| position(&f.segment_id));
        if let Some(first) = failures.into_iter().next() {
            return Err(StageFailure::new(
                Stage::Generation,
                Some(first.segment_id),
                first.error,
            ));
        }

        let assembler = Assembler::new(
            self.assembly.clone(),
            self.services.storage.clone(),
            self.services.probe.clone(),
            self.services.muxer.clone(),
        );
        assembler
            .assemble(run, &inputs)
            .await
            .map_err(|e| StageFailure::new(Stage::Assembly, None, e))
    }

    async fn plan(
        &self,
        run: &mut RunState,
        inputs: &RunInputs,
        profile: &ProviderProfile,
    ) -> ReelsmithResult<()> {
        if !run.segments().is_empty() {
            debug!(segments = run.segments().len(), "Reusing recorded plan");
            return Ok(());
        }
        let planner = ChunkPlanner::new(profile.planning_config(&self.planning))?;
        let segments = match &inputs.alignment {
            Some(track) => planner.plan_with_alignment(&inputs.beats, track)?,
            None => planner.plan(&inputs.beats)?,
        };
        info!(segments = segments.len(), "Planned run");
        run.set_plan(segments);
        self.services.store.save(run).await
    }

    async fn generate(
        &self,
        run: RunState,
        profile: ProviderProfile,
        cancel: &CancellationToken,
    ) -> ReelsmithResult<GenerationReport> {
        let throttle = if profile.max_concurrent != self.profile.max_concurrent
            || profile.submit_cooldown_secs != self.profile.submit_cooldown_secs
        {
            debug!(
                max_concurrent = profile.max_concurrent,
                submit_cooldown_secs = profile.submit_cooldown_secs,
                "Nesting run limits inside the provider throttle"
            );
            self.throttle.nested(&profile)
        } else {
            self.throttle.clone()
        };
        MediaOrchestrator::new(
            self.services.provider.clone(),
            self.services.storage.clone(),
            self.services.probe.clone(),
            self.services.store.clone(),
            profile,
        )
        .with_throttle(throttle)
        .with_leases(self.leases.clone())
        .generate(run, cancel)
        .await
    }
}
