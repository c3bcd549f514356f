//! Media generation: drives every missing segment of a run to an artifact.

use crate::lease::{SegmentLease, SegmentLeases};
use reelsmith_core::{
    ClipArtifact, ClipSegment, FailureReason, GenerationJob, GenerationStatus, PromptPayload,
    RunState,
};
use reelsmith_error::{
    GenerationError, GenerationErrorKind, ReelsmithError, ReelsmithErrorKind, ReelsmithResult,
    RunError, RunErrorKind,
};
use reelsmith_interface::{ClipStorage, MediaProbe, MediaProvider, ProviderStatus, RunStore};
use reelsmith_throttle::{ProviderProfile, SubmissionThrottle, SubmissionTicket, ThrottleSlot};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

type SharedRun = Arc<Mutex<RunState>>;

/// A segment that did not reach an artifact.
#[derive(Debug)]
pub struct SegmentFailure {
    /// Segment that failed
    pub segment_id: String,
    /// Why it failed
    pub error: ReelsmithError,
}

/// Outcome of one generation pass over a run.
#[derive(Debug)]
pub struct GenerationReport {
    /// Run state after the pass, already persisted
    pub run: RunState,
    /// Segments that went to the provider as new jobs
    pub submitted: usize,
    /// Acknowledged jobs picked up again by polling
    pub reattached: usize,
    /// READY jobs whose result was fetched again
    pub refetched: usize,
    /// Segments that gained an artifact
    pub completed: usize,
    /// Segments that ended without one
    pub failures: Vec<SegmentFailure>,
    /// Whether the pass stopped on cancellation
    pub cancelled: bool,
}

impl GenerationReport {
    /// Whether every planned segment now has an artifact.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled && self.run.is_media_complete()
    }
}

/// How a missing segment is picked up.
enum Entry {
    Submit,
    Reattach(GenerationJob),
    Refetch(GenerationJob),
    Busy,
}

/// Where a worker starts.
enum Start {
    Submit(SubmissionTicket),
    Poll,
    Fetch,
}

struct SegmentOutcome {
    segment_id: String,
    result: ReelsmithResult<()>,
}

/// Why a worker stopped early. A `None` reason leaves the job record as is.
struct Abort {
    reason: Option<FailureReason>,
    error: ReelsmithError,
}

impl Abort {
    fn new(reason: FailureReason, error: impl Into<ReelsmithError>) -> Self {
        Self {
            reason: Some(reason),
            error: error.into(),
        }
    }

    fn internal(error: impl Into<ReelsmithError>) -> Self {
        Self {
            reason: None,
            error: error.into(),
        }
    }
}

fn is_transient(error: &ReelsmithError) -> bool {
    matches!(error.kind(), ReelsmithErrorKind::Provider(e) if e.kind.is_retryable())
}

/// Submits, polls and fetches generation jobs for one provider.
///
/// Each segment gets its own task. Tasks hold a throttle slot for their whole
/// life and pass through the submission gate before every submit call, so the
/// provider never sees more than `max_concurrent` jobs or submissions closer
/// together than the cooldown. Every job change is written to the run store
/// before the next provider call.
#[derive(Clone)]
pub struct MediaOrchestrator {
    provider: Arc<dyn MediaProvider>,
    storage: Arc<dyn ClipStorage>,
    probe: Arc<dyn MediaProbe>,
    store: Arc<dyn RunStore>,
    profile: ProviderProfile,
    throttle: SubmissionThrottle,
    leases: SegmentLeases,
}

impl std::fmt::Debug for MediaOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaOrchestrator")
            .field("provider", &self.provider.name())
            .field("throttle", &self.throttle)
            .field("leases", &self.leases.len())
            .finish_non_exhaustive()
    }
}

impl MediaOrchestrator {
    /// Creates an orchestrator with its own throttle and lease set.
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        storage: Arc<dyn ClipStorage>,
        probe: Arc<dyn MediaProbe>,
        store: Arc<dyn RunStore>,
        profile: ProviderProfile,
    ) -> Self {
        let throttle = SubmissionThrottle::new(&profile);
        Self {
            provider,
            storage,
            probe,
            store,
            profile,
            throttle,
            leases: SegmentLeases::new(),
        }
    }

    /// Shares a throttle with other orchestrators for the same provider.
    pub fn with_throttle(mut self, throttle: SubmissionThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Shares a lease set with other orchestrators in this process.
    pub fn with_leases(mut self, leases: SegmentLeases) -> Self {
        self.leases = leases;
        self
    }

    /// Provider limits in use.
    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Throttle in use.
    pub fn throttle(&self) -> &SubmissionThrottle {
        &self.throttle
    }

    /// Generates media for every segment of `run` that lacks an artifact.
    ///
    /// Segments that already have an artifact are never submitted again.
    /// Jobs the provider acknowledged before a restart are polled instead of
    /// resubmitted; jobs that never got a provider id are marked interrupted
    /// and submitted afresh.
    ///
    /// Per-segment failures are collected in the report rather than returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run store cannot be written or the
    /// throttle was closed.
    #[instrument(skip_all, fields(run_id = %run.run_id(), provider = %self.profile.name))]
    pub async fn generate(
        &self,
        mut run: RunState,
        cancel: &CancellationToken,
    ) -> ReelsmithResult<GenerationReport> {
        let run_id = *run.run_id();
        let plan = self.recover(&mut run)?;
        self.store.save(&run).await?;
        info!(missing = plan.len(), "Generating missing segments");

        let shared: SharedRun = Arc::new(Mutex::new(run));
        let mut report = Counts::default();
        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::new();

        for (segment, entry, lease) in plan {
            let segment_id = segment.id().clone();
            let (entry, lease) = match (entry, lease) {
                (Entry::Busy, _) | (_, None) => {
                    warn!(segment_id = %segment_id, "Segment is held by another worker, skipping");
                    report.failures.push(SegmentFailure {
                        segment_id: segment_id.clone(),
                        error: RunError::new(RunErrorKind::SegmentBusy(segment_id)).into(),
                    });
                    continue;
                }
                (entry, Some(lease)) => (entry, lease),
            };

            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let slot = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                slot = self.throttle.acquire_slot() => slot?,
            };

            let (job, start) = match entry {
                Entry::Reattach(job) => {
                    report.reattached += 1;
                    (job, Start::Poll)
                }
                Entry::Refetch(job) => {
                    report.refetched += 1;
                    (job, Start::Fetch)
                }
                Entry::Submit | Entry::Busy => {
                    let job = {
                        let mut run = shared.lock().await;
                        match run.begin_job(&segment_id) {
                            Ok(job) => {
                                self.store.save(&run).await?;
                                job
                            }
                            Err(e) => {
                                report.failures.push(SegmentFailure {
                                    segment_id,
                                    error: e.into(),
                                });
                                continue;
                            }
                        }
                    };
                    let ticket = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            self.abandon(&shared, job).await?;
                            report.cancelled = true;
                            break;
                        }
                        ticket = self.throttle.admit() => ticket,
                    };
                    report.submitted += 1;
                    (job, Start::Submit(ticket))
                }
            };

            let worker = self.clone();
            let task_run = shared.clone();
            let token = cancel.clone();
            let handle = tasks.spawn(async move {
                worker
                    .drive(task_run, segment, job, start, token, slot, lease)
                    .await
            });
            spawned.insert(handle.id(), segment_id);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SegmentOutcome {
                    result: Ok(()), ..
                }) => report.completed += 1,
                Ok(SegmentOutcome {
                    segment_id,
                    result: Err(error),
                }) => report.failures.push(SegmentFailure { segment_id, error }),
                Err(e) => {
                    let segment_id = spawned.get(&e.id()).cloned().unwrap_or_default();
                    warn!(segment_id = %segment_id, error = %e, "Segment worker stopped abnormally");
                    report.failures.push(SegmentFailure {
                        segment_id: segment_id.clone(),
                        error: RunError::new(RunErrorKind::Failed {
                            run_id: run_id.to_string(),
                            reason: format!("worker for {} stopped: {}", segment_id, e),
                        })
                        .into(),
                    });
                }
            }
        }
        report.cancelled |= cancel.is_cancelled();

        let run = Arc::try_unwrap(shared)
            .map(Mutex::into_inner)
            .map_err(|_| {
                RunError::new(RunErrorKind::Failed {
                    run_id: run_id.to_string(),
                    reason: "run state still shared after generation".to_string(),
                })
            })?;
        self.store.save(&run).await?;

        info!(
            submitted = report.submitted,
            reattached = report.reattached,
            refetched = report.refetched,
            completed = report.completed,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "Generation pass finished"
        );
        Ok(report.into_report(run))
    }

    /// Decides how each missing segment is picked up and takes its lease.
    fn recover(
        &self,
        run: &mut RunState,
    ) -> ReelsmithResult<Vec<(ClipSegment, Entry, Option<SegmentLease>)>> {
        let run_id = *run.run_id();
        let missing: Vec<ClipSegment> = run.missing_segments().into_iter().cloned().collect();
        let mut plan = Vec::with_capacity(missing.len());

        for segment in missing {
            let Some(lease) = self
                .leases
                .try_acquire(format!("{}/{}", run_id, segment.id()))
            else {
                plan.push((segment, Entry::Busy, None));
                continue;
            };

            let entry = match run.jobs().get(segment.id()).cloned() {
                Some(job) if job.status().is_active() && job.is_acknowledged() => {
                    info!(
                        segment_id = %segment.id(),
                        provider_job_id = ?job.provider_job_id(),
                        "Re-attaching to acknowledged job"
                    );
                    Entry::Reattach(job)
                }
                Some(mut job) if job.status().is_active() => {
                    warn!(segment_id = %segment.id(), "Job was never acknowledged, resubmitting");
                    job.mark_failed(FailureReason::Interrupted)?;
                    run.update_job(job)?;
                    Entry::Submit
                }
                Some(job)
                    if *job.status() == GenerationStatus::Ready
                        && job.result_locator().is_some() =>
                {
                    debug!(segment_id = %segment.id(), "Job is ready, fetching result");
                    Entry::Refetch(job)
                }
                _ => Entry::Submit,
            };
            plan.push((segment, entry, Some(lease)));
        }
        Ok(plan)
    }

    #[instrument(skip_all, fields(segment_id = %segment.id()))]
    #[allow(clippy::too_many_arguments)]
    async fn drive(
        self,
        shared: SharedRun,
        segment: ClipSegment,
        mut job: GenerationJob,
        start: Start,
        cancel: CancellationToken,
        _slot: ThrottleSlot,
        _lease: SegmentLease,
    ) -> SegmentOutcome {
        let deadline = Instant::now() + self.profile.max_wait();
        let result = match self
            .run_job(&shared, &segment, &mut job, start, deadline, &cancel)
            .await
        {
            Ok(()) => Ok(()),
            Err(abort) => Err(self.settle(&shared, &mut job, abort).await),
        };
        SegmentOutcome {
            segment_id: segment.id().clone(),
            result,
        }
    }

    async fn run_job(
        &self,
        shared: &SharedRun,
        segment: &ClipSegment,
        job: &mut GenerationJob,
        start: Start,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), Abort> {
        let requested = self
            .profile
            .request_duration(*segment.target_duration_seconds());

        match start {
            Start::Submit(ticket) => {
                let payload = PromptPayload::for_segment(
                    segment,
                    requested,
                    self.profile.negative_prompt.as_deref(),
                );
                self.submit(shared, job, &payload, ticket, deadline, cancel)
                    .await?;
                self.poll_until_ready(shared, job, deadline, cancel).await?;
            }
            Start::Poll => self.poll_until_ready(shared, job, deadline, cancel).await?,
            Start::Fetch => {}
        }
        self.fetch_artifact(shared, job, requested, cancel).await
    }

    async fn submit(
        &self,
        shared: &SharedRun,
        job: &mut GenerationJob,
        payload: &PromptPayload,
        ticket: SubmissionTicket,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), Abort> {
        let mut ticket = Some(ticket);
        loop {
            let current = match ticket.take() {
                Some(ticket) => ticket,
                None => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(job)),
                    ticket = self.throttle.admit() => ticket,
                },
            };

            match self.provider.submit(payload).await {
                Ok(provider_job_id) => {
                    current.accepted();
                    info!(provider_job_id = %provider_job_id, "Provider accepted job");
                    job.record_submission(provider_job_id)
                        .map_err(Abort::internal)?;
                    self.commit(shared, job, true)
                        .await
                        .map_err(Abort::internal)?;
                    return Ok(());
                }
                Err(error) if is_transient(&error) => {
                    drop(current);
                    self.retry_after(shared, job, error, deadline, cancel)
                        .await?;
                }
                Err(error) => {
                    warn!(error = %error, "Provider rejected job");
                    let reason = error.to_string();
                    return Err(Abort::new(
                        FailureReason::Rejected {
                            message: reason.clone(),
                        },
                        GenerationError::new(GenerationErrorKind::Rejected {
                            segment_id: job.segment_id().clone(),
                            reason,
                        }),
                    ));
                }
            }
        }
    }

    async fn poll_until_ready(
        &self,
        shared: &SharedRun,
        job: &mut GenerationJob,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), Abort> {
        let Some(provider_job_id) = job.provider_job_id().clone() else {
            return Err(Abort::internal(RunError::new(RunErrorKind::JobNotReady(
                job.segment_id().clone(),
            ))));
        };
        let interval = self.profile.poll_interval();

        loop {
            if Instant::now() >= deadline {
                return Err(self.timed_out(job));
            }

            let before = *job.status();
            match self.provider.poll(&provider_job_id).await {
                Ok(ProviderStatus::Pending) => {
                    job.record_poll().map_err(Abort::internal)?;
                    self.commit(shared, job, before != *job.status())
                        .await
                        .map_err(Abort::internal)?;
                }
                Ok(ProviderStatus::Ready { locator }) => {
                    job.record_poll().map_err(Abort::internal)?;
                    job.mark_ready(locator).map_err(Abort::internal)?;
                    self.commit(shared, job, true)
                        .await
                        .map_err(Abort::internal)?;
                    debug!(provider_job_id = %provider_job_id, "Job is ready");
                    return Ok(());
                }
                Ok(ProviderStatus::Failed { reason }) => {
                    warn!(provider_job_id = %provider_job_id, reason = %reason, "Provider failed job");
                    return Err(Abort::new(
                        FailureReason::ProviderFailed {
                            message: reason.clone(),
                        },
                        GenerationError::new(GenerationErrorKind::Rejected {
                            segment_id: job.segment_id().clone(),
                            reason,
                        }),
                    ));
                }
                Err(error) if is_transient(&error) => {
                    self.retry_after(shared, job, error, deadline, cancel)
                        .await?;
                    continue;
                }
                Err(error) => {
                    return Err(Abort::new(
                        FailureReason::ProviderFailed {
                            message: error.to_string(),
                        },
                        error,
                    ));
                }
            }

            if cancel.is_cancelled() {
                return Err(cancelled(job));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            pause(job, interval.min(remaining), cancel).await?;
        }
    }

    /// Downloads a READY job's result, stores it and attaches the artifact.
    async fn fetch_artifact(
        &self,
        shared: &SharedRun,
        job: &mut GenerationJob,
        requested_seconds: u32,
        cancel: &CancellationToken,
    ) -> Result<(), Abort> {
        let Some(locator) = job.result_locator().clone() else {
            return Err(Abort::internal(RunError::new(RunErrorKind::JobNotReady(
                job.segment_id().clone(),
            ))));
        };
        let policy = self.profile.retry_policy();
        let fetch_failed = |error: ReelsmithError| {
            Abort::new(
                FailureReason::Fetch {
                    message: error.to_string(),
                },
                error,
            )
        };

        let mut attempts = 0;
        let media = loop {
            match self.provider.fetch(&locator).await {
                Ok(media) => break media,
                Err(error) if is_transient(&error) && policy.allows(attempts) => {
                    attempts += 1;
                    let delay = policy.delay_for_retry(attempts).unwrap_or_default();
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Fetch failed, retrying"
                    );
                    pause(job, delay, cancel).await?;
                }
                Err(error) => return Err(fetch_failed(error)),
            }
        };

        let stored = self
            .storage
            .store(&media.bytes, &media.mime_type)
            .await
            .map_err(fetch_failed)?;
        let path = self
            .storage
            .resolve(&stored.locator)
            .await
            .map_err(fetch_failed)?;
        let actual = self
            .probe
            .duration_seconds(&path)
            .await
            .map_err(fetch_failed)?;

        let drift = (actual - f64::from(requested_seconds)).abs();
        if drift > self.profile.duration_tolerance_secs {
            warn!(
                requested_seconds,
                actual_seconds = actual,
                "Clip length differs from the requested length"
            );
        }

        let artifact =
            ClipArtifact::from_ready_job(job, stored, actual).map_err(Abort::internal)?;
        let mut run = shared.lock().await;
        run.attach_artifact(artifact).map_err(Abort::internal)?;
        self.store.save(&run).await.map_err(Abort::internal)?;
        info!(actual_seconds = actual, "Segment artifact attached");
        Ok(())
    }

    /// Records a retry and waits out its backoff.
    async fn retry_after(
        &self,
        shared: &SharedRun,
        job: &mut GenerationJob,
        error: ReelsmithError,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), Abort> {
        let policy = self.profile.retry_policy();
        if !policy.allows(*job.retry_count()) {
            warn!(retries = *job.retry_count(), error = %error, "Retry budget spent");
            let last_error = error.to_string();
            return Err(Abort::new(
                FailureReason::RetriesExhausted {
                    message: last_error.clone(),
                },
                GenerationError::new(GenerationErrorKind::RetriesExhausted {
                    segment_id: job.segment_id().clone(),
                    retries: *job.retry_count(),
                    last_error,
                }),
            ));
        }

        let retry = job.record_retry().map_err(Abort::internal)?;
        self.commit(shared, job, true)
            .await
            .map_err(Abort::internal)?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let delay = policy.delay_for_retry(retry).unwrap_or_default().min(remaining);
        warn!(
            retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Transient provider error, backing off"
        );
        pause(job, delay, cancel).await?;

        if Instant::now() >= deadline {
            return Err(self.timed_out(job));
        }
        Ok(())
    }

    /// Marks the job failed unless it already ended, and returns the error.
    async fn settle(
        &self,
        shared: &SharedRun,
        job: &mut GenerationJob,
        abort: Abort,
    ) -> ReelsmithError {
        if let Some(reason) = abort.reason {
            if !job.status().is_terminal() {
                warn!(reason = %reason, "Generation job failed");
                if job.mark_failed(reason).is_ok() {
                    if let Err(e) = self.commit(shared, job, true).await {
                        warn!(error = %e, "Failed to persist job failure");
                    }
                }
            }
        }
        abort.error
    }

    /// Fails a job registered but never handed to the provider.
    async fn abandon(&self, shared: &SharedRun, mut job: GenerationJob) -> ReelsmithResult<()> {
        job.mark_failed(FailureReason::Cancelled)?;
        self.commit(shared, &job, true).await
    }

    async fn commit(
        &self,
        shared: &SharedRun,
        job: &GenerationJob,
        persist: bool,
    ) -> ReelsmithResult<()> {
        let mut run = shared.lock().await;
        run.update_job(job.clone())?;
        if persist {
            self.store.save(&run).await?;
        }
        Ok(())
    }

    fn timed_out(&self, job: &GenerationJob) -> Abort {
        let waited_secs = self.profile.max_wait().as_secs();
        warn!(waited_secs, "Job exceeded its maximum wait");
        Abort::new(
            FailureReason::Timeout,
            GenerationError::new(GenerationErrorKind::Timeout {
                segment_id: job.segment_id().clone(),
                waited_secs,
            }),
        )
    }
}

fn cancelled(job: &GenerationJob) -> Abort {
    Abort::new(
        FailureReason::Cancelled,
        GenerationError::new(GenerationErrorKind::Cancelled(job.segment_id().clone())),
    )
}

/// Sleeps unless cancelled first.
async fn pause(
    job: &GenerationJob,
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), Abort> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled(job)),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

#[derive(Default)]
struct Counts {
    submitted: usize,
    reattached: usize,
    refetched: usize,
    completed: usize,
    failures: Vec<SegmentFailure>,
    cancelled: bool,
}

impl Counts {
    fn into_report(self, run: RunState) -> GenerationReport {
        GenerationReport {
            run,
            submitted: self.submitted,
            reattached: self.reattached,
            refetched: self.refetched,
            completed: self.completed,
            failures: self.failures,
            cancelled: self.cancelled,
        }
    }
}
