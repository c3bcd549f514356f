//! Scripted media provider and in-memory collaborators.

use async_trait::async_trait;
use reelsmith_core::{PromptPayload, StoredMedia};
use reelsmith_error::{ProviderError, ProviderErrorKind, ReelsmithResult, StorageError, StorageErrorKind};
use reelsmith_interface::{ClipStorage, FetchedMedia, MediaProbe, MediaProvider, MuxPlan, Muxer, ProviderStatus};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::time::Instant;

/// What the provider does; may be changed between runs.
#[derive(Debug, Default, Clone)]
pub struct ProviderScript {
    /// Submissions failing with a transient error before any succeeds
    pub transient_submits: usize,
    /// Segments whose submissions are refused
    pub reject: HashSet<String>,
    /// Segments whose jobs never finish
    pub stall: HashSet<String>,
    /// Pending answers before a job reports ready
    pub polls_until_ready: u32,
}

#[derive(Debug, Default)]
struct ProviderLog {
    submits: Vec<(String, Instant)>,
    polls: usize,
    jobs: HashMap<String, (String, u32)>,
    next_job: usize,
    in_flight: usize,
    peak_in_flight: usize,
}

/// Media provider following a [`ProviderScript`] and recording every call.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<ProviderScript>,
    log: Mutex<ProviderLog>,
}

impl MockProvider {
    /// Creates a provider with the given script.
    pub fn new(script: ProviderScript) -> Self {
        Self {
            script: Mutex::new(script),
            log: Mutex::new(ProviderLog::default()),
        }
    }

    /// Replaces the script.
    pub fn set_script(&self, script: ProviderScript) {
        *self.script.lock().unwrap() = script;
    }

    /// Every submit call so far, in order.
    pub fn submits(&self) -> Vec<(String, Instant)> {
        self.log.lock().unwrap().submits.clone()
    }

    /// Submit calls for one segment.
    pub fn submits_for(&self, segment_id: &str) -> usize {
        self.submits()
            .iter()
            .filter(|(id, _)| id == segment_id)
            .count()
    }

    /// Poll calls so far.
    pub fn polls(&self) -> usize {
        self.log.lock().unwrap().polls
    }

    /// Most accepted jobs that were unfinished at once.
    pub fn peak_in_flight(&self) -> usize {
        self.log.lock().unwrap().peak_in_flight
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, payload: &PromptPayload) -> ReelsmithResult<String> {
        let segment_id = payload.segment_id.clone();
        let mut script = self.script.lock().unwrap();
        let mut log = self.log.lock().unwrap();
        log.submits.push((segment_id.clone(), Instant::now()));

        if script.transient_submits > 0 {
            script.transient_submits -= 1;
            return Err(ProviderError::new(ProviderErrorKind::Unavailable(
                "503 Service Unavailable".to_string(),
            ))
            .into());
        }
        if script.reject.contains(&segment_id) {
            return Err(ProviderError::new(ProviderErrorKind::Rejected(
                "content policy".to_string(),
            ))
            .into());
        }

        log.next_job += 1;
        let job_id = format!("job-{}", log.next_job);
        log.jobs.insert(job_id.clone(), (segment_id, 0));
        log.in_flight += 1;
        log.peak_in_flight = log.peak_in_flight.max(log.in_flight);
        Ok(job_id)
    }

    async fn poll(&self, job_id: &str) -> ReelsmithResult<ProviderStatus> {
        let script = self.script.lock().unwrap();
        let mut log = self.log.lock().unwrap();
        log.polls += 1;

        // Jobs accepted before a restart are unknown here but still exist.
        let (segment_id, polls) = log
            .jobs
            .entry(job_id.to_string())
            .or_insert_with(|| (String::new(), 0));
        *polls += 1;
        if script.stall.contains(segment_id.as_str()) || *polls <= script.polls_until_ready {
            return Ok(ProviderStatus::Pending);
        }
        Ok(ProviderStatus::Ready {
            locator: format!("mock://{}", job_id),
        })
    }

    async fn fetch(&self, locator: &str) -> ReelsmithResult<FetchedMedia> {
        let mut log = self.log.lock().unwrap();
        log.in_flight = log.in_flight.saturating_sub(1);
        Ok(FetchedMedia::new(locator.as_bytes().to_vec(), "video/mp4"))
    }
}

/// Clip storage kept in memory.
#[derive(Debug, Default)]
pub struct MemoryClips {
    clips: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ClipStorage for MemoryClips {
    async fn store(&self, data: &[u8], mime_type: &str) -> ReelsmithResult<StoredMedia> {
        let mut clips = self.clips.lock().unwrap();
        let locator = format!("clip-{}", clips.len() + 1);
        clips.insert(locator.clone(), data.to_vec());
        Ok(StoredMedia {
            locator: locator.clone(),
            checksum: locator,
            size_bytes: data.len() as u64,
            mime_type: mime_type.to_string(),
        })
    }

    async fn retrieve(&self, media: &StoredMedia) -> ReelsmithResult<Vec<u8>> {
        self.clips
            .lock()
            .unwrap()
            .get(&media.locator)
            .cloned()
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(media.locator.clone())).into()
            })
    }

    async fn resolve(&self, locator: &str) -> ReelsmithResult<PathBuf> {
        Ok(PathBuf::from("/clips").join(locator))
    }
}

/// Probe reporting the same duration for every file.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub f64);

#[async_trait]
impl MediaProbe for FixedProbe {
    async fn duration_seconds(&self, _path: &Path) -> ReelsmithResult<f64> {
        Ok(self.0)
    }
}

/// Muxer that records plans instead of running a tool.
#[derive(Debug, Default)]
pub struct CountingMuxer {
    plans: Mutex<Vec<MuxPlan>>,
}

impl CountingMuxer {
    /// Plans received so far.
    pub fn calls(&self) -> usize {
        self.plans.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for CountingMuxer {
    async fn mux(&self, plan: &MuxPlan) -> ReelsmithResult<PathBuf> {
        self.plans.lock().unwrap().push(plan.clone());
        Ok(plan.output.clone())
    }
}
