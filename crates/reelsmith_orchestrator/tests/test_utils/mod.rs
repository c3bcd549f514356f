//! Test utilities for orchestrator tests.
//!
//! Scripted provider plus in-memory storage, probe and muxer.

pub mod mock_provider;

use reelsmith_core::{RunInputs, ScriptBeat, SuspenseTag};
use reelsmith_orchestrator::RunServices;
use reelsmith_throttle::ProviderProfile;
use std::sync::Arc;

#[allow(unused_imports)]
pub use mock_provider::{CountingMuxer, FixedProbe, MemoryClips, MockProvider, ProviderScript};

/// Narration of `count` distinct words.
pub fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Beats of 20 words each; at the default reading rate each fills one
/// eight-second segment on its own.
pub fn beats(count: u32) -> Vec<ScriptBeat> {
    (1..=count)
        .map(|ordinal| ScriptBeat::new(ordinal, words(20), SuspenseTag::Build))
        .collect()
}

/// Inputs for a run of `count` segments.
pub fn inputs(count: u32) -> RunInputs {
    RunInputs::new(beats(count), "narration.mp3").with_output_name("story")
}

/// Profile with no cooldown, a 10 s poll interval and two slots.
pub fn profile() -> ProviderProfile {
    ProviderProfile {
        max_concurrent: 2,
        poll_interval_secs: 10.0,
        max_wait_secs: 600.0,
        ..ProviderProfile::new("mock")
    }
}

/// Services around a mock provider and the given run store.
#[allow(dead_code)]
pub fn services(
    provider: Arc<MockProvider>,
    store: Arc<dyn reelsmith_interface::RunStore>,
    muxer: Arc<CountingMuxer>,
) -> RunServices {
    RunServices {
        provider,
        store,
        storage: Arc::new(MemoryClips::default()),
        probe: Arc::new(FixedProbe(8.0)),
        muxer,
    }
}
