//! Tests for the HTTP provider adapter.

use reelsmith_core::PromptPayload;
use reelsmith_error::{ProviderErrorKind, RetryableError};
use reelsmith_interface::{MediaProvider, ProviderStatus};
use reelsmith_providers::{CreateJobRequest, HttpMediaProvider, JobStatusResponse};
use reelsmith_throttle::ProviderProfile;

fn status(json: &str) -> JobStatusResponse {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_status_words_map_to_provider_status() {
    assert_eq!(
        status(r#"{"status": "queued"}"#).into_status("j").unwrap(),
        ProviderStatus::Pending
    );
    assert_eq!(
        status(r#"{"status": "completed", "result_url": "https://cdn/x.mp4"}"#)
            .into_status("j")
            .unwrap(),
        ProviderStatus::Ready {
            locator: "https://cdn/x.mp4".to_string()
        }
    );
    assert_eq!(
        status(r#"{"status": "failed", "error": "content policy"}"#)
            .into_status("j")
            .unwrap(),
        ProviderStatus::Failed {
            reason: "content policy".to_string()
        }
    );
}

#[test]
fn test_completed_without_result_is_invalid() {
    let err = status(r#"{"status": "completed"}"#)
        .into_status("job-9")
        .unwrap_err();
    assert!(matches!(err.kind, ProviderErrorKind::InvalidResponse(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_unknown_status_is_invalid() {
    let err = status(r#"{"status": "exploded"}"#)
        .into_status("job-9")
        .unwrap_err();
    assert!(err.to_string().contains("exploded"));
}

#[test]
fn test_http_statuses_are_classified() {
    for code in [408, 429, 500, 502, 503, 504] {
        assert!(
            ProviderErrorKind::from_status(code, "x").is_retryable(),
            "{} should be retried",
            code
        );
    }
    for code in [400, 401, 403, 404, 422, 451] {
        assert!(
            !ProviderErrorKind::from_status(code, "x").is_retryable(),
            "{} should not be retried",
            code
        );
    }
}

#[test]
fn test_create_request_carries_composed_prompt() {
    let payload = PromptPayload {
        segment_id: "seg-004".to_string(),
        visual_directive: "rain on a window".to_string(),
        audio_directive: "distant thunder".to_string(),
        narration: "It rained for a week.".to_string(),
        requested_seconds: 8,
        negative_prompt: Some("text".to_string()),
    };

    let body = serde_json::to_value(CreateJobRequest::from(&payload)).unwrap();
    assert_eq!(body["seconds"], 8);
    assert_eq!(body["client_reference"], "seg-004");
    assert_eq!(body["negative_prompt"], "text");
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("rain on a window"));
    assert!(prompt.contains("Audio direction: distant thunder"));
}

#[test]
fn test_profile_without_base_url_is_rejected() {
    let profile = ProviderProfile::new("veo");
    let err = HttpMediaProvider::from_profile(&profile).unwrap_err();
    assert_eq!(err.reason_code(), "config");
}

#[test]
fn test_profile_with_missing_key_variable_is_rejected() {
    let mut profile = ProviderProfile::new("veo");
    profile.base_url = Some("https://video.example/v1".to_string());
    profile.api_key_env = Some("REELSMITH_TEST_UNSET_KEY_4F1C".to_string());

    let err = HttpMediaProvider::from_profile(&profile).unwrap_err();
    assert_eq!(err.reason_code(), "config");
    assert!(err.to_string().contains("REELSMITH_TEST_UNSET_KEY_4F1C"));
}

#[test]
fn test_profile_builds_client() {
    let mut profile = ProviderProfile::new("sora");
    profile.base_url = Some("https://video.example/v1/".to_string());

    let provider = HttpMediaProvider::from_profile(&profile).unwrap();
    assert_eq!(provider.name(), "sora");
    assert_eq!(provider.base_url(), "https://video.example/v1");
}

#[tokio::test]
async fn test_unreachable_service_is_transient() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut profile = ProviderProfile::new("local");
    profile.base_url = Some(format!("http://127.0.0.1:{}", port));
    let provider = HttpMediaProvider::from_profile(&profile).unwrap();

    let err = provider.poll("job-1").await.unwrap_err();
    assert_eq!(err.reason_code(), "provider_transient");
}
