//! Tests for error classification and conversion.

use reelsmith_error::{
    AssemblyError, AssemblyErrorKind, GenerationError, GenerationErrorKind, ProviderError,
    ProviderErrorKind, ReelsmithError, ReelsmithErrorKind, ReelsmithResult, RetryableError,
};

#[test]
fn test_transient_statuses_are_retryable() {
    for status in [408, 429, 500, 502, 503, 504] {
        let err = ProviderError::new(ProviderErrorKind::Http {
            status_code: status,
            message: "busy".to_string(),
        });
        assert!(err.is_retryable(), "status {} should retry", status);
    }
}

#[test]
fn test_rejections_are_not_retryable() {
    let rejected = ProviderError::new(ProviderErrorKind::Rejected("policy".to_string()));
    let malformed = ProviderError::new(ProviderErrorKind::Malformed("bad json".to_string()));
    assert!(!rejected.is_retryable());
    assert!(!malformed.is_retryable());
}

#[test]
fn test_from_status_classification() {
    assert!(matches!(
        ProviderErrorKind::from_status(429, "slow down"),
        ProviderErrorKind::RateLimited(_)
    ));
    assert!(matches!(
        ProviderErrorKind::from_status(422, "missing prompt"),
        ProviderErrorKind::Malformed(_)
    ));
    assert!(matches!(
        ProviderErrorKind::from_status(403, "content policy"),
        ProviderErrorKind::Rejected(_)
    ));
    assert!(ProviderErrorKind::from_status(503, "down").is_retryable());
}

#[test]
fn test_location_is_captured() {
    let err = AssemblyError::new(AssemblyErrorKind::NoSegments);
    assert!(err.file.ends_with("error_test.rs"));
    assert!(err.line > 0);
}

#[test]
fn test_question_mark_conversion() {
    fn fails() -> ReelsmithResult<()> {
        Err(GenerationError::new(GenerationErrorKind::Cancelled(
            "seg-001".to_string(),
        )))?
    }

    let err = fails().unwrap_err();
    assert!(matches!(err.kind(), ReelsmithErrorKind::Generation(_)));
    assert_eq!(err.reason_code(), "cancelled");
}

#[test]
fn test_reason_codes() {
    let timeout: ReelsmithError = GenerationError::new(GenerationErrorKind::Timeout {
        segment_id: "seg-001".to_string(),
        waited_secs: 600,
    })
    .into();
    assert_eq!(timeout.reason_code(), "timeout");

    let missing: ReelsmithError =
        AssemblyError::new(AssemblyErrorKind::MissingArtifact("seg-002".to_string())).into();
    assert_eq!(missing.reason_code(), "assembly_precondition");

    let transient: ReelsmithError =
        ProviderError::new(ProviderErrorKind::RateLimited("429".to_string())).into();
    assert_eq!(transient.reason_code(), "provider_transient");
}
