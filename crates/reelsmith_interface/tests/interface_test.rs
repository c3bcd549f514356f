//! Tests for collaborator value types.

use reelsmith_interface::{ClipFit, ProviderStatus};

#[test]
fn test_provider_status_terminality() {
    assert!(!ProviderStatus::Pending.is_terminal());
    assert!(
        ProviderStatus::Ready {
            locator: "https://cdn/clip.mp4".to_string()
        }
        .is_terminal()
    );
    assert!(
        ProviderStatus::Failed {
            reason: "policy".to_string()
        }
        .is_terminal()
    );
}

#[test]
fn test_provider_status_serialization() {
    let ready = ProviderStatus::Ready {
        locator: "blob://1".to_string(),
    };
    let json = serde_json::to_value(&ready).unwrap();
    assert_eq!(json["state"], "ready");
    assert_eq!(json["locator"], "blob://1");
    assert_eq!(ProviderStatus::Pending.to_string(), "pending");
}

#[test]
fn test_clip_fit_serialization() {
    let fit: ClipFit = serde_json::from_str(r#"{"mode":"stretch","factor":1.25}"#).unwrap();
    assert_eq!(fit, ClipFit::Stretch { factor: 1.25 });
}
