use quake_core::errors::{ErrorInfo, QuakeError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("catalog", "17")
        .with_hint("check the event-set file")
}

#[test]
fn catalog_error_surface() {
    let err = QuakeError::Catalog(sample_info("C001", "non-finite magnitude"));
    assert_eq!(err.info().code, "C001");
    assert!(err.info().context.contains_key("catalog"));
}

#[test]
fn stream_error_surface() {
    let err = QuakeError::Stream(sample_info("S001", "truncated frame"));
    assert_eq!(err.info().code, "S001");
    assert_eq!(err.info().hint.as_deref(), Some("check the event-set file"));
}

#[test]
fn share_error_surface() {
    let err = QuakeError::Share(sample_info("SH001", "incompatible payload"));
    assert_eq!(err.info().code, "SH001");
}

#[test]
fn display_includes_context_and_hint() {
    let err = QuakeError::Eval(sample_info("E001", "phase violation"));
    let rendered = err.to_string();
    assert!(rendered.contains("phase violation"));
    assert!(rendered.contains("catalog=17"));
    assert!(rendered.contains("check the event-set file"));
}

#[test]
fn errors_round_trip_through_serde() {
    let err = QuakeError::Report(sample_info("R001", "figure dir unwritable"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Report\""));
    let back: QuakeError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, err);
}
