use super::error::BrokerError;
use super::logging;

#[test]
fn logging_init_accepts_levels() {
    logging::init("info");
    logging::init("debug");
    logging::init("nonsense");
}

#[test]
fn unknown_levels_fall_back_to_info() {
    assert_eq!(logging::normalize_level("WARNING"), "warn");
    assert_eq!(logging::normalize_level(" trace "), "trace");
    assert_eq!(logging::normalize_level("loud"), "info");
}

#[test]
fn duplicates_are_notices_not_errors() {
    let pending = BrokerError::AlreadyPending {
        topic: "General".to_string(),
    };
    assert!(pending.is_duplicate());
    assert!(pending.is_reportable());
    assert!(!BrokerError::AuthorizationDenied.is_duplicate());
}

#[test]
fn connection_loss_is_never_reported() {
    assert!(!BrokerError::ConnectionLost("reset".to_string()).is_reportable());
    assert!(BrokerError::MalformedFrame("eof".to_string()).is_reportable());
}

#[test]
fn error_text_names_the_topic() {
    let err = BrokerError::NotAMember {
        topic: "General".to_string(),
    };
    assert_eq!(err.to_string(), "Not subscribed to channel General");
}
