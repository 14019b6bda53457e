use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn from_lookup_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.board, Board::Web);
    assert_eq!(cfg.on_move_failure, MoveFailurePolicy::Keep);
    assert_eq!(
        cfg.timeouts,
        ClientTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("TASKBOARD_API_URL", "http://127.0.0.1:8080/"),
        ("TASKBOARD_BOARD", "tsd"),
        ("TASKBOARD_ON_MOVE_FAILURE", "rollback"),
        ("TASKBOARD_REQUEST_TIMEOUT_SECS", "5"),
        ("TASKBOARD_CONNECT_TIMEOUT_SECS", "2"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:8080");
    assert_eq!(cfg.board, Board::Tsd);
    assert_eq!(cfg.on_move_failure, MoveFailurePolicy::Rollback);
    assert_eq!(cfg.timeouts, ClientTimeouts { request_secs: 5, connect_secs: 2 });
}

#[test]
fn from_lookup_unparsable_timeouts_fall_back_to_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("TASKBOARD_REQUEST_TIMEOUT_SECS", "soon"),
        ("TASKBOARD_CONNECT_TIMEOUT_SECS", "-1"),
    ]))
    .unwrap();
    assert_eq!(cfg.timeouts, ClientTimeouts::default());
}

#[test]
fn from_lookup_unknown_board_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("TASKBOARD_BOARD", "ios")])).unwrap_err().to_string();
    assert!(err.contains("TASKBOARD_BOARD"));
    assert!(err.contains("ios"));
}

#[test]
fn from_lookup_unknown_policy_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("TASKBOARD_ON_MOVE_FAILURE", "retry")]))
        .unwrap_err()
        .to_string();
    assert!(err.contains("TASKBOARD_ON_MOVE_FAILURE"));
}
