use std::error::Error as _;

use sql_handle::prelude::*;
use sql_handle::test_utils::{FailurePoint, InMemoryDriver};

fn connected() -> Connection<InMemoryDriver> {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.connect(ConnectOptions::new("localhost", "app", "secret", "shop"))
        .expect("in-memory connect");
    conn
}

#[test]
fn execute_failure_lists_the_bound_parameters() {
    let mut conn = connected();
    conn.driver_mut()
        .fail_next(FailurePoint::Execute, 1062, "Duplicate entry 'ann' for key 'name'");
    let err = conn
        .query(
            "INSERT INTO people (name, bio) VALUES (?, ?)",
            &[
                Parameter::string("ann"),
                Parameter::string(format!("line one\r\n\tline two {}", "x".repeat(200))),
            ],
        )
        .unwrap_err();

    assert!(matches!(err, SqlHandleError::Query { code: 1062, .. }));
    assert_eq!(err.code(), Some(1062));

    let message = err.to_string();
    assert!(message.starts_with("error in query: Duplicate entry 'ann' for key 'name'"));
    assert!(
        message.contains("\n\tparameters given:\n\t - s: 'ann'\n\t - s: 'line one line two xxx")
    );
    let rendered = message
        .lines()
        .find(|l| l.contains("line one"))
        .expect("second parameter rendered");
    // tab, " - s: '", 100 characters, "'"
    assert_eq!(rendered.chars().count(), 1 + 7 + 100 + 1);
    assert!(message.ends_with("\n\t"));

    let source = err.source().expect("driver error kept");
    assert!(source.to_string().contains("(code 1062)"));
}

#[test]
fn prepare_and_bind_failures_get_their_own_variants() {
    let mut conn = connected();

    conn.driver_mut()
        .fail_next(FailurePoint::Prepare, 1064, "You have an error in your SQL syntax");
    let err = conn.query("SELEC 1", &[]).unwrap_err();
    assert!(matches!(err, SqlHandleError::Prepare { code: 1064, .. }));
    assert_eq!(
        err.to_string(),
        "unable to prepare query: You have an error in your SQL syntax"
    );

    conn.driver_mut()
        .fail_next(FailurePoint::Bind, 2031, "No data supplied for parameters");
    let err = conn
        .query("SELECT ?", &[Parameter::double(0.5)])
        .unwrap_err();
    assert!(matches!(err, SqlHandleError::Bind { code: 2031, .. }));
    assert!(err.to_string().contains(" - d: '0.5'"));
}

#[test]
fn failed_statements_do_not_count_as_queries() {
    let mut conn = connected();
    conn.driver_mut()
        .fail_next(FailurePoint::Execute, 1213, "Deadlock found");
    assert!(conn.query("DELETE FROM t", &[]).is_err());
    assert_eq!(conn.total_queries(), 0);
    assert_eq!(conn.errno().unwrap(), 1213);

    conn.query("DELETE FROM t", &[]).unwrap();
    assert_eq!(conn.total_queries(), 1);
    assert_eq!(conn.errno().unwrap(), 0);
}

#[test]
fn invalid_parameter_tags_never_reach_the_driver() {
    let err = Parameter::new("x", 1).unwrap_err();
    assert!(matches!(err, SqlHandleError::InvalidParameterType(ref t) if t == "x"));
    assert_eq!(err.to_string(), "type must be i, s, d or b. 'x' given");
    assert_eq!(err.code(), None);
}
