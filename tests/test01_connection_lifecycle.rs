use sql_handle::prelude::*;
use sql_handle::test_utils::{FailurePoint, InMemoryDriver};

fn options() -> ConnectOptions {
    ConnectOptions::new("db.internal", "app", "secret", "shop")
}

#[test]
fn every_operation_needs_a_connection() {
    let mut conn = Connection::new(InMemoryDriver::new());
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    assert!(conn.reconnect().unwrap_err().is_not_connected());
    assert!(conn.close().unwrap_err().is_not_connected());
    assert!(conn.autocommit(false).unwrap_err().is_not_connected());
    assert!(conn.begin_transaction().unwrap_err().is_not_connected());
    assert!(conn.commit().unwrap_err().is_not_connected());
    assert!(conn.rollback().unwrap_err().is_not_connected());
    assert!(conn.query("SELECT 1", &[]).unwrap_err().is_not_connected());
    assert!(conn.execute(&[Parameter::int(1)]).unwrap_err().is_not_connected());
    assert!(conn.ping().unwrap_err().is_not_connected());
    assert!(conn.insert_id().unwrap_err().is_not_connected());
    assert!(conn.affected_rows().unwrap_err().is_not_connected());
    assert!(conn.client_info().unwrap_err().is_not_connected());
    assert!(conn.host_info().unwrap_err().is_not_connected());
    assert!(conn.proto_info().unwrap_err().is_not_connected());
    assert!(conn.server_info().unwrap_err().is_not_connected());
    assert!(conn.errno().unwrap_err().is_not_connected());
    assert!(conn.errstr().unwrap_err().is_not_connected());
    assert!(conn.size(None).unwrap_err().is_not_connected());

    // escape and the counters never need a session
    assert_eq!(conn.escape("it's"), "it\\'s");
    assert_eq!(conn.total_queries(), 0);
    assert_eq!(conn.db_time_secs(), 0.0);
    assert_eq!(conn.driver().prepare_count(), 0);
}

#[test]
fn connect_records_metadata_and_close_clears_it() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.connect(options())?;
    assert!(conn.is_connected());
    assert_eq!(conn.client_info()?, "in-memory client");
    assert_eq!(conn.host_info()?, "in-memory host");
    assert_eq!(conn.server_info()?, "in-memory server");
    assert_eq!(conn.proto_info()?, 10);
    conn.ping()?;

    conn.query("SELECT 1", &[])?;
    conn.close()?;
    assert!(!conn.is_connected());
    assert!(!conn.driver().is_connected());
    assert_eq!(conn.cached_sql(), None);
    assert!(conn.client_info().unwrap_err().is_not_connected());
    assert!(conn.close().unwrap_err().is_not_connected());
    Ok(())
}

#[test]
fn failed_connect_is_a_connection_error() {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.driver_mut()
        .fail_next(FailurePoint::Connect, 1045, "Access denied for user 'app'");
    let err = conn.connect(options()).unwrap_err();
    assert!(matches!(err, SqlHandleError::Connection { code: 1045, .. }));
    assert!(err.to_string().contains("Access denied"));
    assert!(!conn.is_connected());

    // nothing was stored, so there is nothing to reconnect with
    assert!(conn.reconnect().unwrap_err().is_not_connected());
}

#[test]
fn rejected_charset_fails_the_connect() {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.driver_mut()
        .fail_next(FailurePoint::Charset, 2019, "Can't initialize character set klingon");
    let err = conn
        .connect(ConnectOptions::builder("h", "u", "p", "d").charset("klingon").finish())
        .unwrap_err();
    assert!(matches!(err, SqlHandleError::Connection { code: 2019, .. }));
    assert!(!conn.is_connected());
    assert!(!conn.driver().is_connected());
}

#[test]
fn reconnect_reuses_stored_options_and_drops_the_cache() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.connect(options())?;
    conn.query("INSERT INTO t VALUES (?)", &[Parameter::int(1)])?;
    assert!(conn.cached_sql().is_some());

    conn.reconnect()?;
    assert!(conn.is_connected());
    assert_eq!(conn.cached_sql(), None);
    assert!(matches!(
        conn.execute(&[Parameter::int(2)]),
        Err(SqlHandleError::StatementInvalid)
    ));

    conn.close()?;
    conn.reconnect()?;
    assert!(conn.is_connected());
    Ok(())
}

#[test]
fn transaction_failures_name_the_operation() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.connect(options())?;

    conn.autocommit(false)?;
    conn.begin_transaction()?;
    conn.commit()?;
    conn.rollback()?;
    assert_eq!(conn.driver().autocommit_calls(), &[false]);

    conn.driver_mut().fail_next(FailurePoint::Commit, 1205, "Lock wait timeout exceeded");
    let err = conn.commit().unwrap_err();
    assert!(matches!(err, SqlHandleError::Database { code: 1205, .. }));
    assert_eq!(
        err.to_string(),
        "unable to commit transaction: Lock wait timeout exceeded"
    );
    assert_eq!(conn.errno()?, 1205);
    assert_eq!(conn.errstr()?, "Lock wait timeout exceeded");

    conn.driver_mut().fail_next(FailurePoint::Ping, 2006, "MySQL server has gone away");
    let err = conn.ping().unwrap_err();
    assert!(err.to_string().starts_with("connection to database lost"));
    Ok(())
}

#[test]
fn counters_track_statements() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = Connection::new(InMemoryDriver::new());
    conn.connect(options())?;
    conn.query("CREATE TABLE t (a INT)", &[])?;
    conn.query("INSERT INTO t VALUES (?)", &[Parameter::int(1)])?;
    conn.execute(&[Parameter::int(2)])?;
    assert_eq!(conn.total_queries(), 3);
    assert!(conn.db_time() >= std::time::Duration::ZERO);
    Ok(())
}
