use x_wininfo::{
    Connection, Error,
    stub::{StubConnector, StubTransport},
};

fn closed() -> Connection<StubConnector> {
    Connection::with_connector(StubConnector::new(StubTransport::new()))
}

#[test]
fn queries_fail_before_open() {
    let conn = closed();
    assert!(!conn.is_open());
    assert!(matches!(conn.try_get_windows(), Err(Error::NotOpen)));
    assert!(matches!(conn.get_focused_window(), Err(Error::NotOpen)));
    assert!(conn.connector().transport().calls().is_empty());
}

#[test]
fn queries_fail_after_close() {
    let mut conn = closed();
    conn.open(Some(":1")).unwrap();
    assert!(conn.is_open());
    assert_eq!(conn.try_get_windows().unwrap(), None);

    conn.close();
    assert!(!conn.is_open());
    assert!(matches!(conn.try_get_windows(), Err(Error::NotOpen)));
    assert!(matches!(conn.get_focused_window(), Err(Error::NotOpen)));
}

#[test]
fn close_is_idempotent() {
    let mut conn = closed();
    conn.close();
    conn.open(None).unwrap();
    conn.close();
    conn.close();
    assert!(!conn.is_open());
    assert_eq!(conn.connector().open_sessions(), 0);
}

#[test]
fn reopen_after_close() {
    let mut conn = closed();
    conn.open(None).unwrap();
    conn.close();
    conn.open(None).unwrap();
    assert!(conn.is_open());
    assert_eq!(conn.connector().connect_count(), 2);
    assert_eq!(conn.connector().open_sessions(), 1);
}

#[test]
fn open_while_open_is_rejected() {
    let mut conn = closed();
    conn.open(None).unwrap();
    assert!(matches!(conn.open(None), Err(Error::AlreadyOpen)));
    assert!(conn.is_open());
    assert_eq!(conn.connector().connect_count(), 1);
}

#[test]
fn unreachable_display_leaves_connection_closed() {
    let mut conn = closed();
    conn.connector().set_unreachable(true);
    let err = conn.open(Some(":9")).unwrap_err();
    match &err {
        Error::Connection { display, .. } => assert_eq!(display, ":9"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Cannot open display :9"));
    assert!(!conn.is_open());
    assert!(matches!(conn.try_get_windows(), Err(Error::NotOpen)));

    conn.connector().set_unreachable(false);
    conn.open(Some(":9")).unwrap();
    assert!(conn.is_open());
}

#[test]
fn drop_releases_session() {
    let connector = StubConnector::new(StubTransport::new());
    {
        let mut conn = Connection::with_connector(connector.clone());
        conn.open(None).unwrap();
        assert_eq!(connector.open_sessions(), 1);
    }
    assert_eq!(connector.open_sessions(), 0);
}
