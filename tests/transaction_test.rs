//! Transaction-state preconditions are checked before any network call;
//! every connection here points at an unroutable TEST-NET address so an
//! accidental request fails loudly rather than reaching a server.

use asterdb_sdk::{AsterError, ClientOptions, Connection, Content, content_types};

fn unroutable_connection() -> Connection {
    let options = ClientOptions::new("http://192.0.2.1:5830");
    Connection::new("db", &options).unwrap()
}

#[test]
fn commit_requires_an_active_transaction() {
    let mut conn = unroutable_connection();
    let err = conn.commit().unwrap_err();
    assert!(matches!(err, AsterError::Transaction(_)));
    // local failures carry no HTTP status
    assert_eq!(err.status(), None);
}

#[test]
fn rollback_requires_an_active_transaction() {
    let mut conn = unroutable_connection();
    assert!(matches!(
        conn.rollback().unwrap_err(),
        AsterError::Transaction(_)
    ));
}

#[test]
fn mutations_require_an_active_transaction() {
    let conn = unroutable_connection();
    let content = Content::raw(":a :b :c .", content_types::TURTLE);

    assert!(matches!(
        conn.add(&content, None).unwrap_err(),
        AsterError::Transaction(_)
    ));
    assert!(matches!(
        conn.remove(&content, Some("urn:graph")).unwrap_err(),
        AsterError::Transaction(_)
    ));
    assert!(matches!(
        conn.clear(None).unwrap_err(),
        AsterError::Transaction(_)
    ));
}

#[test]
fn fresh_connection_has_no_transaction() {
    let conn = unroutable_connection();
    assert_eq!(conn.transaction(), None);
}
