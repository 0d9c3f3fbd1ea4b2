//! Entitlement store tests: creation invariants and idempotent grants

mod common;

use common::*;

#[test]
fn test_new_user_starts_without_premium() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "u1", "alice");

    assert!(!user.premium);
    let fetched = queries::get_user_by_id(&conn, "u1").unwrap().unwrap();
    assert!(!fetched.premium);
}

#[test]
fn test_grant_premium_is_idempotent() {
    let conn = setup_test_db();
    create_test_user(&conn, "u1", "alice");

    assert!(queries::grant_premium(&conn, "u1").unwrap());
    let after_first = queries::get_user_by_id(&conn, "u1").unwrap().unwrap();
    assert!(after_first.premium);

    // Applying the same mutation again must leave the record identical
    assert!(queries::grant_premium(&conn, "u1").unwrap());
    let after_second = queries::get_user_by_id(&conn, "u1").unwrap().unwrap();
    assert!(after_second.premium);
    assert_eq!(after_first.id, after_second.id);
    assert_eq!(after_first.username, after_second.username);
    assert_eq!(after_first.created_at, after_second.created_at);
}

#[test]
fn test_grant_premium_reports_missing_record() {
    let conn = setup_test_db();

    let matched = queries::grant_premium(&conn, "no-such-user").unwrap();

    assert!(!matched, "Granting to a missing user must not invent a record");
    assert!(queries::get_user_by_id(&conn, "no-such-user").unwrap().is_none());
}

#[test]
fn test_guest_sentinel_cannot_be_persisted() {
    let conn = setup_test_db();

    let result = queries::create_user(
        &conn,
        &CreateUser {
            id: GUEST_USER_ID.to_string(),
            username: "anyone".to_string(),
        },
    );

    assert!(result.is_err(), "The sentinel identity must never become a row");
}

#[test]
fn test_blank_user_id_rejected() {
    let conn = setup_test_db();

    let result = queries::create_user(
        &conn,
        &CreateUser {
            id: "   ".to_string(),
            username: "alice".to_string(),
        },
    );

    assert!(result.is_err());
}

#[test]
fn test_blank_username_rejected() {
    let conn = setup_test_db();

    let result = queries::create_user(
        &conn,
        &CreateUser {
            id: "u1".to_string(),
            username: "".to_string(),
        },
    );

    assert!(result.is_err());
}

#[test]
fn test_duplicate_user_id_conflicts() {
    let conn = setup_test_db();
    create_test_user(&conn, "u1", "alice");

    let result = queries::create_user(
        &conn,
        &CreateUser {
            id: "u1".to_string(),
            username: "impostor".to_string(),
        },
    );

    assert!(result.is_err(), "User ids are unique entitlement keys");
}
