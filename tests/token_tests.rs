mod common;

use blog_guard::{auth::TokenService, errors::AuthError};
use common::TEST_JWT_SECRET;

const T0: i64 = 1_700_000_000;

fn tokens() -> TokenService {
    TokenService::new(TEST_JWT_SECRET, 100)
}

#[test]
fn test_issued_token_verifies_within_window() {
    let tokens = tokens();
    let token = tokens.issue_at(7, T0).unwrap();

    let verified = tokens.verify_at(&token, T0 + 1).unwrap();
    assert_eq!(verified.subject_id, 7);
    assert_eq!(verified.expires_at, T0 + 100);

    // Last second of the window.
    assert!(tokens.verify_at(&token, T0 + 99).is_ok());
}

#[test]
fn test_token_rejected_at_and_after_expiry() {
    let tokens = tokens();
    let token = tokens.issue_at(7, T0).unwrap();

    // The window is [iat, exp): exp itself is already expired.
    assert_eq!(tokens.verify_at(&token, T0 + 100), Err(AuthError::Unauthenticated));
    assert_eq!(tokens.verify_at(&token, T0 + 101), Err(AuthError::Unauthenticated));
    assert_eq!(tokens.verify_at(&token, T0 + 10_000), Err(AuthError::Unauthenticated));
}

#[test]
fn test_token_rejected_before_issue_time() {
    let tokens = tokens();
    let token = tokens.issue_at(7, T0).unwrap();
    assert_eq!(tokens.verify_at(&token, T0 - 1), Err(AuthError::Unauthenticated));
}

#[test]
fn test_token_from_other_secret_rejected() {
    let foreign = TokenService::new("some-other-secret", 100);
    let token = foreign.issue_at(7, T0).unwrap();
    assert_eq!(tokens().verify_at(&token, T0 + 1), Err(AuthError::Unauthenticated));
}

#[test]
fn test_spliced_payload_rejected() {
    let tokens = tokens();
    let mine = tokens.issue_at(1, T0).unwrap();
    let theirs = tokens.issue_at(2, T0).unwrap();

    // Header and signature of token 1 around the payload of token 2.
    let mine_parts: Vec<&str> = mine.split('.').collect();
    let theirs_parts: Vec<&str> = theirs.split('.').collect();
    let forged = format!("{}.{}.{}", mine_parts[0], theirs_parts[1], mine_parts[2]);

    assert_eq!(tokens.verify_at(&forged, T0 + 1), Err(AuthError::Unauthenticated));
}

#[test]
fn test_malformed_tokens_rejected() {
    let tokens = tokens();
    for raw in ["", "   ", "not-a-token", "a.b.c", "Bearer"] {
        assert_eq!(
            tokens.verify_at(raw, T0 + 1),
            Err(AuthError::Unauthenticated),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn test_verify_uses_current_time() {
    let tokens = tokens();
    let fresh = tokens.issue(3).unwrap();
    assert_eq!(tokens.verify(&fresh).unwrap().subject_id, 3);

    let stale = tokens
        .issue_at(3, chrono::Utc::now().timestamp() - 101)
        .unwrap();
    assert_eq!(tokens.verify(&stale), Err(AuthError::Unauthenticated));
}

#[test]
fn test_oversized_lifetime_saturates_expiry() {
    let tokens = TokenService::new(TEST_JWT_SECRET, i64::MAX);
    let token = tokens.issue_at(7, T0).unwrap();

    let verified = tokens.verify_at(&token, T0 + 1).unwrap();
    assert_eq!(verified.expires_at, i64::MAX);
}
