//! Check-in, policy, and override integration tests against a real
//! PostgreSQL database.

mod common;

use axum::http::{Method, StatusCode};
use persistence::repositories::{GuestRepository, OverrideLogRepository, VisitRepository};
use uuid::Uuid;

use common::*;

async fn override_check_in(
    ctx: &TestCtx,
    qr_token: &str,
    reason: &str,
    password: &str,
    caller: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(
        &ctx.app,
        Method::POST,
        "/api/v1/check-ins/override",
        caller,
        Some(serde_json::json!({
            "qr_token": qr_token,
            "reason": reason,
            "password": password,
        })),
    )
    .await
}

#[tokio::test]
async fn test_admitted_check_in_creates_twelve_hour_visit() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;

    let (invitation_id, guest_id, qr_token) =
        presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;

    let (status, body) = check_in(&ctx.app, &qr_token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["admitted"], true);
    assert_eq!(body["verdict"]["outcome"], "allow");

    let visit = &body["visit"];
    assert_eq!(visit["guest_id"].as_str().unwrap(), guest_id);
    assert_eq!(visit["invitation_id"].as_str().unwrap(), invitation_id);
    assert_eq!(visit["overridden"], false);

    let checked_in_at: chrono::DateTime<chrono::Utc> =
        visit["checked_in_at"].as_str().unwrap().parse().unwrap();
    let expires_at: chrono::DateTime<chrono::Utc> =
        visit["expires_at"].as_str().unwrap().parse().unwrap();
    assert_eq!(expires_at - checked_in_at, chrono::Duration::hours(12));

    // The invitation is now checked in; a second scan conflicts.
    let (status, _) = check_in(&ctx.app, &qr_token).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_qr_token_is_not_found() {
    let ctx = setup().await;
    let (status, _) = check_in(&ctx.app, &"Z".repeat(32)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_short_qr_token_fails_validation() {
    let ctx = setup().await;
    let (status, _) = check_in(&ctx.app, "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blacklisted_guest_denied_before_other_checks() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;

    // Guest never accepted terms AND is blacklisted; blacklist wins.
    let created = create_invitation(&ctx.app, &unique_email(), host_id, location_id).await;
    let invitation_id = created["id"].as_str().unwrap();
    let guest_id = created["guest_id"].as_str().unwrap();
    let activated = activate_invitation(&ctx.app, invitation_id).await;
    let qr_token = activated["qr_token"].as_str().unwrap();

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/guests/{guest_id}/blacklist"),
        Some("test-staff"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = check_in(&ctx.app, qr_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], false);
    assert_eq!(body["verdict"]["reason"], "blacklisted");

    // Clearing the blacklist surfaces the next failing check.
    let (status, _) = send(
        &ctx.app,
        Method::DELETE,
        &format!("/api/v1/guests/{guest_id}/blacklist"),
        Some("test-staff"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = check_in(&ctx.app, qr_token).await;
    assert_eq!(body["verdict"]["reason"], "terms_required");
}

#[tokio::test]
async fn test_host_capacity_denial_and_override() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    seed_policy(&ctx.pool, location_id, 100, 3).await;

    // Scenario B: three guests already checked in under the host.
    for _ in 0..3 {
        let (_, _, qr) =
            presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;
        let (status, body) = check_in(&ctx.app, &qr).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admitted"], true, "{body}");
    }

    let (_, fourth_guest_id, fourth_qr) =
        presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;

    // Fourth check-in denies with the counts attached.
    let (status, body) = check_in(&ctx.app, &fourth_qr).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], false);
    assert_eq!(body["verdict"]["reason"], "host_at_capacity");
    assert_eq!(body["verdict"]["current"], 3);
    assert_eq!(body["verdict"]["max"], 3);

    let overrides = OverrideLogRepository::new(ctx.pool.clone());
    let audit_rows_before = overrides.count().await.unwrap();

    // Wrong password: generic rejection, nothing written.
    let (status, body) =
        override_check_in(&ctx, &fourth_qr, "VIP guest", "wrong-password", Some("sec-1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(overrides.count().await.unwrap(), audit_rows_before);

    // Blank reason is rejected before anything happens.
    let (status, _) =
        override_check_in(&ctx, &fourth_qr, "   ", TEST_OVERRIDE_PASSWORD, Some("sec-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(overrides.count().await.unwrap(), audit_rows_before);

    // Missing caller identity is rejected: the audit row needs an author.
    let (status, _) =
        override_check_in(&ctx, &fourth_qr, "VIP guest", TEST_OVERRIDE_PASSWORD, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correct credential forces the admission and writes one audit row.
    let (status, body) =
        override_check_in(&ctx, &fourth_qr, "VIP guest", TEST_OVERRIDE_PASSWORD, Some("sec-1"))
            .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["admitted"], true);
    let visit_id: Uuid = body["visit"]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(body["visit"]["overridden"], true);
    assert_eq!(
        body["visit"]["guest_id"].as_str().unwrap(),
        fourth_guest_id
    );

    let audit = overrides.list_for_visit(visit_id).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].user_id, "sec-1");
    assert_eq!(audit[0].reason, "VIP guest");
}

#[tokio::test]
async fn test_guest_limit_denial_is_not_overridable() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    seed_policy(&ctx.pool, location_id, 1, 100).await;

    let email = unique_email();

    // First visit consumes the rolling limit.
    let (_, _, qr) = presentable_invitation(&ctx.app, &email, host_id, location_id).await;
    let (_, body) = check_in(&ctx.app, &qr).await;
    assert_eq!(body["admitted"], true, "{body}");

    // Scenario C: the next attempt denies with the counts attached.
    let (_, _, second_qr) = presentable_invitation(&ctx.app, &email, host_id, location_id).await;
    let (status, body) = check_in(&ctx.app, &second_qr).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], false);
    assert_eq!(body["verdict"]["reason"], "guest_limit_exceeded");
    assert_eq!(body["verdict"]["current"], 1);
    assert_eq!(body["verdict"]["max"], 1);

    // The Override Authority refuses to bypass a guest-limit denial even
    // with the correct credential.
    let overrides = OverrideLogRepository::new(ctx.pool.clone());
    let audit_rows_before = overrides.count().await.unwrap();

    let (status, body) =
        override_check_in(&ctx, &second_qr, "VIP guest", TEST_OVERRIDE_PASSWORD, Some("sec-1"))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], false, "{body}");
    assert_eq!(body["verdict"]["reason"], "guest_limit_exceeded");
    assert_eq!(overrides.count().await.unwrap(), audit_rows_before);
}

#[tokio::test]
async fn test_concurrent_check_ins_cannot_exceed_capacity() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    seed_policy(&ctx.pool, location_id, 100, 1).await;

    let (_, _, qr_a) = presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;
    let (_, _, qr_b) = presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;

    // Two simultaneous scans must not both observe count = 0.
    let app_a = ctx.app.clone();
    let app_b = ctx.app.clone();
    let (result_a, result_b) = tokio::join!(
        async move { check_in(&app_a, &qr_a).await },
        async move { check_in(&app_b, &qr_b).await },
    );

    let admitted = [&result_a.1, &result_b.1]
        .iter()
        .filter(|body| body["admitted"] == true)
        .count();
    assert_eq!(admitted, 1, "a: {:?}, b: {:?}", result_a.1, result_b.1);
}

#[tokio::test]
async fn test_check_out_frees_host_capacity() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    seed_policy(&ctx.pool, location_id, 100, 1).await;

    let (_, _, first_qr) =
        presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;
    let (_, body) = check_in(&ctx.app, &first_qr).await;
    assert_eq!(body["admitted"], true, "{body}");
    let visit_id = body["visit"]["id"].as_str().unwrap().to_string();

    // Host is full.
    let (_, _, second_qr) =
        presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;
    let (_, body) = check_in(&ctx.app, &second_qr).await;
    assert_eq!(body["verdict"]["reason"], "host_at_capacity");

    // Checking the first guest out frees the slot.
    let (status, body) = send(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/visits/{visit_id}/check-out"),
        Some("test-staff"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["checked_out_at"].is_string());

    let (_, body) = check_in(&ctx.app, &second_qr).await;
    assert_eq!(body["admitted"], true, "{body}");

    // A second check-out conflicts.
    let (status, _) = send(
        &ctx.app,
        Method::POST,
        &format!("/api/v1/visits/{visit_id}/check-out"),
        Some("test-staff"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let visit: Uuid = visit_id.parse().unwrap();
    let stored = VisitRepository::new(ctx.pool.clone())
        .find_by_id(visit)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.checked_out_at.is_some());
}

#[tokio::test]
async fn test_visit_scoped_acceptance_not_granted_by_invitation_token() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;

    // A QR entry token presented as a registration token is rejected: the
    // two token systems are single-purpose.
    let (_, _, qr_token) =
        presentable_invitation(&ctx.app, &unique_email(), host_id, location_id).await;

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/guests/register",
        None,
        Some(serde_json::json!({
            "token": qr_token,
            "name": "Impostor",
            "accept_terms": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_acceptance_is_scoped_per_invitation() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    let email = unique_email();

    // Terms accepted for the first invitation do not carry to the second.
    let (_, _, first_qr) = presentable_invitation(&ctx.app, &email, host_id, location_id).await;
    let (_, body) = check_in(&ctx.app, &first_qr).await;
    assert_eq!(body["admitted"], true, "{body}");

    let second = create_invitation(&ctx.app, &email, host_id, location_id).await;
    let second_id = second["id"].as_str().unwrap();
    let activated = activate_invitation(&ctx.app, second_id).await;
    let second_qr = activated["qr_token"].as_str().unwrap();

    let (_, body) = check_in(&ctx.app, second_qr).await;
    assert_eq!(body["admitted"], false);
    assert_eq!(body["verdict"]["reason"], "terms_required");
}

#[tokio::test]
async fn test_guest_profile_completed_after_registration() {
    let ctx = setup().await;
    let host_id = seed_host(&ctx.pool).await;
    let location_id = seed_location(&ctx.pool).await;
    let email = unique_email();

    let created = create_invitation(&ctx.app, &email, host_id, location_id).await;
    let token = created["acceptance_token"].as_str().unwrap();
    let registered = register_guest(&ctx.app, token, "Grace Hopper").await;

    assert_eq!(registered["profile_completed"], true);
    assert_eq!(registered["name"], "Grace Hopper");
    assert!(registered["terms_accepted_at"].is_string());

    let guest_id: Uuid = created["guest_id"].as_str().unwrap().parse().unwrap();
    let stored = GuestRepository::new(ctx.pool.clone())
        .find_by_id(guest_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.profile_completed);
}
