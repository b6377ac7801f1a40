/// Integration tests for the organization and scan endpoints
///
/// The router runs against the in-memory store, so these tests need no
/// database.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use stocktake_shared::invite_code::is_valid_invite_code;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check_is_public() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/organization", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let ctx = TestContext::new();

    let response = tower::ServiceExt::oneshot(
        ctx.app.clone(),
        axum::http::Request::builder()
            .uri("/api/organization")
            .header("authorization", "Bearer not-a-jwt")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_organization_returns_null() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(Method::GET, "/api/organization", Some(Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "organization": null }));
}

#[tokio::test]
async fn test_create_organization() {
    let ctx = TestContext::new();
    let owner = Uuid::new_v4();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/organization",
            Some(owner),
            Some(json!({ "name": "  Corner Cafe " })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Corner Cafe");
    assert!(is_valid_invite_code(body["inviteCode"].as_str().unwrap()));
    assert!(body["createdAt"].is_string());
    assert_eq!(body["members"][0]["userId"], owner.to_string());
    assert_eq!(body["members"][0]["role"], "owner");
    assert!(body["members"][0]["joinedAt"].is_string());
}

#[tokio::test]
async fn test_create_rejects_invalid_name() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/organization",
            Some(Uuid::new_v4()),
            Some(json!({ "name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization",
            Some(Uuid::new_v4()),
            Some(json!({ "title": "No name field" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_with_lowercase_code() {
    let ctx = TestContext::new();
    let (owner, code) = ctx.create_organization("Bistro").await;
    let member = ctx.join(&code.to_lowercase()).await;

    let (status, body) = ctx
        .send(Method::GET, "/api/organization", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let members = body["organization"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1]["userId"], member.to_string());
    assert_eq!(members[1]["role"], "member");
}

#[tokio::test]
async fn test_join_unknown_code_is_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/organization/join",
            Some(Uuid::new_v4()),
            Some(json!({ "inviteCode": "ZZZZZZ" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_member_cannot_create_or_join_again() {
    let ctx = TestContext::new();
    let (owner, code) = ctx.create_organization("First").await;
    let (_, other_code) = ctx.create_organization("Second").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization",
            Some(owner),
            Some(json!({ "name": "Third" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let member = ctx.join(&code).await;
    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization/join",
            Some(member),
            Some(json!({ "inviteCode": other_code })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_leave_flows() {
    let ctx = TestContext::new();
    let (owner, code) = ctx.create_organization("Diner").await;
    let member = ctx.join(&code).await;

    // Sole owner with other members must transfer first
    let (status, _) = ctx
        .send(Method::POST, "/api/organization/leave", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .send(Method::POST, "/api/organization/leave", Some(member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = ctx
        .send(Method::POST, "/api/organization/leave", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.store.organization_count().await, 0);

    let (status, _) = ctx
        .send(Method::POST, "/api/organization/leave", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_member_role_is_forbidden_from_managing() {
    let ctx = TestContext::new();
    let (_, code) = ctx.create_organization("Hotel").await;
    let member = ctx.join(&code).await;

    let (status, body) = ctx
        .send(
            Method::PATCH,
            "/api/organization",
            Some(member),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization/regenerate-code",
            Some(member),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_renames_and_regenerates() {
    let ctx = TestContext::new();
    let (owner, code) = ctx.create_organization("Hotel").await;

    let (status, body) = ctx
        .send(
            Method::PATCH,
            "/api/organization",
            Some(owner),
            Some(json!({ "name": "Grand Hotel" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Grand Hotel");
    assert_eq!(body["inviteCode"], code);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/organization/regenerate-code",
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_code = body["inviteCode"].as_str().unwrap();
    assert_ne!(new_code, code);
    assert!(is_valid_invite_code(new_code));
}

#[tokio::test]
async fn test_transfer_ownership_lets_old_owner_leave() {
    let ctx = TestContext::new();
    let (owner, code) = ctx.create_organization("Bar").await;
    let member = ctx.join(&code).await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization/transfer-ownership",
            Some(member),
            Some(json!({ "userId": owner })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/organization/transfer-ownership",
            Some(owner),
            Some(json!({ "userId": member })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    // Former owner is now an admin and may still manage
    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization/regenerate-code",
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::POST, "/api/organization/leave", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_transfer_to_non_member_is_bad_request() {
    let ctx = TestContext::new();
    let (owner, _) = ctx.create_organization("Bar").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/organization/transfer-ownership",
            Some(owner),
            Some(json!({ "userId": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_without_vision_is_unavailable() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/scan",
            Some(Uuid::new_v4()),
            Some(json!({ "imageUrl": "https://example.com/shelf.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_scan_returns_normalized_items() {
    let ctx = TestContext::with_vision(Ok(
        r#"```json
[{"label":"Shirt","count":2,"confidence":0.8},{"label":"shirt","count":"3"},{"label":"","count":1}]
```"#,
    ));

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/scan",
            Some(Uuid::new_v4()),
            Some(json!({ "imageBase64": "aGVsbG8=", "inventoryType": "retail" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "items": [{ "label": "shirt", "count": 5, "confidence": 0.8 }] })
    );
}

#[tokio::test]
async fn test_scan_failures_are_bad_gateway() {
    let ctx = TestContext::with_vision(Ok("Sorry, I cannot help with that."));
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/scan",
            Some(Uuid::new_v4()),
            Some(json!({ "imageUrl": "https://example.com/shelf.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "scan_failed");

    let ctx = TestContext::with_vision(Err("upstream exploded"));
    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/scan",
            Some(Uuid::new_v4()),
            Some(json!({ "imageUrl": "https://example.com/shelf.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_scan_rejects_bad_input() {
    let ctx = TestContext::with_vision(Ok("[]"));

    let (status, _) = ctx
        .send(Method::POST, "/api/scan", Some(Uuid::new_v4()), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/scan",
            Some(Uuid::new_v4()),
            Some(json!({ "imageUrl": "https://example.com/a.jpg", "inventoryType": "warehouse" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let ctx = TestContext::new();

    let response = tower::ServiceExt::oneshot(
        ctx.app.clone(),
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}
