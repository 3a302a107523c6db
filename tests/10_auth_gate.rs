mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;

use restaurant_api::auth::Role;

#[tokio::test]
async fn anonymous_caller_gets_401_on_gated_route() -> Result<()> {
    let state = common::offline_state()?;
    let (status, body) =
        common::send(common::app(&state), Method::GET, "/api/orders", None, None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn chef_gets_403_on_customer_route() -> Result<()> {
    let state = common::offline_state()?;
    let chef = common::bearer(&state, 7, Role::CHEF)?;

    let (status, body) =
        common::send(common::app(&state), Method::GET, "/api/orders", Some(&chef), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn customer_gets_403_on_admin_and_kitchen_routes() -> Result<()> {
    let state = common::offline_state()?;
    let customer = common::bearer(&state, 8, Role::CUSTOMER)?;

    for (method, uri) in [
        (Method::POST, "/api/payments"),
        (Method::GET, "/api/orders/items"),
        (Method::PATCH, "/api/orders/items/1"),
        (Method::POST, "/api/requests/1/grant"),
        (Method::GET, "/api/users"),
    ] {
        let (status, _) =
            common::send(common::app(&state), method.clone(), uri, Some(&customer), None).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected_even_on_open_routes() -> Result<()> {
    let state = common::offline_state()?;
    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        "/api/token",
        Some("Bearer not.a.token"),
        Some(json!({"username": "x", "password": "y"})),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let state = common::offline_state()?;
    let issued = state
        .jwt
        .issue_at(1, Role::ADMIN, Utc::now() - Duration::days(1))?;
    let authorization = format!("Bearer {}", issued.token);

    let (status, _) = common::send(
        common::app(&state),
        Method::GET,
        "/api/orders",
        Some(&authorization),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.token_cache.is_empty());
    Ok(())
}

#[tokio::test]
async fn token_is_read_from_auth_cookie() -> Result<()> {
    let state = common::offline_state()?;
    let token = state.jwt.issue(9, Role::CHEF)?.token;
    let cookie = format!("theme=dark; {}={}", state.config.security.auth_cookie_name, token);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/orders")
        .header(header::COOKIE, cookie)
        .body(Body::empty())?;
    let response = common::app(&state).oneshot(request).await?;

    // Recognised as a chef, so 403 rather than the anonymous 401.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.token_cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_is_400() -> Result<()> {
    let state = common::offline_state()?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = common::app(&state).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let state = common::offline_state()?;
    let (status, body) =
        common::send(common::app(&state), Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
