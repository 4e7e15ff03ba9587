mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use boutique_api::app_router;
use common::{seed_category, seed_product, seed_user, test_state};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn session_cookie(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("ascii cookie");
    raw.split(';').next().expect("cookie pair").to_string()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

#[tokio::test]
async fn every_response_carries_the_security_headers() {
    let state = test_state().await;
    let app = app_router(state);

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        headers.get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );
    assert!(headers.contains_key("content-security-policy"));
    assert!(!headers.contains_key("strict-transport-security"));

    // Error responses carry them too.
    let response = get(&app, "/api/products/not-a-uuid").await;
    assert!(response.status().is_client_error());
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn product_api_lists_sellable_products_with_category() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    seed_product(&state.db, category.id, "Tote", dec!(19.99), 5).await;
    seed_product(&state.db, category.id, "Sold out", dec!(9.99), 0).await;
    let app = app_router(state);

    let response = get(&app, "/api/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let products = body.as_array().expect("array");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Tote");
    assert_eq!(products[0]["price"], "19.99");
    assert_eq!(products[0]["price_with_tax"], "23.99");
    assert_eq!(products[0]["category"]["name"], "Bags");
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let state = test_state().await;
    let app = app_router(state);

    let response = get(&app, "/api/spec").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["openapi"].as_str().is_some());
    assert!(body["paths"]["/api/products"].is_object());
}

#[tokio::test]
async fn cart_add_requires_a_valid_anti_forgery_token() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 5).await;
    let app = app_router(state);

    // Establish a session.
    let response = get(&app, "/cart").await;
    let cookie = session_cookie(&response);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/cart/add/{}", product.id))
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from("quantity=1&_token=forged"))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cart_add_flow_with_token_redirects_and_flashes() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 5).await;
    let app = app_router(state);

    let response = get(&app, "/cart").await;
    let cookie = session_cookie(&response);

    // The product detail hands out the session-bound add token.
    let request = Request::builder()
        .uri(format!("/api/products/{}", product.id))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    let token = detail["cart_token"].as_str().expect("token").to_string();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/cart/add/{}", product.id))
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(format!("quantity=2&_token={}", token)))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");

    let request = Request::builder()
        .uri("/cart")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let cart = body_json(response).await;
    assert_eq!(cart["total_quantity"], 2);
    assert_eq!(cart["lines"][0]["quantity"], 2);
    assert_eq!(cart["total"], "24.00");
    assert_eq!(cart["flash"][0]["kind"], "success");
}

#[tokio::test]
async fn register_login_and_role_gates() {
    let state = test_state().await;
    seed_user(
        &state.db,
        &state.auth,
        "admin@example.com",
        "admin-password",
        &["user", "admin"],
    )
    .await;
    let app = app_router(state);

    // Anonymous callers are turned away from protected surfaces.
    let response = get(&app, "/user/profile").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "email": "alice@example.com",
                "password": "password123",
                "first_name": "Alice",
                "last_name": "Martin"
            })
            .to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created.get("password_hash").is_none());

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "alice@example.com", "password": "password123"}).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let user_token = login["token"].as_str().expect("token").to_string();

    // A customer token opens the profile but not the back office.
    let request = Request::builder()
        .uri("/user/profile")
        .header(header::AUTHORIZATION, format!("Bearer {}", user_token))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/admin/products")
        .header(header::AUTHORIZATION, format!("Bearer {}", user_token))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "admin@example.com", "password": "admin-password"}).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let login = body_json(response).await;
    let admin_token = login["token"].as_str().expect("token").to_string();

    let request = Request::builder()
        .uri("/admin/products")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
