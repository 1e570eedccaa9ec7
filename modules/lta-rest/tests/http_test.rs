use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use lta_common::config::RestConfig;
use lta_common::Role;
use lta_rest::auth::Claims;
use lta_rest::build_router;
use lta_rest::state::AppState;
use serde_json::{json, Value};
use testcontainers::{ContainerAsync, GenericImage};
use tower::ServiceExt;

const AUTH_SECRET: &str = "test-secret";
const AUTH_ISSUER: &str = "lta";

fn bearer_token(role: Role) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "tester".to_string(),
        role,
        exp: now + 3600,
        iat: now,
        iss: AUTH_ISSUER.to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(AUTH_SECRET.as_bytes())).unwrap()
}

async fn test_app() -> (ContainerAsync<GenericImage>, axum::Router) {
    let (container, pool) = lta_store::testutil::postgres_pool().await;
    let store = lta_store::Store::new(pool);
    let config = RestConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        auth_secret: AUTH_SECRET.to_string(),
        auth_issuer: AUTH_ISSUER.to_string(),
        metadata_bulk_body_limit_bytes: 12 * 1024 * 1024,
    };
    let state = Arc::new(AppState::new(store, &config));
    (container, build_router(state))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_returns_ok_without_auth() {
    let (_container, app) = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_and_fetch_transfer_request_round_trips() {
    let (_container, app) = test_app().await;
    let token = bearer_token(Role::User);

    let body = json!({ "source": "WIPAC", "dest": ["DESY"], "path": "/data/exp" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/TransferRequests")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let uuid = created["TransferRequest"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/TransferRequests/{uuid}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["source"], "WIPAC");
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let (_container, app) = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/TransferRequests").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_role_cannot_pop_a_bundle() {
    let (_container, app) = test_app().await;
    let token = bearer_token(Role::User);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/Bundles/actions/pop?source=WIPAC&dest=DESY&status=staged")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "claimant": "stager-1" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn system_role_pop_on_empty_queue_returns_null_bundle() {
    let (_container, app) = test_app().await;
    let token = bearer_token(Role::System);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/Bundles/actions/pop?source=WIPAC&dest=DESY&status=staged")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "claimant": "stager-1" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert!(payload["bundle"].is_null());
}

#[tokio::test]
async fn patch_with_mismatched_uuid_is_bad_request() {
    let (_container, app) = test_app().await;
    let token = bearer_token(Role::Admin);

    let body = json!({ "source": "WIPAC", "dest": ["DESY"], "path": "/data/exp" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/TransferRequests")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = body_json(response).await;
    let uuid = created["TransferRequest"].as_str().unwrap().to_string();

    let other_uuid = uuid::Uuid::new_v4();
    let patch_body = json!({ "uuid": other_uuid.to_string(), "status": "completed" });
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/TransferRequests/{uuid}"))
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(patch_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_of_absent_transfer_request_is_idempotent_204() {
    let (_container, app) = test_app().await;
    let token = bearer_token(Role::Admin);
    let uuid = uuid::Uuid::new_v4();
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/TransferRequests/{uuid}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
