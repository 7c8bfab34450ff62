//! HTTP-level integration tests for the `/tours` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post, post_json, put_json, token_for, tour_body};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_token_returns_401() {
    let app = common::build_test_app();
    let response = get(app.app(), "/api/v1/tours", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_returns_401() {
    let app = common::build_test_app();
    let response = get(app.app(), "/api/v1/tours", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_tour_returns_201() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());

    let response = post_json(
        app.app(),
        "/api/v1/tours",
        Some(&token),
        tour_body("  Onboarding  ", 5),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Onboarding");
    assert_eq!(json["data"]["total_steps"], 5);
    assert_eq!(json["data"]["status"], "inactive");
    assert!(json["data"]["id"].is_number());
}

#[tokio::test]
async fn test_create_tour_with_too_few_steps_returns_400() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());

    let response = post_json(app.app(), "/api/v1/tours", Some(&token), tour_body("Short", 4)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let list = body_json(get(app.app(), "/api/v1/tours", Some(&token)).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_tour_with_blank_title_returns_400() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());

    let response = post_json(app.app(), "/api/v1/tours", Some(&token), tour_body("   ", 5)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_tour_includes_ordered_steps() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;

    let response = get(app.app(), &format!("/api/v1/tours/{id}"), Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let steps = json["data"]["tour_steps"].as_array().unwrap();
    let orders: Vec<i64> = steps.iter().map(|s| s["step_order"].as_i64().unwrap()).collect();
    let titles: Vec<&str> = steps.iter().map(|s| s["title"].as_str().unwrap()).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    assert_eq!(titles, vec!["S1", "S2", "S3", "S4", "S5"]);
}

#[tokio::test]
async fn test_get_other_owners_tour_returns_404() {
    let app = common::build_test_app();
    let owner = token_for(Uuid::new_v4());
    let stranger = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &owner, "Private", 5).await;

    let response = get(app.app(), &format!("/api/v1/tours/{id}"), Some(&stranger)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], format!("Tour {id} not found or unauthorized"));
}

#[tokio::test]
async fn test_list_tours_is_owner_scoped_and_newest_first() {
    let app = common::build_test_app();
    let owner = token_for(Uuid::new_v4());
    let other = token_for(Uuid::new_v4());
    common::create_tour(&app, &owner, "First", 5).await;
    common::create_tour(&app, &owner, "Second", 5).await;
    common::create_tour(&app, &other, "Theirs", 5).await;

    let json = body_json(get(app.app(), "/api/v1/tours", Some(&owner)).await).await;
    let tours = json["data"].as_array().unwrap();

    assert_eq!(tours.len(), 2);
    assert_eq!(tours[0]["title"], "Second");
    assert_eq!(tours[1]["title"], "First");
    assert!(tours[0].get("tour_steps").is_none());
}

#[tokio::test]
async fn test_list_tours_with_steps() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    common::create_tour(&app, &token, "Onboarding", 6).await;

    let json = body_json(get(app.app(), "/api/v1/tours?with_steps=true", Some(&token)).await).await;
    let tours = json["data"].as_array().unwrap();

    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0]["tour_steps"].as_array().unwrap().len(), 6);
}

// ---------------------------------------------------------------------------
// Update / status / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_tour_keeps_steps() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Original", 5).await;

    let response = put_json(
        app.app(),
        &format!("/api/v1/tours/{id}"),
        Some(&token),
        json!({"title": "Renamed", "description": "New copy"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Renamed");
    assert_eq!(json["data"]["total_steps"], 5);
    assert_eq!(common::step_ids(&app, &token, id).await.len(), 5);
}

#[tokio::test]
async fn test_toggle_status_flips_between_states() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;
    let uri = format!("/api/v1/tours/{id}/toggle-status");

    let first = body_json(post(app.app(), &uri, Some(&token)).await).await;
    assert_eq!(first["data"]["status"], "active");

    let second = body_json(post(app.app(), &uri, Some(&token)).await).await;
    assert_eq!(second["data"]["status"], "inactive");
}

#[tokio::test]
async fn test_set_status_rejects_unknown_value() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;
    let uri = format!("/api/v1/tours/{id}/status");

    let ok = put_json(app.app(), &uri, Some(&token), json!({"status": "active"})).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await["data"]["status"], "active");

    let bad = put_json(app.app(), &uri, Some(&token), json!({"status": "archived"})).await;
    assert!(bad.status().is_client_error());
}

#[tokio::test]
async fn test_delete_tour_returns_204_then_404() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Doomed", 5).await;
    let uri = format!("/api/v1/tours/{id}");

    let response = delete(app.app(), &uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app.app(), &uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.raw_step_count(id).await, 0);
}

#[tokio::test]
async fn test_delete_other_owners_tour_returns_404() {
    let app = common::build_test_app();
    let owner = token_for(Uuid::new_v4());
    let stranger = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &owner, "Private", 5).await;

    let response = delete(app.app(), &format!("/api/v1/tours/{id}"), Some(&stranger)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app.app(), &format!("/api/v1/tours/{id}"), Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Step counters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reconcile_repairs_drifted_counter() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;
    app.store.force_total_steps(id, 9).await;

    let counts = body_json(
        get(app.app(), &format!("/api/v1/tours/{id}/step-counts"), Some(&token)).await,
    )
    .await;
    assert_eq!(counts["data"], json!({"cached": 9, "actual": 5}));

    let response = post(app.app(), &format!("/api/v1/tours/{id}/reconcile"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!({"cached": 5, "actual": 5}));
}

// ---------------------------------------------------------------------------
// Embed snippet
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_embed_uses_defaults_and_placeholder_key() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;

    let response = get(app.app(), &format!("/api/v1/tours/{id}/embed"), Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(
        data["steps_url"],
        format!("https://api.example.com/api/v1/widget/tours/{id}")
    );
    assert_eq!(data["mount_config"]["theme"], "dark");
    assert_eq!(data["mount_config"]["position"], "bottom-right");
    assert_eq!(data["mount_config"]["tour_id"], id.to_string());
    let html = data["html"].as_str().unwrap();
    assert!(html.contains("data-api-key=\"tf_live_xxxxxxxxxxxx\""));
    assert!(html.contains("tourflow-widget@1.0.6"));
}

#[tokio::test]
async fn test_embed_honours_query_options() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;

    let response = get(
        app.app(),
        &format!("/api/v1/tours/{id}/embed?api_key=tf_live_abc&theme=light&position=top-left"),
        Some(&token),
    )
    .await;

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["mount_config"]["api_key"], "tf_live_abc");
    assert_eq!(data["mount_config"]["theme"], "light");
    assert_eq!(data["mount_config"]["position"], "top-left");
}

#[tokio::test]
async fn test_embed_rejects_unknown_theme() {
    let app = common::build_test_app();
    let token = token_for(Uuid::new_v4());
    let id = common::create_tour(&app, &token, "Onboarding", 5).await;

    let response = get(
        app.app(),
        &format!("/api/v1/tours/{id}/embed?theme=neon"),
        Some(&token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
