//! Integration tests for the rendering bridge endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use ftm_observer::router::build_router;
use ftm_observer::state::{AppState, Command};
use ftm_types::{Publication, Stage, ViewModel};

fn make_publication() -> Publication {
    Publication {
        id: "wp".to_owned(),
        name: "The Washington Post".to_owned(),
        owner: "Jeff Bezos".to_owned(),
        bias: "Lean Left".to_owned(),
        factuality: "High".to_owned(),
        category: "Billionaire".to_owned(),
    }
}

async fn make_test_state() -> (Arc<AppState>, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(8);
    let state = Arc::new(AppState::new(tx));
    state.set_publications(vec![make_publication()]).await;
    (state, rx)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(path: &str) -> Request<Body> {
    Request::post(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_index_returns_html() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_view_reflects_last_publish() {
    let (state, _rx) = make_test_state().await;
    let view = ViewModel {
        stage: Stage::Conversation,
        publication: Some(make_publication()),
        play_all_visible: true,
        ..ViewModel::default()
    };
    let mut updates = state.subscribe();
    state.publish(&view).await;
    assert_eq!(updates.recv().await.unwrap(), view);

    let router = build_router(state);
    let response = router
        .oneshot(Request::get("/api/view").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stage"], serde_json::to_value(Stage::Conversation).unwrap());
    assert_eq!(json["publication"]["id"], "wp");
    assert_eq!(json["play_all_visible"], true);
}

#[tokio::test]
async fn test_list_publications() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/publications")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["owner"], "Jeff Bezos");
}

#[tokio::test]
async fn test_investigate_forwards_publication() {
    let (state, mut rx) = make_test_state().await;
    let router = build_router(state);

    let response = router.oneshot(post("/api/investigate/wp")).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["command"], "investigate");
    assert_eq!(rx.recv().await.unwrap(), Command::Investigate(make_publication()));
}

#[tokio::test]
async fn test_investigate_unknown_publication() {
    let (state, mut rx) = make_test_state().await;
    let router = build_router(state);

    let response = router.oneshot(post("/api/investigate/nyt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_turn_commands() {
    let (state, mut rx) = make_test_state().await;

    let response = build_router(Arc::clone(&state))
        .oneshot(post("/api/turns/2/play"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(rx.recv().await.unwrap(), Command::PlayOne(2));

    let response = build_router(state)
        .oneshot(post("/api/turns/0/toggle"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(rx.recv().await.unwrap(), Command::Toggle(0));
}

#[tokio::test]
async fn test_bad_turn_index_is_rejected() {
    let (state, mut rx) = make_test_state().await;
    let router = build_router(state);

    let response = router.oneshot(post("/api/turns/first/play")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_playback_commands() {
    let (state, mut rx) = make_test_state().await;

    for (path, expected) in [
        ("/api/play-all", Command::PlayAll),
        ("/api/stop", Command::Stop),
        ("/api/back", Command::Back),
    ] {
        let response = build_router(Arc::clone(&state))
            .oneshot(post(path))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED, "{path}");
        assert_eq!(rx.recv().await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_commands_fail_when_loop_is_gone() {
    let (state, rx) = make_test_state().await;
    drop(rx);
    let router = build_router(state);

    let response = router.oneshot(post("/api/stop")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_get_on_command_route_not_allowed() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
