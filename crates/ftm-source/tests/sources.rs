//! Source tests against an in-process API server and a temporary data
//! directory.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;

use ftm_core::config::{SourceConfig, SourceMode};
use ftm_source::{InvestigationSource, SourceError, find_publication};
use ftm_types::Agent;

async fn demo(Path(id): Path<String>) -> impl IntoResponse {
    if id == "wp" {
        (
            StatusCode::OK,
            axum::Json(json!({
                "publication": "The Washington Post",
                "owner": "Jeff Bezos",
                "turns": [
                    {"agent": "Street Reporter", "text": "Who owns it?", "audio_path": "a/0.wav"},
                    {"agent": "Insider", "text": "Follow the money.", "audio_path": ""},
                    {"agent": "Street Reporter", "text": "And then?"}
                ]
            })),
        )
            .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn investigate(Path(id): Path<String>) -> impl IntoResponse {
    if id == "broken" {
        (StatusCode::INTERNAL_SERVER_ERROR, "model timeout").into_response()
    } else {
        axum::Json(json!({"turns": [{"agent": "Insider", "text": "live", "audio_path": null}]}))
            .into_response()
    }
}

async fn spawn_api() -> String {
    let app = Router::new()
        .route(
            "/api/publications",
            get(|| async {
                axum::Json(json!([{
                    "id": "wp", "name": "The Washington Post", "owner": "Jeff Bezos",
                    "bias": "Lean Left", "factuality": "High", "category": "Billionaire"
                }]))
            }),
        )
        .route("/api/demo/{id}", get(demo))
        .route("/api/investigate/{id}", post(investigate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn http_source(api_url: String) -> InvestigationSource {
    InvestigationSource::from_config(&SourceConfig {
        mode: SourceMode::Http,
        api_url,
        ..SourceConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn http_catalog_and_lookup() {
    let source = http_source(spawn_api().await);
    assert_eq!(source.name(), "http");

    let catalog = source.publications().await.unwrap();
    let wp = find_publication(&catalog, "wp").unwrap();
    assert_eq!(wp.owner, "Jeff Bezos");
    assert!(matches!(
        find_publication(&catalog, "nyt"),
        Err(SourceError::PublicationNotFound { .. })
    ));

    let demo = source.demo("wp").await.unwrap().unwrap();
    let turns = demo.into_turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns.first().unwrap().agent, Agent::Reporter);
    assert!(turns.first().unwrap().has_audio());
    assert!(!turns.get(1).unwrap().has_audio());
    assert!(!turns.get(2).unwrap().has_audio());
    assert_eq!(turns.get(2).unwrap().index, 2);

    assert!(source.demo("nyt").await.unwrap().is_none());
}

#[tokio::test]
async fn http_live_investigation() {
    let source = http_source(spawn_api().await);

    let live = source.start("wp").await.unwrap();
    assert_eq!(live.turns.len(), 1);

    let err = source.start("broken").await.unwrap_err();
    match &err {
        SourceError::Status { status, message } => {
            assert_eq!(*status, 500);
            assert!(message.starts_with("server error"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_unreachable_is_an_error() {
    let source = http_source("http://127.0.0.1:9".to_owned());
    assert!(matches!(
        source.publications().await,
        Err(SourceError::Http { .. })
    ));
}

fn temp_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ftm-source-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("demo")).unwrap();
    std::fs::write(
        dir.join("publications.json"),
        r#"{"publications": [
            {"id": "wp", "name": "The Washington Post", "owner": "Jeff Bezos",
             "ground_news_rating": {"bias": "Lean Left", "factuality": "High",
                                    "ownership_category": "Billionaire"}}
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("demo").join("wp_conversation.json"),
        r#"{"publication": "The Washington Post", "turns": [
            {"agent": "Insider", "text": "It starts with a purchase.", "audio_path": "demo/audio/wp/turn_0.wav"}
        ]}"#,
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn files_mode_reads_catalog_and_demos() {
    let dir = temp_data_dir();
    let source = InvestigationSource::from_config(&SourceConfig {
        mode: SourceMode::Files,
        data_dir: dir.display().to_string(),
        ..SourceConfig::default()
    })
    .unwrap();
    assert_eq!(source.name(), "files");

    let catalog = source.publications().await.unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.first().unwrap().category, "Billionaire");

    let demo = source.demo("wp").await.unwrap().unwrap();
    assert_eq!(
        demo.turns.first().unwrap().audio_path.as_deref(),
        Some("demo/audio/wp/turn_0.wav")
    );
    assert!(source.demo("nyt").await.unwrap().is_none());
    assert!(matches!(
        source.start("wp").await,
        Err(SourceError::LiveUnavailable)
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn files_mode_reports_bad_json() {
    let dir = temp_data_dir();
    std::fs::write(dir.join("demo").join("bad_conversation.json"), "{not json").unwrap();
    let source = InvestigationSource::from_config(&SourceConfig {
        mode: SourceMode::Files,
        data_dir: dir.display().to_string(),
        ..SourceConfig::default()
    })
    .unwrap();

    assert!(matches!(
        source.demo("bad").await,
        Err(SourceError::Decode { .. })
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}
