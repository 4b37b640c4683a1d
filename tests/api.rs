//! API behaviour tests driven through the full router.

use std::fs;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use rom_launcher::store::{MemoryEventStore, SecurityEventKind, SqliteEventStore};

mod common;
use common::{client_addr, get, post_json, spawn_app, spawn_app_with, BrokenStore};

#[tokio::test]
async fn test_health() {
    let app = spawn_app();
    let res = app.send(get("/api/health")).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "development");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_roms_listing_filters_invalid_names() {
    let app = spawn_app();
    let roms_dir = &app.state.config.paths.roms_dir;
    for name in ["Pokemon Emerald.gba", "notes.txt", "..evil.gba", "bad;name.gba"] {
        fs::write(roms_dir.join(name), b"rom").unwrap();
    }

    let res = app.send(get("/api/roms")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"roms": ["Pokemon Emerald.gba"]}));
}

#[tokio::test]
async fn test_roms_missing_directory() {
    let app = spawn_app_with(
        |config| config.paths.roms_dir = config.paths.roms_dir.join("missing"),
        Arc::new(MemoryEventStore::new()),
    );

    let res = app.send(get("/api/roms")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"roms": []}));
    assert!(app.security_events().await.is_empty());
}

#[tokio::test]
async fn test_roms_io_failure_is_internal() {
    let app = spawn_app();
    let not_a_dir = app.dir.path().join("file-not-dir");
    fs::write(&not_a_dir, b"").unwrap();
    let app = spawn_app_with(
        move |config| config.paths.roms_dir = not_a_dir,
        Arc::new(MemoryEventStore::new()),
    );

    let res = app.send(get("/api/roms")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "Failed to list ROMs.");
}

#[tokio::test]
async fn test_play_then_stats() {
    let app = spawn_app();

    let res = app
        .send(post_json("/api/rom-play", r#"{"romName": "Pokemon Emerald.gba"}"#))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json(), json!({"ok": true}));

    let res = app.send(get("/api/rom-stats")).await;
    assert_eq!(res.status, StatusCode::OK);
    let data = res.json()["data"].clone();
    assert_eq!(data[0]["rom_name"], "Pokemon Emerald.gba");
    assert_eq!(data[0]["play_count"], 1);
    assert!(data[0]["last_played"].is_string());
}

#[tokio::test]
async fn test_stats_rank_by_count() {
    let app = spawn_app();
    for _ in 0..3 {
        app.send(post_json("/api/rom-play", r#"{"romName": "b.gba"}"#)).await;
    }
    app.send(post_json("/api/rom-play", r#"{"romName": "a.gba"}"#)).await;

    let data = app.send(get("/api/rom-stats")).await.json()["data"].clone();
    assert_eq!(data[0]["rom_name"], "b.gba");
    assert_eq!(data[0]["play_count"], 3);
    assert_eq!(data[1]["rom_name"], "a.gba");
    assert_eq!(data[1]["play_count"], 1);
}

#[tokio::test]
async fn test_traversal_rejected_and_audited() {
    let app = spawn_app();

    let res = app
        .send(post_json("/api/rom-play", r#"{"romName": "../../etc/passwd"}"#))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid ROM name format.");

    let stats = app.send(get("/api/rom-stats")).await.json();
    assert_eq!(stats, json!({"data": []}));

    let events = app.security_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, SecurityEventKind::PathTraversal);
    let details: serde_json::Value =
        serde_json::from_str(events[0].details.as_deref().unwrap()).unwrap();
    assert_eq!(details["statusCode"], 400);
    assert_eq!(details["path"], "/api/rom-play");
    assert_eq!(details["method"], "POST");
}

#[tokio::test]
async fn test_rejection_reasons() {
    let app = spawn_app();
    let cases = [
        (r#"{}"#, SecurityEventKind::InvalidLength),
        (r#"{"romName": 42}"#, SecurityEventKind::InvalidLength),
        (r#"{"romName": ""}"#, SecurityEventKind::InvalidLength),
        (r#"{"romName": "game.zip"}"#, SecurityEventKind::InvalidCharacters),
        (r#"{"romName": "C:\\roms\\x.gba"}"#, SecurityEventKind::PathTraversal),
        (r#"["a.gba"]"#, SecurityEventKind::InvalidRequestFormat),
        (r#""a.gba""#, SecurityEventKind::InvalidRequestFormat),
        (
            r#"{"romName": "a.gba", "x": {"a": {"b": {"c": {"d": {"e": 1}}}}}}"#,
            SecurityEventKind::RequestTooComplex,
        ),
        (r#"{"romName": "#, SecurityEventKind::MalformedBody),
    ];

    for (body, expected) in cases {
        let res = app.send(post_json("/api/rom-play", body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert!(res.json()["error"].is_string(), "{body}");

        let events = app.security_events().await;
        assert_eq!(events[0].event_type, expected, "{body}");
    }

    assert_eq!(app.security_events().await.len(), cases.len());
    assert_eq!(app.send(get("/api/rom-stats")).await.json(), json!({"data": []}));
}

#[tokio::test]
async fn test_oversized_body() {
    let app = spawn_app_with(
        |config| config.security.max_body_bytes = 64,
        Arc::new(MemoryEventStore::new()),
    );
    let body = format!(r#"{{"romName": "{}.gba"}}"#, "a".repeat(200));

    let res = app.send(post_json("/api/rom-play", &body)).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(res.json()["error"].is_string());
    assert_eq!(
        app.security_events().await[0].event_type,
        SecurityEventKind::PayloadTooLarge
    );
}

#[tokio::test]
async fn test_rate_limit_ceiling() {
    let app = spawn_app();

    for i in 0..100 {
        let res = app
            .send(post_json("/api/rom-play", r#"{"romName": "a.gba"}"#))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "request {i}");
    }

    // Over the ceiling the validator is never reached.
    let res = app
        .send(post_json("/api/rom-play", r#"{"romName": "../x"}"#))
        .await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.json()["error"],
        "Too many requests. Please try again later."
    );
    assert!(res.header("retry-after").is_some());
    assert_eq!(res.header("ratelimit-remaining"), Some("0"));

    let events = app.security_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, SecurityEventKind::RateLimited);

    // Other addresses and the health check are unaffected.
    let res = app.send_from(get("/api/roms"), client_addr(2)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.send(get("/api/health")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_headers_and_shared_budget() {
    let app = spawn_app_with(
        |config| config.rate_limit.max_requests = 3,
        Arc::new(MemoryEventStore::new()),
    );

    let res = app.send(get("/api/roms")).await;
    assert_eq!(res.header("ratelimit-limit"), Some("3"));
    assert_eq!(res.header("ratelimit-remaining"), Some("2"));

    app.send(get("/api/rom-stats")).await;
    app.send(post_json("/api/rom-play", r#"{"romName": "a.gba"}"#)).await;
    let res = app.send(get("/api/roms")).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_disabled() {
    let app = spawn_app_with(
        |config| {
            config.rate_limit.enabled = false;
            config.rate_limit.max_requests = 1;
        },
        Arc::new(MemoryEventStore::new()),
    );
    for _ in 0..5 {
        assert_eq!(app.send(get("/api/roms")).await.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_unknown_api_route() {
    let app = spawn_app();
    let res = app.send(get("/api/nope")).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({"error": "Route /api/nope not found"}));
    assert_eq!(
        app.security_events().await[0].event_type,
        SecurityEventKind::NotFound
    );
}

#[tokio::test]
async fn test_wrong_method() {
    let app = spawn_app();
    let res = app.send(get("/api/rom-play")).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.json()["error"].is_string());
}

#[tokio::test]
async fn test_play_logging_failure_is_soft() {
    let store = Arc::new(BrokenStore::default());
    let app = spawn_app_with(|_| {}, store);

    let res = app
        .send(post_json("/api/rom-play", r#"{"romName": "a.gba"}"#))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let events = app.security_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, SecurityEventKind::RomPlayLogError);
}

#[tokio::test]
async fn test_stats_failure_in_development_shows_message() {
    let app = spawn_app_with(|_| {}, Arc::new(BrokenStore::default()));
    let res = app.send(get("/api/rom-stats")).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "Failed to get statistics.");
    assert_eq!(
        app.security_events().await[0].event_type,
        SecurityEventKind::HttpError
    );
}

#[tokio::test]
async fn test_stats_failure_in_production_is_generic() {
    let app = spawn_app_with(
        |config| config.server.environment = "production".into(),
        Arc::new(BrokenStore::default()),
    );
    let res = app.send(get("/api/rom-stats")).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json(), json!({"error": "Internal server error."}));
    assert!(res.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_rom_bytes_are_octet_stream() {
    let app = spawn_app();
    fs::write(
        app.state.config.paths.roms_dir.join("Pokemon Emerald.gba"),
        b"\x00\x01ROM",
    )
    .unwrap();

    let res = app.send(get("/roms/Pokemon%20Emerald.gba")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    assert_eq!(res.body, b"\x00\x01ROM");
    assert!(res.header("cache-control").unwrap().contains("immutable"));
}

#[tokio::test]
async fn test_missing_rom_file_is_audited() {
    let app = spawn_app();
    let res = app.send(get("/roms/absent.gba")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.security_events().await[0].event_type,
        SecurityEventKind::HttpError
    );
}

#[tokio::test]
async fn test_front_end_fallback() {
    let app = spawn_app();

    for path in ["/", "/library/some-page"] {
        let res = app.send(get(path)).await;
        assert_eq!(res.status, StatusCode::OK, "{path}");
        assert!(res.text().contains("launcher"), "{path}");
        assert_eq!(
            res.header("cache-control"),
            Some("no-cache, no-store, must-revalidate")
        );
    }
}

#[tokio::test]
async fn test_common_headers() {
    let app = spawn_app();
    let res = app.send(get("/api/health")).await;

    let id = res.header("x-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
    assert!(res
        .header("content-security-policy")
        .unwrap()
        .contains("https://cdn.emulatorjs.org"));
}

#[tokio::test]
async fn test_cors_allows_loopback_only() {
    let app = spawn_app();

    let allowed = axum::http::Request::builder()
        .uri("/api/health")
        .header("origin", "http://localhost:5173")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app.send(allowed).await;
    assert_eq!(
        res.header("access-control-allow-origin"),
        Some("http://localhost:5173")
    );

    let denied = axum::http::Request::builder()
        .uri("/api/health")
        .header("origin", "https://evil.example")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app.send(denied).await;
    assert!(res.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_sqlite_backed_flow() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteEventStore::open(dir.path().join("events.sqlite")).unwrap());
    let app = spawn_app_with(|_| {}, store);

    app.send(post_json("/api/rom-play", r#"{"romName": "Zelda.gba"}"#)).await;
    app.send(post_json("/api/rom-play", r#"{"romName": "../Zelda.gba"}"#)).await;

    let data = app.send(get("/api/rom-stats")).await.json()["data"].clone();
    assert_eq!(data, json!([{
        "rom_name": "Zelda.gba",
        "play_count": 1,
        "last_played": data[0]["last_played"].clone(),
    }]));

    let events = app.security_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, SecurityEventKind::PathTraversal);
}
