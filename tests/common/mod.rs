//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use rom_launcher::config::LauncherConfig;
use rom_launcher::http::{AppState, HttpServer};
use rom_launcher::roms::RomName;
use rom_launcher::store::{
    EventStore, MemoryEventStore, PlayStat, SecurityEvent, SecurityEventKind, StoreError,
};

/// A router plus the directories and store behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: TempDir,
}

impl TestApp {
    /// Send one request from the default client address.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.send_from(request, client_addr(1)).await
    }

    /// Send one request from `addr`.
    pub async fn send_from(&self, request: Request<Body>, addr: SocketAddr) -> TestResponse {
        let response = self
            .router
            .clone()
            .layer(MockConnectInfo(addr))
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: bytes.to_vec(),
        }
    }

    pub async fn security_events(&self) -> Vec<SecurityEvent> {
        self.state.events.security_events(1000).await.unwrap()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn client_addr(last: u8) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, last], 40_000))
}

/// Default config rooted in `root`, with ROM and public directories created.
pub fn test_config(root: &Path) -> LauncherConfig {
    let mut config = LauncherConfig::default();
    config.paths.roms_dir = root.join("roms");
    config.paths.public_dir = root.join("public");
    config.paths.db_path = root.join("events.sqlite");
    std::fs::create_dir_all(&config.paths.roms_dir).unwrap();
    std::fs::create_dir_all(&config.paths.public_dir).unwrap();
    std::fs::write(
        config.paths.public_dir.join("index.html"),
        "<!doctype html><html><body>launcher</body></html>",
    )
    .unwrap();
    config
}

/// App over an in-memory store with default config.
pub fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}, Arc::new(MemoryEventStore::new()))
}

/// App with a tweaked config and a given store.
pub fn spawn_app_with(
    tweak: impl FnOnce(&mut LauncherConfig),
    store: Arc<dyn EventStore>,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    tweak(&mut config);

    let state = AppState::new(config, store);
    let server = HttpServer::new(state.clone());
    TestApp {
        router: server.router(),
        state,
        dir,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Store whose every operation fails, except security events which are kept.
#[derive(Default)]
pub struct BrokenStore {
    pub security: MemoryEventStore,
}

#[async_trait]
impl EventStore for BrokenStore {
    async fn append_play_event(&self, _rom_name: &RomName) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn append_security_event(
        &self,
        kind: SecurityEventKind,
        details: Option<String>,
    ) -> Result<i64, StoreError> {
        self.security.append_security_event(kind, details).await
    }

    async fn play_stats(&self) -> Result<Vec<PlayStat>, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        self.security.security_events(limit).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
