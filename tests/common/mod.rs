//! Shared test harness for integration tests.
//!
//! [`Library`] builds a throwaway media tree under a temp dir and a
//! [`Config`] pointing at it. [`context`] wires an [`AppContext`] with a
//! fixed-duration probe and an in-memory store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::Request,
    response::Response,
    Router,
};
use homereel::channels::StaticDurationProbe;
use homereel::clients::{Clock, SystemClock};
use homereel::config::{ChannelDefinition, Config};
use homereel::server::{create_router, AppContext};
use homereel::store::MemoryStore;
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// A media tree with `Movies/` and `Series/` roots.
pub struct Library {
    pub dir: TempDir,
    pub movies: PathBuf,
    pub series: PathBuf,
}

impl Library {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let movies = dir.path().join("Movies");
        let series = dir.path().join("Series");
        std::fs::create_dir_all(&movies).unwrap();
        std::fs::create_dir_all(&series).unwrap();

        // Canonical roots so scanned paths match what containment checks see.
        Self {
            movies: movies.canonicalize().unwrap(),
            series: series.canonicalize().unwrap(),
            dir,
        }
    }

    /// Write `contents` to `path` (relative to the temp dir), creating parents.
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().canonicalize().unwrap().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn movie(&self, folder: &str, files: &[&str]) -> &Self {
        for file in files {
            self.write(&format!("Movies/{folder}/{file}"), b"movie-bytes");
        }
        self
    }

    pub fn episode(&self, series: &str, season: &str, file: &str) -> &Self {
        self.write(&format!("Series/{series}/{season}/{file}"), b"episode-bytes");
        self
    }

    pub fn channel(&self, id: &str, folders: &[&str]) -> ChannelDefinition {
        ChannelDefinition {
            id: id.to_string(),
            name: format!("Channel {id}"),
            description: String::new(),
            cover_path: None,
            folders: folders.iter().map(|f| self.path(f)).collect(),
            active: true,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().canonicalize().unwrap().join(relative)
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.library.movies_dir = self.movies.clone();
        config.library.series_dir = self.series.clone();
        config.server.host = "127.0.0.1".to_string();
        config.channels.autostart = false;
        config
    }
}

/// Context with every file lasting `secs` seconds.
pub fn context(config: Config) -> AppContext {
    context_with(config, Arc::new(SystemClock), 10)
}

pub fn context_with(config: Config, clock: Arc<dyn Clock>, secs: u64) -> AppContext {
    AppContext::with_parts(
        config,
        Arc::new(StaticDurationProbe::new(Some(Duration::from_secs(secs)))),
        clock,
        Arc::new(MemoryStore::default()),
    )
}

pub fn router(ctx: &AppContext) -> Router {
    create_router(ctx.clone())
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    json_request(app, "POST", uri, body).await
}

pub async fn json_request(
    app: Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Percent-encode an absolute path the way catalog URLs do.
pub fn encoded(path: &Path) -> String {
    let url = homereel::server::media_url("", "x", path.to_str().unwrap());
    url.trim_start_matches("/api/x/").to_string()
}
