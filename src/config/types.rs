use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub clients: ClientsConfig,
}

impl Config {
    /// Every path a stream or thumbnail request may be served from: the
    /// library roots, channel folders and channel covers.
    pub fn media_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![
            self.library.movies_dir.clone(),
            self.library.series_dir.clone(),
        ];
        for channel in &self.channels.definitions {
            roots.extend(channel.folders.iter().cloned());
            roots.extend(channel.cover_path.iter().cloned());
        }
        roots
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL embedded in catalog links (e.g. `http://192.168.1.20:8080`).
    /// When unset, the request's `Host` header is used.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Only serve stream/thumbnail paths under the library roots or a
    /// channel folder.
    #[serde(default = "default_restrict_to_library")]
    pub restrict_to_library: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_restrict_to_library() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            restrict_to_library: default_restrict_to_library(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        use anyhow::Context;
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid server address: {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_movies_dir")]
    pub movies_dir: PathBuf,

    #[serde(default = "default_series_dir")]
    pub series_dir: PathBuf,
}

fn default_movies_dir() -> PathBuf {
    PathBuf::from("Movies")
}
fn default_series_dir() -> PathBuf {
    PathBuf::from("Series")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            movies_dir: default_movies_dir(),
            series_dir: default_series_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelsConfig {
    /// Scheduler tick in milliseconds (default: 1000)
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Start every active channel when the server starts (default: true)
    #[serde(default = "default_autostart")]
    pub autostart: bool,

    #[serde(default)]
    pub definitions: Vec<ChannelDefinition>,
}

fn default_tick_millis() -> u64 {
    1000
}
fn default_autostart() -> bool {
    true
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            autostart: default_autostart(),
            definitions: Vec::new(),
        }
    }
}

/// An operator-defined virtual live feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDefinition {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, alias = "cover_path")]
    pub cover_path: Option<PathBuf>,

    #[serde(default)]
    pub folders: Vec<PathBuf>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON file backing the key-value store. In-memory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientsConfig {
    /// Seconds without a heartbeat before a client is considered gone (default: 300)
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

fn default_stale_after() -> u64 {
    300
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
        }
    }
}
