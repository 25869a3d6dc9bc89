use crate::channels::{ChannelScheduler, DurationProbe, FfprobeDurationProbe};
use crate::clients::{Clock, ClientRegistry, SystemClock};
use crate::config::{ChannelDefinition, Config};
use crate::scanner::Scanner;
use crate::store::{open_store, KeyValueStore};
use crate::streaming;
use axum::{
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    Router,
};
use homereel_common::paths::{clean_absolute, resolve_root};
use homereel_common::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_api;
pub mod routes_channels;
pub mod routes_clients;
pub mod routes_library;
pub mod routes_playback;

/// How long in-flight responses get to finish when the server stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Characters left as-is in path segments of generated URLs.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub scanner: Arc<Scanner>,
    pub channels: Arc<ChannelScheduler>,
    pub clients: ClientRegistry,
    pub store: Arc<dyn KeyValueStore>,
    /// [`Config::media_roots`], resolved the same way the scanner resolves
    /// its roots.
    media_roots: Arc<[PathBuf]>,
}

impl AppContext {
    /// Build a context with the production collaborators.
    pub fn new(config: Config) -> Result<Self> {
        let store = open_store(&config.storage)?;
        Ok(Self::with_parts(
            config,
            Arc::new(FfprobeDurationProbe::new()),
            Arc::new(SystemClock),
            store,
        ))
    }

    pub fn with_parts(
        config: Config,
        probe: Arc<dyn DurationProbe>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let tick = Duration::from_millis(config.channels.tick_millis);
        let stale_after = Duration::from_secs(config.clients.stale_after_secs);
        let media_roots = config
            .media_roots()
            .iter()
            .map(|root| resolve_root(root))
            .collect();
        Self {
            media_roots,
            scanner: Arc::new(Scanner::from_config(&config.library)),
            channels: Arc::new(ChannelScheduler::new(probe, tick)),
            clients: ClientRegistry::with_clock(clock, stale_after),
            store,
            config: Arc::new(config),
        }
    }

    pub fn channel_definition(&self, id: &str) -> Option<&ChannelDefinition> {
        self.config.channels.definitions.iter().find(|d| d.id == id)
    }

    /// Return `requested`, lexically cleaned, if it lies under a media root.
    ///
    /// Paths with `..` are refused. Symlinks below a root are not resolved,
    /// so folders linked in from another disk stay servable.
    pub fn contained_path(&self, requested: &Path) -> Option<PathBuf> {
        let path = clean_absolute(requested)?;
        self.media_roots
            .iter()
            .any(|root| path.starts_with(root))
            .then_some(path)
    }

    /// Base URL for links handed to clients, without a trailing slash.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.server.public_url {
            return url.trim_end_matches('/').to_string();
        }
        match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
            Some(host) => format!("http://{host}"),
            None => format!("http://{}:{}", self.config.server.host, self.config.server.port),
        }
    }
}

/// Absolute URL for `route` (`stream` or `thumbnail`) serving `path`.
pub fn media_url(base: &str, route: &str, path: &str) -> String {
    format!("{base}/api/{route}/{}", utf8_percent_encode(path, PATH_SEGMENT))
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn api_routes() -> Router<AppContext> {
    routes_api::api_routes()
        .merge(routes_library::library_routes())
        .merge(routes_clients::client_routes())
        .merge(routes_playback::playback_routes())
        .merge(routes_channels::channel_routes())
        .merge(streaming::stream_router())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

enum ServerState {
    Stopped,
    Running {
        addr: SocketAddr,
        cancel: CancellationToken,
        handle: JoinHandle<std::io::Result<()>>,
    },
}

/// A restartable HTTP server.
///
/// `stop` releases the listening socket before returning, so `start` may
/// bind the same port again.
pub struct MediaServer {
    ctx: AppContext,
    state: Mutex<ServerState>,
}

impl MediaServer {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(ServerState::Stopped),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            ServerState::Running { addr, .. } => Some(*addr),
            ServerState::Stopped => None,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.local_addr().await.is_some()
    }

    /// Bind and start serving. Returns the bound address.
    ///
    /// Fails with [`Error::PortInUse`] if the port is taken; the server
    /// then stays stopped. Calling `start` on a running server returns its
    /// address.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut state = self.state.lock().await;
        if let ServerState::Running { addr, .. } = &*state {
            return Ok(*addr);
        }

        let addr = self
            .ctx
            .config
            .server
            .socket_addr()
            .map_err(|e| Error::invalid_input(e.to_string()))?;

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                Error::PortInUse(addr.to_string())
            } else {
                Error::Io(e)
            }
        })?;
        let addr = listener.local_addr()?;

        let app = create_router(self.ctx.clone());
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
        });

        tracing::info!("Server listening on {}", addr);
        *state = ServerState::Running {
            addr,
            cancel,
            handle,
        };

        if self.ctx.config.channels.autostart {
            let started = self
                .ctx
                .channels
                .start_all(&self.ctx.config.channels.definitions)
                .await;
            tracing::info!(channels = started, "Channels started");
        }

        Ok(addr)
    }

    /// Stop serving and shut down every channel. Safe to call when stopped.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if let ServerState::Running {
            addr,
            cancel,
            mut handle,
        } = std::mem::replace(&mut *state, ServerState::Stopped)
        {
            cancel.cancel();
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::error!("Server error: {}", e),
                Ok(Err(e)) => tracing::error!("Server task failed: {}", e),
                Err(_) => {
                    tracing::warn!("Connections still open after {:?}; aborting", SHUTDOWN_GRACE);
                    handle.abort();
                    let _ = handle.await;
                }
            }
            tracing::info!("Server on {} stopped", addr);
        }

        self.ctx.channels.shutdown().await;
    }

    /// Start, wait for Ctrl+C or SIGTERM, then stop.
    pub async fn run_until_signal(&self) -> Result<()> {
        self.start().await?;
        shutdown_signal().await;
        self.stop().await;
        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        if let ServerState::Running { cancel, .. } = self.state.get_mut() {
            cancel.cancel();
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
