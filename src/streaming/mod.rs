//! Media streaming module.
//!
//! # Routes
//!
//! - `GET /stream/{path}` - Stream a video file
//! - `GET /thumbnail/{path}` - Stream a cover image
//!
//! `{path}` is the percent-encoded absolute filesystem path.

mod direct;
pub mod transport;

pub use direct::{stream_thumbnail, stream_video};
pub use transport::{open_stream, MediaStream};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the streaming router.
pub fn stream_router() -> Router<AppContext> {
    Router::new()
        .route("/stream/*path", get(stream_video))
        .route("/thumbnail/*path", get(stream_thumbnail))
}
