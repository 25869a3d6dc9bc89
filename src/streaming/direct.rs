//! Direct file streaming for videos and thumbnails.
//!
//! The full file is always sent. `Accept-Ranges: bytes` is advertised but
//! range requests are answered with the whole body.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use homereel_common::{paths::MediaKind, Error};
use std::path::PathBuf;

use super::transport::open_stream;
use crate::server::AppContext;

const VIDEO_NOT_FOUND: &str = "Video not found";
const THUMBNAIL_NOT_FOUND: &str = "Thumbnail not found";
const READ_FAILED: &str = "Failed to read file";

/// Stream a video file by its absolute path.
pub async fn stream_video(State(ctx): State<AppContext>, Path(path): Path<String>) -> Response {
    serve(&ctx, &path, MediaKind::Video, VIDEO_NOT_FOUND).await
}

/// Stream an image file by its absolute path.
pub async fn stream_thumbnail(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> Response {
    serve(&ctx, &path, MediaKind::Image, THUMBNAIL_NOT_FOUND).await
}

/// The wildcard capture is already percent-decoded; restore the leading
/// slash the router strips.
fn request_path(raw: &str) -> PathBuf {
    if raw.starts_with('/') {
        PathBuf::from(raw)
    } else {
        PathBuf::from(format!("/{raw}"))
    }
}

async fn serve(ctx: &AppContext, raw: &str, kind: MediaKind, not_found: &'static str) -> Response {
    let requested = request_path(raw);

    let path = if ctx.config.server.restrict_to_library {
        match ctx.contained_path(&requested) {
            Some(path) => path,
            None => {
                tracing::debug!("Refusing path outside media roots: {:?}", requested);
                return (StatusCode::NOT_FOUND, not_found).into_response();
            }
        }
    } else {
        requested
    };

    let media = match open_stream(&path, kind).await {
        Ok(media) => media,
        Err(Error::NotFound(_)) => return (StatusCode::NOT_FOUND, not_found).into_response(),
        Err(e) => {
            tracing::error!("Failed to open {:?}: {}", path, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, READ_FAILED).into_response();
        }
    };

    let log_path = path.clone();
    let stream = media.stream.inspect_err(move |e| {
        tracing::warn!("Read error while streaming {:?}: {}", log_path, e);
    });

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.mime)
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(size) = media.size {
        builder = builder.header(header::CONTENT_LENGTH, size.to_string());
    }

    match builder.body(Body::from_stream(stream)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build stream response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, READ_FAILED).into_response()
        }
    }
}
