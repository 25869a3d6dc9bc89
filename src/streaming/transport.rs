//! Open a file as a chunked byte stream.

use homereel_common::paths::{mime_type, MediaKind};
use homereel_common::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Bytes read from disk per chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// An open, read-only file ready to be sent as a response body.
///
/// Dropping the stream closes the file handle.
#[derive(Debug)]
pub struct MediaStream {
    pub stream: ReaderStream<File>,
    pub mime: &'static str,
    pub size: Option<u64>,
}

/// Open `path` for streaming.
///
/// Fails with [`Error::NotFound`] unless the path resolves to an existing,
/// readable regular file. The file is opened read-only, so any number of
/// streams may share it.
pub async fn open_stream(path: &Path, kind: MediaKind) -> Result<MediaStream> {
    let file = File::open(path).await.map_err(|e| open_error(path, e))?;
    let metadata = file.metadata().await.map_err(|e| open_error(path, e))?;

    if !metadata.is_file() {
        return Err(Error::not_found(path.display().to_string()));
    }

    Ok(MediaStream {
        stream: ReaderStream::with_capacity(file, CHUNK_SIZE),
        mime: mime_type(path, kind),
        size: Some(metadata.len()),
    })
}

fn open_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            Error::not_found(path.display().to_string())
        }
        _ => Error::Io(err),
    }
}
