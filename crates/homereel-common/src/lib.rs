//! Homereel-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across homereel:
//!
//! - **Catalog Types**: Movies, series, seasons, and episodes produced by a scan
//! - **Path Utilities**: Extension tables and MIME lookup for videos and images
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use homereel_common::paths::{is_video_file, mime_type, MediaKind};
//! use homereel_common::{Error, Result};
//! use std::path::Path;
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//! assert_eq!(mime_type(Path::new("movie.mkv"), MediaKind::Video), "video/x-matroska");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("movie.mkv"))
//! }
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
