//! Path utilities for detecting file types by extension.
//!
//! The scanner uses these to decide which files count as videos and covers,
//! and the stream transport uses them to pick a `Content-Type`.

use std::path::{Component, Path, PathBuf};

/// List of recognized video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "webm", "mov", "flv", "wmv", "m4v"];

/// List of recognized image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// What a requested file is expected to be. Selects the MIME fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use homereel_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_video_file(Path::new("poster.jpg")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path has an image file extension.
pub fn is_image_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of image file extensions.
#[must_use]
pub fn image_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}

/// Determine the content type of a file from its extension.
///
/// Unknown extensions fall back to `video/mp4` for videos and `image/jpeg`
/// for images.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use homereel_common::paths::{mime_type, MediaKind};
///
/// assert_eq!(mime_type(Path::new("a.webm"), MediaKind::Video), "video/webm");
/// assert_eq!(mime_type(Path::new("a.xyz"), MediaKind::Video), "video/mp4");
/// assert_eq!(mime_type(Path::new("a.xyz"), MediaKind::Image), "image/jpeg");
/// ```
pub fn mime_type(path: &Path, kind: MediaKind) -> &'static str {
    let ext = lowercase_extension(path).unwrap_or_default();
    match kind {
        MediaKind::Video => match ext.as_str() {
            "mp4" => "video/mp4",
            "m4v" => "video/x-m4v",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "avi" => "video/x-msvideo",
            "mov" => "video/quicktime",
            "flv" => "video/x-flv",
            "wmv" => "video/x-ms-wmv",
            _ => "video/mp4",
        },
        MediaKind::Image => match ext.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            _ => "image/jpeg",
        },
    }
}

/// Resolve a configured media root to the absolute form every catalog path
/// is built from.
///
/// Existing roots are canonicalized. A root that does not exist yet is made
/// absolute against the working directory.
pub fn resolve_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root)
        .or_else(|_| std::path::absolute(root))
        .unwrap_or_else(|_| root.to_path_buf())
}

/// Lexically clean an absolute request path.
///
/// Returns `None` for relative paths and for paths with a `..` component.
/// `.` components are dropped. Symlinks are left unresolved, so a path
/// handed out by the scanner compares equal to the one it came from.
pub fn clean_absolute(path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() {
        return None;
    }
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => return None,
            Component::CurDir => {}
            other => clean.push(other.as_os_str()),
        }
    }
    Some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        for ext in VIDEO_EXTENSIONS {
            assert!(is_video_file(Path::new(&format!("movie.{ext}"))));
        }

        // Case insensitive
        assert!(is_video_file(Path::new("movie.MKV")));
        assert!(is_video_file(Path::new("movie.Mp4")));

        // Not video files
        assert!(!is_video_file(Path::new("movie.ts")));
        assert!(!is_video_file(Path::new("subtitle.srt")));
        assert!(!is_video_file(Path::new("poster.jpg")));
        assert!(!is_video_file(Path::new("no_extension")));
        assert!(!is_video_file(Path::new("")));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("poster.jpg")));
        assert!(is_image_file(Path::new("poster.JPEG")));
        assert!(is_image_file(Path::new("/covers/thumb.png")));
        assert!(!is_image_file(Path::new("movie.mkv")));
    }

    #[test]
    fn test_video_mime_types() {
        assert_eq!(mime_type(Path::new("a.mkv"), MediaKind::Video), "video/x-matroska");
        assert_eq!(mime_type(Path::new("a.MKV"), MediaKind::Video), "video/x-matroska");
        assert_eq!(mime_type(Path::new("a.mp4"), MediaKind::Video), "video/mp4");
        assert_eq!(mime_type(Path::new("a.avi"), MediaKind::Video), "video/x-msvideo");
        assert_eq!(mime_type(Path::new("a.mov"), MediaKind::Video), "video/quicktime");
        assert_eq!(mime_type(Path::new("a"), MediaKind::Video), "video/mp4");
    }

    #[test]
    fn test_image_mime_types() {
        assert_eq!(mime_type(Path::new("a.png"), MediaKind::Image), "image/png");
        assert_eq!(mime_type(Path::new("a.jpg"), MediaKind::Image), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.tiff"), MediaKind::Image), "image/jpeg");
    }

    #[test]
    fn test_clean_absolute() {
        assert_eq!(
            clean_absolute(Path::new("/media/./Movies/a.mp4")),
            Some(PathBuf::from("/media/Movies/a.mp4"))
        );
        assert_eq!(clean_absolute(Path::new("/media/Movies/../private/a.mp4")), None);
        assert_eq!(clean_absolute(Path::new("Movies/a.mp4")), None);
    }

    #[test]
    fn test_resolve_root_is_absolute() {
        let missing = resolve_root(Path::new("not-created-yet/Movies"));
        assert!(missing.is_absolute());
        assert!(missing.ends_with("not-created-yet/Movies"));

        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(resolve_root(Path::new(".")), cwd);
    }
}
