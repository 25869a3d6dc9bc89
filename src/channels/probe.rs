//! Video duration probing for the channel scheduler.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tokio::process::Command;

/// Reports how long a video plays. `None` means unknown.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration(&self, path: &Path) -> Option<Duration>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse the duration out of `ffprobe -print_format json -show_format` output.
pub fn parse_ffprobe_duration(stdout: &[u8]) -> Option<Duration> {
    let output: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    let secs: f64 = output.format.duration?.trim().parse().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs))
}

/// Identifies one version of a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    async fn read(path: &Path) -> Option<Self> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Probe durations with `ffprobe`, caching results until the file changes.
pub struct FfprobeDurationProbe {
    binary: PathBuf,
    cache: DashMap<PathBuf, (FileStamp, Option<Duration>)>,
}

impl FfprobeDurationProbe {
    pub fn new() -> Self {
        let binary = which::which("ffprobe").unwrap_or_else(|_| PathBuf::from("ffprobe"));
        Self::with_binary(binary)
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cache: DashMap::new(),
        }
    }

    async fn run(&self, path: &Path) -> Option<Duration> {
        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => parse_ffprobe_duration(&output.stdout),
            Ok(output) => {
                tracing::debug!("ffprobe exited with {} for {:?}", output.status, path);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to run {:?}: {}", self.binary, e);
                None
            }
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration(&self, path: &Path) -> Option<Duration> {
        let Some(stamp) = FileStamp::read(path).await else {
            self.cache.remove(path);
            return None;
        };
        if let Some(cached) = self.cache.get(path) {
            if cached.0 == stamp {
                return cached.1;
            }
        }
        let duration = self.run(path).await;
        self.cache.insert(path.to_path_buf(), (stamp, duration));
        duration
    }
}

/// Fixed durations, for tests and for libraries without ffprobe.
#[derive(Debug, Clone, Default)]
pub struct StaticDurationProbe {
    default: Option<Duration>,
    durations: HashMap<PathBuf, Option<Duration>>,
}

impl StaticDurationProbe {
    /// Every file reports `default`.
    pub fn new(default: Option<Duration>) -> Self {
        Self {
            default,
            durations: HashMap::new(),
        }
    }

    pub fn with(mut self, path: impl Into<PathBuf>, duration: Option<Duration>) -> Self {
        self.durations.insert(path.into(), duration);
        self
    }
}

#[async_trait]
impl DurationProbe for StaticDurationProbe {
    async fn duration(&self, path: &Path) -> Option<Duration> {
        self.durations.get(path).copied().unwrap_or(self.default)
    }
}
