//! Descriptive metadata for catalog entries.
//!
//! Folder names give the title and, when they end in `(YYYY)`, the year.
//! An optional `metadata.json` sidecar written by an enrichment pass
//! overrides any of these.

use serde::Deserialize;
use std::path::Path;

pub const SIDECAR_FILE: &str = "metadata.json";

pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_GENRE: &str = "Unknown";

/// Fields an enrichment pass may supply. Anything absent keeps its filler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<u16>,
    pub genre: Option<String>,
    pub rating: Option<f32>,
    pub duration_minutes: Option<u32>,
}

/// Read the sidecar in `dir`, if any.
///
/// A missing file is the common case and yields the empty sidecar. A
/// malformed file is logged and ignored.
pub fn read_sidecar(dir: &Path) -> Sidecar {
    let path = dir.join(SIDECAR_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Sidecar::default(),
    };

    match serde_json::from_str(&content) {
        Ok(sidecar) => sidecar,
        Err(e) => {
            tracing::warn!("Ignoring malformed metadata sidecar {:?}: {}", path, e);
            Sidecar::default()
        }
    }
}

/// The folder name with underscores shown as spaces.
pub fn title_from_folder(name: &str) -> String {
    name.replace('_', " ")
}

/// Extract a trailing `(YYYY)` from a folder name.
pub fn year_from_folder(name: &str) -> Option<u16> {
    let name = name.trim_end();
    let inner = name.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|y| (1800..=2200).contains(y))
}

/// Resolved descriptive fields for one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub title: String,
    pub description: String,
    pub year: Option<u16>,
    pub genre: String,
    pub rating: f32,
    pub duration_minutes: u32,
}

impl Descriptor {
    pub fn resolve(folder_name: &str, sidecar: Sidecar) -> Self {
        Self {
            title: sidecar
                .title
                .unwrap_or_else(|| title_from_folder(folder_name)),
            description: sidecar
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            year: sidecar.year.or_else(|| year_from_folder(folder_name)),
            genre: sidecar.genre.unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            rating: sidecar.rating.unwrap_or(0.0),
            duration_minutes: sidecar.duration_minutes.unwrap_or(0),
        }
    }
}
