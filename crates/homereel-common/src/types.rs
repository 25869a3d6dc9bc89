//! Catalog data model.
//!
//! A [`Catalog`] is a derived view of the media directories. It is rebuilt
//! from scratch on every scan and never mutated in place, so none of these
//! types carry interior mutability.

use serde::{Deserialize, Serialize};

/// A single movie: one folder holding one playable video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Folder name; unique within a catalog snapshot.
    pub id: String,
    pub title: String,
    pub description: String,
    pub year: Option<u16>,
    pub genre: String,
    pub rating: f32,
    pub duration_minutes: u32,
    pub cover_path: Option<String>,
    pub file_path: String,
}

/// A series with its seasons in ascending season order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,
    pub title: String,
    pub description: String,
    pub year: Option<u16>,
    pub genre: String,
    pub rating: f32,
    pub cover_path: Option<String>,
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    /// Always positive.
    pub season_number: u32,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// `{series-folder}_S{season}E{episode}`.
    pub id: String,
    /// 1-based position of the file within its season folder.
    pub episode_number: u32,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub file_path: String,
}

impl Episode {
    /// Build the stable episode id for a series folder, season and position.
    pub fn make_id(series_id: &str, season: u32, episode: u32) -> String {
        format!("{series_id}_S{season}E{episode}")
    }
}

impl Series {
    /// Total number of episodes across all seasons.
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

/// One top-level catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogEntry {
    Movie(Movie),
    Series(Series),
}

impl CatalogEntry {
    pub fn id(&self) -> &str {
        match self {
            CatalogEntry::Movie(m) => &m.id,
            CatalogEntry::Series(s) => &s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CatalogEntry::Movie(m) => &m.title,
            CatalogEntry::Series(s) => &s.title,
        }
    }
}

/// The result of one scan pass: movies first, then series, each in folder
/// name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.entries.iter().filter_map(|e| match e {
            CatalogEntry::Movie(m) => Some(m),
            CatalogEntry::Series(_) => None,
        })
    }

    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.entries.iter().filter_map(|e| match e {
            CatalogEntry::Series(s) => Some(s),
            CatalogEntry::Movie(_) => None,
        })
    }

    pub fn find(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
