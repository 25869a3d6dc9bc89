//! Media library scanner.
//!
//! Builds a [`Catalog`] from the movies and series roots using folder naming
//! conventions. A malformed entry is logged and skipped; it never aborts the
//! rest of the scan.

pub mod metadata;
pub mod walk;

use homereel_common::{
    paths::{is_video_file, resolve_root},
    Catalog, CatalogEntry, Episode, Movie, Season, Series,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::LibraryConfig;
use metadata::{read_sidecar, Descriptor, DEFAULT_DESCRIPTION};

/// Why a candidate folder or file produced no catalog entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("no recognized video file")]
    NoVideo,

    #[error("no season folder with videos")]
    NoSeasons,

    #[error("season {0} appears more than once")]
    DuplicateSeason(u32),

    #[error("path is not valid UTF-8")]
    NonUtf8Path,
}

/// A skipped candidate and the reason it was skipped.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// The catalog plus everything that was passed over while building it.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub catalog: Catalog,
    pub skipped: Vec<Skipped>,
}

/// Scanner over a movies root and a series root.
#[derive(Debug, Clone)]
pub struct Scanner {
    movies_dir: PathBuf,
    series_dir: PathBuf,
}

/// Scan both roots and return the catalog.
pub fn scan(movies_dir: &Path, series_dir: &Path) -> Catalog {
    Scanner::new(movies_dir, series_dir).scan()
}

impl Scanner {
    /// Roots are resolved to absolute paths here, so every path in a
    /// catalog is absolute.
    pub fn new(movies_dir: impl Into<PathBuf>, series_dir: impl Into<PathBuf>) -> Self {
        Self {
            movies_dir: resolve_root(&movies_dir.into()),
            series_dir: resolve_root(&series_dir.into()),
        }
    }

    pub fn from_config(library: &LibraryConfig) -> Self {
        Self::new(&library.movies_dir, &library.series_dir)
    }

    pub fn movies_dir(&self) -> &Path {
        &self.movies_dir
    }

    pub fn series_dir(&self) -> &Path {
        &self.series_dir
    }

    /// Build a fresh catalog: movies first, then series, each in folder name order.
    pub fn scan(&self) -> Catalog {
        self.scan_report().catalog
    }

    /// Like [`Scanner::scan`], also returning the skipped candidates.
    pub fn scan_report(&self) -> ScanReport {
        let mut report = ScanReport::default();

        for dir in root_children(&self.movies_dir, "movies") {
            match scan_movie(&dir) {
                Ok(movie) => report.catalog.entries.push(CatalogEntry::Movie(movie)),
                Err(reason) => skip(&mut report, dir, reason),
            }
        }

        for dir in root_children(&self.series_dir, "series") {
            match scan_series(&dir, &mut report.skipped) {
                Ok(series) => report.catalog.entries.push(CatalogEntry::Series(series)),
                Err(reason) => skip(&mut report, dir, reason),
            }
        }

        info!(
            entries = report.catalog.len(),
            skipped = report.skipped.len(),
            "Catalog scan complete"
        );
        report
    }
}

fn skip(report: &mut ScanReport, path: PathBuf, reason: SkipReason) {
    debug!("Skipping {:?}: {}", path, reason);
    report.skipped.push(Skipped { path, reason });
}

fn root_children(root: &Path, label: &str) -> Vec<PathBuf> {
    if !root.is_dir() {
        warn!("{} root does not exist or is not a directory: {:?}", label, root);
        return Vec::new();
    }
    walk::child_dirs(root)
}

fn utf8(path: &Path) -> Result<String, SkipReason> {
    path.to_str()
        .map(str::to_string)
        .ok_or(SkipReason::NonUtf8Path)
}

fn folder_name(dir: &Path) -> Result<String, SkipReason> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or(SkipReason::NonUtf8Path)
}

/// A non-video file whose name contains "poster" or "thumb".
fn find_cover(files: &[PathBuf]) -> Option<String> {
    files
        .iter()
        .filter(|f| !is_video_file(f))
        .find(|f| {
            f.file_name()
                .and_then(|n| n.to_str())
                .map(|n| {
                    let n = n.to_lowercase();
                    n.contains("poster") || n.contains("thumb")
                })
                .unwrap_or(false)
        })
        .and_then(|f| f.to_str().map(str::to_string))
}

fn scan_movie(dir: &Path) -> Result<Movie, SkipReason> {
    let id = folder_name(dir)?;
    let files = walk::child_files(dir);

    let video = files
        .iter()
        .find(|f| is_video_file(f))
        .ok_or(SkipReason::NoVideo)?;
    let file_path = utf8(video)?;

    let d = Descriptor::resolve(&id, read_sidecar(dir));
    Ok(Movie {
        id,
        title: d.title,
        description: d.description,
        year: d.year,
        genre: d.genre,
        rating: d.rating,
        duration_minutes: d.duration_minutes,
        cover_path: find_cover(&files),
        file_path,
    })
}

/// Season number from a folder name: the first run of digits, or 1.
pub fn season_number(name: &str) -> u32 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|n| *n > 0).unwrap_or(1)
}

fn is_season_folder(name: &str) -> bool {
    name.get(..6)
        .map(|prefix| prefix.eq_ignore_ascii_case("season"))
        .unwrap_or(false)
}

fn scan_series(dir: &Path, skipped: &mut Vec<Skipped>) -> Result<Series, SkipReason> {
    let id = folder_name(dir)?;
    let mut seasons: BTreeMap<u32, Season> = BTreeMap::new();

    for season_dir in walk::child_dirs(dir) {
        let Some(name) = season_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_season_folder(name) {
            continue;
        }

        let number = season_number(name);
        if seasons.contains_key(&number) {
            warn!("Series {}: ignoring duplicate season folder {:?}", id, season_dir);
            skipped.push(Skipped {
                path: season_dir,
                reason: SkipReason::DuplicateSeason(number),
            });
            continue;
        }

        let episodes = scan_episodes(&id, number, &season_dir, skipped);
        if episodes.is_empty() {
            debug!("Series {}: season folder {:?} has no videos", id, season_dir);
            continue;
        }

        seasons.insert(
            number,
            Season {
                season_number: number,
                episodes,
            },
        );
    }

    if seasons.is_empty() {
        return Err(SkipReason::NoSeasons);
    }

    let files = walk::child_files(dir);
    let d = Descriptor::resolve(&id, read_sidecar(dir));
    Ok(Series {
        id,
        title: d.title,
        description: d.description,
        year: d.year,
        genre: d.genre,
        rating: d.rating,
        cover_path: find_cover(&files),
        seasons: seasons.into_values().collect(),
    })
}

fn scan_episodes(
    series_id: &str,
    season: u32,
    dir: &Path,
    skipped: &mut Vec<Skipped>,
) -> Vec<Episode> {
    let mut episodes = Vec::new();

    for file in walk::child_files(dir).into_iter().filter(|f| is_video_file(f)) {
        let file_path = match utf8(&file) {
            Ok(p) => p,
            Err(reason) => {
                skipped.push(Skipped { path: file, reason });
                continue;
            }
        };

        let number = episodes.len() as u32 + 1;
        episodes.push(Episode {
            id: Episode::make_id(series_id, season, number),
            episode_number: number,
            title: format!("Episode {number}"),
            description: DEFAULT_DESCRIPTION.to_string(),
            duration_minutes: 0,
            file_path,
        });
    }

    episodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    fn library() -> (TempDir, Scanner) {
        let dir = tempdir().unwrap();
        let movies = dir.path().join("Movies");
        let series = dir.path().join("Series");
        fs::create_dir_all(&movies).unwrap();
        fs::create_dir_all(&series).unwrap();
        let scanner = Scanner::new(movies, series);
        (dir, scanner)
    }

    #[test]
    fn test_season_number() {
        assert_eq!(season_number("Season 2"), 2);
        assert_eq!(season_number("season_10"), 10);
        assert_eq!(season_number("Season"), 1);
        assert_eq!(season_number("Season 0"), 1);
        assert_eq!(season_number("Season 3 (Extended 2)"), 3);
    }

    #[test]
    fn test_is_season_folder() {
        assert!(is_season_folder("Season 1"));
        assert!(is_season_folder("SEASON-2"));
        assert!(is_season_folder("seasonal"));
        assert!(!is_season_folder("Specials"));
        assert!(!is_season_folder("Seas"));
    }

    #[test]
    fn test_movie_with_video_and_cover() {
        let (_dir, scanner) = library();
        let folder = scanner.movies_dir().join("The_Matrix_(1999)");
        touch(&folder.join("movie.mkv"));
        touch(&folder.join("Poster.JPG"));
        touch(&folder.join("readme.txt"));

        let catalog = scanner.scan();
        let movies: Vec<_> = catalog.movies().collect();
        assert_eq!(movies.len(), 1);

        let movie = movies[0];
        assert_eq!(movie.id, "The_Matrix_(1999)");
        assert_eq!(movie.title, "The Matrix (1999)");
        assert_eq!(movie.year, Some(1999));
        assert!(movie.file_path.ends_with("movie.mkv"));
        assert!(movie.cover_path.as_ref().unwrap().ends_with("Poster.JPG"));
    }

    #[test]
    fn test_movie_first_video_wins() {
        let (_dir, scanner) = library();
        let folder = scanner.movies_dir().join("Film");
        touch(&folder.join("b.mp4"));
        touch(&folder.join("a.avi"));

        let catalog = scanner.scan();
        let movie = catalog.movies().next().unwrap();
        assert!(movie.file_path.ends_with("a.avi"));
        assert!(movie.cover_path.is_none());
    }

    #[test]
    fn test_folder_without_video_is_skipped() {
        let (_dir, scanner) = library();
        touch(&scanner.movies_dir().join("Empty").join("poster.jpg"));
        touch(&scanner.movies_dir().join("Good").join("good.mp4"));

        let report = scanner.scan_report();
        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NoVideo);
    }

    #[test]
    fn test_series_positional_episodes() {
        let (_dir, scanner) = library();
        let show = scanner.series_dir().join("Some_Show");
        touch(&show.join("Season 2").join("zzz.mp4"));
        touch(&show.join("Season 2").join("aaa.mkv"));
        touch(&show.join("Season 2").join("notes.nfo"));
        touch(&show.join("Season 1").join("pilot.mp4"));
        touch(&show.join("Extras").join("bloopers.mp4"));
        touch(&show.join("thumb.png"));

        let catalog = scanner.scan();
        let series = catalog.series().next().unwrap();
        assert_eq!(series.title, "Some Show");
        assert_eq!(series.seasons.len(), 2);
        assert_eq!(series.seasons[0].season_number, 1);
        assert_eq!(series.episode_count(), 3);
        assert!(series.cover_path.as_ref().unwrap().ends_with("thumb.png"));

        let s2 = &series.seasons[1];
        assert_eq!(s2.season_number, 2);
        assert_eq!(s2.episodes[0].episode_number, 1);
        assert_eq!(s2.episodes[0].id, "Some_Show_S2E1");
        assert!(s2.episodes[0].file_path.ends_with("aaa.mkv"));
        assert_eq!(s2.episodes[1].id, "Some_Show_S2E2");
        assert_eq!(s2.episodes[1].title, "Episode 2");
    }

    #[test]
    fn test_series_with_only_empty_season_is_omitted() {
        let (_dir, scanner) = library();
        let show = scanner.series_dir().join("Empty_Show");
        touch(&show.join("Season 1").join("cover.jpg"));

        let report = scanner.scan_report();
        assert_eq!(report.catalog.series().count(), 0);
        assert_eq!(report.skipped[0].reason, SkipReason::NoSeasons);
    }

    #[test]
    fn test_duplicate_season_number_is_skipped() {
        let (_dir, scanner) = library();
        let show = scanner.series_dir().join("Show");
        touch(&show.join("Season 1").join("a.mp4"));
        touch(&show.join("Season 01").join("b.mp4"));

        let report = scanner.scan_report();
        let series = report.catalog.series().next().unwrap();
        assert_eq!(series.seasons.len(), 1);
        assert!(series.seasons[0].episodes[0].file_path.ends_with("b.mp4"));
        assert_eq!(report.skipped[0].reason, SkipReason::DuplicateSeason(1));
    }

    #[test]
    fn test_relative_roots_become_absolute() {
        let scanner = Scanner::new("Movies", "library/Series");
        assert!(scanner.movies_dir().is_absolute());
        assert!(scanner.movies_dir().ends_with("Movies"));
        assert!(scanner.series_dir().is_absolute());
        assert!(scanner.series_dir().ends_with("library/Series"));
    }

    #[test]
    fn test_missing_roots_yield_empty_catalog() {
        let catalog = scan(Path::new("/nope/Movies"), Path::new("/nope/Series"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let (_dir, scanner) = library();
        touch(&scanner.movies_dir().join("B").join("b.mp4"));
        touch(&scanner.movies_dir().join("A").join("a.mp4"));
        touch(&scanner.series_dir().join("S").join("Season 1").join("e.mp4"));

        let first = serde_json::to_string(&scanner.scan()).unwrap();
        let second = serde_json::to_string(&scanner.scan()).unwrap();
        assert_eq!(first, second);

        let catalog = scanner.scan();
        let ids: Vec<_> = catalog.entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["A", "B", "S"]);
    }
}
