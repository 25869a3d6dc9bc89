//! Catalog routes.
//!
//! `GET /content` rescans the library on every call and returns movies and
//! series with absolute stream and thumbnail URLs.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use homereel_common::{Catalog, Episode, Error, Movie, Series};
use serde::Serialize;

use super::error::ApiResult;
use super::{media_url, AppContext};

pub fn library_routes() -> Router<AppContext> {
    Router::new().route("/content", get(get_content))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieView<'a> {
    #[serde(flatten)]
    pub movie: &'a Movie,
    pub stream_url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeView<'a> {
    #[serde(flatten)]
    pub episode: &'a Episode,
    pub stream_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonView<'a> {
    pub season_number: u32,
    pub episodes: Vec<EpisodeView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub year: Option<u16>,
    pub genre: &'a str,
    pub rating: f32,
    pub cover_path: Option<&'a str>,
    pub thumbnail_url: Option<String>,
    pub seasons: Vec<SeasonView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse<'a> {
    pub movies: Vec<MovieView<'a>>,
    pub series: Vec<SeriesView<'a>>,
}

impl<'a> ContentResponse<'a> {
    pub fn build(catalog: &'a Catalog, base: &str) -> Self {
        let thumb = |cover: Option<&String>| cover.map(|p| media_url(base, "thumbnail", p));

        let movies = catalog
            .movies()
            .map(|movie| MovieView {
                movie,
                stream_url: media_url(base, "stream", &movie.file_path),
                thumbnail_url: thumb(movie.cover_path.as_ref()),
            })
            .collect();

        let series = catalog
            .series()
            .map(|s: &'a Series| SeriesView {
                id: &s.id,
                title: &s.title,
                description: &s.description,
                year: s.year,
                genre: &s.genre,
                rating: s.rating,
                cover_path: s.cover_path.as_deref(),
                thumbnail_url: thumb(s.cover_path.as_ref()),
                seasons: s
                    .seasons
                    .iter()
                    .map(|season| SeasonView {
                        season_number: season.season_number,
                        episodes: season
                            .episodes
                            .iter()
                            .map(|episode| EpisodeView {
                                episode,
                                stream_url: media_url(base, "stream", &episode.file_path),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self { movies, series }
    }
}

async fn get_content(State(ctx): State<AppContext>, headers: HeaderMap) -> ApiResult<Response> {
    let scanner = ctx.scanner.clone();
    let catalog = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .map_err(|e| Error::internal(format!("Scan task failed: {e}")))?;

    let base = ctx.base_url(&headers);
    let body = serde_json::to_vec(&ContentResponse::build(&catalog, &base))
        .map_err(|e| Error::internal(format!("Failed to serialize catalog: {e}")))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
