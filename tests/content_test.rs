//! Catalog endpoint tests.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_bytes, body_json, context, encoded, get, router, send, Library};
use homereel::config::Config;
use std::path::{Path, PathBuf};

fn sample_library() -> Library {
    let library = Library::new();
    library
        .movie("Blade_Runner_(1982)", &["Blade Runner.mkv", "poster.jpg"])
        .movie("No_Video", &["poster.jpg"])
        .movie("Alien", &["alien.mp4"])
        .episode("The_Wire", "Season 1", "b.mkv")
        .episode("The_Wire", "Season 1", "a.mkv")
        .episode("The_Wire", "Season 2", "x.mp4")
        .episode("Empty_Show", "Season 1", "notes.txt");
    library
}

#[tokio::test]
async fn test_content_lists_movies_and_series() {
    let library = sample_library();
    let ctx = context(library.config());

    let response = get(router(&ctx), "/api/content").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    let json = body_json(response).await;
    let movies = json["movies"].as_array().unwrap();
    let series = json["series"].as_array().unwrap();

    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], "Alien");
    assert_eq!(movies[1]["id"], "Blade_Runner_(1982)");
    assert_eq!(movies[1]["title"], "Blade Runner (1982)");
    assert_eq!(movies[1]["year"], 1982);
    assert_eq!(movies[1]["genre"], "Unknown");
    assert_eq!(movies[1]["durationMinutes"], 0);
    assert!(movies[1]["filePath"]
        .as_str()
        .unwrap()
        .ends_with("Blade Runner.mkv"));
    assert!(movies[1]["coverPath"].as_str().unwrap().ends_with("poster.jpg"));
    assert!(movies[0]["coverPath"].is_null());
    assert!(movies[0]["thumbnailUrl"].is_null());

    assert_eq!(series.len(), 1);
    let wire = &series[0];
    assert_eq!(wire["id"], "The_Wire");
    assert_eq!(wire["title"], "The Wire");
    let seasons = wire["seasons"].as_array().unwrap();
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0]["seasonNumber"], 1);

    let episodes = seasons[0]["episodes"].as_array().unwrap();
    assert_eq!(episodes[0]["id"], "The_Wire_S1E1");
    assert_eq!(episodes[0]["episodeNumber"], 1);
    assert!(episodes[0]["filePath"].as_str().unwrap().ends_with("a.mkv"));
    assert_eq!(episodes[1]["id"], "The_Wire_S1E2");
    assert_eq!(seasons[1]["episodes"][0]["id"], "The_Wire_S2E1");
}

#[tokio::test]
async fn test_urls_embed_host_and_encoded_path() {
    let library = sample_library();
    let ctx = context(library.config());

    let request = Request::get("/api/content")
        .header(header::HOST, "192.168.1.20:8080")
        .body(Body::empty())
        .unwrap();
    let json = body_json(send(router(&ctx), request).await).await;

    let movie = &json["movies"][1];
    let file = Path::new(movie["filePath"].as_str().unwrap());
    let cover = Path::new(movie["coverPath"].as_str().unwrap());

    assert_eq!(
        movie["streamUrl"],
        format!("http://192.168.1.20:8080/api/stream/{}", encoded(file))
    );
    assert_eq!(
        movie["thumbnailUrl"],
        format!("http://192.168.1.20:8080/api/thumbnail/{}", encoded(cover))
    );
    assert!(movie["streamUrl"].as_str().unwrap().contains("Blade%20Runner.mkv"));

    let episode = &json["series"][0]["seasons"][0]["episodes"][0];
    assert!(episode["streamUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://192.168.1.20:8080/api/stream/%2F"));
}

#[tokio::test]
async fn test_public_url_overrides_host() {
    let library = sample_library();
    let mut config = library.config();
    config.server.public_url = Some("http://media-box:8080".to_string());
    let ctx = context(config);

    let json = body_json(get(router(&ctx), "/api/content").await).await;
    assert!(json["movies"][0]["streamUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://media-box:8080/api/stream/"));
}

#[tokio::test]
async fn test_stream_url_round_trips_through_router() {
    let library = sample_library();
    let ctx = context(library.config());

    let json = body_json(get(router(&ctx), "/api/content").await).await;
    let url = json["movies"][0]["streamUrl"].as_str().unwrap().to_string();
    let path = url.trim_start_matches("http://127.0.0.1:8080");

    let response = get(router(&ctx), path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"movie-bytes");
}

#[tokio::test]
async fn test_repeated_scans_are_byte_identical() {
    let library = sample_library();
    let ctx = context(library.config());

    let first = body_bytes(get(router(&ctx), "/api/content").await).await;
    let second = body_bytes(get(router(&ctx), "/api/content").await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sidecar_metadata_is_applied() {
    let library = sample_library();
    library.write(
        "Movies/Alien/metadata.json",
        br#"{"title":"Alien","description":"In space no one can hear you scream.","genre":"Horror","rating":8.5,"year":1979}"#,
    );
    let ctx = context(library.config());

    let json = body_json(get(router(&ctx), "/api/content").await).await;
    let alien = &json["movies"][0];
    assert_eq!(alien["genre"], "Horror");
    assert_eq!(alien["year"], 1979);
    assert_eq!(alien["rating"], 8.5);
}

#[tokio::test]
async fn test_missing_roots_give_empty_catalog() {
    let library = Library::new();
    let mut config = library.config();
    config.library.movies_dir = library.path("nope/Movies");
    config.library.series_dir = library.path("nope/Series");
    let ctx = context(config);

    let response = get(router(&ctx), "/api/content").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({"movies": [], "series": []}));
}

#[tokio::test]
async fn test_relative_roots_produce_servable_urls() {
    let dir = tempfile::Builder::new()
        .prefix("relative-media-")
        .tempdir_in(".")
        .unwrap();
    std::fs::create_dir_all(dir.path().join("Movies/Film")).unwrap();
    std::fs::write(dir.path().join("Movies/Film/film.mp4"), b"relative-bytes").unwrap();

    // Relative to the working directory, like the default config roots.
    let relative = PathBuf::from(dir.path().file_name().unwrap());
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.library.movies_dir = relative.join("Movies");
    config.library.series_dir = relative.join("Series");
    let ctx = context(config);

    let json = body_json(get(router(&ctx), "/api/content").await).await;
    let movie = &json["movies"][0];
    assert!(Path::new(movie["filePath"].as_str().unwrap()).is_absolute());

    let url = movie["streamUrl"].as_str().unwrap();
    let response = get(router(&ctx), url.trim_start_matches("http://127.0.0.1:8080")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"relative-bytes");
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_folders_are_listed_and_servable() {
    let library = Library::new();
    let external = library.write("external_disk/Film/film.mp4", b"linked-bytes");
    std::os::unix::fs::symlink(external.parent().unwrap(), library.movies.join("Film")).unwrap();
    let ctx = context(library.config());

    let json = body_json(get(router(&ctx), "/api/content").await).await;
    let movies = json["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert!(movies[0]["filePath"]
        .as_str()
        .unwrap()
        .starts_with(library.movies.to_str().unwrap()));

    let url = movies[0]["streamUrl"].as_str().unwrap();
    let response = get(router(&ctx), url.trim_start_matches("http://127.0.0.1:8080")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"linked-bytes");
}
