mod cli;

use homereel::{
    config,
    scanner::Scanner,
    server::{AppContext, MediaServer},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting homereel server");
    tracing::info!("Movies: {:?}", config.library.movies_dir);
    tracing::info!("Series: {:?}", config.library.series_dir);
    tracing::info!("Channels: {}", config.channels.definitions.len());

    let ctx = AppContext::new(config).context("Failed to initialize server")?;
    let server = MediaServer::new(ctx);
    server
        .run_until_signal()
        .await
        .context("Server failed")?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "homereel=trace,homereel_common=debug,tower_http=debug".to_string()
        } else {
            "homereel=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Scan { json } => scan_library(cli.config.as_deref(), json),
        Commands::CheckTools => check_tools(),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("homereel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn scan_library(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let report = Scanner::from_config(&config.library).scan_report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report.catalog)?);
        return Ok(());
    }

    let movies: Vec<_> = report.catalog.movies().collect();
    println!("Movies: {}", movies.len());
    for movie in movies {
        match movie.year {
            Some(year) => println!("  {} ({})", movie.title, year),
            None => println!("  {}", movie.title),
        }
    }

    let series: Vec<_> = report.catalog.series().collect();
    println!("\nSeries: {}", series.len());
    for show in series {
        println!(
            "  {} - {} seasons, {} episodes",
            show.title,
            show.seasons.len(),
            show.episode_count()
        );
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped: {}", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} ({})", skipped.path.display(), skipped.reason);
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    match which::which("ffprobe") {
        Ok(path) => {
            println!("✓ ffprobe - {}", path.display());
            println!("\nChannel durations will be probed with ffprobe.");
        }
        Err(_) => {
            println!("✗ ffprobe");
            println!("\nffprobe not found. Channels will advance every tick.");
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let located = path
        .map(Path::to_path_buf)
        .or_else(|| config::locate_config(config::DEFAULT_CONFIG_PATHS));

    let Some(path) = located else {
        println!("No config file found, using defaults");
        let config = config::Config::default();
        println!("Default config:");
        println!("  Server: {}:{}", config.server.host, config.server.port);
        return Ok(());
    };

    println!("Validating config: {:?}", path);
    let config = config::load_config(&path)?;
    println!("✓ Configuration is valid");
    print_summary(&config);
    Ok(())
}

fn print_summary(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Movies: {}", config.library.movies_dir.display());
    println!("  Series: {}", config.library.series_dir.display());
    println!("  Channels: {}", config.channels.definitions.len());
    println!(
        "    Active: {}",
        config.channels.definitions.iter().filter(|c| c.active).count()
    );
    println!(
        "  Storage: {}",
        config
            .storage
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-memory".to_string())
    );
}
