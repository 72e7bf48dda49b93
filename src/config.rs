use crate::services::{thumbnailer::DEFAULT_BOUNDING_BOX, upload::DEFAULT_MAX_UPLOAD_BYTES};
use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub media_dir: String,
    pub thumbnail_dir: String,
    pub database_url: String,
    pub max_upload_bytes: i64,
    pub thumbnail_size: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Personal media library server")]
pub struct Args {
    /// Host to bind to (overrides MEDIALIB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MEDIALIB_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where original media payloads are stored (overrides MEDIALIB_MEDIA_DIR)
    #[arg(long)]
    pub media_dir: Option<String>,

    /// Directory where derived thumbnails are stored (overrides MEDIALIB_THUMBNAIL_DIR)
    #[arg(long)]
    pub thumbnail_dir: Option<String>,

    /// Database URL (overrides MEDIALIB_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Maximum accepted upload size in bytes (overrides MEDIALIB_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<i64>,

    /// Thumbnail bounding box in pixels, applied to the larger side
    /// (overrides MEDIALIB_THUMBNAIL_SIZE)
    #[arg(long)]
    pub thumbnail_size: Option<u32>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        let env_host = env::var("MEDIALIB_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("MEDIALIB_PORT", 3000)?;
        let env_media = env::var("MEDIALIB_MEDIA_DIR").unwrap_or_else(|_| "./data/media".into());
        let env_thumbs =
            env::var("MEDIALIB_THUMBNAIL_DIR").unwrap_or_else(|_| "./data/thumbnails".into());
        let env_db = env::var("MEDIALIB_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/medialib.db".into());
        let env_max_upload = parse_env("MEDIALIB_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let env_thumb_size = parse_env("MEDIALIB_THUMBNAIL_SIZE", DEFAULT_BOUNDING_BOX)?;

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            media_dir: args.media_dir.unwrap_or(env_media),
            thumbnail_dir: args.thumbnail_dir.unwrap_or(env_thumbs),
            database_url: args.database_url.unwrap_or(env_db),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            thumbnail_size: args.thumbnail_size.unwrap_or(env_thumb_size),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
