//! Batch generation of sitemap.xml, rss.xml, and robots.txt from an export
//! of the site's posts and categories.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use codetocrack::application::sitemap::{build_robots_txt, build_rss, build_sitemap};
use codetocrack::config::{self, ConfigError};
use codetocrack::domain::entities::{CategoryRecord, PostRecord};
use codetocrack::infra::{error::InfraError, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "generate-sitemap",
    version,
    about = "Generate sitemap.xml, rss.xml and robots.txt from exported site content"
)]
struct Args {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CODETOCRACK_CONFIG_FILE",
        value_name = "PATH"
    )]
    config_file: Option<PathBuf>,

    /// JSON export holding the site's posts and categories.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Directory receiving the generated artifacts.
    #[arg(long = "out-dir", value_name = "DIR", default_value = "public")]
    out_dir: PathBuf,

    /// Override the site origin used for absolute URLs.
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,
}

/// Shape of the JSON export: documents as stored, each carrying its id.
#[derive(Debug, Deserialize)]
struct SiteExport {
    #[serde(default)]
    posts: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to read export `{path}`: {source}")]
    ReadExport {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode export: {0}")]
    DecodeExport(#[from] serde_json::Error),
    #[error("failed to write `{path}`: {source}")]
    WriteArtifact {
        path: String,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let args = Args::parse();

    let mut settings = config::load(args.config_file.as_deref())?;
    telemetry::init(&settings.logging)?;

    if let Some(base_url) = args.base_url {
        settings.site.base_url = base_url;
    }

    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|source| CliError::ReadExport {
            path: args.input.display().to_string(),
            source,
        })?;
    let export: SiteExport = serde_json::from_str(&raw)?;

    let posts: Vec<PostRecord> = decode_documents(export.posts)?;
    let categories: Vec<CategoryRecord> = decode_documents(export.categories)?;
    info!(
        posts = posts.len(),
        categories = categories.len(),
        "loaded site export"
    );

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .map_err(|source| CliError::WriteArtifact {
            path: args.out_dir.display().to_string(),
            source,
        })?;

    write_artifact(
        &args.out_dir.join("sitemap.xml"),
        &build_sitemap(&settings.site, &posts, &categories),
    )
    .await?;
    write_artifact(&args.out_dir.join("rss.xml"), &build_rss(&settings.site, &posts)).await?;
    write_artifact(
        &args.out_dir.join("robots.txt"),
        &build_robots_txt(&settings.site),
    )
    .await?;

    info!(out_dir = %args.out_dir.display(), "artifacts written");
    Ok(())
}

/// Decode exported documents, injecting the out-of-body `id` field the way
/// store readers do.
fn decode_documents<T: DeserializeOwned + WithId>(
    values: Vec<Value>,
) -> Result<Vec<T>, serde_json::Error> {
    values
        .into_iter()
        .map(|value| {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mut record: T = serde_json::from_value(value)?;
            record.set_id(id);
            Ok(record)
        })
        .collect()
}

trait WithId {
    fn set_id(&mut self, id: String);
}

impl WithId for PostRecord {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl WithId for CategoryRecord {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

async fn write_artifact(path: &Path, content: &str) -> Result<(), CliError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| CliError::WriteArtifact {
            path: path.display().to_string(),
            source,
        })?;
    info!(path = %path.display(), bytes = content.len(), "artifact written");
    Ok(())
}
