mod server;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use mnp_replay_core::config::{DEFAULT_ARCHIVE_DIR, DEFAULT_POSTS_DIR};
use mnp_replay_core::outputs::{BuildMetadata, BuildOptions};
use mnp_replay_core::summary::render_summary;
use mnp_replay_core::{pipeline, PipelineConfig, PipelineRun};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "data/mnp-timeline.json";
const DEFAULT_VERSION_OUTPUT: &str = "data/version.json";
const DEFAULT_PORT: u16 = 3000;

#[derive(Parser, Debug)]
#[command(author, version, about = "MNP match timeline builder and query server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct the match timeline from archived posts
    Build(BuildArgs),
    /// Serve a built timeline over HTTP
    Serve(ServeArgs),
    /// Write the version stamp file
    Version(VersionArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Output file path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Path to the mnp-data-archive directory
    #[arg(long, default_value = DEFAULT_ARCHIVE_DIR)]
    mnp_data_archive: PathBuf,
    /// Path to the posts directory
    #[arg(long, default_value = DEFAULT_POSTS_DIR)]
    posts: PathBuf,
    /// TOML file overriding timezone, exclusion rules and phase offsets
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Built timeline to serve (falls back to MNP_REPLAY_DATA)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Port to listen on (falls back to MNP_REPLAY_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct VersionArgs {
    /// Output file path
    #[arg(long, default_value = DEFAULT_VERSION_OUTPUT)]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionStamp {
    version: String,
    build_date: String,
}

impl VersionStamp {
    fn current() -> Self {
        Self {
            version: git_version(),
            build_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => build(args),
        Command::Serve(args) => {
            dotenvy::dotenv().ok();
            let data = match args.data {
                Some(path) => path,
                None => std::env::var("MNP_REPLAY_DATA")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT)),
            };
            let port = match args.port {
                Some(port) => port,
                None => match std::env::var("MNP_REPLAY_PORT") {
                    Ok(raw) => raw
                        .parse()
                        .with_context(|| format!("MNP_REPLAY_PORT is not a valid port: {raw}"))?,
                    Err(_) => DEFAULT_PORT,
                },
            };
            server::serve(&data, port).await
        }
        Command::Version(args) => {
            let stamp = VersionStamp::current();
            write_json(&args.output, &stamp)?;
            info!(path = %args.output.display(), version = %stamp.version, "wrote version stamp");
            Ok(())
        }
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let mut config = PipelineConfig::new(&args.posts, &args.mnp_data_archive);
    if let Some(path) = &args.config {
        config = config
            .with_overrides_file(path)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }

    info!(posts = %args.posts.display(), "loading posts");
    let PipelineRun {
        mut output,
        summary,
    } = pipeline::run(&config)
        .with_context(|| format!("failed to reconstruct timeline from {}", args.posts.display()))?;
    println!("{}", render_summary(&summary, &output));

    let stamp = VersionStamp::current();
    output.metadata = Some(BuildMetadata {
        version: stamp.version,
        build_date: stamp.build_date,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        options: BuildOptions {
            output: args.output.display().to_string(),
            mnp_data_archive: args.mnp_data_archive.display().to_string(),
            posts: args.posts.display().to_string(),
            config: args.config.as_ref().map(|path| path.display().to_string()),
        },
    });

    write_json(&args.output, &output)?;
    let size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or_default();
    info!(path = %args.output.display(), bytes = size, "wrote timeline");
    Ok(())
}

/// `git describe --tags --always`, or `unknown` outside a repository.
fn git_version() -> String {
    Process::new("git")
        .args(["describe", "--tags", "--always"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
