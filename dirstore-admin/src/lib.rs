//! Command-line front end for a dirstore root.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dirstore_core::StorageConfig;
use dirstore_storage::{Body, LocalStorage};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "dirstore-admin",
    about = "Admin CLI for objects stored in a local dirstore root"
)]
pub struct Cli {
    /// Path to a storage config file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root; overrides the config file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Base URL for public links; overrides the config file
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store an object, reading the body from --file or stdin
    Put {
        directory: String,
        key: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write an object's body to stdout
    Get { directory: String, key: String },
    /// Delete an object and prune directories left empty
    Rm { directory: String, key: String },
    /// List objects under a directory key as JSON lines
    Ls { directory: String },
    /// Print the public URL of an object
    Url { directory: String, key: String },
}

/// Resolve the storage config: an explicit `--config` file, else
/// `--root`, else the `DIRSTORE_*` environment. Flags override file values.
pub fn load_config(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let mut config = match (&cli.config, &cli.root) {
        (Some(path), _) => StorageConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        (None, Some(root)) => StorageConfig::new(root.clone()),
        (None, None) => StorageConfig::from_env_or_path()
            .context("no --config or --root given and the environment has no storage root")?,
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    config.root = std::path::absolute(&config.root)
        .with_context(|| format!("resolving storage root {}", config.root.display()))?;
    Ok(config)
}

pub fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let storage = LocalStorage::open(load_config(&cli)?)?;

    match cli.command {
        Commands::Put {
            directory,
            key,
            file,
        } => {
            let body = match file {
                Some(path) => Body::from(
                    File::open(&path).with_context(|| format!("opening {}", path.display()))?,
                ),
                None => Body::from_reader(io::stdin()),
            };
            let written = storage.save(&directory, &key, body)?;
            info!(%directory, %key, bytes = written, "put object");
            writeln!(out, "saved {written} bytes to {directory}/{key}")?;
        }
        Commands::Get { directory, key } => match storage.get(&directory, &key)? {
            Some(object) => out.write_all(&object.body)?,
            None => bail!("object {directory}/{key} not found"),
        },
        Commands::Rm { directory, key } => {
            let report = storage.destroy(&directory, &key)?;
            if report.object_removed {
                writeln!(out, "removed {directory}/{key}")?;
            } else {
                writeln!(out, "{directory}/{key} did not exist")?;
            }
            for dir in &report.pruned {
                writeln!(out, "pruned {}", dir.display())?;
            }
        }
        Commands::Ls { directory } => {
            for object in storage.list(&directory)? {
                writeln!(out, "{}", serde_json::to_string(&object)?)?;
            }
        }
        Commands::Url { directory, key } => match storage.public_url(&directory, &key)? {
            Some(url) => writeln!(out, "{url}")?,
            None => bail!("no endpoint configured"),
        },
    }

    Ok(())
}

/// Logs go to stderr so `get` can stream object bodies on stdout.
pub fn init_observability(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,dirstore_storage=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .json();
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("dirstore-admin").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn put_get_ls_rm_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        let root = root.to_str().unwrap();
        let source = temp.path().join("body.txt");
        std::fs::write(&source, "my contents").unwrap();

        let saved = run_args(&[
            "--root",
            root,
            "put",
            "path1",
            "path2/file.rb",
            "--file",
            source.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(saved, "saved 11 bytes to path1/path2/file.rb\n");

        let body = run_args(&["--root", root, "get", "path1", "path2/file.rb"]).unwrap();
        assert_eq!(body, "my contents");

        let listing = run_args(&["--root", root, "ls", "path1"]).unwrap();
        let first: serde_json::Value = serde_json::from_str(listing.lines().next().unwrap()).unwrap();
        assert_eq!(first["key"], "path2/file.rb");
        assert_eq!(first["content_length"], 11);

        let removed = run_args(&["--root", root, "rm", "path1", "path2/file.rb"]).unwrap();
        assert!(removed.starts_with("removed path1/path2/file.rb\n"));
        assert!(removed.contains("pruned"));
        assert!(run_args(&["--root", root, "get", "path1", "path2/file.rb"]).is_err());
    }

    #[test]
    fn url_needs_an_endpoint() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_str().unwrap();

        assert!(run_args(&["--root", root, "url", "my directory", "my file.txt"]).is_err());
        let url = run_args(&[
            "--root",
            root,
            "--endpoint",
            "http://example.com/files",
            "url",
            "my directory",
            "my file.txt",
        ])
        .unwrap();
        assert_eq!(url, "http://example.com/files/my%20directory/my%20file.txt\n");
    }

    #[test]
    fn config_file_supplies_root_and_flags_override() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("dirstore.json");
        StorageConfig::new(temp.path().join("from-file"))
            .with_endpoint("http://file.example")
            .to_path(&path)
            .unwrap();

        let cli = Cli::try_parse_from([
            "dirstore-admin",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "https://flag.example",
            "ls",
            "bucket",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.root, temp.path().join("from-file"));
        assert_eq!(config.endpoint.as_deref(), Some("https://flag.example"));
    }
}
