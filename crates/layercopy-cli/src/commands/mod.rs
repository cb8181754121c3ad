//! CLI command definitions and dispatch.

pub mod bundle;
pub mod exists;
pub mod paths;
pub mod unpack;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use layercopy_common::config::LayercopyConfig;
use layercopy_common::constants::{self, BASE_DIR_ENV};

/// layercopy — plain-copy layer store and rootfs bundler.
#[derive(Parser, Debug)]
#[command(name = "lcp", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Base directory holding `volumes/` and `diffs/`.
    #[arg(long, global = true, env = BASE_DIR_ENV)]
    pub base_dir: Option<PathBuf>,

    /// JSON configuration file; flags override its values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Owner uid written onto bundle entries.
    #[arg(long, global = true)]
    pub owner_uid: Option<u32>,

    /// Owner gid written onto bundle entries.
    #[arg(long, global = true)]
    pub owner_gid: Option<u32>,
}

impl Cli {
    /// Resolves the effective configuration: file, then flags, then defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn resolve_config(&self) -> anyhow::Result<LayercopyConfig> {
        let mut config = match &self.config {
            Some(path) => LayercopyConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => LayercopyConfig::with_base_dir(
                self.base_dir
                    .clone()
                    .unwrap_or_else(|| constants::data_dir().clone()),
            ),
        };
        if let Some(base_dir) = &self.base_dir {
            config.base_dir.clone_from(base_dir);
        }
        if let Some(uid) = self.owner_uid {
            config.owner.uid = uid;
        }
        if let Some(gid) = self.owner_gid {
            config.owner.gid = gid;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Materialize a layer from a tar stream on top of its parent.
    Unpack(unpack::UnpackArgs),
    /// Report whether a layer's volume exists.
    Exists(exists::ExistsArgs),
    /// Build a container root from the top layer of a chain.
    Bundle(bundle::BundleArgs),
    /// Print the storage directories in use.
    Paths,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.resolve_config()?;
    tracing::debug!(base_dir = %config.base_dir.display(), owner = %config.owner, "resolved config");
    match cli.command {
        Command::Unpack(args) => unpack::execute(&config, args),
        Command::Exists(args) => exists::execute(&config, &args),
        Command::Bundle(args) => bundle::execute(&config, args),
        Command::Paths => paths::execute(&config),
    }
}
