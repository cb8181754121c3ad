//! `lcp unpack` — Materialize a layer from a tar stream.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use layercopy_common::config::LayercopyConfig;
use layercopy_common::types::LayerId;
use layercopy_image::LayerStore;

/// Arguments for the `unpack` command.
#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Identifier of the layer to materialize.
    pub layer_id: String,

    /// Parent layer whose volume is copied in first.
    #[arg(long, default_value = "")]
    pub parent: String,

    /// Tar archive to extract (plain or gzip); `-` reads standard input.
    #[arg(long, default_value = "-")]
    pub archive: PathBuf,

    /// Do nothing if the layer's volume already exists.
    #[arg(long)]
    pub skip_existing: bool,
}

/// Executes the `unpack` command.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or the unpack fails.
pub fn execute(config: &LayercopyConfig, args: UnpackArgs) -> anyhow::Result<ExitCode> {
    let store = LayerStore::open(config)?;
    let id = LayerId::parse(args.layer_id)?;
    let parent = LayerId::parse_parent(&args.parent)?;

    if args.skip_existing && store.exists(&id) {
        tracing::info!(layer = %id, "layer already exists, skipping");
        return Ok(ExitCode::SUCCESS);
    }

    let archive: Box<dyn Read> = if args.archive.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(&args.archive)
                .with_context(|| format!("opening {}", args.archive.display()))?,
        )
    };

    store
        .unpack(&id, parent.as_ref(), archive)
        .with_context(|| format!("unpacking layer {id}"))?;
    println!("{}", store.volume_path(&id).display());
    Ok(ExitCode::SUCCESS)
}
