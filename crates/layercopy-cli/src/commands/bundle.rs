//! `lcp bundle` — Build a container root filesystem from a layer chain.

use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use layercopy_common::config::LayercopyConfig;
use layercopy_common::types::{Handle, LayerId};
use layercopy_image::Bundler;

/// Arguments for the `bundle` command.
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Container handle keying the bundle directory.
    pub handle: String,

    /// Layer chain ordered base to top; only the last one is copied.
    #[arg(required = true, num_args = 1..)]
    pub layer_ids: Vec<String>,
}

/// Executes the `bundle` command and prints the runtime spec as JSON.
///
/// # Errors
///
/// Returns an error if an identifier is malformed or bundling fails.
pub fn execute(config: &LayercopyConfig, args: BundleArgs) -> anyhow::Result<ExitCode> {
    let bundler = Bundler::open(config)?;
    let handle = Handle::parse(args.handle)?;
    let layer_ids = args
        .layer_ids
        .into_iter()
        .map(LayerId::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let spec = bundler
        .bundle(&handle, &layer_ids)
        .with_context(|| format!("bundling {handle}"))?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(ExitCode::SUCCESS)
}
