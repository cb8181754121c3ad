//! `lcp exists` — Report whether a layer has been materialized.

use std::process::ExitCode;

use clap::Args;
use layercopy_common::config::LayercopyConfig;
use layercopy_common::types::LayerId;
use layercopy_image::LayerStore;

/// Arguments for the `exists` command.
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Identifier of the layer to look up.
    pub layer_id: String,
}

/// Executes the `exists` command. Exits with status 1 when the layer is absent.
///
/// # Errors
///
/// Returns an error if the identifier is malformed.
pub fn execute(config: &LayercopyConfig, args: &ExistsArgs) -> anyhow::Result<ExitCode> {
    let store = LayerStore::open(config)?;
    let id = LayerId::parse(args.layer_id.as_str())?;
    let present = store.exists(&id);
    println!("{present}");
    Ok(if present {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
