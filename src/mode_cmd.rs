//! Mode command: extract the spatial mode nearest to a frequency.

use anyhow::{Context, Result};
use tracing::info_span;

use magnon_spectral::get_mode;
use magnon_store::Store;

use crate::cli::ModeArgs;

/// Run the mode extraction.
pub fn run(args: ModeArgs) -> Result<()> {
    let _cmd = info_span!("mode").entered();

    let store = Store::open(&args.container)
        .with_context(|| format!("failed to open container: {}", args.container.display()))?;

    let mode = get_mode(&store, &args.dataset, args.freq, args.component)
        .with_context(|| format!("mode extraction from '{}' failed", args.dataset))?;
    println!("mode near {:.4e} Hz: shape {:?}", args.freq, mode.shape());

    if let Some(output) = &args.output {
        store
            .write(output, mode, true)
            .with_context(|| format!("failed to store mode as '{output}'"))?;
        println!("stored as '{output}'");
    }
    Ok(())
}
