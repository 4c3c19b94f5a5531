//! Disp command: dispersion relation of a stored field.

use anyhow::{Context, Result};
use tracing::info_span;

use magnon_spectral::{DispConfig, disp};
use magnon_store::Store;

use crate::cli::TransformArgs;
use crate::config;

/// Run the dispersion transform.
pub fn run(args: TransformArgs) -> Result<()> {
    let _cmd = info_span!("disp").entered();
    let cfg = config::load(args.config.as_deref())?;

    let store = Store::open(&args.container)
        .with_context(|| format!("failed to open container: {}", args.container.display()))?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("disp/{}", args.dataset));
    let disp_cfg = DispConfig::default()
        .with_slices(args.slices(cfg.component))
        .with_chunk_z(cfg.chunk_z)
        .with_kvec_scale(cfg.kvec_scale)
        .with_name(name.clone())
        .with_override(args.override_existing);

    let result = disp(&store, &args.dataset, &disp_cfg)
        .with_context(|| format!("dispersion of '{}' failed", args.dataset))?;

    let f_max = result.freqs().last().copied().unwrap_or(0.0);
    println!(
        "{name}: {:?} power map, {} frequencies up to {f_max:.4e} Hz, {} wavevectors",
        result.arr().shape(),
        result.freqs().len(),
        result.kvecs().len()
    );
    Ok(())
}
