//! Fft command: cell-averaged power spectrum of a stored field.

use anyhow::{Context, Result};
use tracing::info_span;

use magnon_spectral::{FftConfig, fft};
use magnon_store::Store;

use crate::cli::TransformArgs;
use crate::config;

/// Run the spectrum transform.
pub fn run(args: TransformArgs) -> Result<()> {
    let _cmd = info_span!("fft").entered();
    let cfg = config::load(args.config.as_deref())?;

    let store = Store::open(&args.container)
        .with_context(|| format!("failed to open container: {}", args.container.display()))?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("fft/{}", args.dataset));
    let fft_cfg = FftConfig::default()
        .with_slices(args.slices(cfg.component))
        .with_chunk_z(cfg.chunk_z)
        .with_name(name.clone())
        .with_override(args.override_existing);

    let result = fft(&store, &args.dataset, &fft_cfg)
        .with_context(|| format!("spectrum of '{}' failed", args.dataset))?;

    println!("{name}: {} frequency bins", result.freqs().len());
    // Skip the DC bin when reporting the dominant frequency.
    let peak = result
        .arr()
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.total_cmp(b));
    if let Some((bin, _)) = peak {
        println!("peak at bin {bin} ({:.4e} Hz)", result.freqs()[bin]);
    }
    Ok(())
}
