//! Ingest command: turn a directory of OVF frames into a container dataset.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use magnon_ovf::{IngestConfig, ingest};
use magnon_store::Store;

use crate::cli::IngestArgs;

/// Run the ingestion pipeline.
pub fn run(args: IngestArgs) -> Result<()> {
    let _cmd = info_span!("ingest").entered();

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&args.input)
        .with_context(|| format!("failed to read input directory: {}", args.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "ovf"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no .ovf files in {}", args.input.display());
    }
    info!(frames = paths.len(), "found frame sequence");

    let store = Store::create(&args.container)
        .with_context(|| format!("failed to open container: {}", args.container.display()))?;
    let config = IngestConfig::new(args.dt).with_override(args.override_existing);
    ingest(&store, &args.dataset, &paths, &config)
        .with_context(|| format!("ingestion of '{}' failed", args.dataset))?;

    let shape = store.shape(&args.dataset)?;
    println!(
        "ingested {} frames into '{}' with shape {:?}",
        paths.len(),
        args.dataset,
        shape
    );
    Ok(())
}
