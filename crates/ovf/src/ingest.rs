//! Parallel ingestion of an OVF frame sequence into a container dataset.

use std::path::PathBuf;

use rayon::prelude::*;

use magnon_store::Store;

use crate::error::OvfError;
use crate::frame::read_ovf;

/// Ingestion parameters. The time step is not recorded in OVF files, so it
/// must be supplied by the caller.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub(crate) dt: f64,
    pub(crate) override_existing: bool,
}

impl IngestConfig {
    /// `dt` is the sampling interval of the frame sequence in seconds.
    pub fn new(dt: f64) -> Self {
        IngestConfig {
            dt,
            override_existing: false,
        }
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}

/// Ingests `paths` (one OVF file per time step, in order) as the dataset
/// `name` of shape `(t, z, y, x, comp)`.
///
/// The first frame fixes the geometry; the dataset is pre-allocated one
/// frame per chunk and the frames are parsed and written from a rayon
/// pool, each worker landing its slab at its assigned time index. Records
/// the `dt`, `dx`, `dy`, `dz` root attributes on success.
pub fn ingest(
    store: &Store,
    name: &str,
    paths: &[PathBuf],
    config: &IngestConfig,
) -> Result<(), OvfError> {
    let first_path = paths.first().ok_or(OvfError::NoFrames)?;
    let first = read_ovf(first_path)?;
    let (z, y, x, c) = first.data.dim();
    let shape = [paths.len(), z, y, x, c];
    tracing::info!(name, frames = paths.len(), ?shape, "ingesting ovf sequence");

    let writer = store.create_dataset(name, &shape, config.override_existing)?;
    paths.par_iter().enumerate().try_for_each(|(t, path)| {
        let frame = read_ovf(path)?;
        if frame.data.dim() != (z, y, x, c) {
            let (fz, fy, fx, fc) = frame.data.dim();
            return Err(OvfError::FrameShapeMismatch {
                path: path.clone(),
                expected: vec![z, y, x, c],
                got: vec![fz, fy, fx, fc],
            });
        }
        writer.write_frame(t, frame.data.into_dyn())?;
        Ok(())
    })?;

    let (dx, dy, dz) = first.cell_size;
    store.set_attr(None, "dt", serde_json::json!(config.dt))?;
    store.set_attr(None, "dx", serde_json::json!(dx))?;
    store.set_attr(None, "dy", serde_json::json!(dy))?;
    store.set_attr(None, "dz", serde_json::json!(dz))?;
    tracing::info!(name, "ingest complete");
    Ok(())
}
