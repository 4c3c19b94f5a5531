//! # magnon-ovf
//!
//! OVF 2.0 frame parsing and parallel ingestion.
//!
//! Micromagnetic solvers save one OVF file per time step; [`ingest`] turns
//! such a sequence into a single `(t, z, y, x, comp)` container dataset,
//! parsing and writing frames concurrently. [`read_ovf`] and [`write_ovf`]
//! handle individual frames (`Binary 4` and `Text` data blocks).

mod error;
mod frame;
mod ingest;

pub use error::OvfError;
pub use frame::{OVF_CONTROL_NUMBER, OvfFrame, read_ovf, write_ovf};
pub use ingest::{IngestConfig, ingest};
