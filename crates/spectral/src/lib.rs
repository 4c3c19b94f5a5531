//! # magnon-spectral
//!
//! Spectral transforms over stored magnetization histories: the dispersion
//! relation (frequency vs wavevector), the cell-averaged spectrum, and the
//! complex spatial mode decomposition.
//!
//! Each transform slices a `(t, z, y, x, comp)` field, builds a lazy graph
//! over it, reads the time step `dt` (and cell size `dx` where needed) from
//! the container's root attributes at call time, and optionally caches the
//! result under a hierarchical name (`disp/m/arr`, `fft/m/freqs`, ...).
//! A cache collision without `override` fails before any data is read.
//!
//! ```ignore
//! use magnon_spectral::{FftConfig, fft};
//!
//! let result = fft(&store, "m", &FftConfig::default().with_name("fft/m"))?;
//! println!("{} frequency bins", result.freqs().len());
//! ```

mod config;
mod disp;
mod error;
mod modes;
mod spectrum;

pub use config::{
    AxisSlices, DEFAULT_CHUNK_Z, DEFAULT_COMPONENT, DEFAULT_KVEC_SCALE, DispConfig, FftConfig,
    ModesConfig,
};
pub use disp::{DispResult, disp};
pub use error::SpectralError;
pub use modes::{compute_modes, get_mode, modes_prefix};
pub use spectrum::{FftResult, fft};

use magnon_store::{Store, StoreError};

/// Reads a numeric root attribute, mapping lookup failures to
/// [`SpectralError::MissingAttribute`].
pub(crate) fn scalar_attr(store: &Store, key: &str) -> Result<f64, SpectralError> {
    store.attr_f64(None, key).map_err(|e| match e {
        StoreError::AttributeNotFound { .. } | StoreError::AttributeType { .. } => {
            SpectralError::MissingAttribute {
                key: key.to_string(),
            }
        }
        other => SpectralError::Store(other),
    })
}

/// Checks that `shape` is a `(t, z, y, x, comp)` field.
pub(crate) fn check_field_rank(name: &str, shape: &[usize]) -> Result<(), SpectralError> {
    if shape.len() != 5 {
        return Err(SpectralError::DatasetRank {
            name: name.to_string(),
            got: shape.len(),
        });
    }
    Ok(())
}
