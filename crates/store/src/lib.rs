//! # magnon-store
//!
//! Dataset and attribute store for a single simulation container.
//!
//! A container is a Zarr V3 hierarchy on the local filesystem holding
//! named N-dimensional arrays (`m`, `fft/m/arr`, ...) and JSON attributes
//! attached to the container root or to individual arrays. The store
//! exposes sliced reads that only touch the selected region, durable
//! writes, renames, deletes, and existence checks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use magnon_store::{AxisSel, Selection, Store};
//!
//! let store = Store::open("job.zarr")?;
//! let dt = store.attr_f64(None, "dt")?;
//! let frame = store.read::<f32>(
//!     "m",
//!     &Selection::new(vec![AxisSel::Index(0)]),
//! )?;
//! ```
//!
//! The container is single-writer: concurrent mutating calls from
//! several processes are undefined behaviour and must be serialized by
//! the caller. Concurrent readers are safe while no writer is active.

mod dataset;
mod error;
mod selection;
mod store;

pub use dataset::{Dataset, DatasetWriter};
pub use error::StoreError;
pub use selection::{AxisSel, ResolvedSelection, Selection};
pub use store::{Store, StoreElement};
