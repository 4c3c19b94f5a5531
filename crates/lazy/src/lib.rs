//! # magnon-lazy
//!
//! Chunked, lazily-evaluated computation graphs over store-backed arrays.
//!
//! A [`LazyArray`] wraps one dataset of a container together with a
//! per-axis chunking policy. Operations (slicing, broadcast arithmetic,
//! reductions, axis moves, FFTs) extend the graph without touching any
//! data; a single [`LazyArray::compute`] call executes the graph and
//! realizes a dense [`Tensor`]. `compute` consumes the graph, so a
//! finished graph cannot be accidentally re-run — wrap the dataset again
//! to recompute.
//!
//! ## Pipeline sketch
//!
//! ```ignore
//! use magnon_lazy::{LazyArray, hann};
//! use magnon_store::{AxisSel, Selection};
//!
//! let dset = store.dataset("m")?;
//! let t_len = dset.shape()[0];
//! let spectrum = LazyArray::wrap(dset, vec![None, Some(16), None, None, None])?
//!     .select(Selection::new(vec![
//!         AxisSel::Full,
//!         AxisSel::Full,
//!         AxisSel::Full,
//!         AxisSel::Full,
//!         AxisSel::Index(2),
//!     ]))?
//!     .sum(&[1])?
//!     .rfft(0)?
//!     .abs()?
//!     .compute()?;
//! ```
//!
//! During execution, source chunks are streamed along the chunked axis
//! through element-wise operations and folded at the first reduction that
//! collapses that axis, so a long time series is never fully resident.
//! FFTs follow the standard forward convention: no `1/N` normalization,
//! `rfft` keeps the `n/2 + 1` non-negative frequencies, `fftshift` rolls
//! each axis by `n/2` to center zero frequency.

mod error;
mod eval;
mod freq;
mod graph;
mod tensor;
mod window;

pub use error::LazyError;
pub use freq::{fftfreq, fftshift_vec, rfftfreq};
pub use graph::LazyArray;
pub use tensor::Tensor;
pub use window::{hann, hann2d};
