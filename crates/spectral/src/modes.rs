//! Complex spatial mode decomposition and nearest-frequency lookup.

use ndarray::Array1;
use ndarray::ArrayD;
use num_complex::Complex32;

use magnon_lazy::{LazyArray, rfftfreq};
use magnon_store::{AxisSel, Selection, Store};

use crate::config::ModesConfig;
use crate::error::SpectralError;
use crate::{check_field_rank, scalar_attr};

/// Container prefix the mode decomposition of `dataset` is cached under.
pub fn modes_prefix(dataset: &str) -> String {
    format!("modes/{dataset}")
}

/// Decomposes `dataset` into complex spatial modes, one per frequency bin.
///
/// Subtracts the temporal mean of every cell, then transforms each cell's
/// time series with a real FFT, keeping the complex coefficients. Persists
/// `modes/{dataset}/arr` of shape `(T/2 + 1, z, y, x, comp)` and the
/// matching `modes/{dataset}/freqs`.
pub fn compute_modes(
    store: &Store,
    dataset: &str,
    config: &ModesConfig,
) -> Result<(), SpectralError> {
    let prefix = modes_prefix(dataset);
    if !config.override_existing && store.exists(&format!("{prefix}/arr"))? {
        return Err(SpectralError::AlreadyExists { name: prefix });
    }
    tracing::info!(dataset, "computing modes");

    let dt = scalar_attr(store, "dt")?;
    let source = store.dataset(dataset)?;
    check_field_rank(dataset, source.shape())?;
    let t_len = source.shape()[0];
    let rank = source.shape().len();

    // The whole series is needed per cell, so no axis is chunked.
    let modes = LazyArray::wrap(source, vec![None; rank])?
        .sub_mean(&[0])?
        .rfft(0)?
        .compute()?
        .into_complex()?;
    let freqs = rfftfreq(t_len, dt);

    store.write(&format!("{prefix}/arr"), modes, true)?;
    store.write(
        &format!("{prefix}/freqs"),
        Array1::from(freqs).into_dyn(),
        true,
    )?;
    tracing::debug!(prefix, "modes cached");
    Ok(())
}

/// Returns the spatial mode of `dataset` nearest to `frequency` (Hz).
///
/// Computes and caches the mode decomposition first if it is absent. With
/// `component` set, only that component's slice `(z, y, x)` is returned;
/// otherwise the full `(z, y, x, comp)` mode.
pub fn get_mode(
    store: &Store,
    dataset: &str,
    frequency: f64,
    component: Option<usize>,
) -> Result<ArrayD<Complex32>, SpectralError> {
    let prefix = modes_prefix(dataset);
    let arr_name = format!("{prefix}/arr");
    if !store.exists(&arr_name)? {
        compute_modes(store, dataset, &ModesConfig::default())?;
    }

    let freqs = store.read::<f64>(&format!("{prefix}/freqs"), &Selection::all())?;
    let index = nearest_index(freqs.iter().copied(), frequency);
    tracing::debug!(dataset, frequency, index, "mode lookup");

    let rank = store.shape(&arr_name)?.len();
    let mut axes = vec![AxisSel::Index(index)];
    if let Some(c) = component {
        axes.resize(rank - 1, AxisSel::Full);
        axes.push(AxisSel::Index(c));
    }
    Ok(store.read::<Complex32>(&arr_name, &Selection::new(axes))?)
}

/// Index of the value closest to `target`; the first occurrence wins ties.
fn nearest_index(values: impl Iterator<Item = f64>, target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, v) in values.enumerate() {
        let dist = (v - target).abs();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
