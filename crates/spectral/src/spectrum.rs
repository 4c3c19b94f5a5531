//! Cell-averaged power spectrum.

use ndarray::{Array1, ArrayD, Axis};

use magnon_lazy::{LazyArray, hann, rfftfreq};
use magnon_store::Store;

use crate::config::FftConfig;
use crate::error::SpectralError;
use crate::{check_field_rank, scalar_attr};

/// Result of the spectrum transform.
#[derive(Debug)]
pub struct FftResult {
    arr: ArrayD<f32>,
    freqs: Vec<f64>,
}

impl FftResult {
    /// Spectral power per frequency bin, shape `(T/2 + 1,)`.
    pub fn arr(&self) -> &ArrayD<f32> {
        &self.arr
    }

    /// Frequency axis in Hz, same length as [`FftResult::arr`].
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }
}

/// Computes the power spectrum of `dataset`, summed over all cells.
///
/// The selected region is summed over z, the first time sample and the
/// temporal mean are subtracted to remove the static configuration, a Hann
/// window tapers the time axis, every spatial cell's time series is
/// transformed with a real FFT, and the magnitudes are summed over cells.
/// The frequency axis derives from the root attribute `dt` and the
/// selected number of time frames.
pub fn fft(store: &Store, dataset: &str, config: &FftConfig) -> Result<FftResult, SpectralError> {
    if let Some(name) = config.name.as_deref()
        && !config.override_existing
        && store.exists(&format!("{name}/arr"))?
    {
        return Err(SpectralError::AlreadyExists {
            name: name.to_string(),
        });
    }
    tracing::info!(dataset, name = config.name.as_deref(), "computing spectrum");

    let dt = scalar_attr(store, "dt")?;

    let source = store.dataset(dataset)?;
    check_field_rank(dataset, source.shape())?;
    let selection = config.slices.selection();
    let resolved = selection.resolve(source.shape(), dataset)?;
    let sel_shape = resolved.out_shape(); // (t, z, y, x)
    let (t_len, y_len, x_len) = (sel_shape[0], sel_shape[2], sel_shape[3]);

    let window_t = hann(t_len)
        .into_dyn()
        .insert_axis(Axis(1))
        .insert_axis(Axis(2));

    let arr = LazyArray::wrap(source, vec![None, Some(config.chunk_z), None, None, None])?
        .select(selection)?
        .sum(&[1])? // (t, y, x)
        .sub_frame(0, 0)?
        .sub_mean(&[0])?
        .mul(window_t)?
        .swap_axes(0, 2)? // (x, y, t)
        .reshape(&[x_len * y_len, t_len])?
        .rfft(1)?
        .abs()?
        .sum(&[0])? // (t/2 + 1,)
        .compute()?
        .into_real()?;

    let freqs = rfftfreq(t_len, dt);

    if let Some(name) = config.name.as_deref() {
        store.write(&format!("{name}/arr"), arr.clone(), true)?;
        store.write(
            &format!("{name}/freqs"),
            Array1::from(freqs.clone()).into_dyn(),
            true,
        )?;
        tracing::debug!(name, "spectrum cached");
    }

    Ok(FftResult { arr, freqs })
}
