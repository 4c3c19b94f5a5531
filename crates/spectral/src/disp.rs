//! Dispersion relation: power as a function of frequency and wavevector
//! along x.

use ndarray::{Array1, ArrayD, Axis};

use magnon_lazy::{LazyArray, fftfreq, fftshift_vec, hann, hann2d, rfftfreq};
use magnon_store::Store;

use crate::config::DispConfig;
use crate::error::SpectralError;
use crate::{check_field_rank, scalar_attr};

/// Result of the dispersion transform.
#[derive(Debug)]
pub struct DispResult {
    arr: ArrayD<f32>,
    freqs: Vec<f64>,
    kvecs: Vec<f64>,
}

impl DispResult {
    /// Power map of shape `(freqs, kvecs)`.
    pub fn arr(&self) -> &ArrayD<f32> {
        &self.arr
    }

    /// Frequency axis in Hz, length `T/2`.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// Wavevector axis, shifted so zero sits in the middle, in units set
    /// by the configured scale (inverse micrometers by default).
    pub fn kvecs(&self) -> &[f64] {
        &self.kvecs
    }
}

/// Computes the dispersion relation of `dataset`.
///
/// The selected region is tapered by a Hann window in time, summed over z,
/// tapered again by a 2-D Hann window over the `(t, x)` plane of each y
/// row, Fourier transformed over `(t, x)`, centered by subtracting each
/// row's mean, reduced to the first half of the frequency axis, shifted so
/// zero wavevector sits in the middle, and finally summed over y. The
/// frequency axis derives from the root attribute `dt`, the wavevector
/// axis from `dx`.
pub fn disp(store: &Store, dataset: &str, config: &DispConfig) -> Result<DispResult, SpectralError> {
    if let Some(name) = config.name.as_deref()
        && !config.override_existing
        && store.exists(&format!("{name}/arr"))?
    {
        return Err(SpectralError::AlreadyExists {
            name: name.to_string(),
        });
    }
    tracing::info!(dataset, name = config.name.as_deref(), "computing dispersion");

    let dt = scalar_attr(store, "dt")?;
    let dx = scalar_attr(store, "dx")?;

    let source = store.dataset(dataset)?;
    check_field_rank(dataset, source.shape())?;
    let selection = config.slices.selection();
    let resolved = selection.resolve(source.shape(), dataset)?;
    let sel_shape = resolved.out_shape(); // (t, z, y, x)
    let (t_len, x_len) = (sel_shape[0], sel_shape[3]);

    let window_t = hann(t_len)
        .into_dyn()
        .insert_axis(Axis(1))
        .insert_axis(Axis(2))
        .insert_axis(Axis(3));
    let window_tx = hann2d(t_len, x_len).into_dyn().insert_axis(Axis(0));

    let arr = LazyArray::wrap(source, vec![None, Some(config.chunk_z), None, None, None])?
        .select(selection)?
        .mul(window_t)?
        .sum(&[1])? // (t, y, x)
        .move_axis(1, 0)? // (y, t, x)
        .mul(window_tx)?
        .fft2([1, 2])?
        .sub_mean(&[1, 2])?
        .move_axis(0, 1)? // (t, y, x)
        .slice_axis(0, 0, t_len / 2)?
        .fftshift(&[1, 2])?
        .abs()?
        .sum(&[1])? // (t/2, x)
        .compute()?
        .into_real()?;

    let mut freqs = rfftfreq(t_len, dt);
    freqs.truncate(t_len / 2);
    let kvecs: Vec<f64> = fftshift_vec(fftfreq(x_len, dx))
        .into_iter()
        .map(|k| k * config.kvec_scale)
        .collect();

    if let Some(name) = config.name.as_deref() {
        store.write(&format!("{name}/arr"), arr.clone(), true)?;
        store.write(
            &format!("{name}/freqs"),
            Array1::from(freqs.clone()).into_dyn(),
            true,
        )?;
        store.write(
            &format!("{name}/kvecs"),
            Array1::from(kvecs.clone()).into_dyn(),
            true,
        )?;
        tracing::debug!(name, "dispersion cached");
    }

    Ok(DispResult { arr, freqs, kvecs })
}
