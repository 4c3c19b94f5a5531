//! Read and write handles bound to one dataset.

use ndarray::ArrayD;

use crate::error::StoreError;
use crate::selection::Selection;
use crate::store::{Store, StoreArray};

/// Read handle to one dataset: its name plus the shape captured at open
/// time. This is the unit the lazy array engine wraps.
#[derive(Clone)]
pub struct Dataset<'s> {
    store: &'s Store,
    name: String,
    shape: Vec<usize>,
}

impl std::fmt::Debug for Dataset<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

impl<'s> Dataset<'s> {
    pub(crate) fn new(store: &'s Store, name: String, shape: Vec<usize>) -> Self {
        Dataset { store, name, shape }
    }

    /// Dataset name within the container.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dataset shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The store this dataset lives in.
    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Reads the selected sub-array as `f32`.
    pub fn read_f32(&self, selection: &Selection) -> Result<ArrayD<f32>, StoreError> {
        self.store.read::<f32>(&self.name, selection)
    }
}

/// Write handle to a pre-allocated dataset, chunked one leading-axis frame
/// per chunk so concurrent workers can land their slabs independently.
pub struct DatasetWriter {
    name: String,
    shape: Vec<usize>,
    array: StoreArray,
}

impl DatasetWriter {
    pub(crate) fn new(name: String, shape: Vec<usize>, array: StoreArray) -> Self {
        DatasetWriter { name, shape, array }
    }

    /// Dataset name within the container.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full dataset shape, frame axis included.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Writes one frame at leading-axis index `index`.
    ///
    /// Safe to call from several threads as long as each thread writes a
    /// distinct index; each frame is its own chunk.
    pub fn write_frame(&self, index: usize, frame: ArrayD<f32>) -> Result<(), StoreError> {
        let expected = &self.shape[1..];
        if frame.shape() != expected {
            return Err(StoreError::SlabShape {
                name: self.name.clone(),
                expected: expected.to_vec(),
                got: frame.shape().to_vec(),
            });
        }
        if index >= self.shape[0] {
            return Err(StoreError::SelectionOutOfBounds {
                name: self.name.clone(),
                axis: 0,
                start: index,
                end: index + 1,
                len: self.shape[0],
            });
        }

        let mut start = vec![0u64; self.shape.len()];
        start[0] = index as u64;
        let frame = frame.insert_axis(ndarray::Axis(0));
        self.array
            .store_array_subset_ndarray::<f32, _>(&start, frame)
            .map_err(|source| StoreError::Array {
                name: self.name.clone(),
                source,
            })
    }
}
