//! Container open/create and the dataset/attribute operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{ArrayD, Axis};
use num_complex::Complex32;
use zarrs::array::{
    Array, ArrayBuilder, DataType, Element, ElementOwned, FillValue, ZARR_NAN_F32, ZARR_NAN_F64,
};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group, GroupBuilder};
use zarrs::storage::{
    ReadableWritableListableStorage, ReadableWritableListableStorageTraits, StoreKey, StorePrefix,
};

use crate::dataset::{Dataset, DatasetWriter};
use crate::error::StoreError;
use crate::selection::Selection;

pub(crate) type StoreArray = Array<dyn ReadableWritableListableStorageTraits>;

/// Name of the per-node metadata document in a Zarr V3 hierarchy.
const METADATA_KEY: &str = "zarr.json";

/// Element types that can live in a container array.
///
/// Implemented for `f32` (raw fields and transform results), `f64`
/// (frequency and wavevector axes) and `Complex32` (mode datasets).
pub trait StoreElement: Element + ElementOwned + Copy + Send + Sync + 'static {
    /// Zarr data type of this element.
    fn data_type() -> DataType;
    /// Fill value used for unwritten chunks.
    fn fill_value() -> FillValue;
}

impl StoreElement for f32 {
    fn data_type() -> DataType {
        DataType::Float32
    }
    fn fill_value() -> FillValue {
        FillValue::from(ZARR_NAN_F32)
    }
}

impl StoreElement for f64 {
    fn data_type() -> DataType {
        DataType::Float64
    }
    fn fill_value() -> FillValue {
        FillValue::from(ZARR_NAN_F64)
    }
}

impl StoreElement for Complex32 {
    fn data_type() -> DataType {
        DataType::Complex64
    }
    fn fill_value() -> FillValue {
        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&ZARR_NAN_F32.to_le_bytes());
        bytes.extend_from_slice(&ZARR_NAN_F32.to_le_bytes());
        FillValue::new(bytes)
    }
}

/// Handle to one simulation container.
///
/// All operations address entries by their full hierarchical name
/// (`"m"`, `"fft/m/freqs"`). Mutating operations are durable before they
/// return; the container is single-writer (see crate docs).
pub struct Store {
    path: PathBuf,
    storage: ReadableWritableListableStorage,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

impl Store {
    /// Creates an empty container at `path`, writing the root group metadata.
    ///
    /// Existing containers are left untouched apart from the root metadata
    /// being rewritten.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        let storage = open_backend(&path)?;
        GroupBuilder::new()
            .build(storage.clone(), "/")
            .map_err(|e| StoreError::Container {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .store_metadata()
            .map_err(StoreError::Storage)?;
        Ok(Store { path, storage })
    }

    /// Opens an existing container.
    ///
    /// # Errors
    ///
    /// [`StoreError::ContainerNotFound`] if `path` does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(StoreError::ContainerNotFound { path });
        }
        let storage = open_backend(&path)?;
        Ok(Store { path, storage })
    }

    /// Filesystem path of the container.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether a dataset named `name` exists.
    pub fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let key = meta_key(name)?;
        Ok(self.storage.get(&key)?.is_some())
    }

    /// Shape of the dataset named `name`.
    pub fn shape(&self, name: &str) -> Result<Vec<usize>, StoreError> {
        let array = self.open_array(name)?;
        Ok(array.shape().iter().map(|&d| d as usize).collect())
    }

    /// Reads the sub-array selected by `selection` from dataset `name`.
    ///
    /// Only the selected region is retrieved from storage; single-index
    /// axes are dropped from the result, range and full axes are kept.
    pub fn read<T: StoreElement>(
        &self,
        name: &str,
        selection: &Selection,
    ) -> Result<ArrayD<T>, StoreError> {
        let array = self.open_array(name)?;
        let shape: Vec<usize> = array.shape().iter().map(|&d| d as usize).collect();
        let resolved = selection.resolve(&shape, name)?;

        let subset = ArraySubset::new_with_ranges(&resolved.ranges);
        let mut out = array
            .retrieve_array_subset_ndarray::<T>(&subset)
            .map_err(|source| StoreError::Array {
                name: name.to_string(),
                source,
            })?;

        // Drop indexed axes, highest first so positions stay valid.
        for axis in (0..resolved.keep.len()).rev() {
            if !resolved.keep[axis] {
                out.index_axis_inplace(Axis(axis), 0);
            }
        }
        Ok(out)
    }

    /// Writes `arr` as a new dataset named `name`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] unless `override_existing`
    /// is set, in which case the prior entry is deleted first. The entry is
    /// durable when this returns.
    pub fn write<T: StoreElement>(
        &self,
        name: &str,
        arr: ArrayD<T>,
        override_existing: bool,
    ) -> Result<(), StoreError> {
        if self.exists(name)? {
            if override_existing {
                self.delete(name)?;
            } else {
                return Err(StoreError::AlreadyExists {
                    name: name.to_string(),
                });
            }
        }

        let shape: Vec<u64> = arr.shape().iter().map(|&d| d as u64).collect();
        // Small derived arrays are stored as a single chunk.
        let chunk: Vec<u64> = shape.iter().map(|&d| d.max(1)).collect();
        let array = self.build_array(name, &shape, &chunk, T::data_type(), T::fill_value())?;

        let start = vec![0u64; arr.ndim()];
        array
            .store_array_subset_ndarray::<T, _>(&start, arr)
            .map_err(|source| StoreError::Array {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!(name, "dataset written");
        Ok(())
    }

    /// Removes the dataset named `name`.
    ///
    /// Deleting an absent entry is an error ([`StoreError::KeyNotFound`]);
    /// this mirrors the behaviour of deleting a missing HDF5 node and is
    /// the policy relied on by the cache layer.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        if !self.exists(name)? {
            return Err(StoreError::KeyNotFound {
                name: name.to_string(),
            });
        }
        let prefix = entry_prefix(name)?;
        self.storage.erase_prefix(&prefix)?;
        tracing::debug!(name, "dataset deleted");
        Ok(())
    }

    /// Renames an entry, preserving its attributes.
    ///
    /// Implemented as a storage-key copy of the whole entry prefix followed
    /// by an erase of the old prefix, so the metadata document (which holds
    /// the attributes) moves with the data.
    pub fn move_entry(&self, source: &str, destination: &str) -> Result<(), StoreError> {
        if !self.exists(source)? {
            return Err(StoreError::KeyNotFound {
                name: source.to_string(),
            });
        }
        if self.exists(destination)? {
            return Err(StoreError::AlreadyExists {
                name: destination.to_string(),
            });
        }

        let src_prefix = entry_prefix(source)?;
        let keys = self.storage.list_prefix(&src_prefix)?;
        for key in keys {
            let bytes = self
                .storage
                .get(&key)?
                .ok_or_else(|| StoreError::CorruptEntry {
                    name: source.to_string(),
                    reason: format!("listed key '{key}' vanished during move"),
                })?;
            let suffix = key
                .as_str()
                .strip_prefix(src_prefix.as_str())
                .unwrap_or_default();
            let dst_key = StoreKey::new(format!("{destination}/{suffix}")).map_err(|_| {
                StoreError::InvalidName {
                    name: destination.to_string(),
                }
            })?;
            self.storage.set(&dst_key, bytes)?;
        }
        self.storage.erase_prefix(&src_prefix)?;
        tracing::debug!(source, destination, "dataset moved");
        Ok(())
    }

    /// Reads an attribute from the container root (`target = None`) or from
    /// the dataset named in `target`.
    pub fn get_attr(
        &self,
        target: Option<&str>,
        key: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let attrs = match target {
            None => self.root_group()?.attributes().clone(),
            Some(name) => self.open_array(name)?.attributes().clone(),
        };
        attrs
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::AttributeNotFound {
                key: key.to_string(),
                target: target.unwrap_or("root").to_string(),
            })
    }

    /// Sets an attribute on the container root or on a dataset; durable on
    /// return.
    pub fn set_attr(
        &self,
        target: Option<&str>,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError> {
        match target {
            None => {
                let mut group = self.root_group()?;
                group.attributes_mut().insert(key.to_string(), value);
                group.store_metadata().map_err(StoreError::Storage)?;
            }
            Some(name) => {
                let mut array = self.open_array(name)?;
                array.attributes_mut().insert(key.to_string(), value);
                array.store_metadata().map_err(StoreError::Storage)?;
            }
        }
        Ok(())
    }

    /// Reads a numeric attribute as `f64`.
    pub fn attr_f64(&self, target: Option<&str>, key: &str) -> Result<f64, StoreError> {
        self.get_attr(target, key)?
            .as_f64()
            .ok_or_else(|| StoreError::AttributeType {
                key: key.to_string(),
                target: target.unwrap_or("root").to_string(),
            })
    }

    /// All datasets in the container, mapped to their shapes.
    pub fn list_arrays(&self) -> Result<BTreeMap<String, Vec<usize>>, StoreError> {
        let mut out = BTreeMap::new();
        for key in self.storage.list()? {
            let Some(name) = key.as_str().strip_suffix(&format!("/{METADATA_KEY}")) else {
                continue;
            };
            // Group metadata fails to open as an array and is skipped.
            if let Ok(array) = Array::open(self.storage.clone(), &node_path(name)) {
                let shape = array.shape().iter().map(|&d| d as usize).collect();
                out.insert(name.to_string(), shape);
            }
        }
        Ok(out)
    }

    /// All attributes on the container root.
    pub fn list_attrs(&self) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        let group = self.root_group()?;
        Ok(group
            .attributes()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Returns a read handle for dataset `name` (name plus shape).
    pub fn dataset(&self, name: &str) -> Result<Dataset<'_>, StoreError> {
        let shape = self.shape(name)?;
        Ok(Dataset::new(self, name.to_string(), shape))
    }

    /// Pre-allocates a dataset of `f32` chunked one frame (leading-axis
    /// index) per chunk and returns a writer for the ingestion step.
    pub fn create_dataset(
        &self,
        name: &str,
        shape: &[usize],
        override_existing: bool,
    ) -> Result<DatasetWriter, StoreError> {
        if self.exists(name)? {
            if override_existing {
                self.delete(name)?;
            } else {
                return Err(StoreError::AlreadyExists {
                    name: name.to_string(),
                });
            }
        }
        let shape_u64: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
        let mut chunk = shape_u64.clone();
        if !chunk.is_empty() {
            chunk[0] = 1;
        }
        let chunk: Vec<u64> = chunk.iter().map(|&d| d.max(1)).collect();
        let array = self.build_array(
            name,
            &shape_u64,
            &chunk,
            f32::data_type(),
            f32::fill_value(),
        )?;
        Ok(DatasetWriter::new(name.to_string(), shape.to_vec(), array))
    }

    fn build_array(
        &self,
        name: &str,
        shape: &[u64],
        chunk: &[u64],
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<StoreArray, StoreError> {
        let array = ArrayBuilder::new(
            shape.to_vec(),
            data_type,
            chunk.to_vec().try_into().map_err(|_| StoreError::InvalidName {
                name: name.to_string(),
            })?,
            fill_value,
        )
        .build(self.storage.clone(), &node_path(name))
        .map_err(|e| StoreError::CorruptEntry {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        array.store_metadata().map_err(StoreError::Storage)?;
        Ok(array)
    }

    fn open_array(&self, name: &str) -> Result<StoreArray, StoreError> {
        if !self.exists(name)? {
            return Err(StoreError::KeyNotFound {
                name: name.to_string(),
            });
        }
        Array::open(self.storage.clone(), &node_path(name)).map_err(|e| {
            StoreError::CorruptEntry {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn root_group(&self) -> Result<Group<dyn ReadableWritableListableStorageTraits>, StoreError> {
        Group::open(self.storage.clone(), "/").map_err(|e| StoreError::Container {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

fn open_backend(path: &Path) -> Result<ReadableWritableListableStorage, StoreError> {
    let backend = FilesystemStore::new(path).map_err(|e| StoreError::Container {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Arc::new(backend))
}

fn node_path(name: &str) -> String {
    format!("/{name}")
}

fn meta_key(name: &str) -> Result<StoreKey, StoreError> {
    StoreKey::new(format!("{name}/{METADATA_KEY}")).map_err(|_| StoreError::InvalidName {
        name: name.to_string(),
    })
}

fn entry_prefix(name: &str) -> Result<StorePrefix, StoreError> {
    StorePrefix::new(format!("{name}/")).map_err(|_| StoreError::InvalidName {
        name: name.to_string(),
    })
}
