//! Slice and transform configuration, builder style.

use magnon_store::{AxisSel, Selection};

/// Default block size along the z axis when streaming a raw field.
pub const DEFAULT_CHUNK_Z: usize = 16;
/// Default magnetization component (z).
pub const DEFAULT_COMPONENT: usize = 2;
/// Default wavevector scale: cycles per meter to inverse micrometers.
pub const DEFAULT_KVEC_SCALE: f64 = 1e-6;

/// Region of a `(t, z, y, x, comp)` field a transform operates on.
///
/// Every axis defaults to its full range and the component defaults to z,
/// so `AxisSlices::default()` selects the whole z-magnetization history.
#[derive(Clone, Debug)]
pub struct AxisSlices {
    t: AxisSel,
    z: AxisSel,
    y: AxisSel,
    x: AxisSel,
    component: usize,
}

impl Default for AxisSlices {
    fn default() -> Self {
        AxisSlices {
            t: AxisSel::Full,
            z: AxisSel::Full,
            y: AxisSel::Full,
            x: AxisSel::Full,
            component: DEFAULT_COMPONENT,
        }
    }
}

impl AxisSlices {
    pub fn with_t(mut self, t: AxisSel) -> Self {
        self.t = t;
        self
    }

    pub fn with_z(mut self, z: AxisSel) -> Self {
        self.z = z;
        self
    }

    pub fn with_y(mut self, y: AxisSel) -> Self {
        self.y = y;
        self
    }

    pub fn with_x(mut self, x: AxisSel) -> Self {
        self.x = x;
        self
    }

    pub fn with_component(mut self, component: usize) -> Self {
        self.component = component;
        self
    }

    /// The five-axis selection this region describes; the component axis is
    /// indexed and therefore dropped from the result.
    pub(crate) fn selection(&self) -> Selection {
        Selection::new(vec![
            self.t.clone(),
            self.z.clone(),
            self.y.clone(),
            self.x.clone(),
            AxisSel::Index(self.component),
        ])
    }
}

/// Configuration for the dispersion transform.
#[derive(Clone, Debug)]
pub struct DispConfig {
    pub(crate) slices: AxisSlices,
    pub(crate) chunk_z: usize,
    pub(crate) name: Option<String>,
    pub(crate) override_existing: bool,
    pub(crate) kvec_scale: f64,
}

impl Default for DispConfig {
    fn default() -> Self {
        DispConfig {
            slices: AxisSlices::default(),
            chunk_z: DEFAULT_CHUNK_Z,
            name: None,
            override_existing: false,
            kvec_scale: DEFAULT_KVEC_SCALE,
        }
    }
}

impl DispConfig {
    pub fn with_slices(mut self, slices: AxisSlices) -> Self {
        self.slices = slices;
        self
    }

    pub fn with_chunk_z(mut self, chunk_z: usize) -> Self {
        self.chunk_z = chunk_z;
        self
    }

    /// Caches the result under `{name}/arr`, `{name}/freqs`, `{name}/kvecs`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn with_kvec_scale(mut self, scale: f64) -> Self {
        self.kvec_scale = scale;
        self
    }
}

/// Configuration for the cell-averaged spectrum transform.
#[derive(Clone, Debug)]
pub struct FftConfig {
    pub(crate) slices: AxisSlices,
    pub(crate) chunk_z: usize,
    pub(crate) name: Option<String>,
    pub(crate) override_existing: bool,
}

impl Default for FftConfig {
    fn default() -> Self {
        FftConfig {
            slices: AxisSlices::default(),
            chunk_z: DEFAULT_CHUNK_Z,
            name: None,
            override_existing: false,
        }
    }
}

impl FftConfig {
    pub fn with_slices(mut self, slices: AxisSlices) -> Self {
        self.slices = slices;
        self
    }

    pub fn with_chunk_z(mut self, chunk_z: usize) -> Self {
        self.chunk_z = chunk_z;
        self
    }

    /// Caches the result under `{name}/arr` and `{name}/freqs`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}

/// Configuration for the mode decomposition.
#[derive(Clone, Debug, Default)]
pub struct ModesConfig {
    pub(crate) override_existing: bool,
}

impl ModesConfig {
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}
