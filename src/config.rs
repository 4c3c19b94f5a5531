use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use magnon_spectral::{DEFAULT_CHUNK_Z, DEFAULT_COMPONENT, DEFAULT_KVEC_SCALE};

/// Optional `magnon.toml` settings, merged under CLI arguments.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagnonConfig {
    /// Block size along z when streaming a raw field.
    #[serde(default = "default_chunk_z")]
    pub chunk_z: usize,

    /// Magnetization component transforms default to.
    #[serde(default = "default_component")]
    pub component: usize,

    /// Scale applied to the wavevector axis (1e-6 = inverse micrometers).
    #[serde(default = "default_kvec_scale")]
    pub kvec_scale: f64,
}

impl Default for MagnonConfig {
    fn default() -> Self {
        Self {
            chunk_z: default_chunk_z(),
            component: default_component(),
            kvec_scale: default_kvec_scale(),
        }
    }
}

fn default_chunk_z() -> usize {
    DEFAULT_CHUNK_Z
}
fn default_component() -> usize {
    DEFAULT_COMPONENT
}
fn default_kvec_scale() -> f64 {
    DEFAULT_KVEC_SCALE
}

/// Loads the configuration: an explicit `--config` path must exist, the
/// implicit `magnon.toml` is used only when present.
pub fn load(explicit: Option<&Path>) -> Result<MagnonConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let implicit = Path::new("magnon.toml");
            if !implicit.exists() {
                return Ok(MagnonConfig::default());
            }
            implicit.to_path_buf()
        }
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config: {}", path.display()))
}
