//! Padding sidecar for packed files.
//!
//! Packed output has no header, so `pack` records the padding count (and
//! the sizes it expects) in `<output>.yaml` for `unpack` to pick up.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub const SIDECAR_EXT: &str = "yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sidecar {
    version: String,
    pub bits: u64,
    pub bytes: u64,
    pub padding: u8,
}

impl Sidecar {
    pub fn new(bits: u64, padding: u8) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            bits,
            bytes: bits.div_ceil(8),
            padding,
        }
    }

    pub fn path_for(packed: &Path) -> PathBuf {
        let mut name = packed.as_os_str().to_os_string();
        name.push(".");
        name.push(SIDECAR_EXT);
        PathBuf::from(name)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let sidecar: Self = serde_yaml_ng::from_str(yaml)?;

        ensure!(
            sidecar.padding <= bitstream::stream::MAX_PADDING,
            "Sidecar padding must be between 0 and 7. Read {}",
            sidecar.padding
        );

        Ok(sidecar)
    }

    pub fn write(&self, packed: &Path) -> Result<PathBuf> {
        let path = Self::path_for(packed);
        fs::write(&path, self.to_yaml()?)
            .with_context(|| format!("Failed to write sidecar {}", path.display()))?;
        Ok(path)
    }

    pub fn read(packed: &Path) -> Result<Self> {
        let path = Self::path_for(packed);
        let yaml = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sidecar {}", path.display()))?;
        Self::from_yaml(&yaml)
    }
}
