//! Camera registry implementation

use std::collections::HashSet;
use std::path::Path;

use super::descriptor::CameraDescriptor;
use super::error::ConfigError;

/// Read-only, ordered camera list with lookup by address
#[derive(Debug, Clone, Default)]
pub struct CameraRegistry {
    cameras: Vec<CameraDescriptor>,
}

impl CameraRegistry {
    /// Build a registry from descriptors, validating each one
    pub fn new(cameras: Vec<CameraDescriptor>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(cameras.len());

        for (index, camera) in cameras.iter().enumerate() {
            camera
                .validate()
                .map_err(|reason| ConfigError::InvalidCamera {
                    index,
                    address: camera.address.clone(),
                    reason,
                })?;

            if !seen.insert(camera.address.as_str()) {
                return Err(ConfigError::DuplicateAddress(camera.address.clone()));
            }
        }

        Ok(Self { cameras })
    }

    /// Parse a JSON array of cameras
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cameras: Vec<CameraDescriptor> = serde_json::from_str(json)?;
        Self::new(cameras)
    }

    /// Load and validate the camera list file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let registry = Self::from_json(&raw)?;

        tracing::info!(
            path = %path.display(),
            cameras = registry.len(),
            "Camera list loaded"
        );

        Ok(registry)
    }

    /// Look up a camera by address
    pub fn get(&self, address: &str) -> Option<&CameraDescriptor> {
        self.cameras.iter().find(|c| c.address == address)
    }

    /// All cameras in file order
    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    /// Iterate cameras in file order
    pub fn iter(&self) -> impl Iterator<Item = &CameraDescriptor> {
        self.cameras.iter()
    }

    /// Number of cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}
