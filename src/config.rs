use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ContainerError;

/// Service provider options
///
/// ```toml
/// validate_scopes = true
/// validate_on_build = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// Reject scoped services resolved from the root provider or captured by a singleton
    pub validate_scopes: bool,
    /// Check required constructor dependencies of implementation-type registrations at build time
    pub validate_on_build: bool,
}

impl ProviderOptions {
    /// 开发环境：打开全部校验
    pub fn strict() -> Self {
        Self {
            validate_scopes: true,
            validate_on_build: true,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ContainerError> {
        toml::from_str(content).map_err(|e| ContainerError::Config(e.to_string()))
    }

    /// 从配置文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ContainerError> {
        toml::to_string(self).map_err(|e| ContainerError::Config(e.to_string()))
    }
}
