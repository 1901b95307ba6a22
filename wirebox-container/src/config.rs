//! Container configuration.

use serde::Deserialize;

/// Settings consumed by [`ContainerBuilder::config`](crate::container::ContainerBuilder::config).
///
/// Every field defaults to `false`, so a partial document only needs to
/// name what it changes:
///
/// ```rust
/// use wirebox_container::config::ContainerConfig;
///
/// let config: ContainerConfig = serde_json::from_str(r#"{ "autowire": true }"#).unwrap();
/// assert!(config.autowire);
/// assert!(!config.default_shared);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Register definitions added through `add` as shared.
    pub default_shared: bool,
    /// Append a reflection container as the last delegate.
    pub autowire: bool,
    /// Let that reflection container reuse the instances it builds.
    pub cache_reflections: bool,
}
