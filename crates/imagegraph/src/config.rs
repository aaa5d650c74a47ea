//! Configuration.
//!
//! [`Settings`] selects how node assets are retrieved. The deployment mode is
//! read once, here, and turned into an [`AssetFetcher`]; nothing downstream
//! checks it again.
//!
//! [`SpatialDataConfiguration`] carries the viewer's spatial data toggles.
//! This crate only stores and merges them.

use std::sync::Arc;

use serde::Deserialize;

use crate::cache::{DEFAULT_IMAGE_SIZE, MeshFailurePolicy};
use crate::error::{Error, Result};
use crate::fetch::{AssetFetcher, BypassFetcher};
use crate::remote::{Endpoints, RemoteFetcher};

/// How node assets are retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Download and decode assets from the configured endpoints.
    #[default]
    Remote,
    /// Skip all I/O and complete every retrieval immediately.
    Bypass,
}

/// Asset retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Retrieval mode.
    pub mode: FetchMode,
    /// Requested image size in pixels.
    pub base_image_size: u32,
    /// How mesh failures affect a caching cycle.
    pub mesh_failure: MeshFailurePolicy,
    /// Asset endpoints; required in remote mode.
    pub endpoints: Option<Endpoints>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: FetchMode::Remote,
            base_image_size: DEFAULT_IMAGE_SIZE,
            mesh_failure: MeshFailurePolicy::Degrade,
            endpoints: None,
        }
    }
}

impl Settings {
    /// Settings for offline runs.
    #[must_use]
    pub fn bypass() -> Self {
        Self {
            mode: FetchMode::Bypass,
            ..Self::default()
        }
    }

    /// Settings for remote retrieval from `endpoints`.
    #[must_use]
    pub fn remote(endpoints: Endpoints) -> Self {
        Self {
            mode: FetchMode::Remote,
            endpoints: Some(endpoints),
            ..Self::default()
        }
    }

    /// Build the fetcher selected by these settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] in remote mode when no endpoints are set.
    pub fn fetcher(&self) -> Result<Arc<dyn AssetFetcher>> {
        match self.mode {
            FetchMode::Bypass => Ok(Arc::new(BypassFetcher::new())),
            FetchMode::Remote => {
                let endpoints = self.endpoints.clone().ok_or_else(|| Error::Config {
                    detail: "remote mode requires endpoints".to_string(),
                })?;
                Ok(Arc::new(RemoteFetcher::new(endpoints)))
            }
        }
    }
}

/// Visibility toggles for spatial data overlays.
///
/// Unset toggles fall back to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpatialDataConfiguration {
    /// Show reconstructed camera frusta. Defaults to `false`.
    pub cameras_visible: Option<bool>,
    /// Show reconstructed points. Defaults to `true`.
    pub points_visible: Option<bool>,
    /// Show original GPS positions. Defaults to `false`.
    pub positions_visible: Option<bool>,
}

impl SpatialDataConfiguration {
    /// Whether cameras are shown.
    #[must_use]
    pub fn cameras_visible(&self) -> bool {
        self.cameras_visible.unwrap_or(false)
    }

    /// Whether points are shown.
    #[must_use]
    pub fn points_visible(&self) -> bool {
        self.points_visible.unwrap_or(true)
    }

    /// Whether original GPS positions are shown.
    #[must_use]
    pub fn positions_visible(&self) -> bool {
        self.positions_visible.unwrap_or(false)
    }

    /// Overlay the toggles set in `other`.
    #[must_use]
    pub fn merge(self, other: SpatialDataConfiguration) -> Self {
        Self {
            cameras_visible: other.cameras_visible.or(self.cameras_visible),
            points_visible: other.points_visible.or(self.points_visible),
            positions_visible: other.positions_visible.or(self.positions_visible),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.base_image_size, 640);
        assert_eq!(settings.mode, FetchMode::Remote);
    }

    #[test]
    fn test_settings_from_json() {
        let json = r#"{
            "mode": "remote",
            "base_image_size": 320,
            "mesh_failure": "fatal",
            "endpoints": {
                "image": "http://img/{key}/{size}",
                "mesh": "http://mesh/{key}"
            }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.base_image_size, 320);
        assert_eq!(settings.mesh_failure, MeshFailurePolicy::Fatal);
        assert!(settings.fetcher().is_ok());
    }

    #[test]
    fn test_remote_without_endpoints_is_rejected() {
        let settings = Settings::default();
        assert!(matches!(settings.fetcher(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_bypass_needs_no_endpoints() {
        let settings: Settings = serde_json::from_str(r#"{"mode": "bypass"}"#).unwrap();
        assert_eq!(settings, Settings::bypass());
        assert!(settings.fetcher().is_ok());
    }

    #[test]
    fn test_spatial_data_defaults() {
        let config = SpatialDataConfiguration::default();
        assert!(!config.cameras_visible());
        assert!(config.points_visible());
        assert!(!config.positions_visible());
    }

    #[test]
    fn test_spatial_data_from_json() {
        let config: SpatialDataConfiguration =
            serde_json::from_str(r#"{"camerasVisible": true, "pointsVisible": false}"#).unwrap();
        assert!(config.cameras_visible());
        assert!(!config.points_visible());
        assert!(!config.positions_visible());
    }

    #[test]
    fn test_spatial_data_merge() {
        let base = SpatialDataConfiguration {
            cameras_visible: Some(true),
            points_visible: Some(false),
            positions_visible: None,
        };
        let update = SpatialDataConfiguration {
            points_visible: Some(true),
            positions_visible: Some(true),
            ..SpatialDataConfiguration::default()
        };

        let merged = base.merge(update);
        assert!(merged.cameras_visible());
        assert!(merged.points_visible());
        assert!(merged.positions_visible());
    }
}
