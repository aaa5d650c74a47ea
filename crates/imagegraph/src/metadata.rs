//! Upstream navigation metadata attached to each image point.
//!
//! The API delivers this as JSON. Only the fields the caching and
//! classification logic reads are modelled; everything else is ignored.

use serde::Deserialize;

/// Navigation metadata for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiNavImIm {
    /// Image key, when the payload carries it.
    #[serde(default)]
    pub key: Option<String>,
    /// Reconstruction version; positive when 3D geometry exists.
    #[serde(default)]
    pub merge_version: Option<i64>,
    /// Photo sphere descriptor for panoramas.
    #[serde(default)]
    pub gpano: Option<Gpano>,
}

impl ApiNavImIm {
    /// Whether the reconstruction pipeline produced geometry for this image.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merge_version.is_some_and(|v| v > 0)
    }
}

/// Photo sphere crop descriptor, using the XMP `GPano` field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Gpano {
    #[serde(default)]
    pub full_pano_width_pixels: Option<u32>,
    #[serde(default)]
    pub full_pano_height_pixels: Option<u32>,
    #[serde(default)]
    pub cropped_area_left_pixels: Option<u32>,
    #[serde(default)]
    pub cropped_area_top_pixels: Option<u32>,
    #[serde(default)]
    pub cropped_area_image_width_pixels: Option<u32>,
    #[serde(default)]
    pub cropped_area_image_height_pixels: Option<u32>,
}

impl Gpano {
    /// Whether the image is a panorama at all.
    #[must_use]
    pub fn is_pano(&self) -> bool {
        self.full_pano_width_pixels.is_some()
    }

    /// Whether the cropped area covers the whole sphere.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cropped_area_left_pixels == Some(0)
            && self.cropped_area_top_pixels == Some(0)
            && self.cropped_area_image_width_pixels.is_some()
            && self.cropped_area_image_width_pixels == self.full_pano_width_pixels
            && self.cropped_area_image_height_pixels.is_some()
            && self.cropped_area_image_height_pixels == self.full_pano_height_pixels
    }
}
