//! Plain value types shared by nodes, fetchers and the asset cache.

use std::ops::{Add, AddAssign};
use std::sync::Arc;

use serde::Deserialize;

/// Decoded bitmap held by a node. Shared so fetchers can hand it back out.
pub type Bitmap = Arc<imagegraph_decode::RgbaImage>;

/// Byte progress of one or more transfers.
///
/// A `total` of zero means the size is unknown or there is nothing to fetch.
/// Sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStatus {
    /// Bytes received so far.
    pub loaded: u64,
    /// Bytes expected in total.
    pub total: u64,
}

impl LoadStatus {
    /// Create a new status.
    #[must_use]
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Fraction of bytes received, if the total is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| self.loaded as f64 / self.total as f64)
    }
}

impl Add for LoadStatus {
    type Output = LoadStatus;

    fn add(self, rhs: LoadStatus) -> LoadStatus {
        LoadStatus {
            loaded: self.loaded.saturating_add(rhs.loaded),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl AddAssign for LoadStatus {
    fn add_assign(&mut self, rhs: LoadStatus) {
        *self = *self + rhs;
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl LatLon {
    /// Create a new position.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_status_sum() {
        let image = LoadStatus::new(40, 100);
        let mesh = LoadStatus::new(5, 50);
        assert_eq!(image + mesh, LoadStatus::new(45, 150));

        let mut acc = LoadStatus::default();
        acc += image;
        acc += mesh;
        assert_eq!(acc, LoadStatus::new(45, 150));
    }

    #[test]
    fn test_load_status_sum_saturates() {
        let huge = LoadStatus::new(u64::MAX - 1, u64::MAX);
        assert_eq!(
            huge + LoadStatus::new(5, 10),
            LoadStatus::new(u64::MAX, u64::MAX)
        );
    }

    #[test]
    fn test_fraction() {
        assert_eq!(LoadStatus::new(25, 100).fraction(), Some(0.25));
        assert_eq!(LoadStatus::new(0, 0).fraction(), None);
    }

    #[test]
    fn test_lat_lon_from_json() {
        let pos: LatLon = serde_json::from_str(r#"{"lat": 55.6, "lon": 13.0}"#).unwrap();
        assert_eq!(pos, LatLon::new(55.6, 13.0));
    }
}
