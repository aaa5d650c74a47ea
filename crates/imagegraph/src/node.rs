//! Graph nodes: georeferenced photographs and their cached assets.

use std::fmt;
use std::sync::{Arc, Weak};

use glam::DVec3;
use imagegraph_decode::Mesh;
use tokio::sync::watch;
use web_time::Instant;

use crate::cache::NodeAssetCache;
use crate::error::Result;
use crate::metadata::{ApiNavImIm, Gpano};
use crate::sequence::Sequence;
use crate::types::{Bitmap, LatLon, LoadStatus};

/// Progress of a node through its most recent caching cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheState {
    /// No cycle has run since construction or eviction.
    #[default]
    Idle,
    /// Image and mesh retrievals are in flight.
    FetchingBoth,
    /// Both retrievals finished; assets are being assigned.
    Combining,
    /// Assets are assigned and the node is cached.
    Done,
    /// The last cycle failed; assets were left untouched.
    Failed,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheState::Idle => "idle",
            CacheState::FetchingBoth => "fetching",
            CacheState::Combining => "combining",
            CacheState::Done => "done",
            CacheState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One image point in the navigation graph.
///
/// The node owns its cached bitmap and mesh. They are only written by a
/// caching cycle ([`GraphNode::cache_assets`]) and by [`GraphNode::evict`].
#[derive(Debug)]
pub struct GraphNode {
    key: String,
    /// Compass angle in degrees.
    pub ca: f64,
    /// Geographic position.
    pub lat_lon: LatLon,
    /// Camera-to-world translation.
    pub translation: DVec3,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at: u64,
    /// Name of the uploading user.
    pub user: String,
    /// Quality flag.
    pub worthy: bool,
    /// Upstream navigation metadata.
    pub api_nav_im_im: Option<ApiNavImIm>,
    /// Spatial index cells containing this node.
    pub hs: Vec<String>,
    sequence: Option<Weak<Sequence>>,
    cached: bool,
    last_cache_evict: Option<Instant>,
    last_used: Instant,
    load_status: watch::Sender<LoadStatus>,
    cache_state: CacheState,
    image: Option<Bitmap>,
    mesh: Option<Mesh>,
}

impl GraphNode {
    /// Create an uncached node.
    #[must_use]
    pub fn new(key: impl Into<String>, lat_lon: LatLon, ca: f64) -> Self {
        let (load_status, _) = watch::channel(LoadStatus::default());
        Self {
            key: key.into(),
            ca,
            lat_lon,
            translation: DVec3::ZERO,
            captured_at: 0,
            user: String::new(),
            worthy: false,
            api_nav_im_im: None,
            hs: Vec::new(),
            sequence: None,
            cached: false,
            last_cache_evict: None,
            last_used: Instant::now(),
            load_status,
            cache_state: CacheState::Idle,
            image: None,
            mesh: None,
        }
    }

    /// Set the camera-to-world translation.
    #[must_use]
    pub fn with_translation(mut self, translation: DVec3) -> Self {
        self.translation = translation;
        self
    }

    /// Set the capture time and uploader.
    #[must_use]
    pub fn with_capture(mut self, captured_at: u64, user: impl Into<String>) -> Self {
        self.captured_at = captured_at;
        self.user = user.into();
        self
    }

    /// Set the quality flag.
    #[must_use]
    pub fn with_worthy(mut self, worthy: bool) -> Self {
        self.worthy = worthy;
        self
    }

    /// Attach upstream navigation metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ApiNavImIm) -> Self {
        self.api_nav_im_im = Some(metadata);
        self
    }

    /// Set the spatial index cells.
    #[must_use]
    pub fn with_hs(mut self, hs: Vec<String>) -> Self {
        self.hs = hs;
        self
    }

    /// Link the node to the sequence it was captured in.
    ///
    /// Only a weak reference is kept; the sequence is owned elsewhere.
    #[must_use]
    pub fn with_sequence(mut self, sequence: &Arc<Sequence>) -> Self {
        self.sequence = Some(Arc::downgrade(sequence));
        self
    }

    /// The node key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the last caching cycle completed.
    #[must_use]
    pub fn cached(&self) -> bool {
        self.cached
    }

    /// Whether the node is cached and holds a bitmap.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.cached && self.image.is_some()
    }

    /// Whether 3D geometry exists for this node.
    #[must_use]
    pub fn merged(&self) -> bool {
        self.api_nav_im_im.as_ref().is_some_and(ApiNavImIm::is_merged)
    }

    /// Whether the photograph is a panorama.
    #[must_use]
    pub fn pano(&self) -> bool {
        self.gpano().is_some_and(Gpano::is_pano)
    }

    /// Whether the photograph is an uncropped 360° panorama.
    #[must_use]
    pub fn full_pano(&self) -> bool {
        self.gpano().is_some_and(Gpano::is_full)
    }

    fn gpano(&self) -> Option<&Gpano> {
        self.api_nav_im_im.as_ref()?.gpano.as_ref()
    }

    /// The cached bitmap.
    #[must_use]
    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    /// The cached mesh.
    #[must_use]
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Combined byte progress of the current or last caching cycle.
    #[must_use]
    pub fn load_status(&self) -> LoadStatus {
        *self.load_status.borrow()
    }

    /// Watch the combined byte progress.
    ///
    /// Each received value is a consistent `{loaded, total}` pair.
    #[must_use]
    pub fn subscribe_load_status(&self) -> watch::Receiver<LoadStatus> {
        self.load_status.subscribe()
    }

    /// Where the node is in its caching cycle.
    #[must_use]
    pub fn cache_state(&self) -> CacheState {
        self.cache_state
    }

    /// When the node was last used.
    #[must_use]
    pub fn last_used(&self) -> Instant {
        self.last_used
    }

    /// When the node's assets were last evicted.
    #[must_use]
    pub fn last_cache_evict(&self) -> Option<Instant> {
        self.last_cache_evict
    }

    /// Mark the node as used now.
    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// Drop the cached assets.
    ///
    /// Deciding when to evict is left to the owner of the graph.
    pub fn evict(&mut self) {
        tracing::debug!(key = %self.key, "evicting node assets");
        self.image = None;
        self.mesh = None;
        self.cached = false;
        self.cache_state = CacheState::Idle;
        self.last_cache_evict = Some(Instant::now());
        self.load_status.send_replace(LoadStatus::default());
    }

    /// Fetch the bitmap and mesh through `cache`.
    ///
    /// Resolves to the node itself once both assets are assigned.
    pub async fn cache_assets(&mut self, cache: &NodeAssetCache) -> Result<&mut Self> {
        cache.cache_assets(self).await
    }

    /// Key of the next node in the capture sequence.
    #[must_use]
    pub fn find_next_key_in_sequence(&self) -> Option<String> {
        let sequence = self.sequence.as_ref()?.upgrade()?;
        sequence.find_next_key(&self.key).map(str::to_string)
    }

    /// Key of the previous node in the capture sequence.
    #[must_use]
    pub fn find_prev_key_in_sequence(&self) -> Option<String> {
        let sequence = self.sequence.as_ref()?.upgrade()?;
        sequence.find_prev_key(&self.key).map(str::to_string)
    }

    pub(crate) fn publish_load_status(&self, status: LoadStatus) {
        self.load_status.send_replace(status);
    }

    pub(crate) fn set_cache_state(&mut self, state: CacheState) {
        tracing::trace!(key = %self.key, %state, "cache state");
        self.cache_state = state;
    }

    pub(crate) fn assign_assets(&mut self, image: Option<Bitmap>, mesh: Mesh, status: LoadStatus) {
        self.image = image;
        self.mesh = Some(mesh);
        self.publish_load_status(status);
        self.cached = true;
    }
}
