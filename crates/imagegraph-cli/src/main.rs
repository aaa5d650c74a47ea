//! Cache the assets of one image graph node and report progress.
//!
//! Usage: `imagegraph <KEY> --image-endpoint <URL> --mesh-endpoint <URL>`
//!
//! Pass `--bypass` to run without network access, or `--settings` to load
//! a JSON settings file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use imagegraph::{
    ApiNavImIm, CacheState, Endpoints, Error, FetchMode, GraphNode, LatLon, LoadStatus,
    MeshFailurePolicy, NodeAssetCache, Result, Settings,
};
use tokio::sync::watch;

#[derive(Parser)]
#[command(about = "Cache the image and mesh of an image graph node")]
struct CliArgs {
    /// Node key.
    key: String,

    /// JSON settings file. Flags below override its values.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Complete every retrieval immediately without network access.
    #[arg(long)]
    bypass: bool,

    /// Image URL template with `{key}` and `{size}` placeholders.
    #[arg(long, requires = "mesh_endpoint")]
    image_endpoint: Option<String>,

    /// Mesh URL template with a `{key}` placeholder.
    #[arg(long, requires = "image_endpoint")]
    mesh_endpoint: Option<String>,

    /// Requested image size in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Reconstruction version of the node; zero means no mesh exists.
    #[arg(long, default_value_t = 1)]
    merge_version: i64,

    /// Fail the node when its mesh cannot be retrieved.
    #[arg(long)]
    fatal_mesh: bool,
}

impl CliArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
                    detail: format!("failed to read {}: {e}", path.display()),
                })?;
                serde_json::from_str(&text).map_err(|e| Error::Config {
                    detail: format!("invalid settings in {}: {e}", path.display()),
                })?
            }
            None => Settings::default(),
        };

        if self.bypass {
            settings.mode = FetchMode::Bypass;
        }
        if let (Some(image), Some(mesh)) = (&self.image_endpoint, &self.mesh_endpoint) {
            settings.endpoints = Some(Endpoints::new(image.as_str(), mesh.as_str()));
        }
        if let Some(size) = self.size {
            settings.base_image_size = size;
        }
        if self.fatal_mesh {
            settings.mesh_failure = MeshFailurePolicy::Fatal;
        }
        Ok(settings)
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let settings = args.settings()?;
    tracing::debug!(?settings, "loaded settings");
    let cache = NodeAssetCache::from_settings(&settings)?;

    let mut node = GraphNode::new(args.key, LatLon::default(), 0.0).with_metadata(ApiNavImIm {
        merge_version: Some(args.merge_version),
        ..ApiNavImIm::default()
    });

    let reporter = tokio::spawn(report_progress(node.subscribe_load_status()));

    let result = node.cache_assets(&cache).await.map(|node| Summary::of(node));

    // Dropping the node closes the status channel; the reporter drains the
    // last update and exits.
    drop(node);
    if let Err(e) = reporter.await {
        tracing::warn!(error = %e, "progress reporter stopped");
    }

    let summary = result?;
    tracing::info!(
        key = %summary.key,
        state = %summary.state,
        width = summary.width,
        height = summary.height,
        vertices = summary.vertices,
        faces = summary.faces,
        "node cached"
    );
    Ok(())
}

/// Log every load status update until the node is dropped.
///
/// Returns the last status seen.
async fn report_progress(mut progress: watch::Receiver<LoadStatus>) -> Option<LoadStatus> {
    let mut last = None;
    while progress.changed().await.is_ok() {
        let status = *progress.borrow_and_update();
        match status.fraction() {
            Some(fraction) => tracing::info!(
                loaded = status.loaded,
                total = status.total,
                "{:.0}%",
                fraction * 100.0
            ),
            None => tracing::info!(loaded = status.loaded, "size unknown"),
        }
        last = Some(status);
    }
    last
}

/// What a finished caching cycle left on the node.
struct Summary {
    key: String,
    state: CacheState,
    width: u32,
    height: u32,
    vertices: usize,
    faces: usize,
}

impl Summary {
    fn of(node: &GraphNode) -> Self {
        let (width, height) = node.image().map_or((0, 0), |image| image.dimensions());
        let (vertices, faces) = node
            .mesh()
            .map_or((0, 0), |mesh| (mesh.vertices.len(), mesh.faces.len()));
        Self {
            key: node.key().to_string(),
            state: node.cache_state(),
            width,
            height,
            vertices,
            faces,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(CliArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged_node() -> GraphNode {
        GraphNode::new("a", LatLon::default(), 0.0).with_metadata(ApiNavImIm {
            merge_version: Some(1),
            ..ApiNavImIm::default()
        })
    }

    #[tokio::test]
    async fn test_reporter_sees_final_status() {
        let cache = NodeAssetCache::from_settings(&Settings::bypass()).unwrap();
        let mut node = merged_node();
        let reporter = tokio::spawn(report_progress(node.subscribe_load_status()));

        let summary = node.cache_assets(&cache).await.map(|node| Summary::of(node)).unwrap();
        drop(node);

        assert_eq!(reporter.await.unwrap(), Some(LoadStatus::new(2, 2)));
        assert_eq!(summary.state, CacheState::Done);
        assert_eq!(summary.vertices, 1);
    }

    #[test]
    fn test_flags_override_settings() {
        let args = CliArgs::parse_from([
            "imagegraph",
            "a",
            "--image-endpoint",
            "http://img/{key}/{size}",
            "--mesh-endpoint",
            "http://mesh/{key}",
            "--size",
            "320",
            "--fatal-mesh",
        ]);
        let settings = args.settings().unwrap();

        assert_eq!(settings.mode, FetchMode::Remote);
        assert_eq!(settings.base_image_size, 320);
        assert_eq!(settings.mesh_failure, MeshFailurePolicy::Fatal);
        assert_eq!(
            settings.endpoints,
            Some(Endpoints::new("http://img/{key}/{size}", "http://mesh/{key}"))
        );
    }
}
