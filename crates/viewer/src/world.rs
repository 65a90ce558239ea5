//! Country boundaries: ordered sources, TopoJSON decoding, and a memoized
//! cache shared by every caller holding the same [`WorldCache`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use formats::{FeatureCollection, Topology};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

pub const WORLD_OBJECT: &str = "countries";
pub const WORLD_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";
pub const WORLD_BUNDLE_PATH: &str = "assets/countries-110m.json";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub struct WorldLoadError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for WorldLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for WorldLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl WorldLoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Somewhere the raw TopoJSON bytes can come from.
pub trait WorldSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, WorldLoadError>>;
}

/// TopoJSON file shipped alongside the binary.
pub struct BundledSource {
    path: PathBuf,
    name: String,
}

impl BundledSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("bundle:{}", path.display()),
            path,
        }
    }
}

impl WorldSource for BundledSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, WorldLoadError>> {
        Box::pin(async move {
            tokio::fs::read(&self.path)
                .await
                .map_err(|e| {
                    WorldLoadError::with_source(format!("failed to read {}", self.path.display()), e)
                })
        })
    }
}

pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

impl WorldSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, WorldLoadError>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| WorldLoadError::with_source("HTTP request failed", e))?;
            if !resp.status().is_success() {
                return Err(WorldLoadError::new(format!("HTTP error: {}", resp.status())));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| WorldLoadError::with_source("failed to read response", e))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Decode the `countries` object of a world-atlas topology.
pub fn decode_world(bytes: &[u8]) -> Result<FeatureCollection, WorldLoadError> {
    let topology = Topology::from_json_slice(bytes)
        .map_err(|e| WorldLoadError::with_source("invalid topology", e))?;
    topology
        .feature(WORLD_OBJECT)
        .map_err(|e| WorldLoadError::with_source("cannot convert countries", e))
}

/// Tries each source in order and keeps the first success for the lifetime
/// of the cache. Concurrent first callers share one load. Failures are not
/// cached, so a later call tries again.
pub struct WorldCache {
    sources: Vec<Arc<dyn WorldSource>>,
    cell: OnceCell<Arc<FeatureCollection>>,
}

impl WorldCache {
    pub fn new(sources: Vec<Arc<dyn WorldSource>>) -> Self {
        Self {
            sources,
            cell: OnceCell::new(),
        }
    }

    /// Bundled file first, CDN second.
    pub fn standard(
        bundle_path: impl AsRef<Path>,
        cdn_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        let bundled: Arc<dyn WorldSource> = Arc::new(BundledSource::new(bundle_path));
        let cdn: Arc<dyn WorldSource> = Arc::new(HttpSource::new(cdn_url, client));
        Self::new(vec![bundled, cdn])
    }

    /// Already-loaded data, without triggering a load.
    pub fn get(&self) -> Option<Arc<FeatureCollection>> {
        self.cell.get().cloned()
    }

    pub async fn load(&self) -> Result<Arc<FeatureCollection>, WorldLoadError> {
        self.cell.get_or_try_init(|| self.load_uncached()).await.cloned()
    }

    /// Like [`WorldCache::load`], but degrades to an empty collection.
    pub async fn load_or_empty(&self) -> Arc<FeatureCollection> {
        match self.load().await {
            Ok(world) => world,
            Err(e) => {
                error!(error = %e, "no world boundaries available; drawing without land");
                Arc::new(FeatureCollection::default())
            }
        }
    }

    async fn load_uncached(&self) -> Result<Arc<FeatureCollection>, WorldLoadError> {
        let mut last_error = None;
        for source in &self.sources {
            match source.fetch().await.and_then(|bytes| decode_world(&bytes)) {
                Ok(world) => {
                    info!(source = source.name(), features = world.len(), "world boundaries loaded");
                    return Ok(Arc::new(world));
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "world source failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| WorldLoadError::new("no world sources configured")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::{BoxFuture, BundledSource, WorldCache, WorldLoadError, WorldSource};

    const FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../formats/tests/fixtures/two-countries.topo.json"
    );

    struct CountingSource {
        body: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn ok() -> Arc<Self> {
            let body = std::fs::read(FIXTURE).expect("fixture");
            Arc::new(Self {
                body: Some(body),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                body: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn cache(sources: &[&Arc<CountingSource>]) -> WorldCache {
        WorldCache::new(
            sources
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn WorldSource>)
                .collect(),
        )
    }

    impl WorldSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self) -> BoxFuture<'_, Result<Vec<u8>, WorldLoadError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.body.clone().ok_or_else(|| WorldLoadError::new("offline"))
            })
        }
    }

    #[tokio::test]
    async fn second_load_returns_the_same_arc() {
        let source = CountingSource::ok();
        let cache = cache(&[&source]);
        let first = cache.load().await.expect("load");
        let second = cache.load().await.expect("load");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_load() {
        let source = CountingSource::ok();
        let cache = cache(&[&source]);
        let (a, b) = tokio::join!(cache.load(), cache.load());
        assert!(Arc::ptr_eq(&a.expect("a"), &b.expect("b")));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn falls_back_when_primary_fails() {
        let primary = CountingSource::failing();
        let secondary = CountingSource::ok();
        let cache = cache(&[&primary, &secondary]);
        let world = cache.load().await.expect("fallback");
        assert_eq!(world.len(), 2);
        assert_eq!((primary.calls(), secondary.calls()), (1, 1));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = CountingSource::failing();
        let cache = cache(&[&source]);
        assert!(cache.load().await.is_err());
        assert!(cache.load_or_empty().await.is_empty());
        assert!(cache.get().is_none());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn bundled_file_source() {
        let bundled: Arc<dyn WorldSource> = Arc::new(BundledSource::new(FIXTURE));
        let cache = WorldCache::new(vec![bundled]);
        let world = cache.load().await.expect("bundle");
        assert_eq!(world.features[1].id.as_deref(), Some("002"));

        let absent: Arc<dyn WorldSource> = Arc::new(BundledSource::new("/nonexistent/world.json"));
        let missing = WorldCache::new(vec![absent]);
        let err = missing.load().await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read /nonexistent/world.json"));
    }
}
