//! Resolved configuration per open document.
//!
//! The cache maps a document's path to its [`ResolvedConfig`]. Entries are
//! created on first observation and reused until [`ConfigResolutionCache::rebuild_all`]
//! discards the whole map. Untitled documents are never entered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ConfigResolver;
use crate::host::TextDocument;
use crate::properties::ResolvedConfig;
use crate::translate::DefaultSettings;

/// Source of per-document configuration and host defaults.
///
/// Transforms and option application only see this trait, so they can run
/// against a test double instead of a real resolver.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn settings_for(&self, path: &Path) -> Option<ResolvedConfig>;

    fn defaults(&self) -> DefaultSettings;
}

/// Outcome of [`ConfigResolutionCache::ensure_resolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The document has no path
    Untracked,
    /// An entry already existed
    Cached,
    Resolved,
    /// The resolver failed; no entry was stored
    Failed,
}

pub struct ConfigResolutionCache {
    resolver: Arc<dyn ConfigResolver>,
    documents: RwLock<HashMap<PathBuf, ResolvedConfig>>,
    defaults: ArcSwap<DefaultSettings>,
}

impl ConfigResolutionCache {
    pub fn new(resolver: Arc<dyn ConfigResolver>, defaults: DefaultSettings) -> Self {
        Self {
            resolver,
            documents: RwLock::new(HashMap::new()),
            defaults: ArcSwap::from_pointee(defaults),
        }
    }

    pub async fn lookup(&self, path: &Path) -> Option<ResolvedConfig> {
        self.documents.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }

    /// Resolve `document` unless it is untitled or already cached.
    ///
    /// Failures are logged and leave no entry, so later lookups see "no
    /// configuration" rather than an error.
    pub async fn ensure_resolved(&self, document: &dyn TextDocument) -> Resolution {
        let Some(path) = document.path() else {
            return Resolution::Untracked;
        };

        if self.documents.read().await.contains_key(path) {
            debug!(path = %path.display(), "configuration cache hit");
            return Resolution::Cached;
        }

        match self.resolver.resolve(path).await {
            Ok(config) => {
                let config = config.normalized();
                debug!(
                    path = %path.display(),
                    properties = config.len(),
                    "cached configuration"
                );
                self.documents
                    .write()
                    .await
                    .insert(path.to_path_buf(), config);
                Resolution::Resolved
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to resolve configuration");
                Resolution::Failed
            }
        }
    }

    /// Discard every entry, then resolve all `documents` concurrently.
    ///
    /// Returns once every resolution has settled, in the order given.
    pub async fn rebuild_all(&self, documents: &[Arc<dyn TextDocument>]) -> Vec<Resolution> {
        self.clear().await;

        let results = join_all(documents.iter().map(|d| self.ensure_resolved(d.as_ref()))).await;

        let failed = results
            .iter()
            .filter(|r| **r == Resolution::Failed)
            .count();
        info!(
            documents = documents.len(),
            failed, "rebuilt configuration cache"
        );
        results
    }

    pub fn defaults(&self) -> DefaultSettings {
        (**self.defaults.load()).clone()
    }

    /// Swap in a new set of defaults as a whole.
    pub fn replace_defaults(&self, defaults: DefaultSettings) {
        self.defaults.store(Arc::new(defaults));
    }
}

#[async_trait]
impl SettingsProvider for ConfigResolutionCache {
    async fn settings_for(&self, path: &Path) -> Option<ResolvedConfig> {
        self.lookup(path).await
    }

    fn defaults(&self) -> DefaultSettings {
        ConfigResolutionCache::defaults(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ResolveError;
    use crate::workspace::MemoryDocument;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Resolver serving fixed configurations, failing for unknown paths.
    #[derive(Default)]
    pub(crate) struct StaticResolver {
        configs: Mutex<HashMap<PathBuf, ResolvedConfig>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) delay: Option<Duration>,
    }

    impl StaticResolver {
        pub(crate) fn with(self, path: &str, pairs: &[(&str, &str)]) -> Self {
            self.set(path, pairs);
            self
        }

        pub(crate) fn set(&self, path: &str, pairs: &[(&str, &str)]) {
            self.configs
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), pairs.iter().copied().collect());
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfigResolver for StaticResolver {
        async fn resolve(&self, path: &Path) -> Result<ResolvedConfig, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let config = self.configs.lock().unwrap().get(path).cloned();
            config.ok_or_else(|| ResolveError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed"),
            })
        }
    }

    fn cache(resolver: StaticResolver) -> (Arc<StaticResolver>, ConfigResolutionCache) {
        let resolver = Arc::new(resolver);
        let cache = ConfigResolutionCache::new(resolver.clone(), DefaultSettings::default());
        (resolver, cache)
    }

    #[tokio::test]
    async fn test_ensure_resolved_stores_normalized_config() {
        let (_, cache) = cache(
            StaticResolver::default().with("/w/a.go", &[("indent_size", "tab"), ("tab_width", "8")]),
        );
        let doc = MemoryDocument::new("/w/a.go", "");

        assert_eq!(cache.ensure_resolved(&doc).await, Resolution::Resolved);

        let config = cache.lookup(Path::new("/w/a.go")).await.unwrap();
        assert_eq!(config.get("indent_size"), Some("8"));
    }

    #[tokio::test]
    async fn test_ensure_resolved_reuses_entry() {
        let (resolver, cache) =
            cache(StaticResolver::default().with("/w/a.txt", &[("indent_size", "2")]));
        let doc = MemoryDocument::new("/w/a.txt", "");

        cache.ensure_resolved(&doc).await;
        assert_eq!(cache.ensure_resolved(&doc).await, Resolution::Cached);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_untitled_documents_are_not_cached() {
        let (resolver, cache) = cache(StaticResolver::default());
        let doc = MemoryDocument::untitled("scratch");

        assert_eq!(cache.ensure_resolved(&doc).await, Resolution::Untracked);
        assert!(cache.is_empty().await);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_leaves_no_entry() {
        let (_, cache) = cache(StaticResolver::default());
        let doc = MemoryDocument::new("/w/broken.txt", "");

        assert_eq!(cache.ensure_resolved(&doc).await, Resolution::Failed);
        assert_eq!(cache.lookup(Path::new("/w/broken.txt")).await, None);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_document() {
        let resolver = StaticResolver {
            delay: Some(Duration::from_millis(5)),
            ..StaticResolver::default()
        }
        .with("/w/b.txt", &[("indent_size", "3")]);
        let (_, cache) = cache(resolver);

        let a: Arc<dyn TextDocument> = Arc::new(MemoryDocument::new("/w/a.txt", ""));
        let b: Arc<dyn TextDocument> = Arc::new(MemoryDocument::new("/w/b.txt", ""));

        let results = cache.rebuild_all(&[a, b]).await;

        assert_eq!(results, vec![Resolution::Failed, Resolution::Resolved]);
        assert_eq!(cache.lookup(Path::new("/w/a.txt")).await, None);
        assert_eq!(
            cache
                .lookup(Path::new("/w/b.txt"))
                .await
                .and_then(|c| c.indent_size()),
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_rebuild_all_discards_stale_entries() {
        let (resolver, cache) =
            cache(StaticResolver::default().with("/w/a.txt", &[("indent_size", "2")]));
        let doc: Arc<dyn TextDocument> = Arc::new(MemoryDocument::new("/w/a.txt", ""));
        let closed = MemoryDocument::new("/w/closed.txt", "");
        resolver.set("/w/closed.txt", &[]);

        cache.ensure_resolved(doc.as_ref()).await;
        cache.ensure_resolved(&closed).await;
        resolver.set("/w/a.txt", &[("indent_size", "8")]);

        cache.rebuild_all(&[doc]).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(
            cache
                .lookup(Path::new("/w/a.txt"))
                .await
                .and_then(|c| c.indent_size()),
            Some(8)
        );
    }

    #[test]
    fn test_replace_defaults_wholesale() {
        let (_, cache) = cache(StaticResolver::default());
        let replacement = DefaultSettings {
            tab_size: 8,
            insert_spaces: false.into(),
            trim_trailing_whitespace: true,
        };

        cache.replace_defaults(replacement.clone());
        assert_eq!(cache.defaults(), replacement);
    }
}
