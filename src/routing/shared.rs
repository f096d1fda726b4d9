//! Hot-swappable router handle.
//!
//! Readers load the current snapshot without locking; a reload builds a
//! complete new [`Router`] and swaps it in atomically. In-flight requests
//! keep the snapshot they started with.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{ConfigError, load_config};
use crate::routing::Params;
use crate::routing::error::RouteResult;
use crate::routing::preroute::CallbackRegistry;
use crate::routing::router::{MatchResult, Router};

/// A router that can be replaced while requests are being served.
pub struct SharedRouter {
    current: ArcSwap<Router>,
}

impl SharedRouter {
    /// Wrap a router for shared, swappable access.
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Swap in a new router.
    pub fn replace(&self, router: Router) {
        self.current.store(Arc::new(router));
    }

    /// Resolve a path against the current snapshot.
    pub fn resolve(&self, path: &str) -> Option<MatchResult> {
        self.current.load().resolve(path)
    }

    /// Generate a URI from the current snapshot.
    pub fn url(&self, name: &str, params: &Params) -> RouteResult<String> {
        self.current.load().url(name, params)
    }

    /// Rebuild from a configuration file.
    ///
    /// The snapshot is only replaced when the file loads, validates and
    /// builds; otherwise the current routes stay active.
    pub fn reload(&self, path: &Path, callbacks: &CallbackRegistry) -> Result<(), ConfigError> {
        let rebuilt = load_config(path)
            .and_then(|config| Router::from_config(&config, callbacks).map_err(ConfigError::Build));

        match rebuilt {
            Ok(router) => {
                tracing::info!(path = ?path, routes = router.routes().len(), "Route table reloaded");
                self.replace(router);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to reload route table: {}. Keeping current routes.", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SharedRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRouter")
            .field("routes", &self.current.load().routes().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_old_snapshot_alive() {
        let mut first = Router::new();
        first.add_route("old", "old", Params::new()).unwrap();
        let shared = SharedRouter::new(first);

        let snapshot = shared.load();
        let mut second = Router::new();
        second.add_route("new", "new", Params::new()).unwrap();
        shared.replace(second);

        assert!(snapshot.resolve("old").is_some());
        assert!(shared.resolve("old").is_none());
        assert_eq!(shared.resolve("new").unwrap().route.name(), "new");
    }

    #[test]
    fn test_failed_reload_keeps_routes() {
        let mut router = Router::new();
        router.add_route("home", "home", Params::new()).unwrap();
        let shared = SharedRouter::new(router);

        let missing = Path::new("/nonexistent/routes.toml");
        assert!(matches!(
            shared.reload(missing, &CallbackRegistry::new()),
            Err(ConfigError::Io(_))
        ));
        assert!(shared.resolve("home").is_some());
    }
}
