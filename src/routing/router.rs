//! Route lookup and URI generation.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Run the preroute stage, then find the first matching route
//! - Merge preroute and route parameters
//! - Generate URIs for named routes, preroute prefixes included
//!
//! # Design Decisions
//! - Populated at startup, read-only afterwards (`Send + Sync`, no locks)
//! - First match wins; registration order is priority
//! - Every request-time failure is a plain no-match for the caller
//! - Re-registering a route name replaces the route in place

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::routing::Params;
use crate::routing::error::{MatchError, RouteError, RouteResult};
use crate::routing::filter::{Filter, FilterOutcome, RequestContext};
use crate::routing::pattern::RegexOverrides;
use crate::routing::preroute::{CallbackRegistry, PrerouteRegistry};
use crate::routing::route::{Route, normalize_slashes};

/// A resolved request: merged parameters and the route that produced them.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub params: Params,
    pub route: Arc<Route>,
}

/// Routes and preroutes for one application.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
    preroutes: PrerouteRegistry,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a router from a validated configuration.
    ///
    /// Preroute callbacks are looked up by name in `callbacks`; a name that
    /// is not there fails with [`RouteError::MalformedPrerouteCallback`].
    pub fn from_config(config: &RouterConfig, callbacks: &CallbackRegistry) -> RouteResult<Self> {
        let mut router = Self::new();

        for preroute in &config.preroutes {
            let callback = match &preroute.callback {
                Some(name) => callbacks.get(name).ok_or_else(|| RouteError::MalformedPrerouteCallback {
                    preroute: preroute.name.clone(),
                    callback: name.clone(),
                })?,
                None => CallbackRegistry::noop(),
            };
            router.preroutes.register_shared(
                &preroute.name,
                &preroute.pattern,
                &preroute.regex,
                callback,
                preroute.defaults.clone(),
            )?;
        }

        for route in &config.routes {
            router.add_route_with_regex(&route.name, &route.pattern, &route.regex, route.defaults.clone())?;
        }

        tracing::info!(
            routes = router.routes.len(),
            preroutes = router.preroutes.len(),
            "Router built from configuration"
        );
        Ok(router)
    }

    /// Register a route with the default placeholder expression.
    pub fn add_route(&mut self, name: impl Into<String>, spec: &str, defaults: Params) -> RouteResult<()> {
        self.add_route_with_regex(name, spec, &RegexOverrides::new(), defaults)
    }

    /// Register a route with per-placeholder expression overrides.
    pub fn add_route_with_regex(
        &mut self,
        name: impl Into<String>,
        spec: &str,
        overrides: &RegexOverrides,
        defaults: Params,
    ) -> RouteResult<()> {
        let route = Route::with_regex(name, spec, overrides)?.with_defaults(defaults);
        self.insert(route);
        Ok(())
    }

    /// Register an already built route.
    pub fn insert(&mut self, route: Route) {
        match self.routes.iter_mut().find(|existing| existing.name() == route.name()) {
            Some(existing) => {
                tracing::info!(route = %route.name(), pattern = %route.pattern().source(), "Replacing route");
                *existing = Arc::new(route);
            }
            None => {
                tracing::info!(route = %route.name(), pattern = %route.pattern().source(), "Registered route");
                self.routes.push(Arc::new(route));
            }
        }
    }

    /// Append a closure filter to a registered route.
    pub fn add_filter<F>(&mut self, route_name: &str, filter: F) -> RouteResult<()>
    where
        F: Fn(&Route, &Params, &RequestContext<'_>) -> FilterOutcome + Send + Sync + 'static,
    {
        self.add_shared_filter(route_name, Arc::new(filter))
    }

    /// Append a shared filter to a registered route.
    pub fn add_shared_filter(&mut self, route_name: &str, filter: Arc<dyn Filter>) -> RouteResult<()> {
        let route = self
            .routes
            .iter_mut()
            .find(|route| route.name() == route_name)
            .ok_or_else(|| RouteError::UnknownRoute(route_name.to_string()))?;
        Arc::make_mut(route).push_filter(filter);
        Ok(())
    }

    /// Register a preroute (see [`PrerouteRegistry::register`]).
    pub fn register_preroute<F>(
        &mut self,
        name: impl Into<String>,
        spec: &str,
        overrides: &RegexOverrides,
        callback: F,
        defaults: Params,
    ) -> RouteResult<()>
    where
        F: Fn(&Params) + Send + Sync + 'static,
    {
        self.preroutes.register(name, spec, overrides, callback, defaults)
    }

    /// Get the preroute stage.
    pub fn preroutes(&self) -> &PrerouteRegistry {
        &self.preroutes
    }

    /// Look a route up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.name() == name)
    }

    /// All routes in matching order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Resolve a path against every registered route.
    pub fn resolve(&self, path: &str) -> Option<MatchResult> {
        self.try_resolve_in(path, &self.routes).ok()
    }

    /// Resolve a path against an explicit route collection.
    pub fn resolve_in(&self, path: &str, routes: &[Arc<Route>]) -> Option<MatchResult> {
        self.try_resolve_in(path, routes).ok()
    }

    /// Like [`resolve`](Self::resolve), reporting why nothing matched.
    pub fn try_resolve(&self, path: &str) -> Result<MatchResult, MatchError> {
        self.try_resolve_in(path, &self.routes)
    }

    /// Like [`resolve_in`](Self::resolve_in), reporting why nothing matched.
    pub fn try_resolve_in(&self, path: &str, routes: &[Arc<Route>]) -> Result<MatchResult, MatchError> {
        let outcome = self.preroutes.apply(path.trim_matches('/'))?;
        let request = RequestContext {
            original_path: path,
            path: &outcome.remaining,
            preroute_params: &outcome.params,
        };

        for route in routes {
            match route.matches_request(&request) {
                Ok(params) => {
                    let mut merged = outcome.params.clone();
                    merged.extend(params);
                    tracing::debug!(route = %route.name(), path = %path, "Route matched");
                    return Ok(MatchResult {
                        params: merged,
                        route: Arc::clone(route),
                    });
                }
                Err(reason) => {
                    tracing::trace!(route = %route.name(), path = %path, reason = %reason, "Route skipped");
                }
            }
        }

        tracing::debug!(path = %path, "No route matched");
        Err(MatchError::NoMatch)
    }

    /// URI for a named route, prefixed with the preroute segments.
    ///
    /// External routes are returned as absolute URLs without preroute prefixes.
    pub fn url(&self, name: &str, params: &Params) -> RouteResult<String> {
        let route = self
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        let uri = route.build_uri(params)?;
        if route.is_external() {
            return Ok(uri);
        }

        let prefix = self.preroutes.uri_prefix(params);
        if prefix.is_empty() {
            Ok(uri)
        } else {
            Ok(normalize_slashes(&format!("{prefix}/{uri}")))
        }
    }
}
