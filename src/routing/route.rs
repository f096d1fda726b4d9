//! A single named route.
//!
//! # Responsibilities
//! - Match a path against the compiled pattern
//! - Fill unmatched or empty parameters from defaults
//! - Canonicalize `controller` / `directory` handler names
//! - Run filters in registration order
//! - Generate the shortest URI for a parameter set
//!
//! # Design Decisions
//! - Empty captures are treated exactly like absent ones when defaults apply
//! - Filters are shared trait objects so routes stay cheap to clone
//! - A route with a `host` default is external and generates absolute URLs

use std::fmt;
use std::sync::Arc;

use crate::routing::Params;
use crate::routing::error::{MatchError, RouteError, RouteResult};
use crate::routing::filter::{Filter, FilterOutcome, RequestContext};
use crate::routing::pattern::{MissingParameter, RegexOverrides, RoutePattern};

/// Scheme prepended to external hosts that do not carry one.
pub const DEFAULT_PROTOCOL: &str = "http://";

/// Parameters whose values name handlers and are canonicalized on match.
const HANDLER_KEYS: [&str; 2] = ["controller", "directory"];

/// A compiled route with its defaults and filters.
#[derive(Clone)]
pub struct Route {
    name: String,
    pattern: RoutePattern,
    defaults: Params,
    filters: Vec<Arc<dyn Filter>>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern.source())
            .field("defaults", &self.defaults)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl Route {
    /// Compile a route with the default placeholder expression.
    pub fn new(name: impl Into<String>, spec: &str) -> RouteResult<Self> {
        Self::with_regex(name, spec, &RegexOverrides::new())
    }

    /// Compile a route with per-placeholder expression overrides.
    pub fn with_regex(name: impl Into<String>, spec: &str, overrides: &RegexOverrides) -> RouteResult<Self> {
        let name = name.into();
        let pattern = RoutePattern::compile(spec, overrides).map_err(|source| RouteError::Pattern {
            name: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            pattern,
            defaults: Params::new(),
            filters: Vec::new(),
        })
    }

    /// Replace the defaults.
    pub fn with_defaults(mut self, defaults: Params) -> Self {
        self.defaults = defaults;
        self
    }

    /// Append a closure filter.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Route, &Params, &RequestContext<'_>) -> FilterOutcome + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append an already shared filter.
    pub fn push_filter(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Get the route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the compiled pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Get the default parameter values.
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// External routes generate absolute URLs on the host named by their `host` default.
    pub fn is_external(&self) -> bool {
        self.defaults.contains_key("host")
    }

    /// Match a bare path with no preroute context.
    pub fn matches(&self, path: &str) -> Result<Params, MatchError> {
        let no_preroute = Params::new();
        self.matches_request(&RequestContext::new(path, &no_preroute))
    }

    /// Match the request's path, running defaults, canonicalization and filters.
    pub fn matches_request(&self, request: &RequestContext<'_>) -> Result<Params, MatchError> {
        let path = request.path.trim_matches('/');
        let mut params = self.pattern.captures(path).ok_or(MatchError::NoMatch)?;

        for (key, value) in &self.defaults {
            let slot = params.entry(key.clone()).or_default();
            if slot.is_empty() {
                slot.clone_from(value);
            }
        }

        for key in HANDLER_KEYS {
            if let Some(value) = params.get_mut(key) {
                if !value.is_empty() {
                    *value = canonicalize(value);
                }
            }
        }

        for (index, filter) in self.filters.iter().enumerate() {
            match filter.apply(self, &params, request) {
                FilterOutcome::Continue => {}
                FilterOutcome::Replace(replacement) => params = replacement,
                FilterOutcome::Abort => {
                    tracing::debug!(route = %self.name, filter = index, "Filter aborted match");
                    return Err(MatchError::FilterAborted {
                        route: self.name.clone(),
                        filter: index,
                    });
                }
            }
        }

        Ok(params)
    }

    /// Generate the shortest URI for `params`.
    pub fn build_uri(&self, params: &Params) -> RouteResult<String> {
        let raw = self
            .pattern
            .fill(params, &self.defaults)
            .map_err(|MissingParameter(param)| RouteError::MissingRequiredParameter {
                route: self.name.clone(),
                param,
            })?;
        let uri = normalize_slashes(&raw);

        match self.defaults.get("host") {
            Some(host) => {
                let host = if host.contains("://") {
                    host.clone()
                } else {
                    format!("{DEFAULT_PROTOCOL}{host}")
                };
                Ok(format!("{}/{}", host.trim_end_matches('/'), uri))
            }
            None => Ok(uri),
        }
    }
}

/// Upper-case the first letter of every `_`-separated word, then of every
/// `/`-separated word: `admin/my_blog` becomes `Admin/My_Blog`.
pub fn canonicalize(name: &str) -> String {
    capitalize_words(&capitalize_words(name, "_"), "/")
}

fn capitalize_words(value: &str, separator: &str) -> String {
    value
        .split(separator)
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(separator)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Collapse runs of `/` and drop trailing separators.
pub(crate) fn normalize_slashes(uri: &str) -> String {
    let mut out = String::with_capacity(uri.len());
    for c in uri.trim_end_matches('/').chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
