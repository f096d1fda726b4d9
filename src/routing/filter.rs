//! Route filters.
//!
//! A filter runs after a route's pattern matched and defaults were applied.
//! It sees the route, the parameters so far and the request being routed,
//! and decides whether the match stands.

use crate::routing::Params;
use crate::routing::route::Route;

/// What a filter decided about a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Keep the parameters as they are.
    Continue,
    /// Replace the parameters wholesale.
    Replace(Params),
    /// Reject the match; no further filters run.
    Abort,
}

/// The request a route is being matched against.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Path exactly as the caller supplied it.
    pub original_path: &'a str,
    /// Path handed to the route, after preroute stripping.
    pub path: &'a str,
    /// Parameters contributed by preroutes.
    pub preroute_params: &'a Params,
}

impl<'a> RequestContext<'a> {
    /// Context for a bare path with no preroute stage.
    pub fn new(path: &'a str, preroute_params: &'a Params) -> Self {
        Self {
            original_path: path,
            path,
            preroute_params,
        }
    }
}

/// A callback that can veto or rewrite a route match.
pub trait Filter: Send + Sync {
    fn apply(&self, route: &Route, params: &Params, request: &RequestContext<'_>) -> FilterOutcome;
}

impl<F> Filter for F
where
    F: Fn(&Route, &Params, &RequestContext<'_>) -> FilterOutcome + Send + Sync,
{
    fn apply(&self, route: &Route, params: &Params, request: &RequestContext<'_>) -> FilterOutcome {
        self(route, params, request)
    }
}
