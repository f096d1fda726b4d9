//! Path routing engine.
//!
//! Matches request paths against an ordered table of route patterns,
//! extracts and defaults their parameters, runs per-route filters, and
//! generates URIs back from parameters. A preroute stage strips leading
//! prefixes such as a locale before routes are tried.

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use routing::{MatchResult, Route, Router, SharedRouter};
