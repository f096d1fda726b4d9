//! Configuration schema definitions.
//!
//! This module defines the route table as it appears in a configuration
//! file. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::routing::Params;
use crate::routing::pattern::RegexOverrides;

/// Root configuration for a route table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Preroutes, applied in order before route matching.
    pub preroutes: Vec<PrerouteConfig>,

    /// Routes, in matching priority order.
    pub routes: Vec<RouteConfig>,
}

/// A single route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier, unique within the table.
    pub name: String,

    /// Route specification, e.g. `"<controller>(/<action>(/<id>))"`.
    pub pattern: String,

    /// Per-placeholder expression overrides.
    #[serde(default)]
    pub regex: RegexOverrides,

    /// Values for placeholders that are absent or empty.
    #[serde(default)]
    pub defaults: Params,
}

/// A single preroute.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrerouteConfig {
    /// Preroute identifier, unique within the table.
    pub name: String,

    /// Prefix specification, e.g. `"<lang>"`.
    pub pattern: String,

    /// Name of a callback registered by the host application.
    #[serde(default)]
    pub callback: Option<String>,

    /// Per-placeholder expression overrides.
    #[serde(default)]
    pub regex: RegexOverrides,

    /// Values applied when the prefix is absent or a capture is empty.
    #[serde(default)]
    pub defaults: Params,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive such as `path_router=debug`).
    pub log_level: String,

    /// Include the event target in log lines.
    pub with_target: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: false,
        }
    }
}
