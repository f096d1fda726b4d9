//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Names present and unique per table
//! - Every pattern compiles, overrides included
//! - Overrides only target placeholders the pattern declares
//! - Log directive parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RouterConfig;
use crate::routing::error::PatternError;
use crate::routing::pattern::{Anchor, RegexOverrides, RoutePattern};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} #{index} has an empty name")]
    EmptyName { kind: &'static str, index: usize },

    #[error("duplicate {kind} name {name:?}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} {name:?} has an invalid pattern: {source}")]
    InvalidPattern {
        kind: &'static str,
        name: String,
        source: PatternError,
    },

    #[error("{kind} {name:?} overrides unknown placeholder {placeholder:?}")]
    UnknownOverride {
        kind: &'static str,
        name: String,
        placeholder: String,
    },

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}

struct Entry<'a> {
    name: &'a str,
    pattern: &'a str,
    regex: &'a RegexOverrides,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let preroutes = config.preroutes.iter().map(|p| Entry {
        name: &p.name,
        pattern: &p.pattern,
        regex: &p.regex,
    });
    check_entries("preroute", preroutes, Anchor::Prefix, &mut errors);

    let routes = config.routes.iter().map(|r| Entry {
        name: &r.name,
        pattern: &r.pattern,
        regex: &r.regex,
    });
    check_entries("route", routes, Anchor::Full, &mut errors);

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_entries<'a>(
    kind: &'static str,
    entries: impl Iterator<Item = Entry<'a>>,
    anchor: Anchor,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();

    for (index, entry) in entries.enumerate() {
        if entry.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { kind, index });
        } else if !seen.insert(entry.name) {
            errors.push(ValidationError::DuplicateName {
                kind,
                name: entry.name.to_string(),
            });
        }

        match RoutePattern::compile_anchored(entry.pattern, entry.regex, anchor) {
            Ok(pattern) => {
                for placeholder in entry.regex.keys() {
                    if !pattern.has_placeholder(placeholder) {
                        errors.push(ValidationError::UnknownOverride {
                            kind,
                            name: entry.name.to_string(),
                            placeholder: placeholder.clone(),
                        });
                    }
                }
            }
            Err(source) => errors.push(ValidationError::InvalidPattern {
                kind,
                name: entry.name.to_string(),
                source,
            }),
        }
    }
}
