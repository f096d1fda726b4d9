//! Routing error definitions.
//!
//! Registration-time failures (`PatternError`, `RouteError`) are programming
//! errors in the route table and are expected to abort startup. Request-time
//! failures (`MatchError`) are ordinary outcomes: the caller treats every
//! variant as "this path is not routed here".

use thiserror::Error;

/// Errors raised while compiling a route specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// An optional group was opened but never closed.
    #[error("unclosed optional group opened at byte {0}")]
    UnclosedGroup(usize),

    /// A `)` appeared without a matching `(`.
    #[error("unexpected ')' at byte {0}")]
    UnexpectedGroupClose(usize),

    /// A `<` was never followed by `>`.
    #[error("unterminated placeholder starting at byte {0}")]
    UnterminatedPlaceholder(usize),

    /// Placeholder names are restricted to `[A-Za-z0-9_]+`.
    #[error("invalid placeholder name {0:?}")]
    InvalidPlaceholderName(String),

    /// Optional groups nest deeper than the compiler accepts.
    #[error("optional groups nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// The assembled expression (usually a per-name override) is not a valid regex.
    #[error("invalid expression: {0}")]
    Regex(String),
}

/// Errors raised while registering routes or generating URIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The route or preroute specification failed to compile.
    #[error("route {name:?} has an invalid pattern: {source}")]
    Pattern {
        name: String,
        #[source]
        source: PatternError,
    },

    /// URI generation needed a placeholder that has neither a value nor a default.
    #[error("required route parameter not passed: {param} (route {route:?})")]
    MissingRequiredParameter { route: String, param: String },

    /// No route is registered under this name.
    #[error("route {0:?} is not registered")]
    UnknownRoute(String),

    /// A preroute refers to a callback that was never provided.
    #[error("invalid preroute callback {callback:?} for preroute {preroute:?}")]
    MalformedPrerouteCallback { preroute: String, callback: String },
}

/// Why a path was not routed. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The pattern did not match the path.
    #[error("no route matched")]
    NoMatch,

    /// A filter vetoed an otherwise successful match.
    #[error("filter #{filter} on route {route:?} aborted the match")]
    FilterAborted { route: String, filter: usize },

    /// A preroute consumed a prefix that does not end on a segment boundary.
    #[error("preroute {preroute:?} left a misaligned remainder {remaining:?}")]
    MisalignedPrerouteStrip { preroute: String, remaining: String },
}

/// Result type for registration and URI generation.
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::MissingRequiredParameter {
            route: "blog".into(),
            param: "id".into(),
        };
        assert!(err.to_string().contains("id"));
        assert!(err.to_string().contains("blog"));

        let err = MatchError::FilterAborted {
            route: "admin".into(),
            filter: 1,
        };
        assert_eq!(err.to_string(), "filter #1 on route \"admin\" aborted the match");
    }

    #[test]
    fn test_pattern_error_is_source() {
        use std::error::Error as _;

        let err = RouteError::Pattern {
            name: "broken".into(),
            source: PatternError::UnclosedGroup(3),
        };
        let source = err.source().expect("pattern error source");
        assert_eq!(source.to_string(), "unclosed optional group opened at byte 3");
    }
}
