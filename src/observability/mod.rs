//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / config produce:
//!     → tracing events (registration, match outcomes, reloads)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, filtered by level)
//! ```
//!
//! # Design Decisions
//! - Structured fields (route, path, preroute) on every event
//! - Match attempts log at debug/trace, so hot paths stay quiet at info

pub mod logging;
