//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path ("/fr/blog/view/3/")
//!     → router.rs (trim separators)
//!     → preroute.rs (strip "fr", set lang, run locale callback)
//!     → route.rs, for each route in registration order:
//!         pattern.rs (anchored match, captures)
//!         defaults, controller canonicalization
//!         filter.rs (continue / replace / abort)
//!     → Return: MatchResult { params, route } or no match
//!
//! Route Compilation (at startup):
//!     spec string "<controller>(/<action>(/<id>))"
//!     → token tree → anchored regex + required/optional names
//!     → Freeze inside Router (optionally behind SharedRouter)
//!
//! URI Generation:
//!     Router::url(name, params)
//!     → preroute prefixes + Route::build_uri (shortest form)
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at registration, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)
//! - Request-time failures never panic or propagate as hard errors

pub mod error;
pub mod filter;
pub mod pattern;
pub mod preroute;
pub mod route;
pub mod router;
pub mod shared;

use std::collections::BTreeMap;

/// Parameter name → value.
pub type Params = BTreeMap<String, String>;

pub use error::{MatchError, PatternError, RouteError, RouteResult};
pub use filter::{Filter, FilterOutcome, RequestContext};
pub use pattern::{RegexOverrides, RoutePattern};
pub use preroute::{CallbackRegistry, Preroute, PrerouteCallback, PrerouteOutcome, PrerouteRegistry};
pub use route::{Route, canonicalize};
pub use router::{MatchResult, Router};
pub use shared::SharedRouter;
