//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! route table file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → Router::from_config (compile patterns, bind callbacks)
//!
//! On reload:
//!     SharedRouter::reload
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → Router rebuilt, atomic swap of Arc<Router>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, load_config, parse_config};
pub use schema::ObservabilityConfig;
pub use schema::PrerouteConfig;
pub use schema::RouteConfig;
pub use schema::RouterConfig;
