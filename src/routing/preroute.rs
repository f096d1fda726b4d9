//! Preroute stage.
//!
//! # Data Flow
//! ```text
//! "lang/en/region/us/home"
//!     → preroute "lang"   (lang/<lang>)     strips "lang/en",   callback({lang})
//!     → preroute "region" (region/<region>) strips "region/us", callback({lang, region})
//!     → remaining "home" handed to route matching
//! ```
//!
//! # Design Decisions
//! - Every preroute is tried in registration order, each against what the
//!   previous ones left over
//! - After every preroute has run, the last strip must have ended on a
//!   segment boundary, otherwise the request is not routed
//! - Preroutes that do not match still contribute their defaults for keys no
//!   earlier preroute set; their callbacks do not run

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::routing::Params;
use crate::routing::error::{MatchError, RouteError, RouteResult};
use crate::routing::pattern::{MissingParameter, RegexOverrides, RoutePattern};

/// Side effect run when a preroute matches, e.g. switching the active locale.
pub type PrerouteCallback = Arc<dyn Fn(&Params) + Send + Sync>;

/// Named preroute callbacks supplied by the host application.
///
/// Configuration files refer to callbacks by name; the names are bound here
/// before the router is built.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, PrerouteCallback>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("CallbackRegistry").field("callbacks", &names).finish()
    }
}

impl CallbackRegistry {
    /// Create an empty callback registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a callback, replacing any earlier binding.
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&Params) + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Arc::new(callback));
        self
    }

    /// Look up a callback by name.
    pub fn get(&self, name: &str) -> Option<PrerouteCallback> {
        self.callbacks.get(name).cloned()
    }

    /// Whether a callback is bound to `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Callback for preroutes that only strip and extract.
    pub fn noop() -> PrerouteCallback {
        Arc::new(|_: &Params| {})
    }
}

/// A named prefix rule.
#[derive(Clone)]
pub struct Preroute {
    name: String,
    pattern: RoutePattern,
    defaults: Params,
    callback: PrerouteCallback,
}

impl fmt::Debug for Preroute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preroute")
            .field("name", &self.name)
            .field("pattern", &self.pattern.source())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Preroute {
    /// Get the preroute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the compiled prefix pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Get the defaults applied when the prefix is absent or a capture is empty.
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }
}

/// Result of running the preroute stage over a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerouteOutcome {
    /// What is left for route matching, without leading separators.
    pub remaining: String,
    /// Accumulated parameters from every preroute.
    pub params: Params,
    /// Names of the preroutes that matched, in order.
    pub applied: Vec<String>,
}

impl PrerouteOutcome {
    /// Whether any preroute matched.
    pub fn stripped(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Ordered collection of preroutes.
#[derive(Debug, Clone, Default)]
pub struct PrerouteRegistry {
    entries: Vec<Preroute>,
}

impl PrerouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register a preroute. Re-using a name replaces that entry in place.
    pub fn register<F>(
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
        self.register_shared(name, spec, overrides, Arc::new(callback), defaults)
    }

    /// Like [`register`](Self::register) with an already shared callback.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        spec: &str,
        overrides: &RegexOverrides,
        callback: PrerouteCallback,
        defaults: Params,
    ) -> RouteResult<()> {
        let name = name.into();
        let pattern = RoutePattern::compile_prefix(spec, overrides).map_err(|source| RouteError::Pattern {
            name: name.clone(),
            source,
        })?;

        let preroute = Preroute {
            name,
            pattern,
            defaults,
            callback,
        };

        match self.entries.iter_mut().find(|entry| entry.name == preroute.name) {
            Some(existing) => {
                tracing::info!(preroute = %preroute.name, pattern = %spec, "Replacing preroute");
                *existing = preroute;
            }
            None => {
                tracing::info!(preroute = %preroute.name, pattern = %spec, "Registered preroute");
                self.entries.push(preroute);
            }
        }
        Ok(())
    }

    /// Look up a preroute by name.
    pub fn get(&self, name: &str) -> Option<&Preroute> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Preroutes in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Preroute> {
        self.entries.iter()
    }

    /// Number of registered preroutes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no preroute is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every preroute against `path`, stripping what each one matches.
    pub fn apply(&self, path: &str) -> Result<PrerouteOutcome, MatchError> {
        let mut remaining = path.trim_matches('/');
        let mut params = Params::new();
        let mut applied = Vec::new();
        let mut misaligned_by: Option<&str> = None;

        for preroute in &self.entries {
            let Some((consumed, captures)) = preroute.pattern.match_prefix(remaining) else {
                for (key, value) in &preroute.defaults {
                    params.entry(key.clone()).or_insert_with(|| value.clone());
                }
                continue;
            };

            let mut local = captures;
            for (key, value) in &preroute.defaults {
                let slot = local.entry(key.clone()).or_default();
                if slot.is_empty() {
                    slot.clone_from(value);
                }
            }
            params.extend(local);

            (preroute.callback)(&params);
            applied.push(preroute.name.clone());
            tracing::debug!(preroute = %preroute.name, consumed, "Preroute matched");

            if consumed == 0 {
                continue;
            }

            let (stripped, rest) = remaining.split_at(consumed);
            let aligned = rest.is_empty() || rest.starts_with('/') || stripped.ends_with('/');
            misaligned_by = (!aligned).then_some(preroute.name.as_str());
            remaining = rest.trim_start_matches('/');
        }

        // Only the final strip decides; a later preroute may realign the path.
        if let Some(name) = misaligned_by {
            tracing::warn!(preroute = %name, remaining = %remaining, "Preroute stripped a partial segment");
            return Err(MatchError::MisalignedPrerouteStrip {
                preroute: name.to_string(),
                remaining: remaining.to_string(),
            });
        }

        Ok(PrerouteOutcome {
            remaining: remaining.to_string(),
            params,
            applied,
        })
    }

    /// Path prefix contributed by the preroutes for URI generation.
    ///
    /// Each preroute segment is filled with that preroute's defaults. A
    /// preroute whose required parameter is unavailable is skipped.
    pub fn uri_prefix(&self, params: &Params) -> String {
        let mut segments = Vec::new();
        for preroute in &self.entries {
            match preroute.pattern.fill(params, &preroute.defaults) {
                Ok(segment) => {
                    let segment = segment.trim_matches('/');
                    if !segment.is_empty() {
                        segments.push(segment.to_string());
                    }
                }
                Err(MissingParameter(param)) => {
                    tracing::trace!(preroute = %preroute.name, param = %param, "Preroute skipped for URI");
                }
            }
        }
        segments.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn noop(_: &Params) {}

    #[test]
    fn test_no_preroutes() {
        let registry = PrerouteRegistry::new();
        let outcome = registry.apply("/home/").unwrap();
        assert_eq!(outcome.remaining, "home");
        assert!(!outcome.stripped());
        assert!(outcome.params.is_empty());
    }

    #[test]
    fn test_chained_preroutes_fire_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PrerouteRegistry::new();

        let lang_log = log.clone();
        registry
            .register("lang", "lang/<lang>", &RegexOverrides::new(), move |p: &Params| {
                lang_log.lock().unwrap().push(format!("lang:{}", p.len()));
            }, Params::new())
            .unwrap();
        let region_log = log.clone();
        registry
            .register("region", "region/<region>", &RegexOverrides::new(), move |p: &Params| {
                region_log.lock().unwrap().push(format!("region:{}", p.len()));
            }, Params::new())
            .unwrap();

        let outcome = registry.apply("lang/en/region/us/home").unwrap();
        assert_eq!(outcome.remaining, "home");
        assert_eq!(outcome.params, params(&[("lang", "en"), ("region", "us")]));
        assert_eq!(outcome.applied, ["lang", "region"]);
        assert_eq!(*log.lock().unwrap(), ["lang:1", "region:2"]);
    }

    #[test]
    fn test_whole_path_consumed() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();

        let outcome = registry.apply("en").unwrap();
        assert_eq!(outcome.remaining, "");
        assert_eq!(outcome.params["lang"], "en");
    }

    #[test]
    fn test_misaligned_strip() {
        let mut overrides = RegexOverrides::new();
        overrides.insert("lang".into(), "[a-z]{2}".into());
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>", &overrides, noop, Params::new())
            .unwrap();

        assert_eq!(
            registry.apply("english/home").unwrap_err(),
            MatchError::MisalignedPrerouteStrip {
                preroute: "lang".into(),
                remaining: "glish/home".into(),
            }
        );
    }

    #[test]
    fn test_later_preroute_realigns_strip() {
        let called = Arc::new(Mutex::new(Vec::new()));
        let mut two_letters = RegexOverrides::new();
        two_letters.insert("a".into(), "[a-z]{2}".into());
        let mut rest_of_word = RegexOverrides::new();
        rest_of_word.insert("b".into(), "glish".into());

        let mut registry = PrerouteRegistry::new();
        registry
            .register("a", "<a>", &two_letters, noop, Params::new())
            .unwrap();
        let sink = called.clone();
        registry
            .register("b", "<b>", &rest_of_word, move |p: &Params| {
                sink.lock().unwrap().push(p["b"].clone());
            }, Params::new())
            .unwrap();

        let outcome = registry.apply("english/home").unwrap();
        assert_eq!(outcome.remaining, "home");
        assert_eq!(outcome.params, params(&[("a", "en"), ("b", "glish")]));
        assert_eq!(outcome.applied, ["a", "b"]);
        assert_eq!(*called.lock().unwrap(), ["glish"]);
    }

    #[test]
    fn test_misaligned_strip_runs_every_preroute_first() {
        let called = Arc::new(Mutex::new(false));
        let mut two_letters = RegexOverrides::new();
        two_letters.insert("lang".into(), "[a-z]{2}".into());

        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>", &two_letters, noop, Params::new())
            .unwrap();
        let flag = called.clone();
        registry
            .register("tenant", "t/<tenant>", &RegexOverrides::new(), move |_: &Params| {
                *flag.lock().unwrap() = true;
            }, Params::new())
            .unwrap();

        // "glish/..." is not a tenant prefix, so the partial strip stands.
        assert_eq!(
            registry.apply("english/home").unwrap_err(),
            MatchError::MisalignedPrerouteStrip {
                preroute: "lang".into(),
                remaining: "glish/home".into(),
            }
        );
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn test_prefix_ending_in_separator_is_aligned() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>/", &RegexOverrides::new(), noop, Params::new())
            .unwrap();

        let outcome = registry.apply("en/home").unwrap();
        assert_eq!(outcome.remaining, "home");
        assert_eq!(outcome.params["lang"], "en");
    }

    #[test]
    fn test_unmatched_preroute_contributes_defaults() {
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();
        let mut overrides = RegexOverrides::new();
        overrides.insert("lang".into(), "en|fr".into());

        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>", &overrides, move |_: &Params| {
                *flag.lock().unwrap() = true;
            }, params(&[("lang", "en")]))
            .unwrap();

        let outcome = registry.apply("blog/post").unwrap();
        assert_eq!(outcome.remaining, "blog/post");
        assert_eq!(outcome.params["lang"], "en");
        assert!(!outcome.stripped());
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn test_later_preroute_overwrites_keys() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("first", "a/<x>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();
        registry
            .register("second", "b/<x>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();

        let outcome = registry.apply("a/1/b/2/rest").unwrap();
        assert_eq!(outcome.params["x"], "2");
        assert_eq!(outcome.remaining, "rest");
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "lang/<lang>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();
        registry
            .register("tenant", "t/<tenant>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();
        registry
            .register("lang", "l/<lang>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();

        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.iter().map(Preroute::name).collect();
        assert_eq!(names, ["lang", "tenant"]);
        assert_eq!(registry.get("lang").unwrap().pattern().source(), "l/<lang>");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut registry = PrerouteRegistry::new();
        let err = registry
            .register("bad", "(<lang>", &RegexOverrides::new(), noop, Params::new())
            .unwrap_err();
        assert!(matches!(err, RouteError::Pattern { ref name, .. } if name == "bad"));
    }

    #[test]
    fn test_callback_registry() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();
        let mut callbacks = CallbackRegistry::new();
        callbacks.register("locale", move |p: &Params| {
            sink.lock().unwrap().push(p["lang"].clone());
        });

        assert!(callbacks.contains("locale"));
        assert!(callbacks.get("missing").is_none());

        let mut registry = PrerouteRegistry::new();
        registry
            .register_shared(
                "lang",
                "<lang>",
                &RegexOverrides::new(),
                callbacks.get("locale").unwrap(),
                Params::new(),
            )
            .unwrap();
        registry.apply("de/start").unwrap();
        assert_eq!(*hits.lock().unwrap(), ["de"]);
    }

    #[test]
    fn test_uri_prefix() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "<lang>", &RegexOverrides::new(), noop, params(&[("lang", "en")]))
            .unwrap();
        registry
            .register("tenant", "t/<tenant>", &RegexOverrides::new(), noop, Params::new())
            .unwrap();

        assert_eq!(registry.uri_prefix(&Params::new()), "en");
        assert_eq!(
            registry.uri_prefix(&params(&[("lang", "fr"), ("tenant", "acme")])),
            "fr/t/acme"
        );
    }

    #[test]
    fn test_uri_prefix_omits_default_optional_segment() {
        let mut registry = PrerouteRegistry::new();
        registry
            .register("lang", "(<lang>)", &RegexOverrides::new(), noop, params(&[("lang", "en")]))
            .unwrap();

        assert_eq!(registry.uri_prefix(&params(&[("lang", "en")])), "");
        assert_eq!(registry.uri_prefix(&params(&[("lang", "de")])), "de");
    }
}
