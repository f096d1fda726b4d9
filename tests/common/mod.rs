//! Shared fixtures for integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use path_router::routing::{Params, RegexOverrides, Router};

/// Build a parameter map from pairs.
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Records callback invocations in order.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// A typical application table: a locale preroute, a blog route with a
/// numeric id, and the catch-all controller route.
#[allow(dead_code)]
pub fn app_router(log: &CallLog) -> Router {
    let mut router = Router::new();

    let mut lang = RegexOverrides::new();
    lang.insert("lang".into(), "en|fr|de".into());
    let sink = log.clone();
    router
        .register_preroute(
            "lang",
            "(<lang>)",
            &lang,
            move |p: &Params| sink.push(format!("locale={}", p["lang"])),
            params(&[("lang", "en")]),
        )
        .unwrap();

    let mut blog = RegexOverrides::new();
    blog.insert("id".into(), "[0-9]+".into());
    router
        .add_route_with_regex(
            "blog",
            "blog(/<action>(/<id>))",
            &blog,
            params(&[("controller", "blog_post"), ("action", "index")]),
        )
        .unwrap();

    router
        .add_route(
            "default",
            "(<controller>(/<action>(/<id>)))",
            params(&[("controller", "welcome"), ("action", "index")]),
        )
        .unwrap();

    router
}

/// A unique scratch file path for this test process.
#[allow(dead_code)]
pub fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("path-router-{}-{}", std::process::id(), name))
}
