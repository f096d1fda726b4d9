use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use path_router::config::parse_config;
use path_router::observability::logging::init_logging;
use path_router::routing::{CallbackRegistry, Params, Router};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Resolve paths and generate URIs against a route table", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request path to a route and its parameters
    Resolve { path: String },
    /// Generate the URI for a named route
    Url {
        route: String,
        /// Parameters as key=value
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// List preroutes and routes in matching order
    Routes,
}

fn parse_param(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {arg:?}"))
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // The log level lives in the table itself, so parse before the
    // subscriber exists and report the load afterwards.
    let config = parse_config(&fs::read_to_string(&cli.config)?)?;
    init_logging(&config.observability)?;
    tracing::info!(
        path = ?cli.config,
        routes = config.routes.len(),
        preroutes = config.preroutes.len(),
        "Configuration loaded"
    );

    // Host callbacks do not exist here; bind every named callback to a log line.
    let mut callbacks = CallbackRegistry::new();
    for name in config.preroutes.iter().filter_map(|p| p.callback.clone()) {
        let label = name.clone();
        callbacks.register(name, move |params: &Params| {
            tracing::info!(callback = %label, ?params, "Preroute callback");
        });
    }
    let router = Router::from_config(&config, &callbacks)?;

    match cli.command {
        Commands::Resolve { path } => match router.try_resolve(&path) {
            Ok(found) => {
                let output = json!({
                    "route": found.route.name(),
                    "params": found.params,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(reason) => {
                eprintln!("No route for {:?}: {}", path, reason);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Url { route, params } => {
            let params: Params = params.into_iter().collect();
            println!("{}", router.url(&route, &params)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Routes => {
            println!("{}", serde_json::to_string_pretty(&describe(&router))?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn describe(router: &Router) -> Value {
    let preroutes: Vec<Value> = router
        .preroutes()
        .iter()
        .map(|p| {
            json!({
                "name": p.name(),
                "pattern": p.pattern().source(),
                "expression": p.pattern().expression(),
                "required": p.pattern().required_names(),
                "optional": p.pattern().optional_names(),
                "defaults": p.defaults(),
            })
        })
        .collect();

    let routes: Vec<Value> = router
        .routes()
        .iter()
        .map(|r| {
            json!({
                "name": r.name(),
                "pattern": r.pattern().source(),
                "expression": r.pattern().expression(),
                "required": r.pattern().required_names(),
                "optional": r.pattern().optional_names(),
                "defaults": r.defaults(),
                "external": r.is_external(),
            })
        })
        .collect();

    json!({ "preroutes": preroutes, "routes": routes })
}
