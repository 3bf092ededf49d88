//! Concord server binary.
//!
//! Starts an axum HTTP server with structured logging and graceful shutdown
//! on SIGTERM/SIGINT. Two maintenance subcommands are also available:
//!
//! - `concord-server generate-node <identifier> [display name]` prints a
//!   `[[nodes]]` block with a fresh signing keypair.
//! - `concord-server issue-token <node> <actor> [target]` mints an actor token
//!   for a configured node.

use concord_identity::NodeIdentity;
use concord_server::{app, config, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path(arg: Option<String>) -> (Option<String>, &'static str) {
    if let Some(path) = arg.filter(|value| !value.trim().is_empty()) {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CONCORD_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn generate_node(identifier: Option<String>, display_name: Option<String>) {
    let Some(identifier) = identifier.filter(|value| !value.trim().is_empty()) else {
        eprintln!("usage: concord-server generate-node <identifier> [display name]");
        std::process::exit(2);
    };
    let display_name = display_name.unwrap_or_else(|| identifier.clone());

    let node = match NodeIdentity::provision(identifier, display_name) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("cannot generate node: {e}");
            std::process::exit(1);
        }
    };
    print!("{}", config::node_toml(&node));
}

fn issue_token(node: Option<String>, actor: Option<String>, target: Option<String>) {
    let (Some(node), Some(actor)) = (node, actor) else {
        eprintln!("usage: concord-server issue-token <node> <actor> [target]");
        std::process::exit(2);
    };

    let (path, _) = resolve_config_path(None);
    let state = match config::load_config(path.as_deref().or(Some("config.toml")))
        .and_then(|config| AppState::from_config(&config))
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("cannot issue token: {e}");
            std::process::exit(1);
        }
    };

    let token = match state.mint_token(&node, &actor, target.as_deref()) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("cannot issue token: {e}");
            std::process::exit(1);
        }
    };
    println!("{token}");
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let first = args.next();
    match first.as_deref() {
        Some("generate-node") => return generate_node(args.next(), args.next()),
        Some("issue-token") => return issue_token(args.next(), args.next(), args.next()),
        _ => {}
    }

    let (resolved_config_path, config_source) = resolve_config_path(first);
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration, the server cannot start without valid config");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let state = AppState::from_config(&config)
        .expect("invalid configuration, check [server], [federation] and [[nodes]]");
    if state.registry.is_empty() {
        tracing::warn!("no nodes configured, every local token will be rejected");
    }
    tracing::info!(
        domain = %state.domain,
        nodes = state.registry.len(),
        cache_ttl_secs = ?config.federation.cache_ttl_secs,
        "federation identity loaded"
    );

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting concord server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address, is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("concord server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
