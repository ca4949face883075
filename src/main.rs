use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use clap::Parser;
use marginalia::config::{Cli, Config, default_config_path};
use marginalia::handler::{AppState, router};
use marginalia::pdf::PdfStore;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt().json().init();
    tracing::info!("marginalia.svc starting");

    // A config file named on the CLI must load; the default location is
    // optional and its absence falls back to defaults.
    let mut cfg = match &args.config_path {
        Some(path) => Config::new(path).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = %path, "failed to load config file");
            std::process::exit(1);
        }),
        None => {
            let path = default_config_path();
            Config::new(path.to_string_lossy().as_ref()).unwrap_or_default()
        }
    };
    cfg.apply_cli(&args);

    let root = PathBuf::from(cfg.app.get_root());
    if !root.is_dir() {
        tracing::error!(root = %root.display(), "document root is not a directory");
        std::process::exit(1);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers(Any);

    let state = AppState {
        store: Arc::new(PdfStore::new()),
        root,
    };
    let app = router().layer(cors).with_state(state);

    let address = cfg.app.get_addr().to_string();
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("marginalia.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server exited with error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, shutting down");
        }
    }

    tracing::info!("marginalia.svc going off");
}
