use anyhow::{Context, Result};
use clap::Parser;
use folio::config::DEFAULT_CONFIG_FILE;
use folio::{
    CatalogEvent, CatalogStore, CatalogWatcher, Config, PageLoader, PartialDetection,
    RenderPipeline,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tower_livereload::LiveReloadLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Serve a Folio page tree
#[derive(Debug, Parser)]
#[command(name = "folio-server", version, about)]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Page root, overrides `routing.pages_dir`
    #[arg(long)]
    pages: Option<String>,

    /// Port, overrides `server.port`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,folio=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(pages) = args.pages {
        config.routing.pages_dir = pages;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Ok(value) = std::env::var("FOLIO_HOT_RELOAD") {
        config.dev.hot_reload = value.parse::<bool>().unwrap_or(config.dev.hot_reload);
    }
    let config = Config::install(config);

    info!(
        project = %config.project.name,
        pages_dir = %config.routing.pages_dir,
        "folio starting"
    );

    let loader = PageLoader::from_config(&config.routing);
    let store = Arc::new(CatalogStore::open(&loader).context("failed to build page catalog")?);
    for route in store.snapshot().catalog().routes() {
        debug!(pattern = %route.pattern_string(), template = %route.template, "route");
    }

    let pipeline = RenderPipeline::from_config(config, store.clone());
    let mut app = folio_server::app(pipeline, PartialDetection::from(&config.routing));

    // Kept alive for the lifetime of the server
    let _watcher = if config.dev.hot_reload {
        let livereload = LiveReloadLayer::new();
        let reloader = livereload.reloader();
        app = app.layer(livereload);

        let watcher = CatalogWatcher::spawn(
            store.clone(),
            loader.clone(),
            Duration::from_millis(config.dev.debounce_ms),
        )
        .context("failed to watch pages directory")?;

        let mut events = watcher.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(CatalogEvent::Rebuilt { version }) => {
                        debug!(version, "reloading browsers");
                        reloader.reload();
                    }
                    Ok(CatalogEvent::Failed { error }) => {
                        warn!(%error, "page change not applied");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed catalog events");
                        reloader.reload();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        info!(debounce_ms = config.dev.debounce_ms, "hot reload enabled");
        Some(watcher)
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, routes = store.snapshot().catalog().len(), "server running");

    axum::serve(listener, app).await?;
    Ok(())
}
