use std::{path::PathBuf, process::exit, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use log::{error, info};
use retpredict::{descriptors, Error, Model, ModelArtifact};

use config::Config;

mod config;
mod handlers;
mod templates;

#[derive(Parser)]
struct Cli {
    /// A TOML configuration file. Built-in defaults are used for any missing
    /// keys, or for everything if no file is given.
    config: Option<PathBuf>,
}

pub(crate) struct AppState {
    pub(crate) model: ModelArtifact,
    pub(crate) config: Config,
}

fn router(state: Arc<AppState>) -> Router {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

async fn serve(config: Config) -> Result<(), Error> {
    let model = ModelArtifact::load(&config.model)?;
    let names = descriptors::names()?;
    info!("RDKit provides {} descriptors", names.len());
    if let Some(f) = model.features().iter().find(|&f| !names.contains(f)) {
        return Err(Error::MissingFeature(f.clone()));
    }
    let listener = tokio::net::TcpListener::bind(&config.address).await?;
    info!("listening on http://{}", config.address);
    let app = router(Arc::new(AppState { model, config }));
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                error!("failed to load {}: {e}", path.display());
                exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
    {
        error!("failed to initialize thread pool: {e}");
        exit(1);
    }

    if let Err(e) = serve(config).await {
        error!("{e}");
        exit(1);
    }
}
