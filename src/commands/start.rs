use std::sync::Arc;

use anyhow::Error;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::args::StartSubCommand;
use crate::clients::notebooklm::{Backend, NotebookLmBackend};
use crate::config::Config;
use crate::handler::{handle, AppState};

/// Accepts connections forever, one task per connection.
pub async fn serve<B: Backend>(listener: TcpListener, state: Arc<AppState<B>>) -> Result<(), Error> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle(state.clone(), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

fn log_startup(config: &Config) {
    if config.backend.auth_json.is_none() && !config.backend.storage_state_path.exists() {
        warn!(
            "NOTEBOOKLM_AUTH_JSON not set and {} does not exist. Make sure authentication is configured.",
            config.backend.storage_state_path.display()
        );
    }
    if config.default_notebook_id.is_none() {
        warn!("NOTEBOOKLM_NOTEBOOK_ID not set. Clients must provide notebook_id in requests.");
    }
    info!(
        "API Key authentication: {}",
        if config.auth_enabled() { "enabled" } else { "disabled" }
    );
    info!(
        "Default notebook ID: {}",
        config.default_notebook_id.as_deref().unwrap_or("not set")
    );
    info!("Markdown mode: {}", config.markdown_mode);
}

pub async fn run(cmd: &StartSubCommand) -> Result<(), Error> {
    let config = Config::load(cmd.config.as_deref())?.with_listen_overrides(cmd.host.clone(), cmd.port);
    log_startup(&config);

    let backend = NotebookLmBackend::new(&config.backend)?;
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, Arc::new(AppState { config, backend })).await
}
