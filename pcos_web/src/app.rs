use crate::config::Config;
use crate::presenter::Presenter;
use crate::server::HttpServer;

use pcos_prediction::{config::ModelConfig, ModelLoadError, ModelService, OrtModelService};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

fn load_model(model_config: &ModelConfig) -> Result<Arc<dyn ModelService>, ModelLoadError> {
    match OrtModelService::new(model_config) {
        Ok(service) => Ok(Arc::new(service)),
        Err(e) => {
            tracing::error!("Failed to load model, analysis is disabled: {}", e);
            Err(e)
        }
    }
}

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let model = tokio::task::spawn_blocking({
        let model_config = config.model.clone();
        move || load_model(&model_config)
    })
    .await?;

    let presenter = Presenter::new(model);
    let server = HttpServer::new(presenter, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    server_handle.await??;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
