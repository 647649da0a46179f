use anyhow::Context;
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

use party_invite::adapters::http::{self, HttpState};
use party_invite::utils::{logger, validation::Validate};
use party_invite::{
    CustomerFileParser, InMemoryFilterCache, InviteService, LogNotifier, ProximityFilter,
    ServerArgs,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    logger::init_logger(args.common.log_format.into(), args.common.verbose);

    let mut config = match args.common.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config file '{}': {}", args.common.config.display(), e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let settings = config.invite_settings()?;
    tracing::info!(
        app = %config.app.name,
        port = config.http.port,
        base_location = %settings.base_location,
        threshold_km = %settings.threshold_km,
        order_by = settings.order_by.as_str(),
        workers = config.workers(),
        "Configuration loaded"
    );

    let filter = ProximityFilter::new(config.workers()).with_notifier(Arc::new(LogNotifier));
    let service = InviteService::new(
        CustomerFileParser::new(),
        filter,
        InMemoryFilterCache::new(),
        settings,
    );
    let state = Arc::new(HttpState::new(service, config.max_upload_bytes()));

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.http.port));
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("error to bind {}", address))?;

    http::serve(listener, http::router(state), shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Error to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
