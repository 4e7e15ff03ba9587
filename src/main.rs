use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use boutique_api::{app_router, config, db, events, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config().context("failed to load configuration")?;
    config::init_tracing(app_config.log_level(), app_config.log_json);
    info!(environment = %app_config.environment, "starting boutique-api");

    let connection = db::establish_connection(&app_config)
        .await
        .context("failed to connect to the database")?;
    if app_config.auto_migrate {
        db::run_migrations(&connection)
            .await
            .context("failed to run database migrations")?;
    }

    let (event_sender, event_receiver) = events::channel();
    tokio::spawn(events::process_events(event_receiver));

    let state = AppState::new(
        Arc::new(connection),
        Arc::new(app_config.clone()),
        event_sender,
    );
    tokio::spawn(boutique_api::session::purge_loop(state.sessions.clone()));
    let app = app_router(state);

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
