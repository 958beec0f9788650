//! # Repositorio Binary
//!
//! Loads settings, wires the adapters into the services and serves HTTP.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use configs::{LogFormat, NotifierKind, Settings};
use domains::ReviewNotifier;
use notify_adapters::LogNotifier;
use services::{Policy, Ports, Services};
use storage_adapters::{LocalFileStore, SqliteDatabase};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings);

    // 1. Database
    let db = SqliteDatabase::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("opening database")?;
    db.migrate().await.context("running migrations")?;

    // 2. File store
    let files = LocalFileStore::open(&settings.storage.uploads_dir)
        .await
        .context("opening uploads directory")?;
    tracing::info!(root = %files.root().display(), "file store ready");

    // 3. Notifier
    let notifier = build_notifier(&settings)?;

    // 4. Services
    let ports = Ports {
        users: Arc::new(db.users()),
        materials: Arc::new(db.materials()),
        authors: Arc::new(db.authors()),
        tags: Arc::new(db.tags()),
        favorites: Arc::new(db.favorites()),
        history: Arc::new(db.history()),
        files: Arc::new(files),
        notifier,
    };
    let policy = Policy {
        allowed_email_domains: settings.policy.allowed_email_domains.clone(),
        history_retention: chrono::Duration::days(settings.policy.history_retention_days),
        viewer_base_url: settings.viewer.base_url.clone(),
    };
    let state = AppState::new(Services::new(ports, policy));
    let app = router(state, settings.server.max_upload_bytes);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "repositorio listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.pool().close().await;
    tracing::info!("shut down");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn build_notifier(settings: &Settings) -> anyhow::Result<Arc<dyn ReviewNotifier>> {
    let notifier = &settings.notifier;
    match notifier.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new(notifier.recipients.clone()))),
        #[cfg(feature = "email-resend")]
        NotifierKind::Resend => {
            let api_key = notifier
                .api_key
                .clone()
                .context("notifier.api_key is required for the resend notifier")?;
            let resend = notify_adapters::ResendNotifier::new(
                api_key,
                notifier.sender(),
                notifier.recipients.clone(),
                std::time::Duration::from_secs(notifier.timeout_secs),
            )
            .context("building the email client")?;
            Ok(Arc::new(resend))
        }
        #[cfg(not(feature = "email-resend"))]
        NotifierKind::Resend => {
            anyhow::bail!("built without the email-resend feature; set notifier.kind = log")
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
