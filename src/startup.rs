//! Application startup and lifecycle management.

use crate::assistant::{Assistant, ChatCompleter, MockChat, OpenAiChat};
use crate::checkout::CheckoutDesk;
use crate::config::PosConfig;
use crate::error::AppError;
use crate::services::{init_metrics, Database, PgReports, ReportSource};
use crate::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PosConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: PosConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: PosConfig, run_migrations: bool) -> Result<Self, AppError> {
        // Initialize metrics
        init_metrics();

        // Connect to database
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        // Run migrations only if requested
        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        // Spawn the checkout desk task that owns carts and tabs
        let desk = CheckoutDesk::spawn(config.checkout.tax_rate);

        let reports: Arc<dyn ReportSource> = Arc::new(PgReports::new(
            db.pool().clone(),
            config.reporting.timezone.clone(),
        ));

        // Pick the completion backend
        let chat: Arc<dyn ChatCompleter> = if config.assistant.api_key.is_some() {
            tracing::info!(
                model = %config.assistant.model,
                "Initialized chat completions backend"
            );
            Arc::new(OpenAiChat::new(config.assistant.clone()))
        } else {
            tracing::warn!("OPENAI_API_KEY not configured - assistant answers will be canned");
            Arc::new(MockChat::default())
        };

        let assistant = Arc::new(Assistant::new(
            chat,
            Arc::clone(&reports),
            config.assistant.max_rounds,
            config.assistant.fallback_answer.clone(),
        ));

        let state = AppState {
            config: config.clone(),
            db,
            desk,
            reports,
            assistant,
        };

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            port = self.port,
            "Service ready to accept connections"
        );

        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}
