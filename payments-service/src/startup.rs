//! Application startup and lifecycle management.

use crate::config::Config;
use crate::handlers;
use crate::services::{PaymentsRepository, RazorpayClient};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use platform_core::error::AppError;
use platform_core::middleware::tracing::propagate_request_id;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. Handed to every handler; there is no other
/// process-wide state.
#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub repository: PaymentsRepository,
    pub razorpay: RazorpayClient,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e)
            })?;
        client_options.app_name = Some("payments-service".to_string());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e)
        })?;
        let db = client.database(&config.database.db_name);

        let repository = PaymentsRepository::new(&db);
        repository.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            AppError::InternalError(e)
        })?;

        let razorpay = RazorpayClient::new(config.razorpay.clone());
        if razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - payment features will be limited");
        }

        let state = AppState {
            db,
            config: config.clone(),
            repository,
            razorpay,
        };

        // Port 0 = random port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::InternalError(e.into())
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::InternalError(e.into()))?
            .port();

        tracing::info!("Payments service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &mongodb::Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await?;
        Ok(())
    }
}

fn build_router(state: AppState) -> Router {
    // Browser clients call these endpoints cross-origin; the credential is
    // the bearer header, never a cookie.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Order initiation plus account reads
        .route(
            "/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route(
            "/purchases",
            post(handlers::purchases::create_purchase).get(handlers::purchases::list_purchases),
        )
        // Payment verification
        .route("/payments/verify", post(handlers::verify::verify_payment))
        // Download gating
        .route(
            "/projects/:id/access",
            get(handlers::purchases::project_access),
        )
        .layer(cors)
        .layer(from_fn(propagate_request_id))
        .layer(
            // Outermost layer, so the middleware below it runs inside this
            // span and can fill in the empty fields.
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = tracing::field::Empty,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
