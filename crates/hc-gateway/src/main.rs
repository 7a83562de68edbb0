//! hc-gateway: Healthcare Assistant Gateway Main Binary
//!
//! Loads configuration, constructs the catalog, store, responder and
//! payment issuer, and serves every channel webhook from one HTTP server.

mod dispatch;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use hc_api::ApiState;
use hc_core::{
    AppointmentJournal, ChatClient, Config, MessageHandler, RecordStore, Responder,
    ServiceCatalog, SmartReply,
};
use hc_instagram::{InstagramApi, InstagramState};
use hc_payments::PaymentLinkIssuer;
use hc_whatsapp::{TwilioClient, WhatsAppState};
use hc_ws::{ConnectionMap, WsState};

use dispatch::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting hc-gateway...");

    // Service catalog: a missing document degrades to an empty catalog
    let catalog = Arc::new(ServiceCatalog::load(&config.catalog.services_path));
    if catalog.is_empty() {
        tracing::warn!(
            "Service catalog is empty; check {}",
            config.catalog.services_path
        );
    }

    let store = Arc::new(
        RecordStore::new(&config.store.db_path)
            .map_err(|e| anyhow::anyhow!("Failed to open record store: {}", e))?,
    );

    let journal = config
        .store
        .appointments_file
        .as_ref()
        .map(AppointmentJournal::new);

    let responder = Responder::new(Arc::clone(&catalog), Arc::clone(&store), journal);

    let issuer = PaymentLinkIssuer::new(
        config.stripe.clone(),
        Arc::clone(&catalog),
        Arc::clone(&store),
    );
    if !config.stripe.is_configured() {
        tracing::info!("Stripe not configured; payment links will fail");
    }

    let smart = if config.llm.is_configured() {
        let client = ChatClient::new(&config.llm)
            .map_err(|e| anyhow::anyhow!("Failed to create chat client: {}", e))?;
        tracing::info!("Smart replies enabled (model: {})", config.llm.model);
        Some(SmartReply::new(client))
    } else {
        tracing::info!("Smart replies disabled (no LLM API key configured)");
        None
    };

    let dispatcher: Arc<dyn MessageHandler> = Arc::new(Dispatcher::new(
        responder,
        issuer,
        smart,
        Arc::clone(&catalog),
        Arc::clone(&store),
    ));

    // Channel clients
    let twilio = Arc::new(TwilioClient::new(
        config.twilio.account_sid.clone(),
        config.twilio.auth_token.clone(),
        config.twilio.whatsapp_number.clone(),
    ));
    if !config.twilio.is_configured() {
        tracing::info!("Twilio not configured; outbound WhatsApp sends disabled");
    }

    let instagram = Arc::new(InstagramApi::new(
        config.instagram.access_token.clone(),
        config.instagram.page_id.clone(),
        config.instagram.verify_token.clone(),
    ));
    if !config.instagram.is_configured() {
        tracing::info!("Instagram not configured; replies on that channel will fail");
    }

    // One server for every channel plus the auxiliary endpoints
    let app = Router::new()
        .merge(hc_api::routes(Arc::new(ApiState {
            handler: Arc::clone(&dispatcher),
            store: Arc::clone(&store),
        })))
        .merge(hc_whatsapp::routes(Arc::new(WhatsAppState {
            handler: Arc::clone(&dispatcher),
            twilio,
            validate_signatures: config.twilio.validate_signatures,
        })))
        .merge(hc_instagram::routes(Arc::new(InstagramState {
            handler: Arc::clone(&dispatcher),
            api: instagram,
            store: Arc::clone(&store),
        })))
        .merge(hc_ws::routes(Arc::new(WsState {
            handler: Arc::clone(&dispatcher),
            connections: ConnectionMap::new(),
        })))
        .layer(cors_layer(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    tracing::info!("hc-gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// CORS layer: permissive unless specific origins are configured
fn cors_layer(config: &Config) -> CorsLayer {
    match &config.api.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        _ => CorsLayer::permissive(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down...");
}
