//! Entry point: load config, wire dependencies, and run both listeners.

use std::future::IntoFuture;
use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ums::auth::{SessionService, TokenCodec, TokenConfig};
use ums::config::Config;
use ums::db::{self, PgUserStore, UserStore};
use ums::external::WalletClient;
use ums::{create_app, create_internal_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db_pool));
    let codec = TokenCodec::new(TokenConfig {
        signing_key: config.jwt_secret.clone(),
        access_ttl: config.access_ttl,
        refresh_ttl: config.refresh_ttl,
    });
    let sessions = SessionService::new(store.clone(), codec);
    let wallet = WalletClient::new(&config.wallet_host, &config.wallet_endpoint_create)
        .map_err(|e| anyhow::anyhow!("wallet client: {}", e))?;

    if !wallet.is_enabled() {
        tracing::warn!("WALLET_HOST not set; wallet provisioning disabled");
    }

    let state = AppState {
        store,
        sessions,
        wallet,
    };

    let app = create_app(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    let internal_app = create_internal_app(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    let internal_listener = tokio::net::TcpListener::bind(config.internal_addr).await?;
    tracing::info!(addr = %config.server_addr, "listening");
    tracing::info!(addr = %config.internal_addr, "internal rpc listening");

    tokio::try_join!(
        axum::serve(listener, app).into_future(),
        axum::serve(internal_listener, internal_app).into_future(),
    )?;
    Ok(())
}
