//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors go through
//! `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use identity::mailer::SmtpMailer;
use identity::{IdentityConfig, PgAccountRepository, identity_router};
use platform::password::WorkFactor;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,identity=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Identity configuration
    let identity_config = build_identity_config()?;

    // SMTP relay for verification mail
    let mailer = SmtpMailer::new(
        &env::var("SMTP_HOST").expect("SMTP_HOST must be set in environment"),
        env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587),
        env::var("SMTP_USERNAME").unwrap_or_default(),
        env::var("SMTP_PASSWORD").unwrap_or_default(),
        env::var("MAIL_FROM").expect("MAIL_FROM must be set in environment"),
    )
    .map_err(|e| anyhow::anyhow!("SMTP transport setup failed: {e}"))?;

    let repo = PgAccountRepository::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api/auth",
            identity_router(
                Arc::new(repo),
                Arc::new(mailer),
                Arc::new(identity_config),
            ),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Assemble the identity config from the environment.
///
/// In release builds the signing secret must come from the environment; in
/// debug builds a random one is generated so the server starts without
/// setup. The verification lifetime is fixed at 10 minutes by design.
fn build_identity_config() -> anyhow::Result<IdentityConfig> {
    let mut config = if cfg!(debug_assertions) {
        IdentityConfig::with_random_secret()
    } else {
        let secret_b64 =
            env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set in production");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        let mut secret = [0u8; 32];
        if secret_bytes.len() != secret.len() {
            anyhow::bail!("TOKEN_SECRET must decode to exactly 32 bytes");
        }
        secret.copy_from_slice(&secret_bytes);
        IdentityConfig {
            token_secret: secret,
            ..IdentityConfig::default()
        }
    };

    if let Some(ttl) = env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.session_ttl = Duration::from_secs(ttl);
    }

    if let Ok(base_url) = env::var("APP_BASE_URL") {
        config.base_url = base_url;
    }

    if let Ok(pepper_b64) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(Engine::decode(&general_purpose::STANDARD, &pepper_b64)?);
    }

    let default_work = WorkFactor::default();
    config.work_factor = WorkFactor {
        memory_kib: env_u32("ARGON2_MEMORY_KIB", default_work.memory_kib),
        iterations: env_u32("ARGON2_ITERATIONS", default_work.iterations),
        parallelism: env_u32("ARGON2_PARALLELISM", default_work.parallelism),
    };

    Ok(config)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
