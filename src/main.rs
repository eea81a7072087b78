mod core;
mod features;
mod shared;

use crate::core::config::Config;
use crate::core::metrics::{self, Metrics};
use crate::core::{cache, database, middleware};
use crate::core::middleware::SourceRateLimit;
use crate::features::conversation::{
    ChatNotifier, CheckoutService, ConversationController, PgSessionStore, SessionStore,
};
use crate::features::payments::{http_client, PayPalGateway, PaymentOrchestrator, StripeGateway};
use crate::features::rate_limits::{RateLimiter, RedisRateLimiter};
use crate::features::telegram::{dispatcher, TelegramNotifier};
use crate::features::transactions::{PgTransactionStore, TransactionStore};
use crate::features::users::{PgUserStore, UserProfileService, UserStore};
use crate::features::webhooks::{routes as webhook_routes, WebhookService};
use crate::shared::constants::{CHAT_RATE_LIMIT_SCOPE, WEBHOOK_RATE_LIMIT_SCOPE};
use crate::shared::i18n::Translations;
use axum::{middleware::from_fn, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::Bot;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let redis = cache::create_connection(&config.redis)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;
    tracing::info!("Redis connection established");

    let metrics = Arc::new(Metrics::new()?);
    let translations = Arc::new(Translations::new(
        config.i18n.supported_languages.clone(),
    ));
    tracing::info!(
        "Translations initialized for {:?}",
        translations.supported()
    );

    // Rate limiters share one Redis connection, keyed by scope
    let chat_limiter: Arc<dyn RateLimiter> = Arc::new(RedisRateLimiter::new(
        redis.clone(),
        CHAT_RATE_LIMIT_SCOPE,
        config.rate_limit.chat_ceiling,
        config.redis.timeout,
    ));
    let webhook_limiter: Arc<dyn RateLimiter> = Arc::new(RedisRateLimiter::new(
        redis,
        WEBHOOK_RATE_LIMIT_SCOPE,
        config.rate_limit.webhook_ceiling,
        config.redis.timeout,
    ));
    tracing::info!(
        "Rate limiters initialized (chat: {}/min, webhook: {}/min)",
        config.rate_limit.chat_ceiling,
        config.rate_limit.webhook_ceiling
    );

    // Stores
    let user_store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let transaction_store: Arc<dyn TransactionStore> =
        Arc::new(PgTransactionStore::new(pool.clone()));
    let session_store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool.clone()));
    let user_service = Arc::new(UserProfileService::new(
        Arc::clone(&user_store),
        Arc::clone(&translations),
    ));

    // Payment gateways
    let http = http_client(config.payments.http_timeout)?;
    let orchestrator = Arc::new(
        PaymentOrchestrator::new()
            .register(Arc::new(StripeGateway::new(
                http.clone(),
                &config.stripe,
                &config.payments,
            )))
            .register(Arc::new(PayPalGateway::new(
                http,
                &config.paypal,
                &config.payments,
            ))),
    );
    orchestrator
        .gateway(config.payments.default_provider)
        .map_err(|e| anyhow::anyhow!("PAYMENT_PROVIDER cannot be used: {}", e))?;
    tracing::info!(
        "Payment orchestrator initialized (default provider: {}, currency: {})",
        config.payments.default_provider,
        config.payments.currency
    );

    let checkout = Arc::new(CheckoutService::new(
        Arc::clone(&orchestrator),
        Arc::clone(&transaction_store),
        Arc::clone(&metrics),
        config.payments.default_provider,
        config.payments.currency.clone(),
    ));
    let controller = Arc::new(ConversationController::new(
        chat_limiter,
        user_service,
        Arc::clone(&session_store),
        checkout,
        Arc::clone(&translations),
        Arc::clone(&metrics),
    ));
    tracing::info!("Conversation controller initialized");

    let bot = Bot::new(config.telegram.bot_token.clone());
    let notifier: Arc<dyn ChatNotifier> = Arc::new(TelegramNotifier::new(bot.clone()));

    let webhook_service = Arc::new(WebhookService::new(
        orchestrator,
        transaction_store,
        session_store,
        user_store,
        notifier,
        translations,
        Arc::clone(&metrics),
    ));
    tracing::info!("Webhook service initialized");

    // Metrics exposition, optionally behind basic auth
    let metrics_route = if let Some(credentials) = config.metrics.credentials() {
        tracing::info!("Metrics basic auth enabled");
        metrics::routes(Arc::clone(&metrics)).layer(from_fn(middleware::basic_auth_middleware(
            Arc::new(credentials),
        )))
    } else {
        tracing::info!("Metrics basic auth disabled (no credentials configured)");
        metrics::routes(Arc::clone(&metrics))
    };

    // Simple health check endpoint
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(webhook_routes::routes(
            webhook_service,
            SourceRateLimit::new(webhook_limiter, config.rate_limit.trusted_proxies.clone()),
        ))
        .merge(metrics_route)
        .merge(health_route)
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);

    // Peer addresses feed the per-source webhook limit
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    let mut bot_dispatcher = dispatcher::build(bot, controller).await;
    tracing::info!("Telegram dispatcher started");

    tokio::select! {
        result = server.into_future() => {
            result?;
            tracing::info!("HTTP server stopped");
        }
        _ = bot_dispatcher.dispatch() => {
            tracing::info!("Telegram dispatcher stopped");
        }
    }

    Ok(())
}
