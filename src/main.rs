//! inkpress - A blog platform REST API

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpress::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAccountRepository, SqlxBlacklistRepository, SqlxBlogRepository,
            SqlxCommentRepository, SqlxDeviceRepository, SqlxPostRepository,
            SqlxRateLimitRepository,
        },
    },
    services::{
        AccountService, BlogService, CommentService, EmailService, JwtService, PostService,
        RateLimitService, SessionService, UserService,
    },
    tasks::CleanupTasks,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpress=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting inkpress API...");

    // Load configuration
    let config = Arc::new(Config::load_with_env(Path::new("config.yml"))?);
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let accounts = SqlxAccountRepository::boxed(pool.clone());
    let blogs = SqlxBlogRepository::boxed(pool.clone());
    let posts = SqlxPostRepository::boxed(pool.clone());
    let comments = SqlxCommentRepository::boxed(pool.clone());
    let devices = SqlxDeviceRepository::boxed(pool.clone());
    let blacklist = SqlxBlacklistRepository::boxed(pool.clone());
    let rate_limits = SqlxRateLimitRepository::boxed(pool.clone());

    // Initialize services
    let jwt = Arc::new(JwtService::new(&config.auth));
    let email = Arc::new(EmailService::new(config.email.clone()));
    if !email.is_configured() {
        tracing::warn!("SMTP not configured; confirmation emails will be logged and skipped");
    }

    let blog_service = Arc::new(BlogService::new(blogs.clone(), posts.clone()));
    let post_service = Arc::new(PostService::new(posts.clone(), blogs));
    let comment_service = Arc::new(CommentService::new(comments, posts));
    let user_service = Arc::new(UserService::new(accounts.clone()));
    let account_service = Arc::new(AccountService::new(accounts, email));
    let session_service = Arc::new(SessionService::new(
        jwt.clone(),
        devices.clone(),
        blacklist.clone(),
    ));
    let rate_limiter = Arc::new(RateLimitService::new(
        rate_limits,
        config.rate_limit.clone(),
    ));

    // Build application state
    let state = AppState {
        config: config.clone(),
        blog_service,
        post_service,
        comment_service,
        user_service,
        account_service,
        session_service,
        rate_limiter: rate_limiter.clone(),
        jwt,
    };

    // Start the periodic cleanup sweeps
    let cleanup = CleanupTasks::spawn(
        &config.rate_limit,
        &config.cleanup,
        rate_limiter,
        devices,
        blacklist,
    );
    tracing::info!("Cleanup tasks started");

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop the sweeps before exiting
    cleanup.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
    }
}
