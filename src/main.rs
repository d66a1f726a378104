use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod errors;
mod extract;
mod handlers;
mod models;
mod policy;
mod routes;
mod services;
mod state;

use services::{
    file_service::FileService, object_gateway::ObjectGateway, token_service::TokenService,
    user_service::UserService,
};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        region = %cfg.aws_region,
        bucket = %cfg.s3_bucket,
        "starting we-upload"
    );

    // --- Initialize SQLite connection ---
    let pool = Arc::new(db::connect(&cfg.database_url).await?);

    // --- Handle migration mode ---
    db::apply_migrations(&pool).await?;
    if migrate {
        tracing::info!("database migration complete");
        return Ok(()); // exit after migration
    }

    // --- Seed the first superuser if configured ---
    let users = UserService::new(pool.clone());
    if let (Some(email), Some(password)) = (&cfg.first_superuser, &cfg.first_superuser_password) {
        if let Err(err) = users.ensure_first_superuser(email, password).await {
            tracing::error!(error = %err, "could not create first superuser");
        }
    }

    // --- Object storage gateway, validated eagerly ---
    // A region or credential mismatch would otherwise surface as opaque
    // signature errors on the first presigned request.
    let gateway = ObjectGateway::from_config(&cfg).await;
    gateway.validate().await.map_err(|err| {
        anyhow::anyhow!(
            "object storage check failed (region `{}`, bucket `{}`): {}",
            cfg.aws_region,
            cfg.s3_bucket,
            err
        )
    })?;
    tracing::info!("object storage reachable, bucket verified");

    // --- Assemble state + router ---
    let state = AppState {
        db: pool.clone(),
        users,
        files: FileService::new(pool, gateway),
        tokens: TokenService::new(&cfg.jwt_secret, cfg.token_expiry_minutes),
    };
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
