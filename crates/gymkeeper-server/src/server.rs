use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, routing::get};
use gymkeeper_auth::{
    AuthHttpState, AuthState, GithubProvider, InMemoryIdentityStore, OAuthStateStore,
    TokenService, router,
};
use serde_json::{Value, json};
use tower::{ServiceBuilder, limit::ConcurrencyLimitLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;

pub struct GymkeeperServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application router with an in-memory identity store.
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let tokens = Arc::new(TokenService::from_config(&cfg.auth)?);
    let store = Arc::new(InMemoryIdentityStore::new());
    let auth = AuthState::new(tokens, store.clone(), store);

    let provider = GithubProvider::new(cfg.auth.github.clone())?;
    let oauth_states = OAuthStateStore::new(
        cfg.auth.github.state_ttl,
        cfg.auth.github.max_pending_states,
    );
    let state = AuthHttpState::new(auth, Arc::new(provider), oauth_states);

    let app = router(state)
        .route("/healthz", get(healthz))
        // Middleware stack (order: trace -> concurrency limit -> cors -> body limit)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(
                        |req: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                            )
                        },
                    ),
                )
                .layer(ConcurrencyLimitLayer::new(
                    cfg.server.max_concurrent_requests,
                ))
                .layer(CorsLayer::permissive())
                .layer(axum::extract::DefaultBodyLimit::max(
                    cfg.server.body_limit_bytes,
                )),
        );
    Ok(app)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<GymkeeperServer> {
        let app = build_app(&self.config)?;

        Ok(GymkeeperServer {
            addr: self.addr,
            app,
        })
    }
}

impl GymkeeperServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
