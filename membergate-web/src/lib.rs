mod api;
mod common;

pub use common::{SessionAuthorization, SessionExt, TwoFactorHandle, SESSION_COOKIE_NAME};

use anyhow::{Context, Result};
use membergate_core::Services;
use poem::listener::TcpListener;
use poem::middleware::AddData;
use poem::session::{CookieConfig, MemoryStorage, ServerSession};
use poem::{EndpointExt, Route, Server};
use poem_openapi::OpenApiService;
use tracing::*;

pub async fn run_server(services: Services) -> Result<()> {
    let (address, cookie_max_age) = {
        let config = services.config.lock().await;
        (config.store.http.listen, config.store.http.cookie_max_age)
    };

    let api_service = OpenApiService::new(
        api::get(),
        "Membergate",
        env!("CARGO_PKG_VERSION"),
    )
    .server("/api");
    let spec = api_service.spec_endpoint();

    let app = Route::new()
        .nest("/api/openapi.json", spec)
        .nest("/api", api_service)
        .with(ServerSession::new(
            CookieConfig::default()
                .name(SESSION_COOKIE_NAME)
                .max_age(cookie_max_age),
            MemoryStorage::default(),
        ))
        .with(AddData::new(services));

    info!(?address, "Listening");
    Server::new(TcpListener::bind(address))
        .run(app)
        .await
        .context("HTTP server failed")
}
