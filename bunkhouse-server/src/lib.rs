use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
};

use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod availability;
mod context;
mod docs;
mod errors;
pub mod logging;
mod reservations;
mod rooms;
mod schemas;
mod serialized;

pub use context::{BunkhouseInstance, ServerContext};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9070;

pub type Router = axum::Router<ServerContext>;

/// Starts the bunkhouse server
pub async fn run_server(context: ServerContext) {
    let port = env::var("BUNKHOUSE_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/reservations", reservations::router())
        .nest("/rooms", rooms::router())
        .merge(availability::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .route("/health", get(health))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    log::info!("listening on port {port}");

    axum::serve(listener, root_router.into_make_service())
        .await
        .unwrap();
}

async fn health() -> &'static str {
    "ok"
}
