use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;

use rally::database::schema;
use rally::web::middleware::identity;
use rally::web::routes::tools as tool_routes;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let db_url = env::var("RALLY_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://rally.db?mode=rwc".to_string());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("cannot connect to database");
    schema::apply_schema(&pool)
        .await
        .expect("cannot bootstrap schema");

    let app = Router::new()
        .route(
            "/api/tools/:tool_name",
            post(tool_routes::call_tool_handler),
        )
        .layer(middleware::from_fn(identity::bind_caller))
        .route("/healthz", get(tool_routes::health_handler))
        .layer(CatchPanicLayer::new())
        .with_state(pool);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(error = %e, "bind failed, trying fallback port {}", port + 1);
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    tracing::info!(addr = %bound_addr, "tool server listening");

    axum::serve(listener, app).await.unwrap();
}
