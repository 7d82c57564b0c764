use actix_web::{web, App, HttpServer};
use backend::config::ServerConfig;
use backend::infra::state::build_state;
use backend::middleware::cors::cors_middleware;
use backend::middleware::request_trace::RequestTrace;
use backend::middleware::structured_logger::StructuredLogger;
use backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    let (host, port) = config.bind_addr();
    let cors_origins = config.cors_origins.clone();

    let app_state = match build_state().with_config(config).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let coordinator = app_state.coordinator();
    let registry = app_state.websocket_registry();
    let data = web::Data::new(app_state);

    info!(host = %host, port, "🎲 starting deathroll backend");

    let result = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&cors_origins))
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    let closed = registry.close_all_connections();
    coordinator.shutdown();
    info!(
        sessions_closed = closed.len(),
        lobbies_dropped = coordinator.lobby_count(),
        "server stopped"
    );

    result
}
