use actix_web::web;

pub mod health;
pub mod keep_alive;
pub mod lobbies;
pub mod realtime;

/// Register every application route.
///
/// `main.rs` wraps these with the middleware stack; tests mount them bare
/// or with the same stack through the test app builder.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Banner and health: /, /health
    cfg.configure(health::configure_routes);

    // Uptime probe: /api/keep-alive
    cfg.service(web::scope("/api/keep-alive").configure(keep_alive::configure_routes));

    // Lobby lookups: /api/lobbies/**
    cfg.service(web::scope("/api/lobbies").configure(lobbies::configure_routes));

    // WebSocket: /ws
    cfg.configure(realtime::configure_routes);
}
