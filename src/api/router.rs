use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use super::{handlers, middleware::auth_middleware, websocket::handle_match_ws};
use crate::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    // Availability routes (protected)
    let availability_routes = Router::new()
        .route("/", put(handlers::availability::set_availability))
        .route("/me", get(handlers::availability::get_my_availability))
        .route("/sweep", post(handlers::availability::sweep_expired))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Discovery routes (protected)
    let nearby_routes = Router::new()
        .route("/", get(handlers::discovery::find_nearby))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Ping routes (protected)
    let ping_routes = Router::new()
        .route("/", post(handlers::pings::send_ping))
        .route("/incoming", get(handlers::pings::get_incoming))
        .route("/sent", get(handlers::pings::get_sent))
        .route("/accepted", get(handlers::pings::get_accepted))
        .route("/:id", get(handlers::pings::get_ping))
        .route("/:id/respond", post(handlers::pings::respond))
        .route("/:id/end", post(handlers::pings::end_match))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Match timeline/chat routes (protected)
    let match_routes = Router::new()
        .route("/history", get(handlers::matches::get_history))
        .route("/with/:user_id", get(handlers::matches::get_match_with_user))
        .route("/:ping_id/events", get(handlers::matches::get_events))
        .route("/:ping_id/events", post(handlers::matches::append_event))
        .route("/:ping_id/messages", get(handlers::matches::get_messages))
        .route("/:ping_id/messages", post(handlers::matches::send_message))
        .route("/:ping_id/messages/seen", post(handlers::matches::mark_seen))
        .route("/:ping_id/ws", get(handle_match_ws))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Profile routes (protected)
    let profile_routes = Router::new()
        .route("/me", get(handlers::profiles::get_my_profile))
        .route("/me", put(handlers::profiles::upsert_my_profile))
        .route("/:id", get(handlers::profiles::get_profile))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/availability", availability_routes)
        .nest("/nearby", nearby_routes)
        .nest("/pings", ping_routes)
        .nest("/matches", match_routes)
        .nest("/profiles", profile_routes)
        .with_state(state)
}
