//! Registry management endpoints.
//!
//! Reads (`GET /registry`, `GET /breakers`) are open. Mutations go through
//! `admin_auth_middleware`, which only enforces anything when
//! `admin.api_key` is configured.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::state::GatewayState;

pub fn router(state: GatewayState) -> Router<GatewayState> {
    let mutations = post(register_instance)
        .delete(unregister_instance)
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    Router::new()
        .route("/registry", get(list_registry).merge(mutations))
        .route("/breakers", get(list_breakers))
}
