use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod bags;
pub mod cart;
pub mod doc;
pub mod health;
pub mod params;
pub mod reservations;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/bags", bags::router())
        .nest("/cart", cart::router())
        .nest("/reservations", reservations::router())
        .route(
            "/establishments/{establishment_id}/reservations",
            get(reservations::list_for_establishment),
        )
}
