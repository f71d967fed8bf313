use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddBagRequest, CartList, PersonalizeRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartEntry,
    response::ApiResponse,
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_bag))
        .route("/{entry_id}", delete(remove_entry))
        .route("/{entry_id}/personalize", post(personalize))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "The current user's live cart entries", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddBagRequest,
    responses(
        (status = 200, description = "Bag added to the cart", body = ApiResponse<CartEntry>),
        (status = 404, description = "Bag does not exist"),
        (status = 409, description = "Bag unavailable or establishment/day already in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_bag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddBagRequest>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let resp = cart_service::add_bag(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{entry_id}",
    params(
        ("entry_id" = Uuid, Path, description = "Cart entry ID")
    ),
    responses(
        (status = 200, description = "Removed (no-op when already gone)", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_entry(&state, &user, entry_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{entry_id}/personalize",
    params(
        ("entry_id" = Uuid, Path, description = "Cart entry ID")
    ),
    request_body = PersonalizeRequest,
    responses(
        (status = 200, description = "Removed-item set updated", body = ApiResponse<CartEntry>),
        (status = 400, description = "Empty list or item not in the bag"),
        (status = 409, description = "Non-regular bag or removal cap exceeded"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn personalize(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<PersonalizeRequest>,
) -> AppResult<Json<ApiResponse<CartEntry>>> {
    let resp = cart_service::personalize(&state, &user, entry_id, payload).await?;
    Ok(Json(resp))
}
