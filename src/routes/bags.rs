use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::bags::{BagList, CreateBagRequest, SetAvailabilityRequest, UpdateBagRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Bag,
    response::ApiResponse,
    routes::params::Pagination,
    services::bag_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bags).post(create_bag))
        .route("/{id}", get(get_bag).patch(update_bag))
        .route("/{id}/availability", post(set_availability))
        .route("/establishment/{establishment_id}", get(list_by_establishment))
}

#[utoipa::path(
    get,
    path = "/api/bags",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Available bags with open pickup windows", body = ApiResponse<BagList>)
    ),
    tag = "Bags"
)]
pub async fn list_bags(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BagList>>> {
    let resp = bag_service::list_available(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bags",
    request_body = CreateBagRequest,
    responses(
        (status = 200, description = "Bag published", body = ApiResponse<Bag>),
        (status = 400, description = "Bad window, empty or invalid item list"),
        (status = 403, description = "Not the establishment owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bags"
)]
pub async fn create_bag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBagRequest>,
) -> AppResult<Json<ApiResponse<Bag>>> {
    let resp = bag_service::create_bag(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bags/{id}",
    params(
        ("id" = Uuid, Path, description = "Bag ID")
    ),
    responses(
        (status = 200, description = "Bag with its item list", body = ApiResponse<Bag>),
        (status = 404, description = "Bag not found"),
    ),
    tag = "Bags"
)]
pub async fn get_bag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Bag>>> {
    let resp = bag_service::get_bag(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/bags/{id}",
    params(
        ("id" = Uuid, Path, description = "Bag ID")
    ),
    request_body = UpdateBagRequest,
    responses(
        (status = 200, description = "Bag updated", body = ApiResponse<Bag>),
        (status = 403, description = "Not the establishment owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bags"
)]
pub async fn update_bag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBagRequest>,
) -> AppResult<Json<ApiResponse<Bag>>> {
    let resp = bag_service::update_bag(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bags/{id}/availability",
    params(
        ("id" = Uuid, Path, description = "Bag ID")
    ),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability flag updated", body = ApiResponse<Bag>),
        (status = 403, description = "Not the establishment owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bags"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> AppResult<Json<ApiResponse<Bag>>> {
    let resp = bag_service::set_availability(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bags/establishment/{establishment_id}",
    params(
        ("establishment_id" = Uuid, Path, description = "Establishment ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Every bag published by the establishment", body = ApiResponse<BagList>)
    ),
    tag = "Bags"
)]
pub async fn list_by_establishment(
    State(state): State<AppState>,
    Path(establishment_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BagList>>> {
    let resp = bag_service::list_by_establishment(&state, establishment_id, pagination).await?;
    Ok(Json(resp))
}
