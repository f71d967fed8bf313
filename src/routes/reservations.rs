use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::reservations::{ConstraintCheck, ConstraintCheckQuery, ReservationList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{Pagination, ReservationListQuery},
    services::reservation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_reservations).post(create_from_cart))
        .route("/check", get(check_constraint))
        .route("/{id}", delete(cancel_reservation))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("filter" = Option<String>, Query, description = "active | canceled | all (default all)")
    ),
    responses(
        (status = 200, description = "The current user's reservations in creation order", body = ApiResponse<ReservationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn list_my_reservations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReservationListQuery>,
) -> AppResult<Json<ApiResponse<ReservationList>>> {
    let resp = reservation_service::list_by_user(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    responses(
        (status = 200, description = "One reservation per cart entry, in cart order", body = ApiResponse<ReservationList>),
        (status = 400, description = "Cart is empty"),
        (status = 409, description = "An entry expired, lost its bag, or broke exclusivity; nothing was committed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn create_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReservationList>>> {
    let resp = reservation_service::create_for_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reservations/check",
    params(
        ("establishment_id" = Uuid, Query, description = "Establishment ID"),
        ("day" = String, Query, description = "Calendar day (UTC), e.g. 2024-01-10")
    ),
    responses(
        (status = 200, description = "Whether an active reservation already holds the establishment/day slot", body = ApiResponse<ConstraintCheck>)
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn check_constraint(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ConstraintCheckQuery>,
) -> AppResult<Json<ApiResponse<ConstraintCheck>>> {
    let resp = reservation_service::check_constraint(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Canceled (no-op when missing or already canceled)", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = reservation_service::cancel_reservation(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/establishments/{establishment_id}/reservations",
    params(
        ("establishment_id" = Uuid, Path, description = "Establishment ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Every reservation against the establishment, any status", body = ApiResponse<ReservationList>),
        (status = 403, description = "Not the owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn list_for_establishment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(establishment_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ReservationList>>> {
    let resp =
        reservation_service::list_by_establishment(&state, &user, establishment_id, pagination)
            .await?;
    Ok(Json(resp))
}
