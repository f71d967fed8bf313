use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::reservations::{ConstraintCheck, ConstraintCheckQuery, ReservationList},
    entity::{
        bag_items::Column as BagItemCol,
        bags::{Column as BagCol, Entity as Bags},
        cart_entries::{ActiveModel as CartEntryActive, Column as CartEntryCol, Entity as CartEntries},
        removed_items::Column as RemovedItemCol,
        reservations::{
            ActiveModel as ReservationActive, Column as ReservationCol, Entity as Reservations,
            Model as ReservationModel,
        },
    },
    error::{AppError, AppResult, on_unique_violation},
    middleware::auth::AuthUser,
    models::{Reservation, ReservationStatus},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ReservationFilter, ReservationListQuery},
    services::bag_service::ensure_establishment_owner,
    state::AppState,
};
use crate::entity::{BagItems, RemovedItems};

/// Converts every live cart entry into a reservation, in cart order, inside
/// one transaction. The first entry that fails any check aborts the whole
/// batch; nothing is committed.
pub async fn create_for_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReservationList>> {
    let now = state.clock.now();
    let today = now.date_naive();

    let txn = state.orm.begin().await?;

    let entries = CartEntries::find()
        .filter(CartEntryCol::UserId.eq(user.user_id))
        .filter(CartEntryCol::ReservedAt.is_null())
        .order_by_asc(CartEntryCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if entries.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }

    let mut created = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry_id = entry.id;

        let bag = Bags::find_by_id(entry.bag_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart entry {entry_id} references a missing bag"
                ))
            })?;

        let item_count = BagItems::find()
            .filter(BagItemCol::BagId.eq(bag.id))
            .count(&txn)
            .await?;
        let removed_count = RemovedItems::find()
            .filter(RemovedItemCol::CartEntryId.eq(entry_id))
            .count(&txn)
            .await?;
        let remaining = item_count.saturating_sub(removed_count) as usize;

        check_entry_reservable(entry_id, bag.pickup_end.with_timezone(&Utc), remaining, now)?;

        if has_reservation_for_day(&txn, user.user_id, bag.establishment_id, today).await? {
            return Err(exclusivity_error(entry_id));
        }

        // Compare-and-set on the availability flag; a concurrent batch that
        // claimed the bag first makes this a zero-row update.
        let claimed = Bags::update_many()
            .col_expr(BagCol::Available, Expr::value(false))
            .filter(BagCol::Id.eq(bag.id))
            .filter(BagCol::Available.eq(true))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict("bag is not available anymore".into()));
        }

        // The unique index on (user, establishment, reserved_day) backs the
        // exclusivity check above across concurrent batches.
        let reservation = ReservationActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            cart_entry_id: Set(entry_id),
            bag_id: Set(bag.id),
            establishment_id: Set(bag.establishment_id),
            reserved_day: Set(today),
            created_at: Set(now.into()),
            canceled_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|err| on_unique_violation(err, || exclusivity_error(entry_id)))?;

        let mut consumed: CartEntryActive = entry.into();
        consumed.reserved_at = Set(Some(now.into()));
        consumed.update(&txn).await?;

        created.push(reservation_from_entity(reservation));
    }

    txn.commit().await?;

    let reservation_ids: Vec<Uuid> = created.iter().map(|r| r.id).collect();
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ReservationCreate,
        Some(serde_json::json!({ "reservation_ids": reservation_ids })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Reservations created",
        ReservationList { items: created },
        Some(Meta::empty()),
    ))
}

/// Canceling a missing or already-canceled reservation is a no-op; cancel
/// retries are expected client behavior. The consumed cart entry and the
/// bag's availability flag are left untouched.
pub async fn cancel_reservation(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let reservation = Reservations::find()
        .filter(ReservationCol::Id.eq(id))
        .filter(ReservationCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let Some(reservation) = reservation else {
        return Ok(canceled_response());
    };
    if reservation.canceled_at.is_some() {
        return Ok(canceled_response());
    }

    let reservation_id = reservation.id;
    let mut active: ReservationActive = reservation.into();
    active.canceled_at = Set(Some(state.clock.now().into()));
    active.update(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ReservationCancel,
        Some(serde_json::json!({ "reservation_id": reservation_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(canceled_response())
}

pub async fn list_by_user(
    state: &AppState,
    user: &AuthUser,
    query: ReservationListQuery,
) -> AppResult<ApiResponse<ReservationList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let filter = query.filter.unwrap_or(ReservationFilter::All);

    let mut finder = Reservations::find().filter(ReservationCol::UserId.eq(user.user_id));
    finder = match filter {
        ReservationFilter::Active => finder.filter(ReservationCol::CanceledAt.is_null()),
        ReservationFilter::Canceled => finder.filter(ReservationCol::CanceledAt.is_not_null()),
        ReservationFilter::All => finder,
    };
    let finder = finder
        .order_by_asc(ReservationCol::CreatedAt)
        .order_by_asc(ReservationCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(reservation_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        ReservationList { items },
        Some(meta),
    ))
}

/// Every reservation against the establishment, canceled ones included.
/// Only the owner (or an admin) may read it.
pub async fn list_by_establishment(
    state: &AppState,
    user: &AuthUser,
    establishment_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReservationList>> {
    ensure_establishment_owner(&state.orm, user, establishment_id).await?;

    let (page, limit, offset) = pagination.normalize();
    let finder = Reservations::find()
        .filter(ReservationCol::EstablishmentId.eq(establishment_id))
        .order_by_asc(ReservationCol::CreatedAt)
        .order_by_asc(ReservationCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(reservation_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        ReservationList { items },
        Some(meta),
    ))
}

/// Exclusivity preview: does the user already hold an active reservation for
/// the establishment on the given day? Read-only.
pub async fn check_constraint(
    state: &AppState,
    user: &AuthUser,
    query: ConstraintCheckQuery,
) -> AppResult<ApiResponse<ConstraintCheck>> {
    let held =
        has_reservation_for_day(&state.orm, user.user_id, query.establishment_id, query.day)
            .await?;
    Ok(ApiResponse::success(
        "OK",
        ConstraintCheck { held },
        Some(Meta::empty()),
    ))
}

/// Canceled reservations still count: canceling never frees the
/// establishment/day slot, mirroring how cancellation leaves the bag
/// unavailable.
pub(crate) async fn has_reservation_for_day<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    establishment_id: Uuid,
    day: NaiveDate,
) -> Result<bool, sea_orm::DbErr> {
    let existing = Reservations::find()
        .filter(ReservationCol::UserId.eq(user_id))
        .filter(ReservationCol::EstablishmentId.eq(establishment_id))
        .filter(ReservationCol::ReservedDay.eq(day))
        .one(conn)
        .await?;
    Ok(existing.is_some())
}

/// Steps 1 and 2 of the per-entry checks: the pickup window must still be
/// open (strictly) and the bag must have items left after personalization.
fn check_entry_reservable(
    entry_id: Uuid,
    pickup_end: DateTime<Utc>,
    remaining_items: usize,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if pickup_end <= now {
        return Err(AppError::Conflict(format!(
            "cart entry {entry_id}: pickup window has passed"
        )));
    }
    if remaining_items == 0 {
        return Err(AppError::Constraint(format!(
            "cart entry {entry_id}: bag has no items left"
        )));
    }
    Ok(())
}

fn exclusivity_error(entry_id: Uuid) -> AppError {
    AppError::Constraint(format!(
        "cart entry {entry_id}: an active reservation for this establishment already exists today"
    ))
}

fn canceled_response() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(
        "Reservation canceled",
        serde_json::json!({}),
        Some(Meta::empty()),
    )
}

fn reservation_from_entity(model: ReservationModel) -> Reservation {
    let canceled_at = model.canceled_at.map(|at| at.with_timezone(&Utc));
    Reservation {
        id: model.id,
        user_id: model.user_id,
        cart_entry_id: model.cart_entry_id,
        bag_id: model.bag_id,
        establishment_id: model.establishment_id,
        reserved_day: model.reserved_day,
        status: ReservationStatus::from_canceled_at(canceled_at),
        created_at: model.created_at.with_timezone(&Utc),
        canceled_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_end_equal_to_now_counts_as_expired() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let entry = Uuid::new_v4();

        let result = check_entry_reservable(entry, now, 3, now);
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let open = check_entry_reservable(entry, now + chrono::Duration::seconds(1), 3, now);
        assert!(open.is_ok());
    }

    #[test]
    fn entry_with_everything_removed_is_not_reservable() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let later = now + chrono::Duration::hours(2);

        let result = check_entry_reservable(Uuid::new_v4(), later, 0, now);
        assert!(matches!(result, Err(AppError::Constraint(_))));
    }

    #[test]
    fn status_follows_cancellation_timestamp() {
        let model = ReservationModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            cart_entry_id: Uuid::new_v4(),
            bag_id: Uuid::new_v4(),
            establishment_id: Uuid::new_v4(),
            reserved_day: chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            created_at: Utc::now().into(),
            canceled_at: None,
        };
        assert_eq!(
            reservation_from_entity(model.clone()).status,
            ReservationStatus::Active
        );

        let canceled = ReservationModel {
            canceled_at: Some(Utc::now().into()),
            ..model
        };
        assert_eq!(
            reservation_from_entity(canceled).status,
            ReservationStatus::Canceled
        );
    }
}
