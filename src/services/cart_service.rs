use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::cart::{AddBagRequest, CartList, PersonalizeRequest},
    entity::{
        bag_items::Model as BagItemModel,
        bags::{Entity as Bags, Model as BagModel},
        cart_entries::{
            ActiveModel as CartEntryActive, Column as CartEntryCol, Entity as CartEntries,
            Model as CartEntryModel,
        },
        removed_items::{
            ActiveModel as RemovedItemActive, Column as RemovedItemCol, Entity as RemovedItems,
        },
    },
    error::{AppError, AppResult, on_unique_violation},
    middleware::auth::AuthUser,
    models::{BagKind, CartEntry},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::bag_service::{bag_from_parts, load_bag_items},
    state::AppState,
};

/// Personalization cap per cart entry, cumulative across calls.
const MAX_REMOVED_ITEMS: usize = 2;

/// The cart projection: the user's live entries in creation order.
pub async fn list_cart(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = CartEntries::find()
        .filter(CartEntryCol::UserId.eq(user.user_id))
        .filter(CartEntryCol::ReservedAt.is_null())
        .order_by_asc(CartEntryCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let entries = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let bag = Bags::find_by_id(entry.bag_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart entry {} references a missing bag",
                    entry.id
                ))
            })?;
        let bag_items = load_bag_items(&state.orm, bag.id).await?;
        let removed = removed_ids(&state.orm, entry.id).await?;
        items.push(entry_from_parts(entry, bag, bag_items, removed)?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

pub async fn add_bag(
    state: &AppState,
    user: &AuthUser,
    payload: AddBagRequest,
) -> AppResult<ApiResponse<CartEntry>> {
    let txn = state.orm.begin().await?;

    let bag = Bags::find_by_id(payload.bag_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if !bag.available {
        return Err(AppError::Conflict("bag is not available".into()));
    }

    let day = pickup_day(bag.pickup_start);
    let duplicate = CartEntries::find()
        .filter(CartEntryCol::UserId.eq(user.user_id))
        .filter(CartEntryCol::EstablishmentId.eq(bag.establishment_id))
        .filter(CartEntryCol::PickupDay.eq(day))
        .filter(CartEntryCol::ReservedAt.is_null())
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(duplicate_day_error(day));
    }

    // The partial unique index on live entries backs this insert; a
    // concurrent add that slipped past the check above surfaces here.
    let entry = CartEntryActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        bag_id: Set(bag.id),
        establishment_id: Set(bag.establishment_id),
        pickup_day: Set(day),
        reserved_at: Set(None),
        created_at: Set(state.clock.now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| on_unique_violation(err, || duplicate_day_error(day)))?;

    let items = load_bag_items(&txn, bag.id).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartAdd,
        Some(serde_json::json!({ "bag_id": bag.id, "cart_entry_id": entry.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = entry_from_parts(entry, bag, items, BTreeSet::new())?;
    Ok(ApiResponse::success("Added to cart", dto, None))
}

/// Removing an entry that does not exist (or belongs to someone else) is a
/// no-op; remove retries are expected client behavior.
pub async fn remove_entry(
    state: &AppState,
    user: &AuthUser,
    entry_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // removed_items rows go with the entry via ON DELETE CASCADE.
    let result = CartEntries::delete_many()
        .filter(CartEntryCol::Id.eq(entry_id))
        .filter(CartEntryCol::UserId.eq(user.user_id))
        .filter(CartEntryCol::ReservedAt.is_null())
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            AuditAction::CartRemove,
            Some(serde_json::json!({ "cart_entry_id": entry_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn personalize(
    state: &AppState,
    user: &AuthUser,
    entry_id: Uuid,
    payload: PersonalizeRequest,
) -> AppResult<ApiResponse<CartEntry>> {
    let txn = state.orm.begin().await?;

    let entry = CartEntries::find()
        .filter(CartEntryCol::Id.eq(entry_id))
        .filter(CartEntryCol::UserId.eq(user.user_id))
        .filter(CartEntryCol::ReservedAt.is_null())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let bag = Bags::find_by_id(entry.bag_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cart entry {} references a missing bag",
                entry.id
            ))
        })?;
    let kind = BagKind::parse(&bag.kind)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown bag kind {}", bag.kind)))?;

    let items = load_bag_items(&txn, bag.id).await?;
    let item_ids: BTreeSet<i32> = items.iter().map(|item| item.item_id).collect();
    let already = removed_ids(&txn, entry.id).await?;

    let merged = merge_removed(kind, &item_ids, &already, &payload.removed_item_ids)?;

    let fresh: Vec<RemovedItemActive> = merged
        .difference(&already)
        .map(|&item_id| RemovedItemActive {
            cart_entry_id: Set(entry.id),
            item_id: Set(item_id),
            created_at: Set(state.clock.now().into()),
        })
        .collect();
    if !fresh.is_empty() {
        RemovedItems::insert_many(fresh).exec(&txn).await?;
    }
    txn.commit().await?;

    let removed_now: Vec<i32> = merged.iter().copied().collect();
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::CartPersonalize,
        Some(serde_json::json!({ "cart_entry_id": entry.id, "removed_item_ids": removed_now })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = entry_from_parts(entry, bag, items, merged)?;
    Ok(ApiResponse::success("Entry personalized", dto, None))
}

/// Calendar day (UTC) a bag is picked up on; the unit of the
/// one-bag-per-establishment rule at cart time.
pub(crate) fn pickup_day(pickup_start: DateTimeWithTimeZone) -> NaiveDate {
    pickup_start.with_timezone(&Utc).date_naive()
}

fn duplicate_day_error(day: NaiveDate) -> AppError {
    AppError::Constraint(format!(
        "cart already holds a bag from this establishment for {day}"
    ))
}

/// Validates one personalize call and returns the new cumulative removed
/// set. Checks run in order: empty request, bag kind, membership, cap.
/// Duplicate ids collapse before the cap is applied.
fn merge_removed(
    kind: BagKind,
    bag_items: &BTreeSet<i32>,
    already: &BTreeSet<i32>,
    requested: &[i32],
) -> Result<BTreeSet<i32>, AppError> {
    if requested.is_empty() {
        return Err(AppError::Validation(
            "must specify at least one item to remove".into(),
        ));
    }
    if kind != BagKind::Regular {
        return Err(AppError::Constraint(
            "a non-regular bag cannot be personalized".into(),
        ));
    }
    if let Some(missing) = requested.iter().find(|id| !bag_items.contains(id)) {
        return Err(AppError::Validation(format!(
            "item with id {missing} is not in the bag"
        )));
    }

    let mut merged = already.clone();
    merged.extend(requested.iter().copied());
    if merged.len() > MAX_REMOVED_ITEMS {
        return Err(AppError::Constraint(format!(
            "cannot remove more than {MAX_REMOVED_ITEMS} items from the bag"
        )));
    }
    Ok(merged)
}

async fn removed_ids<C: sea_orm::ConnectionTrait>(
    conn: &C,
    cart_entry_id: Uuid,
) -> Result<BTreeSet<i32>, sea_orm::DbErr> {
    let rows = RemovedItems::find()
        .filter(RemovedItemCol::CartEntryId.eq(cart_entry_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| row.item_id).collect())
}

fn entry_from_parts(
    entry: CartEntryModel,
    bag: BagModel,
    items: Vec<BagItemModel>,
    removed: BTreeSet<i32>,
) -> AppResult<CartEntry> {
    Ok(CartEntry {
        id: entry.id,
        user_id: entry.user_id,
        bag: bag_from_parts(bag, items)?,
        removed_item_ids: removed.into_iter().collect(),
        created_at: entry.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ids(values: &[i32]) -> BTreeSet<i32> {
        values.iter().copied().collect()
    }

    #[test]
    fn personalize_accumulates_up_to_the_cap() {
        let bag = ids(&[1, 2, 3]);

        let first = merge_removed(BagKind::Regular, &bag, &ids(&[]), &[1]).unwrap();
        assert_eq!(first, ids(&[1]));

        let second = merge_removed(BagKind::Regular, &bag, &first, &[2]).unwrap();
        assert_eq!(second, ids(&[1, 2]));

        let third = merge_removed(BagKind::Regular, &bag, &second, &[3]);
        assert!(matches!(third, Err(AppError::Constraint(_))));
    }

    #[test]
    fn duplicate_ids_do_not_double_count() {
        let bag = ids(&[1, 2, 3]);

        let merged = merge_removed(BagKind::Regular, &bag, &ids(&[1]), &[1, 2]).unwrap();
        assert_eq!(merged, ids(&[1, 2]));

        let merged = merge_removed(BagKind::Regular, &bag, &ids(&[]), &[2, 2]).unwrap();
        assert_eq!(merged, ids(&[2]));
    }

    #[test]
    fn surprise_bags_cannot_be_personalized() {
        let bag = ids(&[1, 2, 3]);
        let result = merge_removed(BagKind::Surprise, &bag, &ids(&[]), &[1]);
        assert!(matches!(result, Err(AppError::Constraint(_))));
    }

    #[test]
    fn unknown_item_id_is_rejected_before_any_merge() {
        let bag = ids(&[1, 2]);
        let result = merge_removed(BagKind::Regular, &bag, &ids(&[1]), &[2, 9]);
        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("9")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_request_is_rejected() {
        let bag = ids(&[1]);
        let result = merge_removed(BagKind::Regular, &bag, &ids(&[]), &[]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn pickup_day_is_the_utc_calendar_day() {
        // 23:30 at UTC-2 is already 01:30 the next day in UTC.
        let offset = FixedOffset::west_opt(2 * 3600).unwrap();
        let start = offset.with_ymd_and_hms(2024, 1, 9, 23, 30, 0).unwrap();
        assert_eq!(
            pickup_day(start),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }
}
