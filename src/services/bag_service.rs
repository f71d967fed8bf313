use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::bags::{BagList, CreateBagRequest, SetAvailabilityRequest, UpdateBagRequest},
    entity::{
        bag_items::{
            ActiveModel as BagItemActive, Column as BagItemCol, Entity as BagItems,
            Model as BagItemModel,
        },
        bags::{ActiveModel as BagActive, Column as BagCol, Entity as Bags, Model as BagModel},
        establishments::{Entity as Establishments, Model as EstablishmentModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, is_admin},
    models::{Bag, BagItem, BagKind},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn create_bag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBagRequest,
) -> AppResult<ApiResponse<Bag>> {
    ensure_establishment_owner(&state.orm, user, payload.establishment_id).await?;

    if payload.pickup_start > payload.pickup_end {
        return Err(AppError::Validation(
            "pickup window start must not be after its end".into(),
        ));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if payload.items.is_empty() {
        return Err(AppError::Validation(
            "bag must contain at least one item".into(),
        ));
    }
    let mut seen: BTreeSet<i32> = BTreeSet::new();
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "item {} must have a quantity greater than 0",
                item.id
            )));
        }
        if !seen.insert(item.id) {
            return Err(AppError::Validation(format!(
                "duplicate item id {} in bag",
                item.id
            )));
        }
    }

    let txn = state.orm.begin().await?;

    let bag = BagActive {
        id: Set(Uuid::new_v4()),
        establishment_id: Set(payload.establishment_id),
        kind: Set(payload.kind.as_str().to_string()),
        size: Set(payload.size),
        tags: Set(payload.tags),
        price: Set(payload.price),
        pickup_start: Set(payload.pickup_start.into()),
        pickup_end: Set(payload.pickup_end.into()),
        available: Set(true),
        created_at: Set(state.clock.now().into()),
    }
    .insert(&txn)
    .await?;

    let item_rows: Vec<BagItemActive> = payload
        .items
        .into_iter()
        .map(|item| BagItemActive {
            bag_id: Set(bag.id),
            item_id: Set(item.id),
            name: Set(item.name),
            quantity: Set(item.quantity),
        })
        .collect();
    BagItems::insert_many(item_rows).exec(&txn).await?;

    let items = load_bag_items(&txn, bag.id).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::BagPublish,
        Some(serde_json::json!({ "bag_id": bag.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Bag published",
        bag_from_parts(bag, items)?,
        None,
    ))
}

/// Browse view: available bags whose pickup window has not yet closed.
pub async fn list_available(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<BagList>> {
    let (page, limit, offset) = pagination.normalize();
    let now = state.clock.now();

    let finder = Bags::find()
        .filter(BagCol::Available.eq(true))
        .filter(BagCol::PickupEnd.gt(now))
        .order_by_asc(BagCol::PickupStart);

    let total = finder.clone().count(&state.orm).await? as i64;
    let bags = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = bags_with_items(&state.orm, bags).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", BagList { items }, Some(meta)))
}

pub async fn get_bag(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Bag>> {
    let bag = Bags::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = load_bag_items(&state.orm, bag.id).await?;
    Ok(ApiResponse::success(
        "OK",
        bag_from_parts(bag, items)?,
        Some(Meta::empty()),
    ))
}

/// Establishment view: every bag, available or not.
pub async fn list_by_establishment(
    state: &AppState,
    establishment_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<BagList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Bags::find()
        .filter(BagCol::EstablishmentId.eq(establishment_id))
        .order_by_asc(BagCol::PickupStart);

    let total = finder.clone().count(&state.orm).await? as i64;
    let bags = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = bags_with_items(&state.orm, bags).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", BagList { items }, Some(meta)))
}

pub async fn set_availability(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetAvailabilityRequest,
) -> AppResult<ApiResponse<Bag>> {
    let bag = Bags::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_establishment_owner(&state.orm, user, bag.establishment_id).await?;

    let mut active: BagActive = bag.into();
    active.available = Set(payload.available);
    let bag = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::BagAvailability,
        Some(serde_json::json!({ "bag_id": bag.id, "available": payload.available })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let items = load_bag_items(&state.orm, bag.id).await?;
    Ok(ApiResponse::success(
        "Availability updated",
        bag_from_parts(bag, items)?,
        Some(Meta::empty()),
    ))
}

/// Administrative update. Kind and item contents are immutable after publish
/// so cart personalization state can never reference items that vanish.
pub async fn update_bag(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBagRequest,
) -> AppResult<ApiResponse<Bag>> {
    let bag = Bags::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_establishment_owner(&state.orm, user, bag.establishment_id).await?;

    let new_start = payload
        .pickup_start
        .map(Into::into)
        .unwrap_or(bag.pickup_start);
    let new_end = payload.pickup_end.map(Into::into).unwrap_or(bag.pickup_end);
    if new_start > new_end {
        return Err(AppError::Validation(
            "pickup window start must not be after its end".into(),
        ));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("price must not be negative".into()));
        }
    }

    let mut active: BagActive = bag.into();
    if let Some(size) = payload.size {
        active.size = Set(size);
    }
    if let Some(tags) = payload.tags {
        active.tags = Set(tags);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(start) = payload.pickup_start {
        active.pickup_start = Set(start.into());
    }
    if let Some(end) = payload.pickup_end {
        active.pickup_end = Set(end.into());
    }
    let bag = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::BagUpdate,
        Some(serde_json::json!({ "bag_id": bag.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let items = load_bag_items(&state.orm, bag.id).await?;
    Ok(ApiResponse::success(
        "Bag updated",
        bag_from_parts(bag, items)?,
        Some(Meta::empty()),
    ))
}

pub(crate) async fn ensure_establishment_owner<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    establishment_id: Uuid,
) -> AppResult<EstablishmentModel> {
    let establishment = Establishments::find_by_id(establishment_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    if establishment.owner_user_id != user.user_id && !is_admin(user) {
        return Err(AppError::Forbidden);
    }
    Ok(establishment)
}

pub(crate) async fn load_bag_items<C: ConnectionTrait>(
    conn: &C,
    bag_id: Uuid,
) -> Result<Vec<BagItemModel>, sea_orm::DbErr> {
    BagItems::find()
        .filter(BagItemCol::BagId.eq(bag_id))
        .order_by_asc(BagItemCol::ItemId)
        .all(conn)
        .await
}

pub(crate) fn bag_from_parts(bag: BagModel, items: Vec<BagItemModel>) -> AppResult<Bag> {
    let kind = BagKind::parse(&bag.kind)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown bag kind {}", bag.kind)))?;
    Ok(Bag {
        id: bag.id,
        establishment_id: bag.establishment_id,
        kind,
        size: bag.size,
        tags: bag.tags,
        price: bag.price,
        pickup_start: bag.pickup_start.with_timezone(&Utc),
        pickup_end: bag.pickup_end.with_timezone(&Utc),
        available: bag.available,
        items: items.into_iter().map(bag_item_from_entity).collect(),
        created_at: bag.created_at.with_timezone(&Utc),
    })
}

fn bag_item_from_entity(model: BagItemModel) -> BagItem {
    BagItem {
        id: model.item_id,
        name: model.name,
        quantity: model.quantity,
    }
}

async fn bags_with_items<C: ConnectionTrait>(
    conn: &C,
    bags: Vec<BagModel>,
) -> AppResult<Vec<Bag>> {
    if bags.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = bags.iter().map(|b| b.id).collect();
    let rows = BagItems::find()
        .filter(BagItemCol::BagId.is_in(ids))
        .order_by_asc(BagItemCol::ItemId)
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<BagItemModel>> = HashMap::new();
    for row in rows {
        grouped.entry(row.bag_id).or_default().push(row);
    }

    bags.into_iter()
        .map(|bag| {
            let items = grouped.remove(&bag.id).unwrap_or_default();
            bag_from_parts(bag, items)
        })
        .collect()
}
