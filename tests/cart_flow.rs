use std::sync::Arc;

use axum_surplus_api::{
    clock::ManualClock,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::{AddBagRequest, PersonalizeRequest},
    entity::{
        bag_items::ActiveModel as BagItemActive, bags::ActiveModel as BagActive,
        establishments::ActiveModel as EstablishmentActive, users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Integration flow: one bag per establishment per pickup day, and the
// personalization rules on top of a regular bag.
#[tokio::test]
async fn establishment_day_rule_and_personalization_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let start = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let (state, clock) = setup_state(&database_url, start).await?;

    let user_id = create_user(&state).await?;
    let user = AuthUser {
        user_id,
        role: "user".into(),
    };

    let owner_id = create_user(&state).await?;
    let bakery = create_establishment(&state, owner_id).await?;
    let grocer = create_establishment(&state, owner_id).await?;

    // Two bags from the same establishment with pickup on the same day.
    let pickup_start = start + Duration::hours(4);
    let pickup_end = start + Duration::hours(8);
    let bakery_bag = create_bag(
        &state,
        bakery,
        "regular",
        pickup_start,
        pickup_end,
        &[(1, "Loaf", 1), (2, "Croissant", 2), (3, "Roll", 1)],
    )
    .await?;
    let bakery_bag_again = create_bag(
        &state,
        bakery,
        "surprise",
        pickup_start,
        pickup_end,
        &[(1, "Chef's choice", 1)],
    )
    .await?;
    let grocer_bag = create_bag(
        &state,
        grocer,
        "surprise",
        pickup_start,
        pickup_end,
        &[(1, "Veg box", 1)],
    )
    .await?;

    // First add succeeds.
    let entry = cart_service::add_bag(&state, &user, AddBagRequest { bag_id: bakery_bag })
        .await?
        .data
        .unwrap();
    assert_eq!(entry.bag.id, bakery_bag);
    assert_eq!(entry.bag.items.len(), 3);
    assert!(entry.removed_item_ids.is_empty());

    // Second bag from the same establishment on the same day is rejected.
    clock.advance(Duration::minutes(1));
    let duplicate =
        cart_service::add_bag(&state, &user, AddBagRequest { bag_id: bakery_bag_again }).await;
    assert!(matches!(duplicate, Err(AppError::Constraint(_))));

    // A different establishment is fine.
    let second = cart_service::add_bag(&state, &user, AddBagRequest { bag_id: grocer_bag })
        .await?
        .data
        .unwrap();

    // The cart holds exactly the two surviving entries, in creation order.
    let cart = cart_service::list_cart(&state, &user, page_one())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items[0].id, entry.id);
    assert_eq!(cart.items[1].id, second.id);

    // Personalize one item at a time; the third removal breaks the cap.
    let personalized = cart_service::personalize(
        &state,
        &user,
        entry.id,
        PersonalizeRequest {
            removed_item_ids: vec![1],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(personalized.removed_item_ids, vec![1]);

    let personalized = cart_service::personalize(
        &state,
        &user,
        entry.id,
        PersonalizeRequest {
            removed_item_ids: vec![2],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(personalized.removed_item_ids, vec![1, 2]);

    let over_cap = cart_service::personalize(
        &state,
        &user,
        entry.id,
        PersonalizeRequest {
            removed_item_ids: vec![3],
        },
    )
    .await;
    assert!(matches!(over_cap, Err(AppError::Constraint(_))));

    // The removed set is unchanged after the rejected call.
    let cart = cart_service::list_cart(&state, &user, page_one())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items[0].removed_item_ids, vec![1, 2]);

    // Surprise bags reject personalization outright.
    let surprise = cart_service::personalize(
        &state,
        &user,
        second.id,
        PersonalizeRequest {
            removed_item_ids: vec![1],
        },
    )
    .await;
    assert!(matches!(surprise, Err(AppError::Constraint(_))));

    // Unknown item ids are rejected without touching the removed set.
    let missing = cart_service::personalize(
        &state,
        &user,
        entry.id,
        PersonalizeRequest {
            removed_item_ids: vec![99],
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    // Removing an entry is idempotent: the second call is a quiet no-op.
    cart_service::remove_entry(&state, &user, second.id).await?;
    cart_service::remove_entry(&state, &user, second.id).await?;
    let cart = cart_service::list_cart(&state, &user, page_one())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn unavailable_bags_cannot_enter_the_cart() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let (state, _clock) = setup_state(&database_url, start).await?;

    let user_id = create_user(&state).await?;
    let user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let owner_id = create_user(&state).await?;
    let establishment = create_establishment(&state, owner_id).await?;

    let bag_id = Uuid::new_v4();
    BagActive {
        id: Set(bag_id),
        establishment_id: Set(establishment),
        kind: Set("regular".into()),
        size: Set("medium".into()),
        tags: Set(vec![]),
        price: Set(3500),
        pickup_start: Set((start + Duration::hours(2)).into()),
        pickup_end: Set((start + Duration::hours(6)).into()),
        available: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let result = cart_service::add_bag(&state, &user, AddBagRequest { bag_id }).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let unknown =
        cart_service::add_bag(&state, &user, AddBagRequest { bag_id: Uuid::new_v4() }).await;
    assert!(matches!(unknown, Err(AppError::NotFound)));

    Ok(())
}

fn page_one() -> Pagination {
    Pagination {
        page: Some(1),
        per_page: Some(20),
    }
}

async fn setup_state(
    database_url: &str,
    start: DateTime<Utc>,
) -> anyhow::Result<(AppState, Arc<ManualClock>)> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let clock = Arc::new(ManualClock::new(start));
    let state = AppState {
        pool,
        orm,
        clock: clock.clone(),
    };
    Ok((state, clock))
}

async fn create_user(state: &AppState) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("user-{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_establishment(state: &AppState, owner_user_id: Uuid) -> anyhow::Result<Uuid> {
    let establishment = EstablishmentActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Establishment {}", Uuid::new_v4())),
        owner_user_id: Set(owner_user_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(establishment.id)
}

async fn create_bag(
    state: &AppState,
    establishment_id: Uuid,
    kind: &str,
    pickup_start: DateTime<Utc>,
    pickup_end: DateTime<Utc>,
    items: &[(i32, &str, i32)],
) -> anyhow::Result<Uuid> {
    let bag = BagActive {
        id: Set(Uuid::new_v4()),
        establishment_id: Set(establishment_id),
        kind: Set(kind.into()),
        size: Set("medium".into()),
        tags: Set(vec![]),
        price: Set(4900),
        pickup_start: Set(pickup_start.into()),
        pickup_end: Set(pickup_end.into()),
        available: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for (item_id, name, quantity) in items {
        BagItemActive {
            bag_id: Set(bag.id),
            item_id: Set(*item_id),
            name: Set((*name).into()),
            quantity: Set(*quantity),
        }
        .insert(&state.orm)
        .await?;
    }

    Ok(bag.id)
}
