use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_surplus_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user123", "user").await?;
    let owner_id =
        ensure_user_with_role(&pool, "bakery@example.com", "bakery123", "establishment").await?;

    let establishment_id = ensure_establishment(&pool, "Corner Bakery", owner_id).await?;
    seed_bags(&pool, establishment_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_establishment(
    pool: &sqlx::PgPool,
    name: &str,
    owner_user_id: Uuid,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM establishments WHERE name = $1 AND owner_user_id = $2")
            .bind(name)
            .bind(owner_user_id)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO establishments (id, name, owner_user_id) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(owner_user_id)
        .execute(pool)
        .await?;

    println!("Ensured establishment {name}");
    Ok(id)
}

async fn seed_bags(pool: &sqlx::PgPool, establishment_id: Uuid) -> anyhow::Result<()> {
    let pickup_start = Utc::now() + Duration::hours(2);
    let pickup_end = pickup_start + Duration::hours(4);

    let bags = vec![
        ("regular", "medium", 4900_i64, vec![(1, "Sourdough loaf", 1), (2, "Croissant", 2), (3, "Cinnamon roll", 1)]),
        ("surprise", "small", 2900_i64, vec![(1, "Chef's choice", 1)]),
    ];

    for (kind, size, price, items) in bags {
        let bag_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO bags (id, establishment_id, kind, size, tags, price, pickup_start, pickup_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bag_id)
        .bind(establishment_id)
        .bind(kind)
        .bind(size)
        .bind(vec!["bakery".to_string()])
        .bind(price)
        .bind(pickup_start)
        .bind(pickup_end)
        .execute(pool)
        .await?;

        for (item_id, name, quantity) in items {
            sqlx::query(
                "INSERT INTO bag_items (bag_id, item_id, name, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(bag_id)
            .bind(item_id as i32)
            .bind(name)
            .bind(quantity as i32)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded bags");
    Ok(())
}
