use artisan_marketplace_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    models::{ListingStatus, Role, ShippingInfo},
    services::auth_service::hash_password,
};
use uuid::Uuid;

struct SeedListing {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    price: i64,
    tags: &'static [&'static str],
}

const LISTINGS: &[SeedListing] = &[
    SeedListing {
        title: "Blue Pottery Flower Vase",
        description: "Hand-painted Jaipur blue pottery vase with floral motifs.",
        category: "Pottery",
        price: 129_900,
        tags: &["pottery", "jaipur", "vase", "home decor"],
    },
    SeedListing {
        title: "Handwoven Cotton Dhurrie",
        description: "Flat-woven cotton rug dyed with natural indigo.",
        category: "Textiles",
        price: 349_900,
        tags: &["rug", "cotton", "handwoven"],
    },
    SeedListing {
        title: "Brass Diya Set",
        description: "Set of four cast brass oil lamps, polished by hand.",
        category: "Metalwork",
        price: 89_900,
        tags: &["brass", "diya", "festive"],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "Admin", Role::Admin).await?;
    let artisan_id = ensure_user(
        &pool,
        "artisan@example.com",
        "artisan123",
        "Meera Kumari",
        Role::Artisan,
    )
    .await?;
    let buyer_id =
        ensure_user(&pool, "buyer@example.com", "buyer123", "Rohan Shah", Role::Buyer).await?;

    sqlx::query(
        r#"
        UPDATE users
        SET location = 'Jaipur, Rajasthan', bio = 'Third-generation potter.',
            specialization = 'Blue pottery', years_of_experience = 15
        WHERE id = $1
        "#,
    )
    .bind(artisan_id)
    .execute(&pool)
    .await?;

    seed_listings(&pool, artisan_id).await?;

    println!("Seed completed. Admin: {admin_id}, Artisan: {artisan_id}, Buyer: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    display_name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_listings(pool: &sqlx::PgPool, artisan_id: Uuid) -> anyhow::Result<()> {
    let shipping = serde_json::to_value(ShippingInfo::default())?;
    for listing in LISTINGS {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM listings WHERE artisan_id = $1 AND title = $2")
                .bind(artisan_id)
                .bind(listing.title)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO listings
                (id, artisan_id, title, description, price, original_price, category, tags,
                 status, shipping_info)
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(artisan_id)
        .bind(listing.title)
        .bind(listing.description)
        .bind(listing.price)
        .bind(listing.category)
        .bind(serde_json::json!(listing.tags))
        .bind(ListingStatus::Active.as_str())
        .bind(&shipping)
        .execute(pool)
        .await?;
        println!("Seeded listing {}", listing.title);
    }
    Ok(())
}
