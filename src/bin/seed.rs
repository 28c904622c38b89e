use cafe_pos_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::status::{Role, TableStatus},
    entity::{
        categories::{self, Entity as Categories},
        dining_tables::{self, Entity as DiningTables},
        products::{self, Entity as Products},
        settings::{self as settings_entity, Entity as SettingsEntity},
        users::{self, Entity as Users},
    },
    models::ProductOption,
    services::{auth_service::hash_password, settings_service},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "Admin", "admin1234", Role::Admin).await?;
    let staff_id = ensure_user(&orm, "staff@example.com", "Cashier", "staff1234", Role::Staff).await?;
    let customer_id =
        ensure_user(&orm, "customer@example.com", "Customer", "customer1234", Role::Customer).await?;
    ensure_settings(&orm).await?;
    seed_menu(&orm).await?;
    seed_tables(&orm).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Staff ID: {staff_id}, Customer ID: {customer_id}"
    );
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        name: Set(name.to_string()),
        phone: Set(None),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn ensure_settings(orm: &DatabaseConnection) -> anyhow::Result<()> {
    if SettingsEntity::find_by_id(settings_service::SETTINGS_ID)
        .one(orm)
        .await?
        .is_some()
    {
        return Ok(());
    }
    let defaults = settings_service::default_settings();
    settings_entity::ActiveModel {
        id: Set(settings_service::SETTINGS_ID),
        cafe_name: Set("Kopi Senja".into()),
        address: Set("Jl. Merdeka 17".into()),
        phone: Set("+62 21 555 0101".into()),
        currency: Set(defaults.currency),
        tax_rate_bps: Set(1_000),
        opening_hours: Set("07:00-22:00".into()),
        updated_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(())
}

fn options(items: &[(&str, i64)]) -> anyhow::Result<serde_json::Value> {
    let options: Vec<ProductOption> = items
        .iter()
        .map(|(name, price)| ProductOption {
            name: (*name).to_string(),
            price: *price,
        })
        .collect();
    Ok(serde_json::to_value(options)?)
}

async fn ensure_category(
    orm: &DatabaseConnection,
    name: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Categories::find()
        .filter(categories::Column::Name.eq(name))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        sort_order: Set(sort_order),
        is_archived: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(category.id)
}

async fn seed_menu(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let coffee = ensure_category(orm, "Coffee", 1).await?;
    let tea = ensure_category(orm, "Tea", 2).await?;
    let food = ensure_category(orm, "Food", 3).await?;

    let milk = [("Oat milk", 5_000), ("Extra shot", 6_000)];
    let sizes = [("Regular", 25_000), ("Large", 32_000)];

    let menu = vec![
        (coffee, "Espresso", "Double shot", 18_000, options(&[])?, options(&milk[1..])?),
        (coffee, "Cafe Latte", "Espresso with steamed milk", 25_000, options(&sizes)?, options(&milk)?),
        (coffee, "Cappuccino", "Espresso, milk and foam", 25_000, options(&sizes)?, options(&milk)?),
        (tea, "Jasmine Tea", "Hot or iced", 15_000, options(&[("Hot", 15_000), ("Iced", 17_000)])?, options(&[])?),
        (tea, "Matcha Latte", "Stone ground matcha", 28_000, options(&[])?, options(&milk[..1])?),
        (food, "Butter Croissant", "Baked every morning", 22_000, options(&[])?, options(&[])?),
        (food, "Banana Bread", "Served warm", 20_000, options(&[])?, options(&[("Butter", 3_000)])?),
    ];

    for (category_id, name, description, price, variants, modifiers) in menu {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let now = Utc::now();
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(Some(category_id)),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            image_url: Set(None),
            variants: Set(variants),
            modifiers: Set(modifiers),
            is_available: Set(true),
            is_archived: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }
    Ok(())
}

async fn seed_tables(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let tables = [
        ("T1", "Indoor", 2),
        ("T2", "Indoor", 4),
        ("T3", "Indoor", 4),
        ("P1", "Patio", 6),
    ];
    for (name, area, capacity) in tables {
        let exists = DiningTables::find()
            .filter(dining_tables::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let now = Utc::now();
        dining_tables::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            area: Set(area.to_string()),
            capacity: Set(capacity),
            status: Set(TableStatus::Available.as_str().to_string()),
            current_order_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }
    Ok(())
}
