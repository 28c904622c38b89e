#![allow(dead_code)]

use std::time::Duration;

use cafe_pos_api::{
    db::{create_orm_conn, run_migrations},
    domain::status::{Role, TableStatus},
    entity::{
        dining_tables::ActiveModel as TableActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    events::EventBus,
    middleware::auth::AuthUser,
    models::ProductOption,
    services::settings_service,
    state::AppState,
};
use chrono::FixedOffset;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Flow tests need Postgres; they are skipped when no URL is configured.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str, table_reset_delay: Duration) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    Ok(AppState {
        orm,
        events: EventBus::default(),
        table_reset_delay,
        business_offset: FixedOffset::east_opt(0).expect("utc offset"),
    })
}

/// Rows are keyed by fresh ids so tests can share one database without truncating.
pub fn unique(prefix: &str) -> String {
    format!("{prefix} {}", &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let email = format!("{}@example.com", Uuid::new_v4().simple());
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set("dummy".into()),
        name: Set(unique(role.as_str())),
        phone: Set(None),
        role: Set(role.as_str().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    variants: &[(&str, i64)],
    modifiers: &[(&str, i64)],
) -> anyhow::Result<Uuid> {
    let to_options = |items: &[(&str, i64)]| -> Vec<ProductOption> {
        items
            .iter()
            .map(|(name, price)| ProductOption {
                name: (*name).to_string(),
                price: *price,
            })
            .collect()
    };
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(None),
        name: Set(unique("Latte")),
        description: Set(None),
        price: Set(price),
        image_url: Set(None),
        variants: Set(serde_json::to_value(to_options(variants))?),
        modifiers: Set(serde_json::to_value(to_options(modifiers))?),
        is_available: Set(true),
        is_archived: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn create_table(state: &AppState) -> anyhow::Result<Uuid> {
    let table = TableActive {
        id: Set(Uuid::new_v4()),
        name: Set(unique("T")),
        area: Set("Indoor".into()),
        capacity: Set(4),
        status: Set(TableStatus::Available.as_str().into()),
        current_order_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(table.id)
}

pub async fn tax_rate_bps(state: &AppState) -> anyhow::Result<i32> {
    let settings = settings_service::get_settings(state).await?;
    Ok(settings.data.map(|s| s.tax_rate_bps).unwrap_or(0))
}
