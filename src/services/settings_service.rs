use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    audit,
    dto::settings::UpdateSettingsRequest,
    entity::settings::{ActiveModel, Entity as Settings, Model as SettingsModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models,
    response::ApiResponse,
    state::AppState,
};

pub const SETTINGS_ID: i32 = 1;
pub const MAX_TAX_RATE_BPS: i32 = 10_000;

/// Values served before an admin saves anything.
pub fn default_settings() -> SettingsModel {
    SettingsModel {
        id: SETTINGS_ID,
        cafe_name: "Cafe".to_string(),
        address: String::new(),
        phone: String::new(),
        currency: "VND".to_string(),
        tax_rate_bps: 0,
        opening_hours: String::new(),
        updated_at: Utc::now().into(),
    }
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<models::Settings>> {
    let settings = Settings::find_by_id(SETTINGS_ID)
        .one(&state.orm)
        .await?
        .unwrap_or_else(default_settings);
    Ok(ApiResponse::ok("Settings", models::Settings::from(settings)))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<models::Settings>> {
    ensure_admin(user)?;
    if let Some(rate) = payload.tax_rate_bps {
        if !(0..=MAX_TAX_RATE_BPS).contains(&rate) {
            return Err(AppError::BadRequest(
                "tax_rate_bps must be between 0 and 10000".into(),
            ));
        }
    }
    if payload.cafe_name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("cafe_name must not be empty".into()));
    }

    let existing = Settings::find_by_id(SETTINGS_ID).one(&state.orm).await?;
    let is_new = existing.is_none();
    let mut active: ActiveModel = existing.unwrap_or_else(default_settings).into();

    if let Some(cafe_name) = payload.cafe_name {
        active.cafe_name = Set(cafe_name.trim().to_string());
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(currency) = payload.currency {
        active.currency = Set(currency.trim().to_uppercase());
    }
    if let Some(rate) = payload.tax_rate_bps {
        active.tax_rate_bps = Set(rate);
    }
    if let Some(opening_hours) = payload.opening_hours {
        active.opening_hours = Set(opening_hours);
    }
    active.updated_at = Set(Utc::now().into());

    let settings = if is_new {
        active.insert(&state.orm).await?
    } else {
        active.update(&state.orm).await?
    };

    tracing::info!(tax_rate_bps = settings.tax_rate_bps, "settings updated");
    audit::record(
        state,
        Some(user.user_id),
        "settings_update",
        "settings",
        serde_json::json!({ "tax_rate_bps": settings.tax_rate_bps, "currency": settings.currency }),
    )
    .await;

    Ok(ApiResponse::ok("Settings updated", models::Settings::from(settings)))
}
