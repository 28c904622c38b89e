use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::messages::{CreateMessageRequest, MessageList},
    entity::messages::{ActiveModel, Column, Entity as Messages},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Message,
    response::{ApiResponse, Meta},
    routes::params::MessageQuery,
    state::AppState,
};

const MAX_BODY_LEN: usize = 5_000;

/// Contact form. Anonymous visitors may write; signed-in users get linked.
pub async fn create_message(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateMessageRequest,
) -> AppResult<ApiResponse<Message>> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_string();
    let body = payload.body.trim().to_string();

    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if body.is_empty() || body.len() > MAX_BODY_LEN {
        return Err(AppError::BadRequest(format!(
            "body must be between 1 and {MAX_BODY_LEN} characters"
        )));
    }

    let message = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(name),
        email: Set(email),
        subject: Set(payload.subject.trim().to_string()),
        body: Set(body),
        is_read: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(message_id = %message.id, "contact message received");
    Ok(ApiResponse::ok("Message sent", Message::from(message)))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    query: MessageQuery,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Messages::find();
    if query.unread_only.unwrap_or(false) {
        finder = finder.filter(Column::IsRead.eq(false));
    }
    let finder = finder.order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Message::from)
        .collect();

    Ok(ApiResponse::success(
        "Messages",
        MessageList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Message>> {
    ensure_admin(user)?;
    let existing = Messages::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.is_read = Set(true);
    let message = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Message updated", Message::from(message)))
}

pub async fn delete_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Messages::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::ok("Deleted", serde_json::json!({})))
}
