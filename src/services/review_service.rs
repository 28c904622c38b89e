use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList, SetReviewVisibilityRequest},
    entity::{
        products::Entity as Products,
        reviews::{ActiveModel, Column, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Review,
    response::ApiResponse,
    state::AppState,
};

/// Reviews for one product, or for the café itself when `product_id` is `None`.
/// Hidden reviews are only listed for admins and never count toward the average.
pub async fn list_reviews(
    state: &AppState,
    user: Option<&AuthUser>,
    product_id: Option<Uuid>,
) -> AppResult<ApiResponse<ReviewList>> {
    let is_admin = user.is_some_and(|u| ensure_admin(u).is_ok());

    let mut finder = match product_id {
        Some(id) => Reviews::find().filter(Column::ProductId.eq(id)),
        None => Reviews::find().filter(Column::ProductId.is_null()),
    };
    if !is_admin {
        finder = finder.filter(Column::IsHidden.eq(false));
    }
    let items: Vec<Review> = finder
        .order_by_desc(Column::UpdatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    let (count, average_rating) = rating_stats(&items);
    Ok(ApiResponse::ok(
        "Reviews",
        ReviewList {
            items,
            average_rating,
            count,
        },
    ))
}

/// One review per user and target, the café or a product. A second submission
/// replaces the first.
pub async fn upsert_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Option<Uuid>,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    if let Some(id) = product_id {
        let product = Products::find_by_id(id).one(&state.orm).await?;
        if product.is_none_or(|p| p.is_archived) {
            return Err(AppError::NotFound);
        }
    }

    let comment = payload.comment.filter(|c| !c.trim().is_empty());

    // Café reviews are unique through the partial index on `user_id`.
    let conflict_target = match product_id {
        Some(_) => "(user_id, product_id)",
        None => "(user_id) WHERE product_id IS NULL",
    };
    let sql = format!(
        r#"
        INSERT INTO reviews (id, user_id, product_id, rating, comment, is_hidden)
        VALUES ($1, $2, $3, $4, $5, FALSE)
        ON CONFLICT {conflict_target}
        DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = NOW()
        RETURNING id
        "#
    );
    let pool = state.orm.get_postgres_connection_pool();
    let id: Uuid = sqlx::query_scalar(&sql)
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(product_id)
        .bind(payload.rating)
        .bind(comment)
        .fetch_one(pool)
        .await?;

    let review = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::ok("Review saved", Review::from(review)))
}

pub async fn set_review_visibility(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetReviewVisibilityRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.is_hidden = Set(payload.is_hidden);
    let review = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Review updated", Review::from(review)))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Reviews::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::ok("Deleted", serde_json::json!({})))
}

/// Count and mean rating of the visible reviews, rounded to one decimal.
pub fn rating_stats(reviews: &[Review]) -> (i64, Option<f64>) {
    let visible: Vec<i32> = reviews
        .iter()
        .filter(|r| !r.is_hidden)
        .map(|r| r.rating)
        .collect();
    if visible.is_empty() {
        return (0, None);
    }
    let count = visible.len() as i64;
    let sum: i64 = visible.iter().map(|r| i64::from(*r)).sum();
    let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;
    (count, Some(average))
}
