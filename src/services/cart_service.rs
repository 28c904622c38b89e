use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    domain::pricing,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, ProductOption, from_json, to_json},
    response::ApiResponse,
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(product) = products.get(&row.product_id) else {
            continue;
        };
        let modifiers: Vec<String> = from_json(row.modifiers)?;
        // Lines whose options were edited away show the base price; checkout rejects them.
        let unit_price = unit_price_for(product, row.variant.as_deref(), &modifiers)
            .unwrap_or(product.price);
        items.push(CartItemDto {
            id: row.id,
            product: Product::try_from(product.clone())?,
            quantity: row.quantity,
            variant: row.variant,
            modifiers,
            note: row.note,
            unit_price,
            line_total: unit_price.saturating_mul(i64::from(row.quantity)),
        });
    }

    let subtotal = items.iter().map(|i| i.line_total).sum();
    Ok(ApiResponse::ok("OK", CartList { items, subtotal }))
}

/// Adding the same product with the same options bumps the existing line.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    validate_quantity(payload.quantity)?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    if product.is_archived || !product.is_available {
        return Err(AppError::BadRequest(format!("{} is not available", product.name)));
    }

    let mut modifiers = payload.modifiers;
    modifiers.sort();
    unit_price_for(&product, payload.variant.as_deref(), &modifiers)?;

    let variant_filter = match payload.variant.as_ref() {
        Some(variant) => Condition::all().add(CartCol::Variant.eq(variant.clone())),
        None => Condition::all().add(CartCol::Variant.is_null()),
    };
    let candidates = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product.id))
        .filter(variant_filter)
        .all(&state.orm)
        .await?;

    let mut existing = None;
    for line in candidates {
        let line_modifiers: Vec<String> = from_json(line.modifiers.clone())?;
        if line_modifiers == modifiers {
            existing = Some(line);
            break;
        }
    }

    match existing {
        Some(line) => {
            let quantity = line
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
            let mut active: CartActive = line.into();
            active.quantity = Set(quantity);
            if payload.note.is_some() {
                active.note = Set(payload.note);
            }
            active.update(&state.orm).await?;
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                variant: Set(payload.variant),
                modifiers: Set(to_json(&modifiers)?),
                note: Set(payload.note),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    tracing::debug!(user_id = %user.user_id, product_id = %product.id, "cart updated");
    list_cart(state, user).await
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartList>> {
    validate_quantity(payload.quantity)?;
    let line = CartItems::find_by_id(id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CartActive = line.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    list_cart(state, user).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::ok("Removed from cart", serde_json::json!({})))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::ok(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected }),
    ))
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn unit_price_for(
    product: &ProductModel,
    variant: Option<&str>,
    modifiers: &[String],
) -> AppResult<i64> {
    let variants: Vec<ProductOption> = from_json(product.variants.clone())?;
    let options: Vec<ProductOption> = from_json(product.modifiers.clone())?;
    pricing::resolve_unit_price(product.price, &variants, &options, variant, modifiers)
}
