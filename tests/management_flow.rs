mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use cafe_pos_api::{
    domain::{
        pricing::Discount,
        status::{OrderStatus, PaymentMethod, PaymentStatus, Role, TableStatus},
    },
    dto::{
        auth::{LoginRequest, RegisterRequest, UpdateRoleRequest},
        categories::CreateCategoryRequest,
        favorites::AddFavoriteRequest,
        messages::CreateMessageRequest,
        orders::{ApplyDiscountRequest, OrderItemInput, RecordPaymentRequest, UpdateOrderStatusRequest},
        pos::{CompleteOrderRequest, OpenTableOrderRequest, WalkInOrderRequest},
        reviews::CreateReviewRequest,
        tables::SetTableStatusRequest,
    },
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    error::AppError,
    routes::{create_app, params::{MessageQuery, Pagination}},
    services::{
        admin_service, auth_service, category_service, favorite_service, message_service,
        pos_service, product_service, review_service, table_service,
    },
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tower::ServiceExt;
use uuid::Uuid;

use common::{create_product, create_table, create_user, database_url, setup_state, unique};

fn ensure_jwt_secret() {
    if std::env::var("JWT_SECRET").is_err() {
        // SAFETY: every test in this binary writes the same value.
        unsafe { std::env::set_var("JWT_SECRET", "flow-test-secret") };
    }
}

fn item(product_id: Uuid, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
        variant: None,
        modifiers: vec![],
        note: None,
    }
}

fn walk_in(product_id: Uuid, quantity: i32) -> WalkInOrderRequest {
    WalkInOrderRequest {
        items: vec![item(product_id, quantity)],
        order_type: None,
        payment_method: None,
        customer_name: None,
        note: None,
    }
}

#[tokio::test]
async fn busy_tables_cannot_be_deleted_and_override_clears_the_order() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let admin = create_user(&state, Role::Admin).await?;
    let coffee = create_product(&state, 18_000, &[], &[]).await?;
    let table_id = create_table(&state).await?;

    let opened = pos_service::open_table_order(
        &state,
        &staff,
        OpenTableOrderRequest {
            table_id,
            items: vec![item(coffee, 1)],
            customer_name: None,
            note: None,
        },
    )
    .await?
    .data
    .unwrap();

    let serving_delete = table_service::delete_table(&state, &admin, table_id).await;
    assert!(matches!(serving_delete, Err(AppError::Conflict(_))));

    let serving_override = table_service::set_table_status(
        &state,
        &staff,
        table_id,
        SetTableStatusRequest {
            status: TableStatus::Available,
        },
    )
    .await;
    assert!(matches!(serving_override, Err(AppError::Conflict(_))));

    let forced_serving = table_service::set_table_status(
        &state,
        &staff,
        table_id,
        SetTableStatusRequest {
            status: TableStatus::Serving,
        },
    )
    .await;
    assert!(matches!(forced_serving, Err(AppError::BadRequest(_))));

    pos_service::complete_order(
        &state,
        &staff,
        opened.order.id,
        CompleteOrderRequest {
            payment_method: Some(PaymentMethod::Cash),
        },
    )
    .await?;

    let completed = table_service::get_table(&state, &staff, table_id).await?.data.unwrap();
    assert_eq!(completed.table.status, TableStatus::Completed);
    assert_eq!(completed.table.current_order_id, Some(opened.order.id));
    let completed_delete = table_service::delete_table(&state, &admin, table_id).await;
    assert!(matches!(completed_delete, Err(AppError::Conflict(_))));

    let freed = table_service::set_table_status(
        &state,
        &staff,
        table_id,
        SetTableStatusRequest {
            status: TableStatus::Available,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(freed.status, TableStatus::Available);
    assert_eq!(freed.current_order_id, None);

    table_service::delete_table(&state, &admin, table_id).await?;
    let gone = table_service::get_table(&state, &staff, table_id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn category_with_active_products_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let admin = create_user(&state, Role::Admin).await?;

    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: unique("Pastry"),
            description: None,
            sort_order: 0,
        },
    )
    .await?
    .data
    .unwrap();

    let product_id = create_product(&state, 25_000, &[], &[]).await?;
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    let mut active: ProductActive = product.into();
    active.category_id = Set(Some(category.id));
    active.update(&state.orm).await?;

    let blocked = category_service::delete_category(&state, &admin, category.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    product_service::archive_product(&state, &admin, product_id).await?;
    category_service::delete_category(&state, &admin, category.id).await?;

    let detached = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(detached.category_id, None);
    assert!(detached.is_archived);
    Ok(())
}

#[tokio::test]
async fn discounts_are_bounded_and_frozen_once_paid() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let cake = create_product(&state, 20_000, &[], &[]).await?;

    let order = pos_service::walk_in_order(&state, &staff, walk_in(cake, 2))
        .await?
        .data
        .unwrap();
    let order_id = order.order.id;
    assert_eq!(order.order.subtotal, 40_000);

    let over = admin_service::apply_discount(
        &state,
        &staff,
        order_id,
        ApplyDiscountRequest {
            discount: Discount::Percent { value: 150 },
        },
    )
    .await;
    assert!(matches!(over, Err(AppError::BadRequest(_))));

    let clamped = admin_service::apply_discount(
        &state,
        &staff,
        order_id,
        ApplyDiscountRequest {
            discount: Discount::Amount { value: 1_000_000 },
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(clamped.order.discount, 40_000);
    assert_eq!(clamped.order.total_amount, 0);

    let quarter = admin_service::apply_discount(
        &state,
        &staff,
        order_id,
        ApplyDiscountRequest {
            discount: Discount::Percent { value: 25 },
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(quarter.order.discount, 10_000);

    let paid = admin_service::record_payment(
        &state,
        &staff,
        order_id,
        RecordPaymentRequest {
            payment_method: PaymentMethod::Card,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(paid.order.payment_status, PaymentStatus::Paid);

    let after_payment = admin_service::apply_discount(
        &state,
        &staff,
        order_id,
        ApplyDiscountRequest {
            discount: Discount::Percent { value: 50 },
        },
    )
    .await;
    assert!(matches!(after_payment, Err(AppError::Conflict(_))));

    let cancelled = pos_service::walk_in_order(&state, &staff, walk_in(cake, 1))
        .await?
        .data
        .unwrap();
    admin_service::update_order_status(
        &state,
        &staff,
        cancelled.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?;
    let after_cancel = admin_service::apply_discount(
        &state,
        &staff,
        cancelled.order.id,
        ApplyDiscountRequest {
            discount: Discount::Amount { value: 500 },
        },
    )
    .await;
    assert!(matches!(after_cancel, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn register_rejects_duplicate_email_and_login_round_trips() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    ensure_jwt_secret();
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let email = format!("{}@example.com", Uuid::new_v4().simple());

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.clone(),
            password: "correct horse".into(),
            name: "Mira".into(),
            phone: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.role, Role::Customer);

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.to_uppercase(),
            password: "another password".into(),
            name: "Mira Again".into(),
            phone: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "wrong horse".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.user.id, registered.id);

    let app = create_app(state.clone());
    let response = app
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, &login.token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

// Tokens outlive role changes; staff routes read the stored role.
#[tokio::test]
async fn demoted_staff_lose_access_before_token_expiry() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    ensure_jwt_secret();
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let admin = create_user(&state, Role::Admin).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let token = format!(
        "Bearer {}",
        auth_service::issue_token(staff.user_id, Role::Staff.as_str())?
    );

    let list_tables = |token: String| {
        let app = create_app(state.clone());
        async move {
            app.oneshot(
                Request::get("/api/tables")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
        }
    };

    assert_eq!(list_tables(token.clone()).await, StatusCode::OK);

    let self_change = admin_service::update_user_role(
        &state,
        &admin,
        admin.user_id,
        UpdateRoleRequest {
            role: Role::Customer,
        },
    )
    .await;
    assert!(matches!(self_change, Err(AppError::BadRequest(_))));

    let demoted = admin_service::update_user_role(
        &state,
        &admin,
        staff.user_id,
        UpdateRoleRequest {
            role: Role::Customer,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(demoted.role, Role::Customer);

    assert_eq!(list_tables(token).await, StatusCode::FORBIDDEN);

    let unknown = format!(
        "Bearer {}",
        auth_service::issue_token(Uuid::new_v4(), Role::Admin.as_str())?
    );
    assert_eq!(list_tables(unknown).await, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn reviews_are_one_per_user_and_target() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product = create_product(&state, 30_000, &[], &[]).await?;

    let review = |rating: i32, comment: &str| CreateReviewRequest {
        rating,
        comment: Some(comment.to_string()),
    };

    // Two café reviews racing must still leave a single row.
    let (first, second) = tokio::join!(
        review_service::upsert_review(&state, &customer, None, review(4, "Cozy")),
        review_service::upsert_review(&state, &customer, None, review(5, "Great beans")),
    );
    let first = first?.data.unwrap();
    let second = second?.data.unwrap();
    assert_eq!(first.id, second.id);

    let cafe = review_service::list_reviews(&state, None, None).await?.data.unwrap();
    let mine: Vec<_> = cafe
        .items
        .iter()
        .filter(|r| r.user_id == customer.user_id)
        .collect();
    assert_eq!(mine.len(), 1);

    let replaced = review_service::upsert_review(&state, &customer, None, review(2, "  "))
        .await?
        .data
        .unwrap();
    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.rating, 2);
    assert_eq!(replaced.comment, None);

    let on_product = review_service::upsert_review(&state, &customer, Some(product), review(3, "Fine"))
        .await?
        .data
        .unwrap();
    assert_ne!(on_product.id, first.id);
    let again = review_service::upsert_review(&state, &customer, Some(product), review(5, "Better"))
        .await?
        .data
        .unwrap();
    assert_eq!(again.id, on_product.id);

    let listed = review_service::list_reviews(&state, None, Some(product))
        .await?
        .data
        .unwrap();
    assert_eq!(listed.count, 1);
    assert_eq!(listed.average_rating, Some(5.0));
    assert_eq!(listed.items[0].comment.as_deref(), Some("Better"));
    Ok(())
}

#[tokio::test]
async fn favoriting_twice_keeps_one_row() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let product_id = create_product(&state, 12_000, &[], &[]).await?;

    let first = favorite_service::add_favorite(&state, &customer, AddFavoriteRequest { product_id })
        .await?
        .data
        .unwrap();
    let second = favorite_service::add_favorite(&state, &customer, AddFavoriteRequest { product_id })
        .await?
        .data
        .unwrap();
    assert_eq!(first.id, second.id);

    let listed = favorite_service::list_favorites(&state, &customer, Pagination::default()).await?;
    assert_eq!(listed.meta.as_ref().and_then(|m| m.total), Some(1));
    assert_eq!(listed.data.unwrap().items.len(), 1);

    favorite_service::remove_favorite(&state, &customer, product_id).await?;
    let removed_again = favorite_service::remove_favorite(&state, &customer, product_id).await;
    assert!(matches!(removed_again, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn unread_filter_hides_messages_once_read() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::Customer).await?;

    let message = message_service::create_message(
        &state,
        None,
        CreateMessageRequest {
            name: "Visitor".into(),
            email: "visitor@example.com".into(),
            subject: unique("Opening hours"),
            body: "Are you open on holidays?".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!message.is_read);
    assert_eq!(message.user_id, None);

    let denied = message_service::list_messages(&state, &customer, MessageQuery::default()).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let unread_ids = |unread_only: bool| {
        let state = state.clone();
        let admin = admin.clone();
        async move {
            let query = MessageQuery {
                page: Some(1),
                per_page: Some(100),
                unread_only: Some(unread_only),
            };
            let list = message_service::list_messages(&state, &admin, query)
                .await?
                .data
                .unwrap();
            anyhow::Ok(list.items.into_iter().map(|m| m.id).collect::<Vec<_>>())
        }
    };

    assert!(unread_ids(true).await?.contains(&message.id));

    let read = message_service::mark_read(&state, &admin, message.id)
        .await?
        .data
        .unwrap();
    assert!(read.is_read);

    assert!(!unread_ids(true).await?.contains(&message.id));
    assert!(unread_ids(false).await?.contains(&message.id));
    Ok(())
}
