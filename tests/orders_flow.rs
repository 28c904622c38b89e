mod common;

use std::time::Duration;

use cafe_pos_api::{
    domain::{
        pricing::compute_tax,
        status::{ItemStatus, OrderStatus, OrderType, PaymentMethod, PaymentStatus, Role},
    },
    dto::{
        cart::AddToCartRequest,
        orders::{CheckoutRequest, RecordPaymentRequest, UpdateItemStatusRequest, UpdateOrderStatusRequest},
    },
    error::AppError,
    services::{admin_service, cart_service, invoice_service, order_service},
};

use common::{create_product, create_user, database_url, setup_state, tax_rate_bps};

fn latte(product_id: uuid::Uuid, quantity: i32, modifiers: &[&str]) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity,
        variant: Some("Large".into()),
        modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
        note: None,
    }
}

// Customer: cart -> checkout. Staff: kitchen progress -> payment -> completion.
#[tokio::test]
async fn online_order_from_cart_to_invoice() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;

    let customer = create_user(&state, Role::Customer).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let product = create_product(
        &state,
        25_000,
        &[("Regular", 25_000), ("Large", 32_000)],
        &[("Oat milk", 5_000), ("Extra shot", 6_000)],
    )
    .await?;

    // Same options in a different order land on the same cart line.
    cart_service::add_to_cart(&state, &customer, latte(product, 1, &["Oat milk", "Extra shot"]))
        .await?;
    let cart = cart_service::add_to_cart(&state, &customer, latte(product, 1, &["Extra shot", "Oat milk"]))
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].unit_price, 43_000);
    assert_eq!(cart.subtotal, 86_000);

    let placed = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            order_type: OrderType::Takeaway,
            table_id: None,
            payment_method: PaymentMethod::Card,
            customer_name: None,
            customer_phone: None,
            note: Some("less ice".into()),
        },
    )
    .await?
    .data
    .unwrap();

    let tax = compute_tax(86_000, tax_rate_bps(&state).await?)?;
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(placed.order.subtotal, 86_000);
    assert_eq!(placed.order.total_amount, 86_000 + tax);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].modifiers, vec!["Extra shot", "Oat milk"]);

    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty(), "checkout empties the cart");

    // Kitchen progress drives the order status.
    let item_id = placed.items[0].id;
    let order_id = placed.order.id;
    let progressed = admin_service::update_item_status(
        &state,
        &staff,
        order_id,
        item_id,
        UpdateItemStatusRequest {
            status: ItemStatus::Preparing,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(progressed.order.status, OrderStatus::Preparing);

    let ready = admin_service::update_item_status(
        &state,
        &staff,
        order_id,
        item_id,
        UpdateItemStatusRequest {
            status: ItemStatus::Ready,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(ready.order.status, OrderStatus::Ready);

    let backwards = admin_service::update_item_status(
        &state,
        &staff,
        order_id,
        item_id,
        UpdateItemStatusRequest {
            status: ItemStatus::Preparing,
        },
    )
    .await;
    assert!(matches!(backwards, Err(AppError::Conflict(_))));

    // Completing an unpaid order needs a payment first.
    let unpaid = admin_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
        },
    )
    .await;
    assert!(matches!(unpaid, Err(AppError::BadRequest(_))));

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

    let completed = admin_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.order.status, OrderStatus::Completed);
    assert!(completed.items.iter().all(|i| i.status == ItemStatus::Served));

    // The customer can read the invoice of their own order.
    let invoice = invoice_service::get_invoice_for_order(&state, &customer, order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(invoice.order_id, order_id);
    assert_eq!(invoice.total_amount, completed.order.total_amount);
    assert_eq!(invoice.items.len(), 1);
    assert!(invoice.invoice_number.starts_with("INV-"));

    let stranger = create_user(&state, Role::Customer).await?;
    let hidden = invoice_service::get_invoice_for_order(&state, &stranger, order_id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let reopened = admin_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Preparing,
        },
    )
    .await;
    assert!(matches!(reopened, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn customers_cancel_only_their_pending_orders() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;

    let customer = create_user(&state, Role::Customer).await?;
    let other = create_user(&state, Role::Customer).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let product = create_product(&state, 18_000, &[], &[]).await?;

    let checkout = || CheckoutRequest {
        order_type: OrderType::Takeaway,
        table_id: None,
        payment_method: PaymentMethod::Cash,
        customer_name: None,
        customer_phone: None,
        note: None,
    };
    let plain = |quantity| AddToCartRequest {
        product_id: product,
        quantity,
        variant: None,
        modifiers: vec![],
        note: None,
    };

    cart_service::add_to_cart(&state, &customer, plain(1)).await?;
    let first = order_service::checkout(&state, &customer, checkout()).await?.data.unwrap();

    let foreign = order_service::cancel_order(&state, &other, first.order.id).await;
    assert!(matches!(foreign, Err(AppError::NotFound)));

    let cancelled = order_service::cancel_order(&state, &customer, first.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

    let again = order_service::cancel_order(&state, &customer, first.order.id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    // Once staff confirm, the customer can no longer withdraw.
    cart_service::add_to_cart(&state, &customer, plain(2)).await?;
    let second = order_service::checkout(&state, &customer, checkout()).await?.data.unwrap();
    admin_service::update_order_status(
        &state,
        &staff,
        second.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Confirmed,
        },
    )
    .await?;
    let late = order_service::cancel_order(&state, &customer, second.order.id).await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    // Empty carts cannot be checked out.
    let empty = order_service::checkout(&state, &customer, checkout()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    // Customers are kept away from staff endpoints.
    let forbidden = admin_service::record_payment(
        &state,
        &customer,
        second.order.id,
        RecordPaymentRequest {
            payment_method: PaymentMethod::Cash,
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}
