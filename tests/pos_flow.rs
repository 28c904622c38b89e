mod common;

use std::time::Duration;

use cafe_pos_api::{
    domain::{
        pricing::{Discount, compute_tax},
        status::{ItemStatus, OrderSource, OrderStatus, OrderType, PaymentMethod, Role, TableStatus},
    },
    dto::{
        orders::OrderItemInput,
        pos::{
            AddItemsRequest, CompleteOrderRequest, OpenTableOrderRequest, QuickCheckoutRequest,
            WalkInOrderRequest,
        },
    },
    error::AppError,
    events::Resource,
    routes::params::AnalyticsQuery,
    services::{analytics_service, pos_service, table_service},
};
use uuid::Uuid;

use common::{create_product, create_table, create_user, database_url, setup_state, tax_rate_bps};

fn item(product_id: Uuid, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
        variant: None,
        modifiers: vec![],
        note: None,
    }
}

// Open a table order, add a round, settle at the counter and watch the table free up.
#[tokio::test]
async fn table_order_lifecycle_releases_table() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_millis(200)).await?;
    let mut live = state.events.subscribe();

    let staff = create_user(&state, Role::Staff).await?;
    let coffee = create_product(&state, 20_000, &[], &[]).await?;
    let cake = create_product(&state, 15_000, &[], &[]).await?;
    let table_id = create_table(&state).await?;

    let opened = pos_service::open_table_order(
        &state,
        &staff,
        OpenTableOrderRequest {
            table_id,
            items: vec![item(coffee, 2)],
            customer_name: None,
            note: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(opened.order.status, OrderStatus::Confirmed);
    assert_eq!(opened.order.source, OrderSource::Pos);
    assert_eq!(opened.order.order_type, OrderType::DineIn);
    assert_eq!(opened.order.table_id, Some(table_id));

    let created = live.recv().await?;
    assert_eq!(created.resource, Resource::Orders);
    assert_eq!(created.action, "created");

    let detail = table_service::get_table(&state, &staff, table_id).await?.data.unwrap();
    assert_eq!(detail.table.status, TableStatus::Serving);
    assert_eq!(detail.table.current_order_id, Some(opened.order.id));
    assert_eq!(opened.order.customer_name, detail.table.name);

    // One open order per table.
    let second = pos_service::open_table_order(
        &state,
        &staff,
        OpenTableOrderRequest {
            table_id,
            items: vec![item(cake, 1)],
            customer_name: None,
            note: None,
        },
    )
    .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let topped_up = pos_service::add_items(
        &state,
        &staff,
        opened.order.id,
        AddItemsRequest {
            items: vec![item(cake, 1)],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(topped_up.items.len(), 2);
    assert_eq!(topped_up.order.subtotal, 55_000);
    let tax = compute_tax(55_000, tax_rate_bps(&state).await?)?;
    assert_eq!(topped_up.order.total_amount, 55_000 + tax);

    let unpaid = pos_service::complete_order(
        &state,
        &staff,
        opened.order.id,
        CompleteOrderRequest::default(),
    )
    .await;
    assert!(matches!(unpaid, Err(AppError::BadRequest(_))));

    let completed = pos_service::complete_order(
        &state,
        &staff,
        opened.order.id,
        CompleteOrderRequest {
            payment_method: Some(PaymentMethod::Ewallet),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.order.order.status, OrderStatus::Completed);
    assert!(completed.order.items.iter().all(|i| i.status == ItemStatus::Served));
    assert_eq!(completed.invoice.total_amount, completed.order.order.total_amount);
    assert_eq!(completed.invoice.payment_method, PaymentMethod::Ewallet);
    assert_eq!(completed.invoice.table_name.as_deref(), Some(detail.table.name.as_str()));

    let after = table_service::get_table(&state, &staff, table_id).await?.data.unwrap();
    assert_eq!(after.table.status, TableStatus::Completed);

    let late_items = pos_service::add_items(
        &state,
        &staff,
        opened.order.id,
        AddItemsRequest {
            items: vec![item(cake, 1)],
        },
    )
    .await;
    assert!(matches!(late_items, Err(AppError::Conflict(_))));

    tokio::time::sleep(Duration::from_millis(600)).await;
    let released = table_service::get_table(&state, &staff, table_id).await?.data.unwrap();
    assert_eq!(released.table.status, TableStatus::Available);
    assert_eq!(released.table.current_order_id, None);

    Ok(())
}

#[tokio::test]
async fn quick_checkout_and_walk_in_show_up_in_sales() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;

    let staff = create_user(&state, Role::Staff).await?;
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let croissant = create_product(&state, 22_000, &[], &[]).await?;

    let quick = pos_service::quick_checkout(
        &state,
        &staff,
        QuickCheckoutRequest {
            items: vec![item(croissant, 5)],
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            discount: Some(Discount::Percent { value: 10 }),
        },
    )
    .await?
    .data
    .unwrap();
    let tax = compute_tax(110_000 - 11_000, tax_rate_bps(&state).await?)?;
    assert_eq!(quick.order.order.status, OrderStatus::Completed);
    assert_eq!(quick.order.order.customer_name, "Walk-in");
    assert_eq!(quick.order.order.discount, 11_000);
    assert_eq!(quick.invoice.discount, 11_000);
    assert_eq!(quick.invoice.total_amount, 99_000 + tax);

    let walk_in = pos_service::walk_in_order(
        &state,
        &staff,
        WalkInOrderRequest {
            items: vec![item(croissant, 1)],
            order_type: None,
            payment_method: None,
            customer_name: Some("Rin".into()),
            note: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(walk_in.order.order_type, OrderType::Takeaway);
    assert_eq!(walk_in.order.status, OrderStatus::Confirmed);

    let walk_in_done = pos_service::complete_order(
        &state,
        &staff,
        walk_in.order.id,
        CompleteOrderRequest {
            payment_method: Some(PaymentMethod::Card),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(walk_in_done.invoice.table_name.is_none());

    let forbidden = analytics_service::sales_report(&state, &staff, AnalyticsQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let report = analytics_service::sales_report(&state, &admin, AnalyticsQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(report.daily.len(), 7);
    assert_eq!(report.hourly.len(), 24);
    assert!(report.summary.invoices >= 2);
    assert!(report.summary.revenue >= quick.invoice.total_amount + walk_in_done.invoice.total_amount);
    let sold = report
        .top_products
        .iter()
        .find(|p| p.product_id == croissant)
        .map(|p| p.quantity);
    assert!(sold.is_none_or(|q| q == 6), "croissant lines add up when ranked");

    let customer_walk_in = pos_service::walk_in_order(
        &state,
        &customer,
        WalkInOrderRequest {
            items: vec![item(croissant, 1)],
            order_type: None,
            payment_method: None,
            customer_name: None,
            note: None,
        },
    )
    .await;
    assert!(matches!(customer_walk_in, Err(AppError::Forbidden)));

    Ok(())
}
