use cafe_pos_api::{
    domain::status::{
        ItemStatus, OrderStatus, OrderType, PaymentMethod, Role, TableStatus, derive_order_status,
    },
    error::AppError,
    events::{EventBus, LiveEvent, Resource},
};
use chrono::Utc;
use uuid::Uuid;

#[test]
fn orders_move_forward_only() {
    use OrderStatus::*;

    assert!(Pending.can_transition_to(Confirmed));
    assert!(Pending.can_transition_to(Ready));
    assert!(Preparing.can_transition_to(Completed));
    assert!(Ready.can_transition_to(Cancelled));

    assert!(!Ready.can_transition_to(Preparing));
    assert!(!Confirmed.can_transition_to(Confirmed));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Pending));

    let err = Completed.ensure_transition(Ready).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn items_move_forward_only() {
    assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Ready));
    assert!(ItemStatus::Ready.can_transition_to(ItemStatus::Served));
    assert!(!ItemStatus::Served.can_transition_to(ItemStatus::Ready));
    assert!(!ItemStatus::Preparing.can_transition_to(ItemStatus::Preparing));
}

#[test]
fn order_status_follows_kitchen_progress() {
    use ItemStatus as I;

    assert_eq!(
        derive_order_status(OrderStatus::Confirmed, &[I::Preparing, I::Pending]),
        Some(OrderStatus::Preparing)
    );
    assert_eq!(
        derive_order_status(OrderStatus::Preparing, &[I::Ready, I::Served]),
        Some(OrderStatus::Ready)
    );
    assert_eq!(
        derive_order_status(OrderStatus::Preparing, &[I::Ready, I::Pending]),
        None
    );
    assert_eq!(derive_order_status(OrderStatus::Confirmed, &[I::Pending]), None);
    assert_eq!(derive_order_status(OrderStatus::Ready, &[I::Served]), None);
    assert_eq!(derive_order_status(OrderStatus::Completed, &[I::Ready]), None);
    assert_eq!(derive_order_status(OrderStatus::Confirmed, &[]), None);
}

#[test]
fn pending_orders_wait_for_confirmation_before_ready() {
    use ItemStatus as I;

    assert_eq!(derive_order_status(OrderStatus::Pending, &[I::Ready]), None);
    assert_eq!(derive_order_status(OrderStatus::Pending, &[I::Served, I::Ready]), None);
    assert_eq!(
        derive_order_status(OrderStatus::Pending, &[I::Preparing, I::Ready]),
        Some(OrderStatus::Preparing)
    );
    assert_eq!(
        derive_order_status(OrderStatus::Confirmed, &[I::Ready]),
        Some(OrderStatus::Ready)
    );
}

#[test]
fn only_a_preparing_item_starts_the_order() {
    use ItemStatus as I;

    assert_eq!(derive_order_status(OrderStatus::Confirmed, &[I::Ready, I::Pending]), None);
    assert_eq!(derive_order_status(OrderStatus::Pending, &[I::Served, I::Pending]), None);
    assert_eq!(
        derive_order_status(OrderStatus::Confirmed, &[I::Ready, I::Preparing]),
        Some(OrderStatus::Preparing)
    );
}

#[test]
fn enums_parse_from_stored_text() {
    assert_eq!("dine_in".parse::<OrderType>().unwrap(), OrderType::DineIn);
    assert_eq!("ewallet".parse::<PaymentMethod>().unwrap(), PaymentMethod::Ewallet);
    assert_eq!("completed".parse::<TableStatus>().unwrap(), TableStatus::Completed);
    assert!("bitcoin".parse::<PaymentMethod>().is_err());
    assert!("owner".parse::<Role>().is_err());
}

#[test]
fn staff_roles() {
    assert!(Role::Admin.is_staff());
    assert!(Role::Staff.is_staff());
    assert!(!Role::Customer.is_staff());
}

fn event(resource: Resource, owner_id: Option<Uuid>) -> LiveEvent {
    LiveEvent {
        resource,
        action: "updated".into(),
        id: Uuid::new_v4(),
        owner_id,
        data: serde_json::Value::Null,
        at: Utc::now(),
    }
}

#[test]
fn customers_only_see_their_own_order_events() {
    let customer = Uuid::new_v4();
    let other = Uuid::new_v4();

    assert!(event(Resource::Orders, Some(customer)).visible_to(customer, false));
    assert!(!event(Resource::Orders, Some(other)).visible_to(customer, false));
    assert!(!event(Resource::Tables, None).visible_to(customer, false));
    assert!(!event(Resource::Invoices, Some(customer)).visible_to(customer, false));

    assert!(event(Resource::Tables, None).visible_to(other, true));
    assert!(event(Resource::Orders, Some(customer)).visible_to(other, true));
}

#[tokio::test]
async fn event_bus_fans_out_to_subscribers() {
    let bus = EventBus::default();
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();

    let id = Uuid::new_v4();
    bus.publish(Resource::Tables, "updated", id, None, &serde_json::json!({ "name": "T1" }));

    let a = first.recv().await.unwrap();
    let b = second.recv().await.unwrap();
    assert_eq!(a.id, id);
    assert_eq!(b.action, "updated");
    assert_eq!(a.data["name"], "T1");
    assert_eq!(Resource::Tables.as_str(), "tables");
}

#[test]
fn publishing_without_subscribers_is_silent() {
    let bus = EventBus::default();
    bus.publish(Resource::Orders, "created", Uuid::new_v4(), None, &1_u8);
}
