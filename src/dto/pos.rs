use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        pricing::Discount,
        status::{OrderType, PaymentMethod},
    },
    dto::orders::{OrderItemInput, OrderWithItems},
    models::Invoice,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenTableOrderRequest {
    pub table_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemsRequest {
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WalkInOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub order_type: Option<OrderType>,
    pub payment_method: Option<PaymentMethod>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteOrderRequest {
    /// Required when the order has not been paid yet.
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuickCheckoutRequest {
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub discount: Option<Discount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompletedOrder {
    pub order: OrderWithItems,
    pub invoice: Invoice,
}
