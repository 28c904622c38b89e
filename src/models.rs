use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::status::{
        ItemStatus, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus, Role,
        TableStatus,
    },
    entity,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// A named price point: a size/variant (replaces the base price) or a modifier (added to it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductOption {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub variants: Vec<ProductOption>,
    pub modifiers: Vec<ProductOption>,
    pub is_available: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub order_type: OrderType,
    pub source: OrderSource,
    pub table_id: Option<Uuid>,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub variant: Option<String>,
    pub modifiers: Vec<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub note: Option<String>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiningTable {
    pub id: Uuid,
    pub name: String,
    pub area: String,
    pub capacity: i32,
    pub status: TableStatus,
    pub current_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line of an invoice, frozen at completion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub order_id: Uuid,
    pub order_number: String,
    pub table_name: Option<String>,
    pub customer_name: String,
    pub items: Vec<InvoiceLine>,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    pub cafe_name: String,
    pub address: String,
    pub phone: String,
    pub currency: String,
    pub tax_rate_bps: i32,
    pub opening_hours: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Decode a JSONB column written by this service.
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt stored json: {e}")))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

impl TryFrom<entity::users::Model> for User {
    type Error = AppError;

    fn try_from(model: entity::users::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            email: model.email,
            name: model.name,
            phone: model.phone,
            role: model.role.parse()?,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl From<entity::categories::Model> for Category {
    fn from(model: entity::categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            sort_order: model.sort_order,
            is_archived: model.is_archived,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<entity::products::Model> for Product {
    type Error = AppError;

    fn try_from(model: entity::products::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_url: model.image_url,
            variants: from_json(model.variants)?,
            modifiers: from_json(model.modifiers)?,
            is_available: model.is_available,
            is_archived: model.is_archived,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl From<entity::favorites::Model> for Favorite {
    fn from(model: entity::favorites::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<entity::orders::Model> for Order {
    type Error = AppError;

    fn try_from(model: entity::orders::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            order_type: model.order_type.parse()?,
            source: model.source.parse()?,
            table_id: model.table_id,
            subtotal: model.subtotal,
            discount: model.discount,
            tax: model.tax,
            total_amount: model.total_amount,
            status: model.status.parse()?,
            payment_method: model.payment_method.parse()?,
            payment_status: model.payment_status.parse()?,
            note: model.note,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<entity::order_items::Model> for OrderItem {
    type Error = AppError;

    fn try_from(model: entity::order_items::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            variant: model.variant,
            modifiers: from_json(model.modifiers)?,
            unit_price: model.unit_price,
            quantity: model.quantity,
            line_total: model.line_total,
            note: model.note,
            status: model.status.parse()?,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<entity::dining_tables::Model> for DiningTable {
    type Error = AppError;

    fn try_from(model: entity::dining_tables::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            area: model.area,
            capacity: model.capacity,
            status: model.status.parse()?,
            current_order_id: model.current_order_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<entity::invoices::Model> for Invoice {
    type Error = AppError;

    fn try_from(model: entity::invoices::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            invoice_number: model.invoice_number,
            order_id: model.order_id,
            order_number: model.order_number,
            table_name: model.table_name,
            customer_name: model.customer_name,
            items: from_json(model.items)?,
            subtotal: model.subtotal,
            discount: model.discount,
            tax: model.tax,
            total_amount: model.total_amount,
            payment_method: model.payment_method.parse()?,
            cashier_id: model.cashier_id,
            issued_at: model.issued_at.with_timezone(&Utc),
        })
    }
}

impl From<entity::settings::Model> for Settings {
    fn from(model: entity::settings::Model) -> Self {
        Self {
            cafe_name: model.cafe_name,
            address: model.address,
            phone: model.phone,
            currency: model.currency,
            tax_rate_bps: model.tax_rate_bps,
            opening_hours: model.opening_hours,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::reviews::Model> for Review {
    fn from(model: entity::reviews::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            product_id: model.product_id,
            rating: model.rating,
            comment: model.comment,
            is_hidden: model.is_hidden,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::messages::Model> for Message {
    fn from(model: entity::messages::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            subject: model.subject,
            body: model.body,
            is_read: model.is_read,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
