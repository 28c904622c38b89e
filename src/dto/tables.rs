use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::status::TableStatus,
    dto::orders::OrderWithItems,
    models::DiningTable,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(default)]
    pub area: String,
    pub capacity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTableRequest {
    pub name: Option<String>,
    pub area: Option<String>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTableStatusRequest {
    pub status: TableStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableList {
    pub items: Vec<DiningTable>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableDetail {
    pub table: DiningTable,
    pub current_order: Option<OrderWithItems>,
}
