use sea_orm::entity::prelude::*;

/// Snapshot of an order taken at completion. Rows are never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_number: String,
    #[sea_orm(unique)]
    pub order_id: Uuid,
    pub order_number: String,
    pub table_name: Option<String>,
    pub customer_name: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total_amount: i64,
    pub payment_method: String,
    pub cashier_id: Option<Uuid>,
    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
