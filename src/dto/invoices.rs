use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Invoice;

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceList {
    pub items: Vec<Invoice>,
}
