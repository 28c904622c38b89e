use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Message;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub items: Vec<Message>,
}
