use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Orders,
    Tables,
    Invoices,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Orders => "orders",
            Resource::Tables => "tables",
            Resource::Invoices => "invoices",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveEvent {
    pub resource: Resource,
    pub action: String,
    pub id: Uuid,
    /// Customer who owns the order, if any. Customers only see their own events.
    pub owner_id: Option<Uuid>,
    pub data: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl LiveEvent {
    pub fn visible_to(&self, user_id: Uuid, is_staff: bool) -> bool {
        is_staff || (self.resource == Resource::Orders && self.owner_id == Some(user_id))
    }
}

/// In-process fan-out of order, table and invoice changes to live clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventBus {
    pub fn publish<T: Serialize>(
        &self,
        resource: Resource,
        action: &str,
        id: Uuid,
        owner_id: Option<Uuid>,
        data: &T,
    ) {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, ?resource, %id, "live event not serializable");
                return;
            }
        };
        let event = LiveEvent {
            resource,
            action: action.to_string(),
            id,
            owner_id,
            data,
            at: Utc::now(),
        };
        // No receivers is the normal idle case.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }
}
