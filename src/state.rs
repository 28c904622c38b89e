use std::time::Duration;

use chrono::FixedOffset;
use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, events::EventBus};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub events: EventBus,
    pub table_reset_delay: Duration,
    pub business_offset: FixedOffset,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            orm,
            events: EventBus::default(),
            table_reset_delay: config.table_reset_delay,
            business_offset: config.business_offset,
        }
    }
}
