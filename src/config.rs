use std::{env, time::Duration};

use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// How long a completed table keeps showing `completed` before it is released.
    pub table_reset_delay: Duration,
    /// Offset of the café's local time, used to bucket sales by day and hour.
    pub business_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let table_reset_delay = env::var("TABLE_RESET_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let offset_minutes = env::var("BUSINESS_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(0);
        let business_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!("BUSINESS_UTC_OFFSET_MINUTES out of range: {offset_minutes}")
        })?;

        Ok(Self {
            port,
            database_url,
            host,
            table_reset_delay,
            business_offset,
        })
    }
}
