use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::build_pool;
use crate::repository::store::PgStore;

/// Calendar "today" in the property's timezone. Handlers read it once per
/// request and pass it down; the rule functions never touch the clock.
#[derive(Debug, Clone, Copy)]
pub struct PropertyClock {
    timezone: Tz,
}

impl PropertyClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
    pub clock: PropertyClock,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, sqlx::Error> {
        let db_pool = build_pool(&config)?;
        if db_pool.is_none() {
            tracing::warn!("DATABASE_URL is not set; data endpoints will return 502");
        }
        Ok(Self {
            clock: PropertyClock::new(config.property_timezone),
            config: Arc::new(config),
            db_pool,
        })
    }

    pub fn store(&self) -> Option<PgStore> {
        self.db_pool.clone().map(PgStore::new)
    }
}
