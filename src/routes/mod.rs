use axum::{routing::get, Router};

use crate::error::{AppError, AppResult};
use crate::repository::store::PgStore;
use crate::state::AppState;

pub mod bookings;
pub mod health;
pub mod lifecycle;
pub mod quotes;
pub mod rooms;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(rooms::router())
        .merge(bookings::router())
        .merge(lifecycle::router())
        .merge(quotes::router())
}

fn store(state: &AppState) -> AppResult<PgStore> {
    state.store().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}

fn non_empty_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
}
