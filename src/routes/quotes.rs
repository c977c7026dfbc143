use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    schemas::{validate_input, DueDateQuoteInput, StayQuoteInput},
    services::{due_date::resolve_due_date, proration::quote_stay},
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/quotes/stay-due", axum::routing::post(stay_due))
        .route("/quotes/due-date", axum::routing::post(due_date))
}

async fn stay_due(Json(payload): Json<StayQuoteInput>) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let quote = quote_stay(
        payload.joining_date,
        payload.move_out_date,
        payload.monthly_rent,
    );
    Ok(Json(json!({ "data": quote })))
}

async fn due_date(
    State(state): State<AppState>,
    Json(payload): Json<DueDateQuoteInput>,
) -> AppResult<Json<Value>> {
    let today = state.clock.today();
    let resolved = resolve_due_date(
        payload.due_type,
        payload.joining_date,
        payload.custom_date,
        today,
    );
    Ok(Json(json!({
        "data": {
            "due_type": payload.due_type,
            "due_date": resolved,
            "today": today,
        }
    })))
}
