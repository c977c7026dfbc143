use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    schemas::{
        AdvanceBookingInput, ConvertBookingInput, InterimBookingInput, PropertyPath, TenantPath,
    },
    services::bookings::{
        convert_booking, create_advance_booking, create_interim_booking, edit_advance_booking,
        edit_interim_booking,
    },
    state::AppState,
};

use super::{rooms::TenantView, store};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/properties/{property_id}/advance-bookings",
            axum::routing::post(create_advance),
        )
        .route(
            "/tenants/{tenant_id}/advance-booking",
            axum::routing::patch(edit_advance),
        )
        .route("/tenants/{tenant_id}/convert", axum::routing::post(convert))
        .route(
            "/properties/{property_id}/interim-bookings",
            axum::routing::post(create_interim),
        )
        .route(
            "/tenants/{tenant_id}/interim-booking",
            axum::routing::patch(edit_interim),
        )
}

async fn create_advance(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    Json(payload): Json<AdvanceBookingInput>,
) -> AppResult<(StatusCode, Json<TenantView>)> {
    let store = store(&state)?;
    let created =
        create_advance_booking(&store, &path.property_id, payload, state.clock.today()).await?;
    Ok((StatusCode::CREATED, Json(TenantView::from(created))))
}

async fn edit_advance(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<AdvanceBookingInput>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let updated =
        edit_advance_booking(&store, &path.tenant_id, payload, state.clock.today()).await?;
    Ok(Json(TenantView::from(updated)))
}

async fn convert(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<ConvertBookingInput>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let converted = convert_booking(&store, &path.tenant_id, payload, state.clock.today()).await?;
    Ok(Json(TenantView::from(converted)))
}

async fn create_interim(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    Json(payload): Json<InterimBookingInput>,
) -> AppResult<(StatusCode, Json<TenantView>)> {
    let store = store(&state)?;
    let created =
        create_interim_booking(&store, &path.property_id, payload, state.clock.today()).await?;
    Ok((StatusCode::CREATED, Json(TenantView::from(created))))
}

async fn edit_interim(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<InterimBookingInput>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let updated =
        edit_interim_booking(&store, &path.tenant_id, payload, state.clock.today()).await?;
    Ok(Json(TenantView::from(updated)))
}
