use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    domain::TenantPatch,
    error::AppResult,
    repository::store::{OccupancyReader, PgStore, TenantStore},
    schemas::{validate_input, CheckoutInput, GiveNoticeInput, RejectKycInput, TenantPath},
    services::{
        bookings::cancel_notice,
        checkout::checkout,
        lifecycle::{approve_kyc, give_notice, reject_kyc, send_ekyc},
    },
    state::AppState,
};

use super::{rooms::TenantView, store};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/tenants/{tenant_id}/notice",
            axum::routing::post(post_notice).delete(delete_notice),
        )
        .route(
            "/tenants/{tenant_id}/checkout",
            axum::routing::post(post_checkout),
        )
        .route("/tenants/{tenant_id}/kyc/send", axum::routing::post(kyc_send))
        .route(
            "/tenants/{tenant_id}/kyc/approve",
            axum::routing::post(kyc_approve),
        )
        .route(
            "/tenants/{tenant_id}/kyc/reject",
            axum::routing::post(kyc_reject),
        )
}

async fn apply(
    store: &PgStore,
    tenant_id: &str,
    patch: TenantPatch,
    action: &str,
) -> AppResult<Json<TenantView>> {
    let updated = store.update_tenant(tenant_id, &patch).await?;
    tracing::info!(
        tenant_id = %updated.id,
        action,
        status = updated.overall_status.as_str(),
        kyc = updated.kyc_status.as_str(),
        "Tenant lifecycle updated"
    );
    Ok(Json(TenantView::from(updated)))
}

async fn post_notice(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    payload: Option<Json<GiveNoticeInput>>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    let move_out_date = payload.and_then(|Json(input)| input.move_out_date);
    let patch = give_notice(
        &tenant,
        move_out_date,
        state.clock.today(),
        state.config.default_notice_period_days,
    )?;
    apply(&store, &tenant.id, patch, "give_notice").await
}

async fn delete_notice(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let updated = cancel_notice(&store, &path.tenant_id).await?;
    Ok(Json(TenantView::from(updated)))
}

async fn kyc_send(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    let patch = send_ekyc(&tenant)?;
    apply(&store, &tenant.id, patch, "send_ekyc").await
}

async fn kyc_approve(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    let patch = approve_kyc(&tenant)?;
    apply(&store, &tenant.id, patch, "approve_kyc").await
}

async fn kyc_reject(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<RejectKycInput>,
) -> AppResult<Json<TenantView>> {
    validate_input(&payload)?;
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    let patch = reject_kyc(&tenant, &payload.reason)?;
    apply(&store, &tenant.id, patch, "reject_kyc").await
}

async fn post_checkout(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<CheckoutInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    let receipt = checkout(
        &store,
        &tenant,
        payload.deductions,
        payload.payment_mode,
        state.clock.today(),
    )
    .await?;
    Ok(Json(json!({
        "refund": receipt.refund,
        "tenant": TenantView::from(receipt.tenant),
    })))
}
