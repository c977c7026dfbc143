use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    domain::{BedAssignment, Room, TenantRecord},
    error::AppResult,
    repository::store::OccupancyReader,
    schemas::{
        clamp_limit_in_range, parse_status_csv, PropertyPath, RoomsQuery, TenantPath,
        TenantsQuery,
    },
    services::{
        lifecycle::{legal_actions, LifecycleAction},
        occupancy::{
            bed_selectable, bed_status, interim_bed_selectable, interim_bed_status,
            summarize_room, BedStatus, InterimBedStatus, RoomSummary,
        },
    },
    state::AppState,
};

use super::{non_empty_opt, store};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/properties/{property_id}/rooms",
            axum::routing::get(list_rooms),
        )
        .route(
            "/properties/{property_id}/tenants",
            axum::routing::get(list_tenants),
        )
        .route("/tenants/{tenant_id}", axum::routing::get(get_tenant))
}

#[derive(Debug, Serialize)]
struct BedView {
    letter: char,
    codes: Vec<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<BedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interim_status: Option<InterimBedStatus>,
    selectable: bool,
}

#[derive(Debug, Serialize)]
struct RoomView {
    #[serde(flatten)]
    room: Room,
    summary: RoomSummary,
    bed_views: Vec<BedView>,
}

fn room_view(room: Room, exempt: Option<&BedAssignment>, interim: bool) -> RoomView {
    let bed_views = room
        .beds
        .iter()
        .map(|bed| {
            if interim {
                BedView {
                    letter: bed.letter,
                    codes: bed.codes.clone(),
                    status: None,
                    interim_status: Some(interim_bed_status(&bed.codes)),
                    selectable: interim_bed_selectable(&room.id, bed, exempt),
                }
            } else {
                BedView {
                    letter: bed.letter,
                    codes: bed.codes.clone(),
                    status: Some(bed_status(&bed.codes)),
                    interim_status: None,
                    selectable: bed_selectable(&room.id, bed, exempt),
                }
            }
        })
        .collect();

    RoomView {
        summary: summarize_room(&room),
        bed_views,
        room,
    }
}

async fn list_rooms(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    Query(query): Query<RoomsQuery>,
) -> AppResult<Json<Value>> {
    let store = store(&state)?;

    let exempt = match non_empty_opt(query.exempt_tenant_id.as_deref()) {
        Some(tenant_id) => Some(store.get_tenant(&tenant_id).await?.assignment()),
        None => None,
    };
    let interim = query.interim_mode();

    let rooms = store.list_rooms(&path.property_id).await?;
    let views = rooms
        .into_iter()
        .map(|room| room_view(room, exempt.as_ref(), interim))
        .collect::<Vec<_>>();
    Ok(Json(json!({ "data": views })))
}

async fn list_tenants(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    Query(query): Query<TenantsQuery>,
) -> AppResult<Json<Value>> {
    let store = store(&state)?;
    let statuses = parse_status_csv(query.status.as_deref());
    let limit = usize::try_from(clamp_limit_in_range(query.limit, 1, 1000)).unwrap_or(1000);

    let mut tenants = store.list_tenants(&path.property_id, &statuses).await?;
    tenants.truncate(limit);
    Ok(Json(json!({ "data": tenants })))
}

#[derive(Debug, Serialize)]
pub(super) struct TenantView {
    #[serde(flatten)]
    tenant: TenantRecord,
    legal_actions: &'static [LifecycleAction],
}

impl From<TenantRecord> for TenantView {
    fn from(tenant: TenantRecord) -> Self {
        Self {
            legal_actions: legal_actions(tenant.overall_status, tenant.kyc_status),
            tenant,
        }
    }
}

async fn get_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<TenantView>> {
    let store = store(&state)?;
    let tenant = store.get_tenant(&path.tenant_id).await?;
    Ok(Json(TenantView::from(tenant)))
}

#[cfg(test)]
mod tests {
    use super::room_view;
    use crate::domain::{BedAssignment, BedSlot, Room};
    use crate::services::occupancy::{BedStatus, InterimBedStatus, RoomStatus};

    fn room() -> Room {
        Room {
            id: "r-1".to_string(),
            property_id: "p-1".to_string(),
            room_no: "101".to_string(),
            floor: 1,
            total_beds: 3,
            bed_price: 6000,
            security_deposit: 12000,
            facilities: vec!["ac".to_string()],
            beds: vec![
                BedSlot { letter: 'A', codes: vec![1] },
                BedSlot { letter: 'B', codes: vec![2] },
                BedSlot { letter: 'C', codes: Vec::new() },
            ],
        }
    }

    #[test]
    fn long_term_view_exempts_own_bed() {
        let exempt = BedAssignment::new("r-1", 'A');
        let view = room_view(room(), Some(&exempt), false);
        assert_eq!(view.summary.status, RoomStatus::Partial);
        assert_eq!(view.summary.vacant_beds, 1);
        assert_eq!(view.bed_views[0].status, Some(BedStatus::Filled));
        assert!(view.bed_views[0].selectable);
        assert!(!view.bed_views[1].selectable);
        assert!(view.bed_views[2].selectable);
    }

    #[test]
    fn interim_view_opens_beds_between_tenancies() {
        let view = room_view(room(), None, true);
        assert_eq!(
            view.bed_views[1].interim_status,
            Some(InterimBedStatus::PartiallyFilled)
        );
        assert!(view.bed_views[1].selectable);
        assert!(!view.bed_views[0].selectable);
    }
}
