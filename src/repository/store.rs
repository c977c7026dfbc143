//! Typed access to rooms, tenants and payments.
//!
//! Rooms carry no stored bed state. Each bed's status codes are assembled
//! from the tenants currently holding it, so the occupancy view can never
//! drift from the tenant rows.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::{
    BedAssignment, BedSlot, NewPayment, NewTenant, OverallStatus, Payment, Room, TenantPatch,
    TenantRecord,
};
use crate::error::{AppError, AppResult};
use crate::repository::table_service::{
    create_row, get_row, list_rows, update_row, Filter, Ordering,
};
use crate::schemas::serialize_to_map;
use crate::services::occupancy::bed_letters;

const ROOM_LIMIT: i64 = 1000;
const TENANT_LIMIT: i64 = 1000;

pub trait OccupancyReader {
    /// Rooms of a property with bed codes filled in from occupying tenants.
    fn list_rooms(&self, property_id: &str) -> impl Future<Output = AppResult<Vec<Room>>> + Send;

    /// Tenants of a property in any of `statuses`; an empty slice means all.
    fn list_tenants(
        &self,
        property_id: &str,
        statuses: &[OverallStatus],
    ) -> impl Future<Output = AppResult<Vec<TenantRecord>>> + Send;

    fn get_tenant(&self, tenant_id: &str) -> impl Future<Output = AppResult<TenantRecord>> + Send;

    /// Occupying tenants holding one bed, whatever their dates.
    fn list_bed_claims(
        &self,
        property_id: &str,
        slot: &BedAssignment,
    ) -> impl Future<Output = AppResult<Vec<TenantRecord>>> + Send;
}

pub trait TenantStore {
    fn insert_tenant(&self, tenant: &NewTenant)
        -> impl Future<Output = AppResult<TenantRecord>> + Send;

    fn update_tenant(
        &self,
        tenant_id: &str,
        patch: &TenantPatch,
    ) -> impl Future<Output = AppResult<TenantRecord>> + Send;

    fn insert_payment(&self, payment: &NewPayment)
        -> impl Future<Output = AppResult<Payment>> + Send;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OccupancyReader for PgStore {
    async fn list_rooms(&self, property_id: &str) -> AppResult<Vec<Room>> {
        let filters = [Filter::eq("property_id", property_id)];
        let rows = list_rows(
            &self.pool,
            "rooms",
            &filters,
            ROOM_LIMIT,
            Ordering::asc("room_no"),
        )
        .await?;
        let rooms = decode_rows::<Room>(rows)?;
        let occupants = self
            .list_tenants(property_id, &OverallStatus::OCCUPYING)
            .await?;
        Ok(assemble_rooms(rooms, &occupants))
    }

    async fn list_tenants(
        &self,
        property_id: &str,
        statuses: &[OverallStatus],
    ) -> AppResult<Vec<TenantRecord>> {
        let mut filters = vec![Filter::eq("property_id", property_id)];
        if !statuses.is_empty() {
            filters.push(Filter::any_of(
                "overall_status",
                statuses.iter().map(|status| status.as_str()),
            ));
        }
        let rows = list_rows(
            &self.pool,
            "tenants",
            &filters,
            TENANT_LIMIT,
            Ordering::asc("joining_date"),
        )
        .await?;
        decode_rows(rows)
    }

    async fn get_tenant(&self, tenant_id: &str) -> AppResult<TenantRecord> {
        decode_row(get_row(&self.pool, "tenants", tenant_id).await?)
    }

    async fn list_bed_claims(
        &self,
        property_id: &str,
        slot: &BedAssignment,
    ) -> AppResult<Vec<TenantRecord>> {
        let filters = [
            Filter::eq("property_id", property_id),
            Filter::eq("room_id", slot.room_id.as_str()),
            Filter::eq("bed_letter", slot.bed.to_string()),
            Filter::any_of(
                "overall_status",
                OverallStatus::OCCUPYING.iter().map(|status| status.as_str()),
            ),
        ];
        let rows = list_rows(
            &self.pool,
            "tenants",
            &filters,
            TENANT_LIMIT,
            Ordering::asc("joining_date"),
        )
        .await?;
        decode_rows(rows)
    }
}

impl TenantStore for PgStore {
    async fn insert_tenant(&self, tenant: &NewTenant) -> AppResult<TenantRecord> {
        decode_row(create_row(&self.pool, "tenants", &serialize_to_map(tenant)).await?)
    }

    async fn update_tenant(&self, tenant_id: &str, patch: &TenantPatch) -> AppResult<TenantRecord> {
        if patch.is_empty() {
            return self.get_tenant(tenant_id).await;
        }
        decode_row(update_row(&self.pool, "tenants", tenant_id, &serialize_to_map(patch)).await?)
    }

    async fn insert_payment(&self, payment: &NewPayment) -> AppResult<Payment> {
        decode_row(create_row(&self.pool, "payments", &serialize_to_map(payment)).await?)
    }
}

/// Lays out one slot per bed letter and stamps each occupying tenant's code
/// onto its slot. Tenants pointing at unknown rooms or letters are ignored.
pub fn assemble_rooms(rooms: Vec<Room>, occupants: &[TenantRecord]) -> Vec<Room> {
    rooms
        .into_iter()
        .map(|mut room| {
            room.beds = bed_letters(room.total_beds)
                .map(|letter| BedSlot {
                    letter,
                    codes: occupants
                        .iter()
                        .filter(|tenant| tenant.room_id == room.id && tenant.bed_letter == letter)
                        .filter_map(|tenant| tenant.overall_status.bed_status())
                        .map(|status| status.code())
                        .collect(),
                })
                .collect();
            room
        })
        .collect()
}

fn decode_row<T: DeserializeOwned>(row: Value) -> AppResult<T> {
    serde_json::from_value(row).map_err(|error| {
        tracing::error!(error = %error, "Stored row did not match the expected shape");
        AppError::Internal("Stored record could not be decoded.".to_string())
    })
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> AppResult<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}
