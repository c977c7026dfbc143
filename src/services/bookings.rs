//! Booking workflows: validate against the current room view, re-check the
//! bed for overlapping claims at commit time, then write the tenant row.
//!
//! The re-check narrows the window between two concurrent submissions for the
//! same bed but does not close it; no lock is taken.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{
    BedAssignment, KycStatus, NewTenant, OverallStatus, Room, TenantPatch, TenantRecord,
};
use crate::error::{AppError, AppResult};
use crate::repository::store::{OccupancyReader, TenantStore};
use crate::schemas::{AdvanceBookingInput, ConvertBookingInput, InterimBookingInput};
use crate::services::booking_form::BookingForm;
use crate::services::booking_validation::{
    validate_convert, validate_create_advance, validate_edit_advance, validate_interim,
};
use crate::services::lifecycle::{self, booking_patch, Conversion, LifecycleAction};
use crate::services::occupancy::{find_conflicting_claim, StayWindow};

pub async fn create_advance_booking<S>(
    store: &S,
    property_id: &str,
    mut input: AdvanceBookingInput,
    today: NaiveDate,
) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let rooms = store.list_rooms(property_id).await?;
    let mut form = BookingForm::blank();
    fill_from_form(
        &mut form,
        &rooms,
        &mut input.room_id,
        &mut input.bed_letter,
        &mut input.rent_amount,
        &mut input.deposit_amount,
    );
    validate_create_advance(&input, &rooms, today).map_err(AppError::Validation)?;

    let slot = required_slot(input.room_id.as_deref(), input.bed_letter)?;
    let joining_date = required(input.joining_date, "joining_date")?;
    ensure_slot_free(store, property_id, &slot, StayWindow::new(joining_date, None), None).await?;

    let tenant = NewTenant {
        property_id: property_id.to_string(),
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        email: trimmed(input.email.as_deref()),
        gender: trimmed(input.gender.as_deref()),
        room_id: slot.room_id.clone(),
        bed_letter: slot.bed,
        joining_date,
        move_out_date: None,
        rent_amount: required(input.rent_amount, "rent_amount")?,
        deposit_amount: required(input.deposit_amount, "deposit_amount")?,
        advance_rent_paid: input.advance_rent.unwrap_or(0),
        advance_deposit_paid: input.advance_deposit.unwrap_or(0),
        rent_paid: 0,
        deposit_paid: 0,
        overall_status: OverallStatus::AdvanceBooked,
        kyc_status: KycStatus::Pending,
        notice_period_days: None,
        persisted_proration_amount: None,
    };
    let created = store.insert_tenant(&tenant).await?;
    info!(
        tenant_id = %created.id,
        room_id = %created.room_id,
        bed = %created.bed_letter,
        "Advance booking created"
    );
    Ok(created)
}

pub async fn edit_advance_booking<S>(
    store: &S,
    tenant_id: &str,
    mut input: AdvanceBookingInput,
    today: NaiveDate,
) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let tenant = store.get_tenant(tenant_id).await?;
    if tenant.overall_status != OverallStatus::AdvanceBooked {
        return Err(AppError::UnprocessableEntity(format!(
            "Only advance bookings can be edited here; tenant is {}.",
            tenant.overall_status.as_str()
        )));
    }

    let rooms = store.list_rooms(&tenant.property_id).await?;
    let mut form = BookingForm::from_tenant(&tenant, today);
    fill_from_form(
        &mut form,
        &rooms,
        &mut input.room_id,
        &mut input.bed_letter,
        &mut input.rent_amount,
        &mut input.deposit_amount,
    );
    let own_slot = tenant.assignment();
    validate_edit_advance(&input, &rooms, tenant.joining_date, Some(&own_slot))
        .map_err(AppError::Validation)?;

    let slot = required_slot(input.room_id.as_deref(), input.bed_letter)?;
    let joining_date = required(input.joining_date, "joining_date")?;
    ensure_slot_free(
        store,
        &tenant.property_id,
        &slot,
        StayWindow::new(joining_date, None),
        Some(&tenant.id),
    )
    .await?;

    let updated = store.update_tenant(&tenant.id, &booking_patch(&input)).await?;
    info!(tenant_id = %updated.id, "Advance booking updated");
    Ok(updated)
}

pub async fn convert_booking<S>(
    store: &S,
    tenant_id: &str,
    mut input: ConvertBookingInput,
    today: NaiveDate,
) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let tenant = store.get_tenant(tenant_id).await?;
    lifecycle::ensure_allowed(&tenant, LifecycleAction::Convert)?;

    let rooms = store.list_rooms(&tenant.property_id).await?;
    let mut form = BookingForm::from_tenant(&tenant, today);
    let booking = &mut input.booking;
    fill_from_form(
        &mut form,
        &rooms,
        &mut booking.room_id,
        &mut booking.bed_letter,
        &mut booking.rent_amount,
        &mut booking.deposit_amount,
    );
    form.set_joining_date(booking.joining_date, today);
    if let Some(due_type) = input.due_type {
        form.set_due_type(due_type, today);
        if let Some(chosen) = input.due_date {
            form.set_custom_due_date(chosen, today);
        }
        input.due_date = form.due_date();
    }

    let own_slot = tenant.assignment();
    validate_convert(&input, &rooms, tenant.joining_date, Some(&own_slot), today)
        .map_err(AppError::Validation)?;

    let slot = required_slot(input.booking.room_id.as_deref(), input.booking.bed_letter)?;
    let joining_date = required(input.booking.joining_date, "joining_date")?;
    ensure_slot_free(
        store,
        &tenant.property_id,
        &slot,
        StayWindow::new(joining_date, None),
        Some(&tenant.id),
    )
    .await?;

    let conversion = Conversion {
        rent_collected: required(input.rent_collected, "rent_collected")?,
        deposit_collected: required(input.deposit_collected, "deposit_collected")?,
        due_type: required(input.due_type, "due_type")?,
        due_date: required(input.due_date, "due_date")?,
    };
    let patch = lifecycle::convert(&tenant, &input.booking, &conversion)?;
    let updated = store.update_tenant(&tenant.id, &patch).await?;
    info!(
        tenant_id = %updated.id,
        due_date = %conversion.due_date,
        "Advance booking converted to tenant"
    );
    Ok(updated)
}

pub async fn create_interim_booking<S>(
    store: &S,
    property_id: &str,
    mut input: InterimBookingInput,
    today: NaiveDate,
) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let rooms = store.list_rooms(property_id).await?;
    let mut form = BookingForm::blank();
    fill_from_form(
        &mut form,
        &rooms,
        &mut input.room_id,
        &mut input.bed_letter,
        &mut input.rent_amount,
        &mut input.deposit_amount,
    );
    form.set_joining_date(input.joining_date, today);
    form.set_move_out_date(input.move_out_date);
    let stay_due = form.stay_due();

    validate_interim(&input, &rooms, None, stay_due, today).map_err(AppError::Validation)?;

    let slot = required_slot(input.room_id.as_deref(), input.bed_letter)?;
    let joining_date = required(input.joining_date, "joining_date")?;
    let move_out_date = required(input.move_out_date, "move_out_date")?;
    ensure_slot_free(
        store,
        property_id,
        &slot,
        StayWindow::new(joining_date, Some(move_out_date)),
        None,
    )
    .await?;

    let tenant = NewTenant {
        property_id: property_id.to_string(),
        name: input.name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        email: trimmed(input.email.as_deref()),
        gender: trimmed(input.gender.as_deref()),
        room_id: slot.room_id.clone(),
        bed_letter: slot.bed,
        joining_date,
        move_out_date: Some(move_out_date),
        rent_amount: required(input.rent_amount, "rent_amount")?,
        deposit_amount: input.deposit_amount.unwrap_or(0),
        advance_rent_paid: 0,
        advance_deposit_paid: 0,
        rent_paid: input.rent_collected.unwrap_or(0),
        deposit_paid: input.deposit_collected.unwrap_or(0),
        overall_status: OverallStatus::ShortTerm,
        kyc_status: KycStatus::Pending,
        notice_period_days: None,
        persisted_proration_amount: Some(stay_due),
    };
    let created = store.insert_tenant(&tenant).await?;
    info!(
        tenant_id = %created.id,
        stay_due,
        "Interim booking created"
    );
    Ok(created)
}

/// Edits a short-term stay. The stored proration is kept unless the joining
/// date, move-out date or rent changed.
pub async fn edit_interim_booking<S>(
    store: &S,
    tenant_id: &str,
    mut input: InterimBookingInput,
    today: NaiveDate,
) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let tenant = store.get_tenant(tenant_id).await?;
    if tenant.overall_status != OverallStatus::ShortTerm {
        return Err(AppError::UnprocessableEntity(format!(
            "Only interim bookings can be edited here; tenant is {}.",
            tenant.overall_status.as_str()
        )));
    }

    let rooms = store.list_rooms(&tenant.property_id).await?;
    let mut form = BookingForm::from_tenant(&tenant, today);
    fill_from_form(
        &mut form,
        &rooms,
        &mut input.room_id,
        &mut input.bed_letter,
        &mut input.rent_amount,
        &mut input.deposit_amount,
    );
    form.set_joining_date(input.joining_date, today);
    form.set_move_out_date(input.move_out_date);
    let stay_due = form.stay_due();

    let own_slot = tenant.assignment();
    validate_interim(&input, &rooms, Some(&own_slot), stay_due, today)
        .map_err(AppError::Validation)?;

    let slot = required_slot(input.room_id.as_deref(), input.bed_letter)?;
    let joining_date = required(input.joining_date, "joining_date")?;
    let move_out_date = required(input.move_out_date, "move_out_date")?;
    ensure_slot_free(
        store,
        &tenant.property_id,
        &slot,
        StayWindow::new(joining_date, Some(move_out_date)),
        Some(&tenant.id),
    )
    .await?;

    let patch = TenantPatch {
        name: Some(input.name.trim().to_string()),
        phone: Some(input.phone.trim().to_string()),
        email: Some(trimmed(input.email.as_deref())),
        gender: Some(trimmed(input.gender.as_deref())),
        room_id: Some(slot.room_id),
        bed_letter: Some(slot.bed),
        joining_date: Some(joining_date),
        move_out_date: Some(Some(move_out_date)),
        rent_amount: input.rent_amount,
        deposit_amount: Some(input.deposit_amount.unwrap_or(0)),
        rent_paid: input.rent_collected,
        deposit_paid: input.deposit_collected,
        persisted_proration_amount: Some(stay_due),
        ..TenantPatch::default()
    };
    let updated = store.update_tenant(&tenant.id, &patch).await?;
    info!(tenant_id = %updated.id, stay_due, "Interim booking updated");
    Ok(updated)
}

/// Withdraws a tenant's notice. Their stay becomes open-ended again, so the
/// bed is re-checked first: a stay booked into it from the notice date on
/// blocks the withdrawal.
pub async fn cancel_notice<S>(store: &S, tenant_id: &str) -> AppResult<TenantRecord>
where
    S: OccupancyReader + TenantStore + Sync,
{
    let tenant = store.get_tenant(tenant_id).await?;
    let patch = lifecycle::remove_notice(&tenant)?;
    ensure_slot_free(
        store,
        &tenant.property_id,
        &tenant.assignment(),
        StayWindow::new(tenant.joining_date, None),
        Some(&tenant.id),
    )
    .await?;

    let updated = store.update_tenant(&tenant.id, &patch).await?;
    info!(tenant_id = %updated.id, "Notice withdrawn");
    Ok(updated)
}

/// Runs the requested room and bed through the form so a room change picks up
/// that room's rent and deposit. Values given explicitly win; omitted ones
/// keep what the form already holds.
fn fill_from_form(
    form: &mut BookingForm,
    rooms: &[Room],
    room_id: &mut Option<String>,
    bed_letter: &mut Option<char>,
    rent_amount: &mut Option<i64>,
    deposit_amount: &mut Option<i64>,
) {
    let requested = room_id.as_deref().map(str::trim);
    if let Some(room) = rooms.iter().find(|room| Some(room.id.as_str()) == requested) {
        form.select_room(room);
    }
    if let Some(letter) = *bed_letter {
        form.select_bed(letter);
    }
    if rent_amount.is_some() {
        form.set_rent(*rent_amount);
    }
    if deposit_amount.is_some() {
        form.set_deposit(*deposit_amount);
    }

    if room_id.is_none() {
        *room_id = form.room_id().map(ToOwned::to_owned);
    }
    *bed_letter = form.bed_letter();
    *rent_amount = form.rent_amount();
    *deposit_amount = form.deposit_amount();
}

async fn ensure_slot_free<S>(
    store: &S,
    property_id: &str,
    slot: &BedAssignment,
    window: StayWindow,
    exempt_tenant_id: Option<&str>,
) -> AppResult<()>
where
    S: OccupancyReader + Sync,
{
    let claims = store.list_bed_claims(property_id, slot).await?;
    if let Some(claim) = find_conflicting_claim(&claims, slot, window, exempt_tenant_id) {
        warn!(
            room_id = %slot.room_id,
            bed = %slot.bed,
            holder = %claim.id,
            "Bed was claimed before the booking was committed"
        );
        return Err(AppError::Unavailable(format!(
            "Bed {} is no longer available for the requested dates.",
            slot.bed
        )));
    }
    Ok(())
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::UnprocessableEntity(format!("Missing {field}.")))
}

fn required_slot(room_id: Option<&str>, bed_letter: Option<char>) -> AppResult<BedAssignment> {
    let room_id = room_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::UnprocessableEntity("Missing room_id.".to_string()))?;
    Ok(BedAssignment::new(room_id, required(bed_letter, "bed_letter")?))
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
}
