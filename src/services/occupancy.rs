//! Room and bed status derivation.
//!
//! Everything here is a pure function of its arguments. Bed codes are read
//! tolerantly: unknown codes are ignored and contradictory combinations resolve
//! by a fixed priority instead of failing.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{BedAssignment, BedSlot, BedTenantStatus, Room, TenantRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Partial,
    Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BedStatus {
    Available,
    Filled,
    AdvBooked,
    UnderNotice,
}

/// Bed status as seen when placing an interim stay between two tenancies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterimBedStatus {
    Available,
    PartiallyFilled,
    Filled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyCounts {
    pub occupied: i32,
    pub under_notice: i32,
    pub advance_booked: i32,
}

impl OccupancyCounts {
    pub fn from_beds(beds: &[BedSlot]) -> Self {
        let mut counts = Self::default();
        for bed in beds {
            match bed_status(&bed.codes) {
                BedStatus::Filled => counts.occupied += 1,
                BedStatus::UnderNotice => counts.under_notice += 1,
                BedStatus::AdvBooked => counts.advance_booked += 1,
                BedStatus::Available => {}
            }
        }
        counts
    }

    fn total(self) -> i32 {
        self.occupied
            .saturating_add(self.under_notice)
            .saturating_add(self.advance_booked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub status: RoomStatus,
    pub vacant_beds: i32,
    pub counts: OccupancyCounts,
}

pub fn vacant_beds(total_beds: i32, counts: OccupancyCounts) -> i32 {
    total_beds.saturating_sub(counts.total()).max(0)
}

pub fn room_status(total_beds: i32, vacant_beds: i32) -> RoomStatus {
    if total_beds <= 0 || vacant_beds >= total_beds {
        return RoomStatus::Available;
    }
    if vacant_beds <= 0 {
        return RoomStatus::Filled;
    }
    RoomStatus::Partial
}

pub fn summarize_counts(total_beds: i32, counts: OccupancyCounts) -> RoomSummary {
    let vacant = vacant_beds(total_beds, counts);
    RoomSummary {
        status: room_status(total_beds, vacant),
        vacant_beds: vacant,
        counts,
    }
}

pub fn summarize_room(room: &Room) -> RoomSummary {
    summarize_counts(room.total_beds, OccupancyCounts::from_beds(&room.beds))
}

/// Filled > AdvBooked > UnderNotice > Available, whatever the order or multiplicity.
pub fn bed_status(codes: &[i16]) -> BedStatus {
    let has = |wanted: BedTenantStatus| {
        codes
            .iter()
            .any(|code| BedTenantStatus::from_code(*code) == Some(wanted))
    };

    if has(BedTenantStatus::Filled) {
        BedStatus::Filled
    } else if has(BedTenantStatus::AdvBooked) {
        BedStatus::AdvBooked
    } else if has(BedTenantStatus::UnderNotice) {
        BedStatus::UnderNotice
    } else {
        BedStatus::Available
    }
}

pub fn interim_bed_status(codes: &[i16]) -> InterimBedStatus {
    match bed_status(codes) {
        BedStatus::Filled => InterimBedStatus::Filled,
        BedStatus::AdvBooked | BedStatus::UnderNotice => InterimBedStatus::PartiallyFilled,
        BedStatus::Available => InterimBedStatus::Available,
    }
}

fn is_exempt(room_id: &str, bed: &BedSlot, exempt: Option<&BedAssignment>) -> bool {
    exempt.is_some_and(|assignment| assignment.matches(room_id, bed.letter))
}

/// A bed can be picked for a long-term booking when it is free or is the
/// exempted slot currently held by the tenant being edited.
pub fn bed_selectable(room_id: &str, bed: &BedSlot, exempt: Option<&BedAssignment>) -> bool {
    bed_status(&bed.codes) == BedStatus::Available || is_exempt(room_id, bed, exempt)
}

pub fn interim_bed_selectable(
    room_id: &str,
    bed: &BedSlot,
    exempt: Option<&BedAssignment>,
) -> bool {
    interim_bed_status(&bed.codes) != InterimBedStatus::Filled || is_exempt(room_id, bed, exempt)
}

/// Bed numbering for a room: A, B, C... up to the sharing count (at most 26).
pub fn bed_letters(total_beds: i32) -> impl Iterator<Item = char> {
    let count = u8::try_from(total_beds.clamp(0, 26)).unwrap_or(0);
    (0..count).map(|offset| char::from(b'A' + offset))
}

/// A requested stay on one bed, half-open: the move-out day is free for the next tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayWindow {
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
}

impl StayWindow {
    pub fn new(starts_on: NaiveDate, ends_on: Option<NaiveDate>) -> Self {
        Self { starts_on, ends_on }
    }

    pub fn overlaps(&self, other: &StayWindow) -> bool {
        let self_end = self.ends_on.unwrap_or(NaiveDate::MAX);
        let other_end = other.ends_on.unwrap_or(NaiveDate::MAX);
        !(self_end <= other.starts_on || self.starts_on >= other_end)
    }
}

/// First occupying tenant on the same bed whose stay overlaps `window`.
///
/// `claims` may contain tenants of any bed; only those on `slot` are considered.
pub fn find_conflicting_claim<'a>(
    claims: &'a [TenantRecord],
    slot: &BedAssignment,
    window: StayWindow,
    exempt_tenant_id: Option<&str>,
) -> Option<&'a TenantRecord> {
    claims.iter().find(|claim| {
        claim.overall_status.occupies_bed()
            && slot.matches(&claim.room_id, claim.bed_letter)
            && exempt_tenant_id != Some(claim.id.as_str())
            && StayWindow::new(claim.joining_date, claim.move_out_date).overlaps(&window)
    })
}
