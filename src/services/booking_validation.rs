//! Field and date-window rules for the booking workflows.
//!
//! Every entry point evaluates all of its rules and returns the complete list
//! of violations, so the caller can show every problem at once.

use chrono::NaiveDate;
use serde::Serialize;
use validator::ValidateEmail;

use crate::domain::{BedAssignment, Room};
use crate::schemas::{AdvanceBookingInput, ConvertBookingInput, InterimBookingInput};
use crate::services::calendar::{add_months, sub_months};
use crate::services::occupancy::{bed_selectable, interim_bed_selectable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    OutOfRange,
    /// An advance or collected amount exceeds what it is drawn against.
    Inconsistent,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Verdict = Result<(), Vec<Violation>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotMode {
    LongTerm,
    Interim,
}

#[derive(Debug, Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, kind: ViolationKind, field: &str, message: impl Into<String>) {
        self.0.push(Violation::new(kind, field, message));
    }

    fn missing(&mut self, field: &str, label: &str) {
        self.push(
            ViolationKind::MissingField,
            field,
            format!("{label} is required."),
        );
    }

    fn finish(self) -> Verdict {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

pub fn validate_create_advance(
    input: &AdvanceBookingInput,
    rooms: &[Room],
    today: NaiveDate,
) -> Verdict {
    let mut violations = Violations::default();
    check_advance_fields(&mut violations, input, rooms, None);

    match input.joining_date {
        None => violations.missing("joining_date", "Joining date"),
        Some(joining) if joining <= today => violations.push(
            ViolationKind::OutOfRange,
            "joining_date",
            "Joining date must be after today.",
        ),
        Some(_) => {}
    }

    violations.finish()
}

pub fn validate_edit_advance(
    input: &AdvanceBookingInput,
    rooms: &[Room],
    original_joining_date: NaiveDate,
    exempt: Option<&BedAssignment>,
) -> Verdict {
    let mut violations = Violations::default();
    check_advance_fields(&mut violations, input, rooms, exempt);
    check_edit_window(&mut violations, input.joining_date, original_joining_date);
    violations.finish()
}

pub fn validate_convert(
    input: &ConvertBookingInput,
    rooms: &[Room],
    original_joining_date: NaiveDate,
    exempt: Option<&BedAssignment>,
    today: NaiveDate,
) -> Verdict {
    let mut violations = Violations::default();
    let booking = &input.booking;
    check_advance_fields(&mut violations, booking, rooms, exempt);
    check_edit_window(&mut violations, booking.joining_date, original_joining_date);

    let rent_collected = check_positive(
        &mut violations,
        "rent_collected",
        "Advance rent collected",
        input.rent_collected,
    );
    let deposit_collected = check_positive(
        &mut violations,
        "deposit_collected",
        "Advance deposit collected",
        input.deposit_collected,
    );

    if let (Some(collected), Some(rent)) = (rent_collected, booking.rent_amount) {
        let ceiling = rent.saturating_add(booking.advance_rent.unwrap_or(0));
        if collected > ceiling {
            violations.push(
                ViolationKind::Inconsistent,
                "rent_collected",
                format!("Rent collected cannot exceed {ceiling} (rent plus advance rent)."),
            );
        }
    }
    if let (Some(collected), Some(deposit)) = (deposit_collected, booking.deposit_amount) {
        let ceiling = deposit.saturating_add(booking.advance_deposit.unwrap_or(0));
        if collected > ceiling {
            violations.push(
                ViolationKind::Inconsistent,
                "deposit_collected",
                format!("Deposit collected cannot exceed {ceiling} (deposit plus advance deposit)."),
            );
        }
    }

    if input.due_type.is_none() {
        violations.missing("due_type", "Due type");
    }
    match input.due_date {
        None => violations.missing("due_date", "Due date"),
        Some(due) if due < today => violations.push(
            ViolationKind::OutOfRange,
            "due_date",
            "Due date cannot be in the past.",
        ),
        Some(_) => {}
    }

    violations.finish()
}

/// Rules for creating (`exempt = None`) or editing an interim stay.
///
/// `stay_due` is the prorated rent for the requested window; collected rent
/// may not exceed it.
pub fn validate_interim(
    input: &InterimBookingInput,
    rooms: &[Room],
    exempt: Option<&BedAssignment>,
    stay_due: i64,
    today: NaiveDate,
) -> Verdict {
    let mut violations = Violations::default();
    check_identity(
        &mut violations,
        &input.name,
        &input.phone,
        input.email.as_deref(),
    );
    check_slot(
        &mut violations,
        rooms,
        input.room_id.as_deref(),
        input.bed_letter,
        exempt,
        SlotMode::Interim,
    );

    let horizon = add_months(today, 1);
    match input.joining_date {
        None => violations.missing("joining_date", "Joining date"),
        Some(joining) if joining < today || joining > horizon => violations.push(
            ViolationKind::OutOfRange,
            "joining_date",
            format!("Joining date must be between {today} and {horizon}."),
        ),
        Some(_) => {}
    }
    match input.move_out_date {
        None => violations.missing("move_out_date", "Move-out date"),
        Some(move_out) => {
            if input.joining_date.is_some_and(|joining| move_out <= joining) {
                violations.push(
                    ViolationKind::OutOfRange,
                    "move_out_date",
                    "Move-out date must be after the joining date.",
                );
            }
            if move_out > horizon {
                violations.push(
                    ViolationKind::OutOfRange,
                    "move_out_date",
                    format!("Move-out date cannot be later than {horizon}."),
                );
            }
        }
    }

    check_positive(&mut violations, "rent_amount", "Rent", input.rent_amount);
    if input.deposit_amount.is_some_and(|deposit| deposit < 0) {
        violations.push(
            ViolationKind::OutOfRange,
            "deposit_amount",
            "Deposit cannot be negative.",
        );
    }

    if let Some(collected) = input.rent_collected {
        if collected < 0 {
            violations.push(
                ViolationKind::OutOfRange,
                "rent_collected",
                "Rent collected cannot be negative.",
            );
        } else if collected > stay_due {
            violations.push(
                ViolationKind::Inconsistent,
                "rent_collected",
                format!("Rent collected cannot exceed the stay due of {stay_due}."),
            );
        }
    }
    if let Some(collected) = input.deposit_collected {
        let deposit = input.deposit_amount.unwrap_or(0);
        if collected < 0 {
            violations.push(
                ViolationKind::OutOfRange,
                "deposit_collected",
                "Deposit collected cannot be negative.",
            );
        } else if collected > deposit {
            violations.push(
                ViolationKind::Inconsistent,
                "deposit_collected",
                format!("Deposit collected cannot exceed the deposit of {deposit}."),
            );
        }
    }

    violations.finish()
}

fn check_advance_fields(
    violations: &mut Violations,
    input: &AdvanceBookingInput,
    rooms: &[Room],
    exempt: Option<&BedAssignment>,
) {
    check_identity(violations, &input.name, &input.phone, input.email.as_deref());
    check_slot(
        violations,
        rooms,
        input.room_id.as_deref(),
        input.bed_letter,
        exempt,
        SlotMode::LongTerm,
    );

    let rent = check_positive(violations, "rent_amount", "Rent", input.rent_amount);
    let deposit = check_positive(violations, "deposit_amount", "Deposit", input.deposit_amount);
    check_advance(violations, "advance_rent", "Advance rent", input.advance_rent, rent, "rent");
    check_advance(
        violations,
        "advance_deposit",
        "Advance deposit",
        input.advance_deposit,
        deposit,
        "deposit",
    );
}

fn check_identity(violations: &mut Violations, name: &str, phone: &str, email: Option<&str>) {
    if name.trim().is_empty() {
        violations.missing("name", "Name");
    }

    let phone = phone.trim();
    if phone.is_empty() {
        violations.missing("phone", "Phone number");
    } else if !is_ten_digit_phone(phone) {
        violations.push(
            ViolationKind::OutOfRange,
            "phone",
            "Phone number must be exactly 10 digits.",
        );
    }

    if let Some(email) = email.map(str::trim).filter(|value| !value.is_empty()) {
        if !email.to_string().validate_email() {
            violations.push(
                ViolationKind::OutOfRange,
                "email",
                "Email address is not valid.",
            );
        }
    }
}

fn is_ten_digit_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|character| character.is_ascii_digit())
}

fn check_positive(
    violations: &mut Violations,
    field: &str,
    label: &str,
    value: Option<i64>,
) -> Option<i64> {
    match value {
        None => {
            violations.missing(field, label);
            None
        }
        Some(amount) if amount <= 0 => {
            violations.push(
                ViolationKind::OutOfRange,
                field,
                format!("{label} must be greater than 0."),
            );
            None
        }
        Some(amount) => Some(amount),
    }
}

fn check_advance(
    violations: &mut Violations,
    field: &str,
    label: &str,
    advance: Option<i64>,
    principal: Option<i64>,
    principal_label: &str,
) {
    let Some(advance) = advance else {
        return;
    };
    if advance <= 0 {
        violations.push(
            ViolationKind::OutOfRange,
            field,
            format!("{label} must be greater than 0 when provided."),
        );
        return;
    }
    if principal.is_some_and(|principal| advance > principal) {
        violations.push(
            ViolationKind::Inconsistent,
            field,
            format!("{label} cannot exceed the {principal_label}."),
        );
    }
}

fn check_edit_window(
    violations: &mut Violations,
    joining_date: Option<NaiveDate>,
    original_joining_date: NaiveDate,
) {
    let Some(joining) = joining_date else {
        violations.missing("joining_date", "Joining date");
        return;
    };
    let earliest = sub_months(original_joining_date, 1);
    if joining > original_joining_date || joining < earliest {
        violations.push(
            ViolationKind::OutOfRange,
            "joining_date",
            format!("Joining date must be between {earliest} and {original_joining_date}."),
        );
    }
}

fn check_slot(
    violations: &mut Violations,
    rooms: &[Room],
    room_id: Option<&str>,
    bed_letter: Option<char>,
    exempt: Option<&BedAssignment>,
    mode: SlotMode,
) {
    let room_id = room_id.map(str::trim).filter(|value| !value.is_empty());
    if room_id.is_none() {
        violations.missing("room_id", "Room");
    }
    if bed_letter.is_none() {
        violations.missing("bed_letter", "Bed");
    }
    let (Some(room_id), Some(letter)) = (room_id, bed_letter) else {
        return;
    };

    let Some(room) = rooms.iter().find(|room| room.id == room_id) else {
        violations.push(
            ViolationKind::Unavailable,
            "room_id",
            "Selected room does not exist in this property.",
        );
        return;
    };
    let Some(bed) = room.bed(letter) else {
        violations.push(
            ViolationKind::Unavailable,
            "bed_letter",
            format!("Room {} has no bed {letter}.", room.room_no),
        );
        return;
    };

    let selectable = match mode {
        SlotMode::LongTerm => bed_selectable(&room.id, bed, exempt),
        SlotMode::Interim => interim_bed_selectable(&room.id, bed, exempt),
    };
    if !selectable {
        violations.push(
            ViolationKind::Unavailable,
            "bed_letter",
            format!("Bed {letter} in room {} is not available.", room.room_no),
        );
    }
}
