//! Edit session behind the booking forms.
//!
//! Derived values (bed, rent and deposit defaults, stay due, due date) only
//! change in response to an explicit field change, and only when the value
//! actually differs from what the session already holds.

use chrono::NaiveDate;

use crate::domain::{DueType, Room, TenantRecord};
use crate::services::due_date::{auto_recomputes, clamp_to_today, resolve_due_date};
use crate::services::proration::compute_stay_due;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    room_id: Option<String>,
    bed_letter: Option<char>,
    joining_date: Option<NaiveDate>,
    move_out_date: Option<NaiveDate>,
    rent_amount: Option<i64>,
    deposit_amount: Option<i64>,
    due_type: Option<DueType>,
    due_date: Option<NaiveDate>,
    stay_due: i64,
}

impl BookingForm {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Loads an existing booking. A persisted proration is kept as-is; it is
    /// only computed here when none was stored.
    pub fn from_tenant(tenant: &TenantRecord, today: NaiveDate) -> Self {
        let stay_due = tenant.persisted_proration_amount.unwrap_or_else(|| {
            compute_stay_due(
                Some(tenant.joining_date),
                tenant.move_out_date,
                tenant.rent_amount,
            )
        });
        let due_date = match tenant.due_type {
            Some(DueType::Custom) => tenant.due_date.map(|date| clamp_to_today(date, today)),
            _ => tenant.due_date,
        };

        Self {
            room_id: Some(tenant.room_id.clone()),
            bed_letter: Some(tenant.bed_letter),
            joining_date: Some(tenant.joining_date),
            move_out_date: tenant.move_out_date,
            rent_amount: Some(tenant.rent_amount),
            deposit_amount: Some(tenant.deposit_amount),
            due_type: tenant.due_type,
            due_date,
            stay_due,
        }
    }

    /// Switching rooms clears the bed and takes rent and deposit from the room.
    pub fn select_room(&mut self, room: &Room) {
        if self.room_id.as_deref() == Some(room.id.as_str()) {
            return;
        }
        self.room_id = Some(room.id.clone());
        self.bed_letter = None;
        self.deposit_amount = Some(room.security_deposit);
        self.set_rent(Some(room.bed_price));
    }

    pub fn select_bed(&mut self, letter: char) {
        self.bed_letter = Some(letter);
    }

    pub fn set_joining_date(&mut self, joining_date: Option<NaiveDate>, today: NaiveDate) {
        if self.joining_date == joining_date {
            return;
        }
        self.joining_date = joining_date;
        self.refresh_stay_due();
        self.refresh_due_date(today);
    }

    pub fn set_move_out_date(&mut self, move_out_date: Option<NaiveDate>) {
        if self.move_out_date == move_out_date {
            return;
        }
        self.move_out_date = move_out_date;
        self.refresh_stay_due();
    }

    pub fn set_rent(&mut self, rent_amount: Option<i64>) {
        if self.rent_amount == rent_amount {
            return;
        }
        self.rent_amount = rent_amount;
        self.refresh_stay_due();
    }

    pub fn set_deposit(&mut self, deposit_amount: Option<i64>) {
        self.deposit_amount = deposit_amount;
    }

    pub fn set_due_type(&mut self, due_type: DueType, today: NaiveDate) {
        if self.due_type == Some(due_type) {
            return;
        }
        self.due_type = Some(due_type);
        self.refresh_due_date(today);
    }

    /// Ignored unless the due type is Custom. Past dates move up to `today`.
    pub fn set_custom_due_date(&mut self, date: NaiveDate, today: NaiveDate) {
        if self.due_type == Some(DueType::Custom) {
            self.due_date = Some(clamp_to_today(date, today));
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn bed_letter(&self) -> Option<char> {
        self.bed_letter
    }

    pub fn rent_amount(&self) -> Option<i64> {
        self.rent_amount
    }

    pub fn deposit_amount(&self) -> Option<i64> {
        self.deposit_amount
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn stay_due(&self) -> i64 {
        self.stay_due
    }

    fn refresh_stay_due(&mut self) {
        self.stay_due = compute_stay_due(
            self.joining_date,
            self.move_out_date,
            self.rent_amount.unwrap_or(0),
        );
    }

    fn refresh_due_date(&mut self, today: NaiveDate) {
        let Some(due_type) = self.due_type else {
            return;
        };
        if auto_recomputes(due_type) {
            self.due_date = resolve_due_date(due_type, self.joining_date, None, today);
        } else if let Some(date) = self.due_date {
            self.due_date = Some(clamp_to_today(date, today));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::BookingForm;
    use crate::domain::{DueType, KycStatus, OverallStatus, Room};
    use crate::services::lifecycle::tests::tenant;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn room(id: &str, bed_price: i64, security_deposit: i64) -> Room {
        Room {
            id: id.to_string(),
            property_id: "p-1".to_string(),
            room_no: id.to_uppercase(),
            floor: 0,
            total_beds: 2,
            bed_price,
            security_deposit,
            facilities: Vec::new(),
            beds: Vec::new(),
        }
    }

    #[test]
    fn room_change_resets_bed_and_fills_prices() {
        let mut form = BookingForm::blank();
        form.select_room(&room("r-1", 6000, 12000));
        form.select_bed('B');
        assert_eq!(form.rent_amount(), Some(6000));

        form.set_rent(Some(5500));
        form.select_room(&room("r-1", 6000, 12000));
        assert_eq!(form.bed_letter(), Some('B'));
        assert_eq!(form.rent_amount(), Some(5500));

        form.select_room(&room("r-2", 7000, 14000));
        assert_eq!(form.bed_letter(), None);
        assert_eq!(form.rent_amount(), Some(7000));
        assert_eq!(form.deposit_amount(), Some(14000));
    }

    #[test]
    fn keeps_persisted_proration_until_inputs_change() {
        let today = date(2024, 3, 1);
        let mut interim = tenant(OverallStatus::ShortTerm, KycStatus::Pending);
        interim.joining_date = date(2024, 3, 10);
        interim.move_out_date = Some(date(2024, 3, 12));
        interim.rent_amount = 6200;
        interim.persisted_proration_amount = Some(555);

        let mut form = BookingForm::from_tenant(&interim, today);
        assert_eq!(form.stay_due(), 555);

        form.set_move_out_date(Some(date(2024, 3, 12)));
        form.set_rent(Some(6200));
        assert_eq!(form.stay_due(), 555);

        form.set_move_out_date(Some(date(2024, 3, 13)));
        assert_eq!(form.stay_due(), 800);
    }

    #[test]
    fn computes_proration_when_none_was_stored() {
        let mut interim = tenant(OverallStatus::ShortTerm, KycStatus::Pending);
        interim.joining_date = date(2024, 3, 10);
        interim.move_out_date = Some(date(2024, 3, 12));
        interim.rent_amount = 6200;
        let form = BookingForm::from_tenant(&interim, date(2024, 3, 1));
        assert_eq!(form.stay_due(), 600);
    }

    #[test]
    fn auto_due_dates_follow_joining_date() {
        let today = date(2024, 1, 5);
        let mut form = BookingForm::blank();
        form.set_joining_date(Some(date(2024, 1, 31)), today);
        form.set_due_type(DueType::Monthly, today);
        assert_eq!(form.due_date(), Some(date(2024, 2, 29)));

        form.set_joining_date(Some(date(2024, 2, 10)), today);
        assert_eq!(form.due_date(), Some(date(2024, 3, 10)));

        form.set_due_type(DueType::FirstMonth, today);
        assert_eq!(form.due_date(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn custom_due_date_only_clamps() {
        let today = date(2024, 1, 5);
        let mut form = BookingForm::blank();
        form.set_joining_date(Some(date(2024, 1, 10)), today);
        form.set_due_type(DueType::Custom, today);
        assert_eq!(form.due_date(), None);

        form.set_custom_due_date(date(2024, 1, 20), today);
        form.set_joining_date(Some(date(2024, 1, 12)), today);
        assert_eq!(form.due_date(), Some(date(2024, 1, 20)));

        form.set_custom_due_date(date(2023, 12, 1), today);
        assert_eq!(form.due_date(), Some(today));

        let later = date(2024, 1, 25);
        form.set_joining_date(Some(date(2024, 1, 15)), later);
        assert_eq!(form.due_date(), Some(later));
    }

    #[test]
    fn loading_clamps_a_stale_custom_due_date() {
        let mut active = tenant(OverallStatus::Active, KycStatus::Verified);
        active.due_type = Some(DueType::Custom);
        active.due_date = Some(date(2024, 1, 1));
        let form = BookingForm::from_tenant(&active, date(2024, 2, 1));
        assert_eq!(form.due_date(), Some(date(2024, 2, 1)));
    }
}
