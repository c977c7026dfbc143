use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::{DueType, OverallStatus, PaymentMode};
use crate::error::AppError;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

pub fn serialize_to_map<T>(value: &T) -> serde_json::Map<String, serde_json::Value>
where
    T: serde::Serialize,
{
    let json = serde_json::to_value(value)
        .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
    json.as_object().cloned().unwrap_or_default()
}

pub fn clamp_limit_in_range(limit: i64, minimum: i64, maximum: i64) -> i64 {
    limit.clamp(minimum, maximum)
}

/// Parses `active,under_notice` into statuses, skipping unknown names.
pub fn parse_status_csv(raw: Option<&str>) -> Vec<OverallStatus> {
    let mut statuses = Vec::new();
    for status in raw
        .unwrap_or_default()
        .split(',')
        .filter_map(OverallStatus::parse)
    {
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    statuses
}

fn default_limit_500() -> i64 {
    500
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct PropertyPath {
    pub property_id: String,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TenantPath {
    pub tenant_id: String,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct RoomsQuery {
    pub exempt_tenant_id: Option<String>,
    pub mode: Option<String>,
}

impl RoomsQuery {
    pub fn interim_mode(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("interim"))
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TenantsQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit_500")]
    pub limit: i64,
}

/// Form fields shared by creating and editing an advance booking.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub struct AdvanceBookingInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub room_id: Option<String>,
    pub bed_letter: Option<char>,
    pub joining_date: Option<NaiveDate>,
    pub rent_amount: Option<i64>,
    pub deposit_amount: Option<i64>,
    pub advance_rent: Option<i64>,
    pub advance_deposit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub struct ConvertBookingInput {
    #[serde(flatten)]
    pub booking: AdvanceBookingInput,
    pub rent_collected: Option<i64>,
    pub deposit_collected: Option<i64>,
    pub due_type: Option<DueType>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub struct InterimBookingInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub room_id: Option<String>,
    pub bed_letter: Option<char>,
    pub joining_date: Option<NaiveDate>,
    pub move_out_date: Option<NaiveDate>,
    pub rent_amount: Option<i64>,
    pub deposit_amount: Option<i64>,
    pub rent_collected: Option<i64>,
    pub deposit_collected: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub struct GiveNoticeInput {
    pub move_out_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct RejectKycInput {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize, Validate)]
pub struct CheckoutInput {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub deductions: i64,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct StayQuoteInput {
    pub joining_date: Option<NaiveDate>,
    pub move_out_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub monthly_rent: i64,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct DueDateQuoteInput {
    pub due_type: DueType,
    pub joining_date: Option<NaiveDate>,
    pub custom_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::{parse_status_csv, CheckoutInput, ConvertBookingInput, RejectKycInput};
    use crate::domain::{DueType, OverallStatus};

    #[test]
    fn parses_status_sets_without_duplicates() {
        assert_eq!(
            parse_status_csv(Some("active, under_notice,active,bogus")),
            vec![OverallStatus::Active, OverallStatus::UnderNotice]
        );
        assert!(parse_status_csv(None).is_empty());
    }

    #[test]
    fn convert_input_flattens_booking_fields() {
        let input: ConvertBookingInput = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "phone": "9876543210",
            "room_id": "r-1",
            "bed_letter": "A",
            "joining_date": "2024-03-10",
            "rent_amount": 6000,
            "deposit_amount": 12000,
            "rent_collected": 6000,
            "due_type": "first_month"
        }))
        .expect("valid convert payload");
        assert_eq!(input.booking.bed_letter, Some('A'));
        assert_eq!(input.due_type, Some(DueType::FirstMonth));
        assert_eq!(input.deposit_collected, None);
    }

    #[test]
    fn rejects_negative_deductions_and_empty_reason() {
        let checkout = CheckoutInput {
            deductions: -1,
            ..CheckoutInput::default()
        };
        assert!(checkout.validate().is_err());
        let reject = RejectKycInput {
            reason: String::new(),
        };
        assert!(reject.validate().is_err());
    }
}
