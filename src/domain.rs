//! Typed room, tenant and payment records.
//!
//! Overall tenancy status, KYC status and the per-bed status codes are three
//! separate enums; only [`BedTenantStatus`] has a numeric wire form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    AdvanceBooked,
    ShortTerm,
    Active,
    UnderNotice,
    CheckedOut,
}

impl OverallStatus {
    pub const OCCUPYING: [OverallStatus; 4] = [
        OverallStatus::Active,
        OverallStatus::ShortTerm,
        OverallStatus::AdvanceBooked,
        OverallStatus::UnderNotice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdvanceBooked => "advance_booked",
            Self::ShortTerm => "short_term",
            Self::Active => "active",
            Self::UnderNotice => "under_notice",
            Self::CheckedOut => "checked_out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "advance_booked" => Some(Self::AdvanceBooked),
            "short_term" => Some(Self::ShortTerm),
            "active" => Some(Self::Active),
            "under_notice" => Some(Self::UnderNotice),
            "checked_out" => Some(Self::CheckedOut),
            _ => None,
        }
    }

    /// Active, ShortTerm and AdvanceBooked block a slot outright. UnderNotice
    /// still holds it until the move-out date.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Active | Self::ShortTerm | Self::AdvanceBooked)
    }

    pub fn occupies_bed(self) -> bool {
        self.is_blocking() || self == Self::UnderNotice
    }

    pub fn bed_status(self) -> Option<BedTenantStatus> {
        match self {
            Self::Active | Self::ShortTerm => Some(BedTenantStatus::Filled),
            Self::UnderNotice => Some(BedTenantStatus::UnderNotice),
            Self::AdvanceBooked => Some(BedTenantStatus::AdvBooked),
            Self::CheckedOut => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    Pending,
    LinkSent,
    Verified,
    Rejected,
}

impl KycStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::LinkSent => "link_sent",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

/// Status code attached to a bed slot by the tenant holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedTenantStatus {
    Filled,
    UnderNotice,
    AdvBooked,
}

impl BedTenantStatus {
    pub fn code(self) -> i16 {
        match self {
            Self::Filled => 1,
            Self::UnderNotice => 2,
            Self::AdvBooked => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Filled),
            2 => Some(Self::UnderNotice),
            3 => Some(Self::AdvBooked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueType {
    Monthly,
    FirstMonth,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedSlot {
    pub letter: char,
    #[serde(default)]
    pub codes: Vec<i16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub property_id: String,
    pub room_no: String,
    #[serde(default)]
    pub floor: i32,
    pub total_beds: i32,
    pub bed_price: i64,
    pub security_deposit: i64,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub beds: Vec<BedSlot>,
}

impl Room {
    pub fn bed(&self, letter: char) -> Option<&BedSlot> {
        self.beds.iter().find(|bed| bed.letter == letter)
    }
}

/// A (room, bed) pair, used to exempt a tenant's own slot from availability checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BedAssignment {
    pub room_id: String,
    pub bed: char,
}

impl BedAssignment {
    pub fn new(room_id: impl Into<String>, bed: char) -> Self {
        Self {
            room_id: room_id.into(),
            bed,
        }
    }

    pub fn matches(&self, room_id: &str, bed: char) -> bool {
        self.room_id == room_id && self.bed == bed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: String,
    pub property_id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub room_id: String,
    pub bed_letter: char,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub move_out_date: Option<NaiveDate>,
    pub rent_amount: i64,
    pub deposit_amount: i64,
    #[serde(default)]
    pub advance_rent_paid: i64,
    #[serde(default)]
    pub advance_deposit_paid: i64,
    #[serde(default)]
    pub rent_paid: i64,
    #[serde(default)]
    pub deposit_paid: i64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_type: Option<DueType>,
    pub overall_status: OverallStatus,
    #[serde(default)]
    pub kyc_status: KycStatus,
    #[serde(default)]
    pub kyc_rejection_reason: Option<String>,
    #[serde(default)]
    pub notice_period_days: Option<i32>,
    #[serde(default)]
    pub persisted_proration_amount: Option<i64>,
}

impl TenantRecord {
    pub fn assignment(&self) -> BedAssignment {
        BedAssignment::new(self.room_id.clone(), self.bed_letter)
    }
}

/// Tenant fields as sent to the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTenant {
    pub property_id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub room_id: String,
    pub bed_letter: char,
    pub joining_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_out_date: Option<NaiveDate>,
    pub rent_amount: i64,
    pub deposit_amount: i64,
    pub advance_rent_paid: i64,
    pub advance_deposit_paid: i64,
    pub rent_paid: i64,
    pub deposit_paid: i64,
    pub overall_status: OverallStatus,
    pub kyc_status: KycStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_period_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_proration_amount: Option<i64>,
}

/// Partial tenant update. Unset fields are left alone; `Some(None)` clears a
/// nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_status: Option<OverallStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_status: Option<KycStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_rejection_reason: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_letter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_out_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_rent_paid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_deposit_paid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_paid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_paid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_type: Option<DueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_proration_amount: Option<i64>,
}

impl TenantPatch {
    pub fn status(overall_status: OverallStatus) -> Self {
        Self {
            overall_status: Some(overall_status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCategory {
    Rent,
    Deposit,
    AdvanceRent,
    AdvanceDeposit,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    Cash,
    Upi,
    BankTransfer,
    Card,
}

/// Payment fields as sent to the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub tenant_id: String,
    pub property_id: String,
    pub category: PaymentCategory,
    pub amount: i64,
    pub total_amount: i64,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(flatten)]
    pub fields: NewPayment,
}
