//! Tenant lifecycle: overall status, the independent KYC sub-status, and the
//! actions allowed at each combination of the two.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::{DueType, KycStatus, OverallStatus, TenantPatch, TenantRecord};
use crate::error::AppError;
use crate::schemas::AdvanceBookingInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Convert,
    SendEkyc,
    ApproveKyc,
    RejectKyc,
    GiveNotice,
    RemoveNotice,
    Checkout,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Convert => "convert",
            Self::SendEkyc => "send_ekyc",
            Self::ApproveKyc => "approve_kyc",
            Self::RejectKyc => "reject_kyc",
            Self::GiveNotice => "give_notice",
            Self::RemoveNotice => "remove_notice",
            Self::Checkout => "checkout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Action '{}' is not allowed while the tenant is {} (KYC {}).", .action.as_str(), .status.as_str(), .kyc.as_str())]
    NotAllowed {
        action: LifecycleAction,
        status: OverallStatus,
        kyc: KycStatus,
    },
    #[error("A reason is required to reject KYC.")]
    MissingReason,
    #[error("Move-out date {move_out} cannot be before {today}.")]
    MoveOutInPast { move_out: NaiveDate, today: NaiveDate },
    #[error("Deductions of {deductions} must be between 0 and the deposit paid ({deposit_paid}).")]
    DeductionsOutOfRange { deductions: i64, deposit_paid: i64 },
}

impl From<TransitionError> for AppError {
    fn from(error: TransitionError) -> Self {
        AppError::UnprocessableEntity(error.to_string())
    }
}

pub fn legal_actions(overall: OverallStatus, kyc: KycStatus) -> &'static [LifecycleAction] {
    use LifecycleAction::{
        ApproveKyc, Checkout, Convert, GiveNotice, RejectKyc, RemoveNotice, SendEkyc,
    };

    match (overall, kyc) {
        (OverallStatus::AdvanceBooked, _) => &[Convert],
        (OverallStatus::ShortTerm, _) => &[Checkout],
        (OverallStatus::UnderNotice, _) => &[RemoveNotice, Checkout],
        (OverallStatus::Active, KycStatus::Verified) => &[RejectKyc, GiveNotice, Checkout],
        (OverallStatus::Active, KycStatus::LinkSent) => {
            &[ApproveKyc, RejectKyc, GiveNotice, Checkout]
        }
        (OverallStatus::Active, KycStatus::Pending | KycStatus::Rejected) => {
            &[SendEkyc, ApproveKyc, GiveNotice, Checkout]
        }
        (OverallStatus::CheckedOut, _) => &[],
    }
}

pub fn ensure_allowed(
    tenant: &TenantRecord,
    action: LifecycleAction,
) -> Result<(), TransitionError> {
    if legal_actions(tenant.overall_status, tenant.kyc_status).contains(&action) {
        return Ok(());
    }
    Err(TransitionError::NotAllowed {
        action,
        status: tenant.overall_status,
        kyc: tenant.kyc_status,
    })
}

/// Collected amounts and the resolved due date for a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub rent_collected: i64,
    pub deposit_collected: i64,
    pub due_type: DueType,
    pub due_date: NaiveDate,
}

pub fn convert(
    tenant: &TenantRecord,
    booking: &AdvanceBookingInput,
    conversion: &Conversion,
) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::Convert)?;
    Ok(TenantPatch {
        overall_status: Some(OverallStatus::Active),
        kyc_status: Some(KycStatus::Pending),
        rent_paid: Some(conversion.rent_collected),
        deposit_paid: Some(conversion.deposit_collected),
        due_type: Some(conversion.due_type),
        due_date: Some(conversion.due_date),
        ..booking_patch(booking)
    })
}

/// Field changes from an advance-booking form, without any status change.
pub fn booking_patch(booking: &AdvanceBookingInput) -> TenantPatch {
    TenantPatch {
        name: Some(booking.name.trim().to_string()),
        phone: Some(booking.phone.trim().to_string()),
        email: Some(trimmed(booking.email.as_deref())),
        gender: Some(trimmed(booking.gender.as_deref())),
        room_id: booking.room_id.as_deref().map(str::trim).map(ToOwned::to_owned),
        bed_letter: booking.bed_letter,
        joining_date: booking.joining_date,
        rent_amount: booking.rent_amount,
        deposit_amount: booking.deposit_amount,
        advance_rent_paid: Some(booking.advance_rent.unwrap_or(0)),
        advance_deposit_paid: Some(booking.advance_deposit.unwrap_or(0)),
        ..TenantPatch::default()
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
}

/// Puts an active tenant on notice. Without an explicit date the move-out falls
/// `notice_period_days` after today (the tenant's own period wins over the default).
pub fn give_notice(
    tenant: &TenantRecord,
    move_out_date: Option<NaiveDate>,
    today: NaiveDate,
    default_notice_period_days: i32,
) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::GiveNotice)?;
    let move_out = match move_out_date {
        Some(date) if date < today => {
            return Err(TransitionError::MoveOutInPast {
                move_out: date,
                today,
            })
        }
        Some(date) => date,
        None => {
            let days = tenant
                .notice_period_days
                .unwrap_or(default_notice_period_days)
                .max(0);
            today
                .checked_add_days(Days::new(u64::try_from(days).unwrap_or(0)))
                .unwrap_or(today)
        }
    };

    Ok(TenantPatch {
        move_out_date: Some(Some(move_out)),
        ..TenantPatch::status(OverallStatus::UnderNotice)
    })
}

pub fn remove_notice(tenant: &TenantRecord) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::RemoveNotice)?;
    Ok(TenantPatch {
        move_out_date: Some(None),
        ..TenantPatch::status(OverallStatus::Active)
    })
}

pub fn send_ekyc(tenant: &TenantRecord) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::SendEkyc)?;
    Ok(kyc_patch(KycStatus::LinkSent, None))
}

pub fn approve_kyc(tenant: &TenantRecord) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::ApproveKyc)?;
    Ok(kyc_patch(KycStatus::Verified, None))
}

pub fn reject_kyc(tenant: &TenantRecord, reason: &str) -> Result<TenantPatch, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::RejectKyc)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(TransitionError::MissingReason);
    }
    Ok(kyc_patch(KycStatus::Rejected, Some(reason.to_string())))
}

fn kyc_patch(status: KycStatus, reason: Option<String>) -> TenantPatch {
    TenantPatch {
        kyc_status: Some(status),
        kyc_rejection_reason: Some(reason),
        ..TenantPatch::default()
    }
}

/// Deposit returned on checkout: what was paid minus the deductions.
pub fn checkout_refund(tenant: &TenantRecord, deductions: i64) -> Result<i64, TransitionError> {
    ensure_allowed(tenant, LifecycleAction::Checkout)?;
    if deductions < 0 || deductions > tenant.deposit_paid {
        return Err(TransitionError::DeductionsOutOfRange {
            deductions,
            deposit_paid: tenant.deposit_paid,
        });
    }
    Ok(tenant.deposit_paid - deductions)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use super::{
        approve_kyc, checkout_refund, convert, give_notice, legal_actions, reject_kyc,
        remove_notice, send_ekyc, Conversion, LifecycleAction, TransitionError,
    };
    use crate::domain::{DueType, KycStatus, OverallStatus, TenantRecord};
    use crate::schemas::AdvanceBookingInput;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    pub(crate) fn tenant(status: OverallStatus, kyc: KycStatus) -> TenantRecord {
        TenantRecord {
            id: "t-1".to_string(),
            property_id: "p-1".to_string(),
            name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            gender: None,
            room_id: "r-1".to_string(),
            bed_letter: 'A',
            joining_date: date(2024, 1, 1),
            move_out_date: None,
            rent_amount: 6000,
            deposit_amount: 12000,
            advance_rent_paid: 0,
            advance_deposit_paid: 0,
            rent_paid: 6000,
            deposit_paid: 12000,
            due_date: None,
            due_type: None,
            overall_status: status,
            kyc_status: kyc,
            kyc_rejection_reason: None,
            notice_period_days: None,
            persisted_proration_amount: None,
        }
    }

    #[test]
    fn action_sets_follow_status_pairs() {
        use LifecycleAction::*;
        assert_eq!(
            legal_actions(OverallStatus::UnderNotice, KycStatus::Verified),
            &[RemoveNotice, Checkout]
        );
        assert_eq!(
            legal_actions(OverallStatus::Active, KycStatus::Verified),
            &[RejectKyc, GiveNotice, Checkout]
        );
        assert_eq!(
            legal_actions(OverallStatus::Active, KycStatus::LinkSent),
            &[ApproveKyc, RejectKyc, GiveNotice, Checkout]
        );
        for kyc in [KycStatus::Pending, KycStatus::Rejected] {
            assert_eq!(
                legal_actions(OverallStatus::Active, kyc),
                &[SendEkyc, ApproveKyc, GiveNotice, Checkout]
            );
        }
        assert_eq!(legal_actions(OverallStatus::AdvanceBooked, KycStatus::Pending), &[Convert]);
        for kyc in [KycStatus::Pending, KycStatus::LinkSent, KycStatus::Verified] {
            assert_eq!(legal_actions(OverallStatus::ShortTerm, kyc), &[Checkout]);
        }
        assert!(legal_actions(OverallStatus::CheckedOut, KycStatus::Verified).is_empty());
    }

    #[test]
    fn converts_advance_booking_to_active() {
        let booked = tenant(OverallStatus::AdvanceBooked, KycStatus::Pending);
        let booking = AdvanceBookingInput {
            name: " Asha Rao ".to_string(),
            phone: "9876543210".to_string(),
            joining_date: Some(date(2024, 1, 1)),
            ..AdvanceBookingInput::default()
        };
        let conversion = Conversion {
            rent_collected: 6000,
            deposit_collected: 12000,
            due_type: DueType::Monthly,
            due_date: date(2024, 2, 1),
        };
        let patch = convert(&booked, &booking, &conversion).expect("convert allowed");
        assert_eq!(patch.overall_status, Some(OverallStatus::Active));
        assert_eq!(patch.due_date, Some(date(2024, 2, 1)));
        assert_eq!(patch.name.as_deref(), Some("Asha Rao"));
        assert_eq!(patch.email, Some(None));

        let active = tenant(OverallStatus::Active, KycStatus::Pending);
        assert!(matches!(
            convert(&active, &booking, &conversion),
            Err(TransitionError::NotAllowed { .. })
        ));
    }

    #[test]
    fn notice_defaults_to_notice_period() {
        let today = date(2024, 5, 1);
        let mut active = tenant(OverallStatus::Active, KycStatus::Verified);
        let patch = give_notice(&active, None, today, 30).expect("notice allowed");
        assert_eq!(patch.overall_status, Some(OverallStatus::UnderNotice));
        assert_eq!(patch.move_out_date, Some(Some(date(2024, 5, 31))));

        active.notice_period_days = Some(15);
        let patch = give_notice(&active, None, today, 30).expect("notice allowed");
        assert_eq!(patch.move_out_date, Some(Some(date(2024, 5, 16))));

        assert_eq!(
            give_notice(&active, Some(date(2024, 4, 30)), today, 30),
            Err(TransitionError::MoveOutInPast {
                move_out: date(2024, 4, 30),
                today
            })
        );
    }

    #[test]
    fn notice_round_trip_clears_move_out() {
        let noticed = tenant(OverallStatus::UnderNotice, KycStatus::Verified);
        let patch = remove_notice(&noticed).expect("remove allowed");
        assert_eq!(patch.overall_status, Some(OverallStatus::Active));
        assert_eq!(patch.move_out_date, Some(None));

        assert!(give_notice(&noticed, None, date(2024, 5, 1), 30).is_err());
        assert!(remove_notice(&tenant(OverallStatus::Active, KycStatus::Verified)).is_err());
    }

    #[test]
    fn kyc_moves_through_link_and_review() {
        let pending = tenant(OverallStatus::Active, KycStatus::Pending);
        assert_eq!(send_ekyc(&pending).map(|p| p.kyc_status), Ok(Some(KycStatus::LinkSent)));

        let sent = tenant(OverallStatus::Active, KycStatus::LinkSent);
        assert!(send_ekyc(&sent).is_err());
        assert_eq!(approve_kyc(&sent).map(|p| p.kyc_status), Ok(Some(KycStatus::Verified)));

        assert_eq!(reject_kyc(&sent, "  "), Err(TransitionError::MissingReason));
        let rejected = reject_kyc(&sent, " blurred ID ").expect("reject allowed");
        assert_eq!(rejected.kyc_status, Some(KycStatus::Rejected));
        assert_eq!(rejected.kyc_rejection_reason, Some(Some("blurred ID".to_string())));

        let resend = tenant(OverallStatus::Active, KycStatus::Rejected);
        let patch = send_ekyc(&resend).expect("resend allowed");
        assert_eq!(patch.kyc_rejection_reason, Some(None));

        let noticed = tenant(OverallStatus::UnderNotice, KycStatus::Pending);
        assert!(send_ekyc(&noticed).is_err());
    }

    #[test]
    fn refund_is_deposit_minus_deductions() {
        let active = tenant(OverallStatus::Active, KycStatus::Verified);
        assert_eq!(checkout_refund(&active, 2000), Ok(10000));
        assert_eq!(checkout_refund(&active, 12000), Ok(0));
        assert!(checkout_refund(&active, 12001).is_err());
        assert!(checkout_refund(&active, -1).is_err());

        let booked = tenant(OverallStatus::AdvanceBooked, KycStatus::Pending);
        assert!(matches!(
            checkout_refund(&booked, 0),
            Err(TransitionError::NotAllowed { .. })
        ));
        let gone = tenant(OverallStatus::CheckedOut, KycStatus::Verified);
        assert!(checkout_refund(&gone, 0).is_err());
    }
}
