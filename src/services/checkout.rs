use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info};

use crate::domain::{
    NewPayment, OverallStatus, Payment, PaymentCategory, PaymentMode, PaymentStatus, TenantPatch,
    TenantRecord,
};
use crate::error::{AppError, AppResult};
use crate::repository::store::TenantStore;
use crate::services::lifecycle::checkout_refund;

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub refund: Payment,
    pub tenant: TenantRecord,
}

pub fn refund_payment(
    tenant: &TenantRecord,
    amount: i64,
    payment_mode: PaymentMode,
    today: NaiveDate,
) -> NewPayment {
    NewPayment {
        tenant_id: tenant.id.clone(),
        property_id: tenant.property_id.clone(),
        category: PaymentCategory::Refund,
        amount,
        total_amount: amount,
        due_date: None,
        payment_date: Some(today),
        status: PaymentStatus::Paid,
        payment_mode,
    }
}

/// Records the deposit refund, then marks the tenant checked out.
///
/// The status update only runs once the refund is stored. If it then fails the
/// refund stays recorded and the caller gets [`AppError::Inconsistent`].
pub async fn checkout<S: TenantStore>(
    store: &S,
    tenant: &TenantRecord,
    deductions: i64,
    payment_mode: PaymentMode,
    today: NaiveDate,
) -> AppResult<CheckoutReceipt> {
    let amount = checkout_refund(tenant, deductions)?;
    let refund = store
        .insert_payment(&refund_payment(tenant, amount, payment_mode, today))
        .await?;

    match store
        .update_tenant(&tenant.id, &TenantPatch::status(OverallStatus::CheckedOut))
        .await
    {
        Ok(updated) => {
            info!(
                tenant_id = %tenant.id,
                refund_id = %refund.id,
                refund = amount,
                "Tenant checked out"
            );
            Ok(CheckoutReceipt {
                refund,
                tenant: updated,
            })
        }
        Err(update_error) => {
            error!(
                tenant_id = %tenant.id,
                refund_id = %refund.id,
                error = %update_error,
                "Refund recorded but tenant status update failed"
            );
            Err(AppError::Inconsistent(format!(
                "Refund {} was recorded but tenant {} is still {}.",
                refund.id,
                tenant.id,
                tenant.overall_status.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::checkout;
    use crate::domain::{
        KycStatus, NewPayment, NewTenant, OverallStatus, Payment, PaymentCategory, PaymentMode,
        TenantPatch, TenantRecord,
    };
    use crate::error::{AppError, AppResult};
    use crate::repository::store::TenantStore;
    use crate::services::lifecycle::tests::tenant;

    #[derive(Default)]
    struct RecordingStore {
        fail_payment: bool,
        fail_update: bool,
        payment_calls: AtomicUsize,
        update_calls: AtomicUsize,
        payments: Mutex<Vec<NewPayment>>,
    }

    impl TenantStore for RecordingStore {
        async fn insert_tenant(&self, _tenant: &NewTenant) -> AppResult<TenantRecord> {
            Err(AppError::Internal("not used".to_string()))
        }

        async fn update_tenant(
            &self,
            _tenant_id: &str,
            patch: &TenantPatch,
        ) -> AppResult<TenantRecord> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_update {
                return Err(AppError::Dependency("Database operation failed.".to_string()));
            }
            let mut updated = tenant(OverallStatus::Active, KycStatus::Verified);
            if let Some(status) = patch.overall_status {
                updated.overall_status = status;
            }
            Ok(updated)
        }

        async fn insert_payment(&self, payment: &NewPayment) -> AppResult<Payment> {
            self.payment_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_payment {
                return Err(AppError::Dependency("Database operation failed.".to_string()));
            }
            self.payments
                .lock()
                .expect("payments lock")
                .push(payment.clone());
            Ok(Payment {
                id: "pay-1".to_string(),
                fields: payment.clone(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date")
    }

    #[tokio::test]
    async fn records_refund_then_checks_out() {
        let store = RecordingStore::default();
        let active = tenant(OverallStatus::Active, KycStatus::Verified);

        let receipt = checkout(&store, &active, 2000, PaymentMode::Upi, today())
            .await
            .expect("checkout succeeds");

        assert_eq!(receipt.tenant.overall_status, OverallStatus::CheckedOut);
        assert_eq!(receipt.refund.fields.amount, 10000);
        assert_eq!(receipt.refund.fields.category, PaymentCategory::Refund);
        assert_eq!(receipt.refund.fields.payment_date, Some(today()));
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_term_stay_checks_out_with_partial_deposit() {
        let store = RecordingStore::default();
        let mut stay = tenant(OverallStatus::ShortTerm, KycStatus::Pending);
        stay.deposit_paid = 3000;

        let receipt = checkout(&store, &stay, 500, PaymentMode::Cash, today())
            .await
            .expect("short-term checkout succeeds");

        assert_eq!(receipt.tenant.overall_status, OverallStatus::CheckedOut);
        assert_eq!(receipt.refund.fields.amount, 2500);
        assert_eq!(receipt.refund.fields.tenant_id, "t-1");
        assert_eq!(store.payment_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refund_leaves_status_untouched() {
        let store = RecordingStore {
            fail_payment: true,
            ..RecordingStore::default()
        };
        let active = tenant(OverallStatus::Active, KycStatus::Verified);

        let result = checkout(&store, &active, 0, PaymentMode::Cash, today()).await;

        assert!(matches!(result, Err(AppError::Dependency(_))));
        assert_eq!(store.payment_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_status_update_reports_inconsistency() {
        let store = RecordingStore {
            fail_update: true,
            ..RecordingStore::default()
        };
        let noticed = tenant(OverallStatus::UnderNotice, KycStatus::Verified);

        let result = checkout(&store, &noticed, 0, PaymentMode::Cash, today()).await;

        match result {
            Err(error @ AppError::Inconsistent(_)) => {
                assert_eq!(error.code(), "checkout_inconsistent");
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
        assert_eq!(store.payments.lock().expect("payments lock").len(), 1);
    }

    #[tokio::test]
    async fn rejects_excess_deductions_before_writing() {
        let store = RecordingStore::default();
        let active = tenant(OverallStatus::Active, KycStatus::Verified);

        let result = checkout(&store, &active, 12001, PaymentMode::Cash, today()).await;

        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
        assert_eq!(store.payment_calls.load(Ordering::SeqCst), 0);
    }
}
