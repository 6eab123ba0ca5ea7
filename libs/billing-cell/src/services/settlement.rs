// libs/billing-cell/src/services/settlement.rs
use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use appointment_cell::models::{
    appointments_collection, Appointment, AppointmentStatus, PaymentStatus,
};
use shared_database::{document::encode, DocumentStore, Write};
use shared_models::auth::Actor;

use crate::models::{
    BillingError, Payment, PaymentRecordStatus, RecordPaymentRequest, PAYMENTS_COLLECTION,
};
use crate::services::fees::FeeConfigService;

pub struct SettlementService {
    store: Arc<dyn DocumentStore>,
    fees: FeeConfigService,
}

impl SettlementService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let fees = FeeConfigService::new(Arc::clone(&store));
        Self { store, fees }
    }

    /// Record an offline payment against a completed appointment and
    /// settle it into platform/doctor/admin shares. The payment record and
    /// the paid flip commit as one batch guarded by the appointment's
    /// revision, so a second recording (concurrent or repeated) fails.
    pub async fn record_payment(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        request: RecordPaymentRequest,
        actor: &Actor,
    ) -> Result<Payment, BillingError> {
        if !actor.role.is_admin() {
            return Err(BillingError::Unauthorized(
                "Only admins can record payments".to_string(),
            ));
        }
        if request.amount <= 0.0 {
            return Err(BillingError::Validation(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        if request.method.trim().is_empty() {
            return Err(BillingError::Validation(
                "Payment method is required".to_string(),
            ));
        }

        let collection = appointments_collection(patient_id);
        let doc = self
            .store
            .get(&collection, &appointment_id.to_string())
            .await?
            .ok_or_else(|| BillingError::NotFound(format!("Appointment {}", appointment_id)))?;
        let appointment = doc.decode::<Appointment>()?;

        if appointment.status != AppointmentStatus::Completed {
            warn!(
                "Payment rejected for appointment {} in status {}",
                appointment_id, appointment.status
            );
            return Err(BillingError::Precondition(format!(
                "Payment can only be recorded for completed appointments (status: {})",
                appointment.status
            )));
        }
        if appointment.payment_status != PaymentStatus::Pending {
            return Err(BillingError::Precondition(format!(
                "Appointment is already settled (payment status: {})",
                appointment.payment_status
            )));
        }

        let config = self.fees.resolve_fee_configuration().await?;
        let split = config.split(request.amount);

        let payment = Payment {
            id: Uuid::new_v4(),
            appointment_id,
            patient_id,
            doctor_id: appointment.doctor_id,
            amount: request.amount,
            currency: request.currency.unwrap_or_else(|| "USD".to_string()),
            method: request.method,
            transaction_ref: request
                .transaction_ref
                .unwrap_or_else(offline_transaction_ref),
            status: PaymentRecordStatus::Successful,
            platform_fee_amount: split.platform_fee_amount,
            doctor_fee_amount: split.doctor_fee_amount,
            admin_fee_amount: split.admin_fee_amount,
            recorded_by: actor.id,
            created_at: Utc::now(),
        };

        self.store
            .commit(vec![
                Write::create(PAYMENTS_COLLECTION, &payment.id.to_string(), encode(&payment)?),
                Write::update_guarded(
                    &collection,
                    &appointment_id.to_string(),
                    json!({
                        "payment_status": PaymentStatus::Paid,
                        "updated_at": payment.created_at,
                    }),
                    doc.revision,
                ),
            ])
            .await?;

        info!(
            "Payment {} recorded for appointment {}: {} {} (platform {:.2} / doctor {:.2} / admin {:.2})",
            payment.id,
            appointment_id,
            payment.amount,
            payment.currency,
            payment.platform_fee_amount,
            payment.doctor_fee_amount,
            payment.admin_fee_amount
        );
        Ok(payment)
    }
}

/// Reference for payments collected outside any gateway (cash, bank
/// transfer).
fn offline_transaction_ref() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!(
        "OFFLINE-{}-{}",
        Utc::now().timestamp_millis(),
        suffix.to_uppercase()
    )
}
