// libs/billing-cell/src/services/rating.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{
    appointments_collection, Appointment, AppointmentStatus, PaymentStatus,
};
use doctor_cell::models::{Doctor, USERS_COLLECTION};
use shared_database::{document::encode, DocumentStore, StoreError, Write};
use shared_models::auth::{Actor, Role};

use crate::models::{BillingError, Feedback, SubmitFeedbackRequest, FEEDBACK_COLLECTION};

/// Attempts for the rating read-modify-write before surfacing contention.
const MAX_RATING_ATTEMPTS: u32 = 5;

pub struct FeedbackService {
    store: Arc<dyn DocumentStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record feedback for a settled appointment and fold the rating into
    /// the doctor's running average. The feedback write and the aggregate
    /// update commit together, guarded by the doctor document's revision:
    /// concurrent submissions for the same doctor retry instead of losing
    /// an update.
    pub async fn submit_feedback(
        &self,
        request: SubmitFeedbackRequest,
        actor: &Actor,
    ) -> Result<Feedback, BillingError> {
        if actor.role != Role::Patient || actor.id != request.patient_id {
            return Err(BillingError::Unauthorized(
                "Only the patient who received the service can leave feedback".to_string(),
            ));
        }
        if !(1..=5).contains(&request.rating) {
            return Err(BillingError::Validation(format!(
                "Rating must be an integer between 1 and 5, got {}",
                request.rating
            )));
        }

        let appointment = self.load_eligible_appointment(&request).await?;
        debug!(
            "Feedback eligible: appointment {} doctor {:?}",
            appointment.id, appointment.doctor_id
        );

        let feedback = Feedback {
            id: Uuid::new_v4(),
            appointment_id: request.appointment_id,
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            rating: request.rating,
            comments: request.comments.clone(),
            created_at: Utc::now(),
        };
        let feedback_write = Write::create(
            FEEDBACK_COLLECTION,
            &feedback.id.to_string(),
            encode(&feedback)?,
        );

        let mut attempts = 0;
        loop {
            attempts += 1;

            let doctor_doc = self
                .store
                .get(USERS_COLLECTION, &request.doctor_id.to_string())
                .await?;

            let Some(doctor_doc) = doctor_doc else {
                // Tolerated inconsistency: keep the feedback even when the
                // profile to aggregate onto is gone.
                warn!(
                    "Doctor {} missing, recording feedback {} without rating update",
                    request.doctor_id, feedback.id
                );
                self.store.commit(vec![feedback_write]).await?;
                return Ok(feedback);
            };

            let doctor = doctor_doc.decode::<Doctor>()?;
            let old_count = doctor.total_reviews;
            let new_count = old_count + 1;
            let new_average = (doctor.average_rating * old_count as f64 + request.rating as f64)
                / new_count as f64;

            let result = self
                .store
                .commit(vec![
                    feedback_write.clone(),
                    Write::update_guarded(
                        USERS_COLLECTION,
                        &request.doctor_id.to_string(),
                        json!({
                            "average_rating": new_average,
                            "total_reviews": new_count,
                            "updated_at": Utc::now(),
                        }),
                        doctor_doc.revision,
                    ),
                ])
                .await;

            match result {
                Ok(()) => {
                    info!(
                        "Feedback {} recorded, doctor {} rating now {:.2} over {} reviews",
                        feedback.id, request.doctor_id, new_average, new_count
                    );
                    return Ok(feedback);
                }
                Err(StoreError::Conflict(_)) if attempts < MAX_RATING_ATTEMPTS => {
                    debug!(
                        "Rating update contention for doctor {}, retrying (attempt {})",
                        request.doctor_id, attempts
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn load_eligible_appointment(
        &self,
        request: &SubmitFeedbackRequest,
    ) -> Result<Appointment, BillingError> {
        let doc = self
            .store
            .get(
                &appointments_collection(request.patient_id),
                &request.appointment_id.to_string(),
            )
            .await?
            .ok_or_else(|| {
                BillingError::NotFound(format!("Appointment {}", request.appointment_id))
            })?;
        let appointment = doc.decode::<Appointment>()?;

        if appointment.patient_id != request.patient_id {
            return Err(BillingError::Precondition(
                "Appointment does not belong to this patient".to_string(),
            ));
        }
        if appointment.status != AppointmentStatus::Completed
            || appointment.payment_status != PaymentStatus::Paid
        {
            return Err(BillingError::Precondition(
                "Feedback requires a completed, settled appointment".to_string(),
            ));
        }
        if appointment.doctor_id != Some(request.doctor_id) {
            return Err(BillingError::Precondition(
                "Doctor does not match the appointment's assignment".to_string(),
            ));
        }

        Ok(appointment)
    }
}
