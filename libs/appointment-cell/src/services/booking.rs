// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::profile::DoctorProfileService;
use shared_database::{document::encode, Document, DocumentStore, Write};
use shared_models::auth::{Actor, Role};

use crate::models::{
    appointments_collection, teleconsultations_collection, Appointment, AppointmentError,
    AppointmentStatus, AppointmentType, CreateAppointmentRequest, PaymentStatus,
    RescheduleAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::teleconsultation::TeleconsultationService;

pub struct AppointmentBookingService {
    store: Arc<dyn DocumentStore>,
    lifecycle: AppointmentLifecycleService,
    doctors: DoctorProfileService,
    teleconsultations: TeleconsultationService,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn DocumentStore>, teleconsult_platform: &str) -> Self {
        let doctors = DoctorProfileService::new(Arc::clone(&store));
        Self {
            store,
            lifecycle: AppointmentLifecycleService::new(),
            doctors,
            teleconsultations: TeleconsultationService::new(teleconsult_platform),
        }
    }

    /// Create a new appointment request. Patients book for themselves;
    /// admins may book on a patient's behalf.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Creating {:?} appointment for patient {}",
            request.appointment_type, request.patient_id
        );

        match actor.role {
            Role::Patient if actor.id == request.patient_id => {}
            Role::Admin | Role::Superadmin => {}
            _ => {
                return Err(AppointmentError::Unauthorized(
                    "Only the patient or an admin can book this appointment".to_string(),
                ))
            }
        }

        if request.appointment_date < Utc::now().date_naive() {
            return Err(AppointmentError::Validation(
                "Appointment date cannot be in the past".to_string(),
            ));
        }
        if request.appointment_type == AppointmentType::InPerson && request.address_id.is_none() {
            return Err(AppointmentError::Validation(
                "In-person appointments require a visit address".to_string(),
            ));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: None,
            service_id: request.service_id,
            address_id: request.address_id,
            appointment_date: request.appointment_date,
            time_slot: request.time_slot,
            estimated_cost: request.estimated_cost,
            appointment_type: request.appointment_type,
            teleconsultation_id: None,
            status: AppointmentStatus::PendingAssignment,
            payment_status: PaymentStatus::Pending,
            cancellation_reason: None,
            assigned_at: None,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(
                &appointments_collection(appointment.patient_id),
                &appointment.id.to_string(),
                encode(&appointment)?,
            )
            .await?;

        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    /// Assign an active doctor to a pending appointment. For
    /// teleconsultations the room record is provisioned in the same batch,
    /// so assignment and provisioning land or fail together.
    pub async fn assign_doctor(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        doctor_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        if !actor.role.is_admin() {
            return Err(AppointmentError::Unauthorized(
                "Only admins can assign doctors".to_string(),
            ));
        }

        let (mut appointment, revision) = self.load(patient_id, appointment_id).await?;

        if !self.lifecycle.can_assign(&appointment.status) {
            warn!(
                "Assignment rejected for appointment {} in status {}",
                appointment_id, appointment.status
            );
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Assigned,
            });
        }

        let doctor = match self.doctors.get_doctor(doctor_id).await {
            Ok(doctor) => doctor,
            Err(DoctorError::NotFound(id)) => return Err(AppointmentError::DoctorNotFound(id)),
            Err(e) => return Err(AppointmentError::Validation(e.to_string())),
        };
        if !doctor.is_active() {
            return Err(AppointmentError::DoctorNotFound(doctor_id));
        }

        let now = Utc::now();
        appointment.doctor_id = Some(doctor_id);
        appointment.status = AppointmentStatus::Assigned;
        appointment.assigned_at = Some(now);
        appointment.updated_at = now;

        let mut patch = json!({
            "doctor_id": doctor_id,
            "status": AppointmentStatus::Assigned,
            "assigned_at": now,
            "updated_at": now,
        });

        let mut writes = Vec::new();
        if appointment.appointment_type == AppointmentType::Teleconsultation {
            let room = self.teleconsultations.build_record(&appointment, doctor_id);
            appointment.teleconsultation_id = Some(room.id);
            patch["teleconsultation_id"] = json!(room.id);
            writes.push(Write::create(
                &teleconsultations_collection(patient_id, appointment_id),
                &room.id.to_string(),
                encode(&room)?,
            ));
        }
        writes.push(Write::update_guarded(
            &appointments_collection(patient_id),
            &appointment_id.to_string(),
            patch,
            revision,
        ));

        self.store.commit(writes).await?;

        info!(
            "Doctor {} assigned to appointment {}",
            doctor_id, appointment_id
        );
        Ok(appointment)
    }

    /// Doctor-driven progression along the forward pipeline.
    pub async fn advance_status(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, revision) = self.load(patient_id, appointment_id).await?;

        if actor.role != Role::Doctor || appointment.doctor_id != Some(actor.id) {
            return Err(AppointmentError::Unauthorized(
                "Only the assigned doctor can progress this appointment".to_string(),
            ));
        }

        self.lifecycle.validate_advance(&appointment.status, &new_status)?;

        let now = Utc::now();
        appointment.status = new_status;
        appointment.updated_at = now;

        self.guarded_status_update(
            patient_id,
            appointment_id,
            json!({ "status": new_status, "updated_at": now }),
            revision,
        )
        .await?;

        info!("Appointment {} advanced to {}", appointment_id, new_status);
        Ok(appointment)
    }

    /// Cancel before the visit is underway. The terminal status records who
    /// backed out.
    pub async fn cancel(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let (mut appointment, revision) = self.load(patient_id, appointment_id).await?;

        let cancelled_status = match actor.role {
            Role::Patient if actor.id == patient_id => AppointmentStatus::CancelledByPatient,
            Role::Doctor if appointment.doctor_id == Some(actor.id) => {
                AppointmentStatus::CancelledByDoctor
            }
            _ => {
                return Err(AppointmentError::Unauthorized(
                    "Only the patient or the assigned doctor can cancel".to_string(),
                ))
            }
        };

        if !self.lifecycle.can_cancel(&appointment.status) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: cancelled_status,
            });
        }

        let now = Utc::now();
        appointment.status = cancelled_status;
        appointment.cancellation_reason = reason.clone();
        appointment.updated_at = now;

        self.guarded_status_update(
            patient_id,
            appointment_id,
            json!({
                "status": cancelled_status,
                "cancellation_reason": reason,
                "updated_at": now,
            }),
            revision,
        )
        .await?;

        info!("Appointment {} cancelled ({})", appointment_id, cancelled_status);
        Ok(appointment)
    }

    /// A doctor turning down an open request before anyone is assigned.
    pub async fn decline(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        if actor.role != Role::Doctor {
            return Err(AppointmentError::Unauthorized(
                "Only doctors can decline appointment requests".to_string(),
            ));
        }

        let (mut appointment, revision) = self.load(patient_id, appointment_id).await?;

        if appointment.status != AppointmentStatus::PendingAssignment {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::DeclinedByDoctor,
            });
        }

        let now = Utc::now();
        appointment.status = AppointmentStatus::DeclinedByDoctor;
        appointment.cancellation_reason = reason.clone();
        appointment.updated_at = now;

        self.guarded_status_update(
            patient_id,
            appointment_id,
            json!({
                "status": AppointmentStatus::DeclinedByDoctor,
                "cancellation_reason": reason,
                "updated_at": now,
            }),
            revision,
        )
        .await?;

        info!("Appointment {} declined by doctor {}", appointment_id, actor.id);
        Ok(appointment)
    }

    /// Overwrite the requested date/slot and park the record as
    /// rescheduled. No operation re-enters a rescheduled appointment into
    /// the pipeline.
    pub async fn reschedule(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        match actor.role {
            Role::Patient if actor.id == patient_id => {}
            Role::Admin | Role::Superadmin => {}
            _ => {
                return Err(AppointmentError::Unauthorized(
                    "Only the patient or an admin can reschedule".to_string(),
                ))
            }
        }

        if request.new_date < Utc::now().date_naive() {
            return Err(AppointmentError::Validation(
                "New appointment date cannot be in the past".to_string(),
            ));
        }

        let (mut appointment, revision) = self.load(patient_id, appointment_id).await?;

        if !self.lifecycle.can_reschedule(&appointment.status) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Rescheduled,
            });
        }

        let now = Utc::now();
        appointment.appointment_date = request.new_date;
        appointment.time_slot = request.new_time_slot;
        appointment.status = AppointmentStatus::Rescheduled;
        appointment.updated_at = now;

        self.guarded_status_update(
            patient_id,
            appointment_id,
            json!({
                "appointment_date": request.new_date,
                "time_slot": request.new_time_slot,
                "status": AppointmentStatus::Rescheduled,
                "updated_at": now,
            }),
            revision,
        )
        .await?;

        info!("Appointment {} rescheduled to {}", appointment_id, request.new_date);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let (appointment, _) = self.load(patient_id, appointment_id).await?;
        self.authorize_read(&appointment, actor)?;
        Ok(appointment)
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if actor.role == Role::Patient && actor.id != patient_id {
            return Err(AppointmentError::Unauthorized(
                "Patients can only list their own appointments".to_string(),
            ));
        }

        let docs = self
            .store
            .list(&appointments_collection(patient_id), &[])
            .await?;
        docs.iter()
            .map(|doc| doc.decode::<Appointment>().map_err(AppointmentError::from))
            .collect()
    }

    fn authorize_read(
        &self,
        appointment: &Appointment,
        actor: &Actor,
    ) -> Result<(), AppointmentError> {
        let allowed = match actor.role {
            Role::Patient => actor.id == appointment.patient_id,
            Role::Doctor => appointment.doctor_id == Some(actor.id),
            Role::Admin | Role::Superadmin => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(AppointmentError::Unauthorized(
                "Not authorized to view this appointment".to_string(),
            ))
        }
    }

    async fn load(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<(Appointment, Option<String>), AppointmentError> {
        debug!("Loading appointment {} for patient {}", appointment_id, patient_id);

        let doc: Document = self
            .store
            .get(&appointments_collection(patient_id), &appointment_id.to_string())
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))?;

        let appointment = doc.decode::<Appointment>()?;
        Ok((appointment, doc.revision))
    }

    async fn guarded_status_update(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        patch: serde_json::Value,
        revision: Option<String>,
    ) -> Result<(), AppointmentError> {
        self.store
            .commit(vec![Write::update_guarded(
                &appointments_collection(patient_id),
                &appointment_id.to_string(),
                patch,
                revision,
            )])
            .await?;
        Ok(())
    }
}
