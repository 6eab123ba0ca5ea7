use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{document::encode, DocumentStore, Filter};
use shared_models::auth::{Actor, Role};

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorStatus, USERS_COLLECTION,
};

pub struct DoctorProfileService {
    store: Arc<dyn DocumentStore>,
}

impl DoctorProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a doctor profile with a zeroed rating aggregate.
    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        actor: &Actor,
    ) -> Result<Doctor, DoctorError> {
        if !actor.role.is_admin() {
            return Err(DoctorError::Unauthorized(
                "Only admins can create doctor profiles".to_string(),
            ));
        }
        if request.full_name.trim().is_empty() {
            return Err(DoctorError::Validation("Doctor name is required".to_string()));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: request.user_id,
            role: Role::Doctor,
            full_name: request.full_name,
            email: request.email,
            specialty: request.specialty,
            status: DoctorStatus::Active,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        };

        self.store
            .create(USERS_COLLECTION, &doctor.id.to_string(), encode(&doctor)?)
            .await?;

        info!("Doctor profile created: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let doc = self
            .store
            .get(USERS_COLLECTION, &doctor_id.to_string())
            .await?
            .ok_or(DoctorError::NotFound(doctor_id))?;

        Ok(doc.decode::<Doctor>()?)
    }

    pub async fn list_active_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let docs = self
            .store
            .list(
                USERS_COLLECTION,
                &[Filter::eq("role", "doctor"), Filter::eq("status", "active")],
            )
            .await?;

        docs.iter()
            .map(|doc| doc.decode::<Doctor>().map_err(DoctorError::from))
            .collect()
    }

    pub async fn set_doctor_status(
        &self,
        doctor_id: Uuid,
        status: DoctorStatus,
        actor: &Actor,
    ) -> Result<(), DoctorError> {
        if !actor.role.is_admin() {
            return Err(DoctorError::Unauthorized(
                "Only admins can change doctor status".to_string(),
            ));
        }

        // Existence check keeps the error a NotFound rather than a raw
        // store failure.
        self.get_doctor(doctor_id).await?;

        self.store
            .update(
                USERS_COLLECTION,
                &doctor_id.to_string(),
                json!({
                    "status": status,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;

        info!("Doctor {} status set to {}", doctor_id, status);
        Ok(())
    }
}
