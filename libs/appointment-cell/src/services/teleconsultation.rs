// libs/appointment-cell/src/services/teleconsultation.rs
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, Teleconsultation, TeleconsultationStatus};

/// Builds the teleconsultation room record provisioned at assignment time.
pub struct TeleconsultationService {
    platform: String,
}

impl TeleconsultationService {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
        }
    }

    /// Meeting links must be unique per appointment and provisioning
    /// instant; the random suffix covers same-millisecond re-provisioning
    /// after a reschedule.
    fn generate_meeting_link(&self, appointment_id: Uuid) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        format!(
            "https://{}/room/{}-{}-{}",
            self.platform,
            appointment_id,
            Utc::now().timestamp_millis(),
            suffix.to_lowercase()
        )
    }

    pub fn build_record(&self, appointment: &Appointment, doctor_id: Uuid) -> Teleconsultation {
        let record = Teleconsultation {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id,
            meeting_link: self.generate_meeting_link(appointment.id),
            status: TeleconsultationStatus::Scheduled,
            platform: self.platform.clone(),
            created_at: Utc::now(),
        };
        debug!(
            "Provisioned teleconsultation {} for appointment {}",
            record.id, appointment.id
        );
        record
    }
}
