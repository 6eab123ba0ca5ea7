// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Pure transition rules for the appointment state machine. The forward
/// pipeline is pending_assignment -> assigned -> confirmed -> on_the_way ->
/// arrived -> service_started -> completed; cancellations, declines and
/// reschedules branch off as terminal side states.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Statuses a doctor may advance an appointment to.
    const DOCTOR_ADVANCE_TARGETS: [AppointmentStatus; 4] = [
        AppointmentStatus::OnTheWay,
        AppointmentStatus::Arrived,
        AppointmentStatus::ServiceStarted,
        AppointmentStatus::Completed,
    ];

    /// Validate a doctor-driven progression. Moving backward is never
    /// allowed; skipping forward over intermediate stages is deliberately
    /// permitted (the field workflow does not force every checkpoint).
    pub fn validate_advance(
        &self,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status advance {} -> {}", current, new);

        if !Self::DOCTOR_ADVANCE_TARGETS.contains(new) {
            warn!("Status {} is not a doctor progression target", new);
            return Err(AppointmentError::InvalidTransition {
                from: *current,
                to: *new,
            });
        }

        match (current.stage(), new.stage()) {
            (Some(from), Some(to)) if to > from => Ok(()),
            _ => {
                warn!("Invalid status advance attempted: {} -> {}", current, new);
                Err(AppointmentError::InvalidTransition {
                    from: *current,
                    to: *new,
                })
            }
        }
    }

    /// Doctor assignment is only legal while the appointment still waits
    /// for one.
    pub fn can_assign(&self, current: &AppointmentStatus) -> bool {
        *current == AppointmentStatus::PendingAssignment
    }

    /// Patients and doctors can back out only before the visit is underway.
    pub fn can_cancel(&self, current: &AppointmentStatus) -> bool {
        matches!(
            current,
            AppointmentStatus::PendingAssignment
                | AppointmentStatus::Assigned
                | AppointmentStatus::Confirmed
        )
    }

    /// Rescheduling shares the cancellation window.
    pub fn can_reschedule(&self, current: &AppointmentStatus) -> bool {
        self.can_cancel(current)
    }

    /// All statuses a doctor could legally advance to from `current`.
    pub fn advance_targets(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        Self::DOCTOR_ADVANCE_TARGETS
            .iter()
            .copied()
            .filter(|target| self.validate_advance(current, target).is_ok())
            .collect()
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
