use assert_matches::assert_matches;

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;

#[test]
fn forward_progression_is_allowed() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_advance(&AppointmentStatus::Assigned, &AppointmentStatus::OnTheWay)
        .is_ok());
    assert!(lifecycle
        .validate_advance(&AppointmentStatus::OnTheWay, &AppointmentStatus::Arrived)
        .is_ok());
    assert!(lifecycle
        .validate_advance(
            &AppointmentStatus::ServiceStarted,
            &AppointmentStatus::Completed
        )
        .is_ok());
}

#[test]
fn forward_skipping_is_permitted() {
    // The field workflow does not force every checkpoint; jumping straight
    // to completed from assigned is legal.
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_advance(&AppointmentStatus::Assigned, &AppointmentStatus::Completed)
        .is_ok());
    assert!(lifecycle
        .validate_advance(&AppointmentStatus::Confirmed, &AppointmentStatus::ServiceStarted)
        .is_ok());
}

#[test]
fn backward_movement_is_rejected() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_matches!(
        lifecycle.validate_advance(&AppointmentStatus::Arrived, &AppointmentStatus::OnTheWay),
        Err(AppointmentError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_advance(&AppointmentStatus::Completed, &AppointmentStatus::Arrived),
        Err(AppointmentError::InvalidTransition { .. })
    );
}

#[test]
fn only_doctor_progression_targets_are_accepted() {
    let lifecycle = AppointmentLifecycleService::new();

    // Confirmed is part of the pipeline ordering but not a doctor
    // progression target.
    assert_matches!(
        lifecycle.validate_advance(&AppointmentStatus::Assigned, &AppointmentStatus::Confirmed),
        Err(AppointmentError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_advance(
            &AppointmentStatus::Assigned,
            &AppointmentStatus::CancelledByDoctor
        ),
        Err(AppointmentError::InvalidTransition { .. })
    );
}

#[test]
fn terminal_states_cannot_advance() {
    let lifecycle = AppointmentLifecycleService::new();

    for terminal in [
        AppointmentStatus::CancelledByPatient,
        AppointmentStatus::CancelledByDoctor,
        AppointmentStatus::DeclinedByDoctor,
        AppointmentStatus::Rescheduled,
    ] {
        assert_matches!(
            lifecycle.validate_advance(&terminal, &AppointmentStatus::Completed),
            Err(AppointmentError::InvalidTransition { .. })
        );
        assert!(lifecycle.advance_targets(&terminal).is_empty());
    }
}

#[test]
fn assignment_window_is_pending_only() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.can_assign(&AppointmentStatus::PendingAssignment));
    assert!(!lifecycle.can_assign(&AppointmentStatus::Assigned));
    assert!(!lifecycle.can_assign(&AppointmentStatus::Completed));
}

#[test]
fn cancel_window_closes_after_confirmed() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.can_cancel(&AppointmentStatus::PendingAssignment));
    assert!(lifecycle.can_cancel(&AppointmentStatus::Assigned));
    assert!(lifecycle.can_cancel(&AppointmentStatus::Confirmed));
    assert!(!lifecycle.can_cancel(&AppointmentStatus::OnTheWay));
    assert!(!lifecycle.can_cancel(&AppointmentStatus::ServiceStarted));
    assert!(!lifecycle.can_cancel(&AppointmentStatus::Completed));
}

#[test]
fn advance_targets_shrink_along_the_pipeline() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_eq!(
        lifecycle.advance_targets(&AppointmentStatus::Assigned),
        vec![
            AppointmentStatus::OnTheWay,
            AppointmentStatus::Arrived,
            AppointmentStatus::ServiceStarted,
            AppointmentStatus::Completed,
        ]
    );
    assert_eq!(
        lifecycle.advance_targets(&AppointmentStatus::ServiceStarted),
        vec![AppointmentStatus::Completed]
    );
    assert!(lifecycle
        .advance_targets(&AppointmentStatus::Completed)
        .is_empty());
}
