use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    teleconsultations_collection, AppointmentError, AppointmentStatus, AppointmentType,
    CreateAppointmentRequest, PaymentStatus, RescheduleAppointmentRequest, Teleconsultation,
    TeleconsultationStatus, TimeSlot,
};
use appointment_cell::services::booking::AppointmentBookingService;
use doctor_cell::models::{CreateDoctorRequest, DoctorStatus};
use doctor_cell::services::profile::DoctorProfileService;
use shared_database::memory::MemoryStore;
use shared_database::DocumentStore;
use shared_models::auth::{Actor, Role};

fn setup() -> (Arc<MemoryStore>, AppointmentBookingService) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let service = AppointmentBookingService::new(dyn_store, "carevisit-meet");
    (store, service)
}

fn patient() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Patient)
}

fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

fn booking_request(patient_id: Uuid, appointment_type: AppointmentType) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        patient_id,
        service_id: Uuid::new_v4(),
        address_id: match appointment_type {
            AppointmentType::InPerson => Some(Uuid::new_v4()),
            AppointmentType::Teleconsultation => None,
        },
        appointment_date: (Utc::now() + Duration::days(1)).date_naive(),
        time_slot: TimeSlot::NineToTen,
        estimated_cost: 120.0,
        appointment_type,
    }
}

async fn seed_doctor(store: &Arc<MemoryStore>) -> Uuid {
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let doctor = DoctorProfileService::new(dyn_store)
        .create_doctor(
            CreateDoctorRequest {
                user_id: Uuid::new_v4(),
                full_name: "Dr. Amaka Obi".to_string(),
                email: "amaka@example.com".to_string(),
                specialty: Some("General practice".to_string()),
            },
            &admin(),
        )
        .await
        .unwrap();
    doctor.id
}

#[tokio::test]
async fn create_starts_pending_and_unpaid() {
    let (_store, service) = setup();
    let patient = patient();

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::PendingAssignment);
    assert_eq!(appointment.payment_status, PaymentStatus::Pending);
    assert_eq!(appointment.time_slot, TimeSlot::NineToTen);
    assert!(appointment.doctor_id.is_none());
}

#[tokio::test]
async fn create_rejects_past_dates() {
    let (_store, service) = setup();
    let patient = patient();

    let mut request = booking_request(patient.id, AppointmentType::InPerson);
    request.appointment_date = (Utc::now() - Duration::days(1)).date_naive();

    let result = service.create_appointment(request, &patient).await;
    assert_matches!(result, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn in_person_requires_an_address() {
    let (_store, service) = setup();
    let patient = patient();

    let mut request = booking_request(patient.id, AppointmentType::InPerson);
    request.address_id = None;

    let result = service.create_appointment(request, &patient).await;
    assert_matches!(result, Err(AppointmentError::Validation(_)));
}

#[tokio::test]
async fn patients_cannot_book_for_others() {
    let (_store, service) = setup();
    let patient = patient();

    let request = booking_request(Uuid::new_v4(), AppointmentType::InPerson);
    let result = service.create_appointment(request, &patient).await;
    assert_matches!(result, Err(AppointmentError::Unauthorized(_)));
}

#[tokio::test]
async fn assignment_provisions_teleconsultation_room() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;

    let appointment = service
        .create_appointment(
            booking_request(patient.id, AppointmentType::Teleconsultation),
            &patient,
        )
        .await
        .unwrap();

    let assigned = service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    assert_eq!(assigned.status, AppointmentStatus::Assigned);
    assert_eq!(assigned.doctor_id, Some(doctor_id));
    assert!(assigned.assigned_at.is_some());

    let room_id = assigned.teleconsultation_id.expect("room must be provisioned");
    let room = store
        .get(
            &teleconsultations_collection(patient.id, appointment.id),
            &room_id.to_string(),
        )
        .await
        .unwrap()
        .expect("room document must exist")
        .decode::<Teleconsultation>()
        .unwrap();

    assert_eq!(room.status, TeleconsultationStatus::Scheduled);
    assert_eq!(room.doctor_id, doctor_id);
    assert!(!room.meeting_link.is_empty());
}

#[tokio::test]
async fn in_person_assignment_skips_room_provisioning() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    let assigned = service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    assert_eq!(assigned.status, AppointmentStatus::Assigned);
    assert!(assigned.teleconsultation_id.is_none());
}

#[tokio::test]
async fn double_assignment_is_an_invalid_transition() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    let result = service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn inactive_doctor_cannot_be_assigned() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;

    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    DoctorProfileService::new(dyn_store)
        .set_doctor_status(doctor_id, DoctorStatus::Inactive, &admin())
        .await
        .unwrap();

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    let result = service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await;
    assert_matches!(result, Err(AppointmentError::DoctorNotFound(_)));
}

#[tokio::test]
async fn assignment_requires_admin_capability() {
    let (_store, service) = setup();
    let patient = patient();

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    let result = service
        .assign_doctor(patient.id, appointment.id, Uuid::new_v4(), &patient)
        .await;
    assert_matches!(result, Err(AppointmentError::Unauthorized(_)));
}

#[tokio::test]
async fn assigned_doctor_can_progress_and_skip_forward() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;
    let doctor = Actor::new(doctor_id, Role::Doctor);

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    let on_the_way = service
        .advance_status(patient.id, appointment.id, AppointmentStatus::OnTheWay, &doctor)
        .await
        .unwrap();
    assert_eq!(on_the_way.status, AppointmentStatus::OnTheWay);

    // Skipping arrived/service_started is allowed.
    let completed = service
        .advance_status(patient.id, appointment.id, AppointmentStatus::Completed, &doctor)
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn non_assigned_doctor_cannot_progress() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    let other_doctor = Actor::new(Uuid::new_v4(), Role::Doctor);
    let result = service
        .advance_status(
            patient.id,
            appointment.id,
            AppointmentStatus::Completed,
            &other_doctor,
        )
        .await;
    assert_matches!(result, Err(AppointmentError::Unauthorized(_)));
}

#[tokio::test]
async fn cancellation_window_closes_once_underway() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;
    let doctor = Actor::new(doctor_id, Role::Doctor);

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    service
        .assign_doctor(patient.id, appointment.id, doctor_id, &admin())
        .await
        .unwrap();

    service
        .advance_status(patient.id, appointment.id, AppointmentStatus::OnTheWay, &doctor)
        .await
        .unwrap();

    let result = service
        .cancel(patient.id, appointment.id, &patient, Some("changed my mind".to_string()))
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn cancellation_records_who_backed_out() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;
    let doctor = Actor::new(doctor_id, Role::Doctor);

    let first = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    let cancelled = service
        .cancel(patient.id, first.id, &patient, Some("travel plans".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::CancelledByPatient);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("travel plans"));

    let second = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    service
        .assign_doctor(patient.id, second.id, doctor_id, &admin())
        .await
        .unwrap();
    let cancelled = service.cancel(patient.id, second.id, &doctor, None).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::CancelledByDoctor);
}

#[tokio::test]
async fn decline_only_while_pending() {
    let (store, service) = setup();
    let patient = patient();
    let doctor_id = seed_doctor(&store).await;
    let doctor = Actor::new(doctor_id, Role::Doctor);

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    let declined = service
        .decline(patient.id, appointment.id, &doctor, Some("fully booked".to_string()))
        .await
        .unwrap();
    assert_eq!(declined.status, AppointmentStatus::DeclinedByDoctor);

    let another = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();
    service
        .assign_doctor(patient.id, another.id, doctor_id, &admin())
        .await
        .unwrap();
    let result = service.decline(patient.id, another.id, &doctor, None).await;
    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn reschedule_overwrites_slot_and_parks_the_record() {
    let (_store, service) = setup();
    let patient = patient();

    let appointment = service
        .create_appointment(booking_request(patient.id, AppointmentType::InPerson), &patient)
        .await
        .unwrap();

    let new_date = (Utc::now() + Duration::days(3)).date_naive();
    let rescheduled = service
        .reschedule(
            patient.id,
            appointment.id,
            RescheduleAppointmentRequest {
                new_date,
                new_time_slot: TimeSlot::ThreeToFour,
            },
            &patient,
        )
        .await
        .unwrap();

    assert_eq!(rescheduled.status, AppointmentStatus::Rescheduled);
    assert_eq!(rescheduled.appointment_date, new_date);
    assert_eq!(rescheduled.time_slot, TimeSlot::ThreeToFour);

    // No re-entry into the pipeline is defined for rescheduled records.
    let result = service
        .reschedule(
            patient.id,
            appointment.id,
            RescheduleAppointmentRequest {
                new_date,
                new_time_slot: TimeSlot::FourToFive,
            },
            &patient,
        )
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}
