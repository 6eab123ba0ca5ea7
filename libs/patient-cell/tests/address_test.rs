use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use patient_cell::models::{Address, PatientError, SetAddressRequest};
use patient_cell::services::address::AddressService;
use shared_database::memory::MemoryStore;
use shared_database::DocumentStore;
use shared_models::auth::{Actor, Role};

fn setup() -> AddressService {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    AddressService::new(store)
}

fn patient() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Patient)
}

fn address_request(label: &str, is_default: bool) -> SetAddressRequest {
    SetAddressRequest {
        line1: "12 Marina Road".to_string(),
        line2: None,
        city: "Lagos".to_string(),
        state: "LA".to_string(),
        zip: "101241".to_string(),
        label: label.to_string(),
        is_default,
    }
}

async fn defaults_of(service: &AddressService, patient: &Actor) -> Vec<Address> {
    service
        .list_addresses(patient.id, patient)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.is_default)
        .collect()
}

#[tokio::test]
async fn new_default_demotes_the_previous_one() {
    let service = setup();
    let patient = patient();

    let first = service
        .set_address(patient.id, address_request("Home", true), None, &patient)
        .await
        .unwrap();
    assert!(first.is_default);

    let second = service
        .set_address(patient.id, address_request("Office", true), None, &patient)
        .await
        .unwrap();
    assert!(second.is_default);

    let defaults = defaults_of(&service, &patient).await;
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, second.id);

    let first_now = service.get_address(patient.id, first.id, &patient).await.unwrap();
    assert!(!first_now.is_default);
}

#[tokio::test]
async fn non_default_saves_leave_the_default_alone() {
    let service = setup();
    let patient = patient();

    let home = service
        .set_address(patient.id, address_request("Home", true), None, &patient)
        .await
        .unwrap();
    service
        .set_address(patient.id, address_request("Office", false), None, &patient)
        .await
        .unwrap();

    let defaults = defaults_of(&service, &patient).await;
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, home.id);
}

#[tokio::test]
async fn promoting_an_existing_address_keeps_one_default() {
    let service = setup();
    let patient = patient();

    service
        .set_address(patient.id, address_request("Home", true), None, &patient)
        .await
        .unwrap();
    let office = service
        .set_address(patient.id, address_request("Office", false), None, &patient)
        .await
        .unwrap();

    let promoted = service
        .set_address(
            patient.id,
            address_request("Office", true),
            Some(office.id),
            &patient,
        )
        .await
        .unwrap();
    assert_eq!(promoted.id, office.id);
    assert_eq!(promoted.created_at, office.created_at);

    let defaults = defaults_of(&service, &patient).await;
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, office.id);
}

#[tokio::test]
async fn updating_a_missing_address_is_not_found() {
    let service = setup();
    let patient = patient();

    let result = service
        .set_address(
            patient.id,
            address_request("Home", false),
            Some(Uuid::new_v4()),
            &patient,
        )
        .await;
    assert_matches!(result, Err(PatientError::AddressNotFound(_)));
}

#[tokio::test]
async fn blank_required_fields_are_rejected() {
    let service = setup();
    let patient = patient();

    let mut request = address_request("Home", false);
    request.line1 = "  ".to_string();
    let result = service.set_address(patient.id, request, None, &patient).await;
    assert_matches!(result, Err(PatientError::Validation(_)));
}

#[tokio::test]
async fn addresses_are_owner_scoped() {
    let service = setup();
    let owner = patient();
    let stranger = patient();

    let address = service
        .set_address(owner.id, address_request("Home", true), None, &owner)
        .await
        .unwrap();

    let result = service
        .set_address(owner.id, address_request("Hijack", true), None, &stranger)
        .await;
    assert_matches!(result, Err(PatientError::Unauthorized(_)));

    let result = service.get_address(owner.id, address.id, &stranger).await;
    assert_matches!(result, Err(PatientError::Unauthorized(_)));

    // Admins manage addresses on the patient's behalf.
    let admin = Actor::new(Uuid::new_v4(), Role::Admin);
    let fetched = service.get_address(owner.id, address.id, &admin).await.unwrap();
    assert_eq!(fetched.id, address.id);
}

#[tokio::test]
async fn delete_removes_only_the_address() {
    let service = setup();
    let patient = patient();

    let home = service
        .set_address(patient.id, address_request("Home", true), None, &patient)
        .await
        .unwrap();
    let office = service
        .set_address(patient.id, address_request("Office", false), None, &patient)
        .await
        .unwrap();

    service.delete_address(patient.id, home.id, &patient).await.unwrap();

    let remaining = service.list_addresses(patient.id, &patient).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, office.id);

    let result = service.get_address(patient.id, home.id, &patient).await;
    assert_matches!(result, Err(PatientError::AddressNotFound(_)));
}
