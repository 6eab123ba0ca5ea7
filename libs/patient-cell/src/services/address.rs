// libs/patient-cell/src/services/address.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{document::encode, DocumentStore, Filter, Write};
use shared_models::auth::{Actor, Role};

use crate::models::{addresses_collection, Address, PatientError, SetAddressRequest};

pub struct AddressService {
    store: Arc<dyn DocumentStore>,
}

impl AddressService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create or update an address. When the new address becomes the
    /// default, every other default is cleared in the same batch that
    /// writes the target, keeping the at-most-one-default invariant even
    /// if earlier writes left several defaults behind.
    pub async fn set_address(
        &self,
        patient_id: Uuid,
        request: SetAddressRequest,
        existing_address_id: Option<Uuid>,
        actor: &Actor,
    ) -> Result<Address, PatientError> {
        self.authorize_owner(patient_id, actor)?;

        if request.line1.trim().is_empty() || request.city.trim().is_empty() {
            return Err(PatientError::Validation(
                "Address line 1 and city are required".to_string(),
            ));
        }

        let collection = addresses_collection(patient_id);
        let now = Utc::now();

        let (address_id, created_at) = match existing_address_id {
            Some(id) => {
                let existing = self
                    .store
                    .get(&collection, &id.to_string())
                    .await?
                    .ok_or(PatientError::AddressNotFound(id))?
                    .decode::<Address>()?;
                (id, existing.created_at)
            }
            None => (Uuid::new_v4(), now),
        };

        let address = Address {
            id: address_id,
            patient_id,
            line1: request.line1,
            line2: request.line2,
            city: request.city,
            state: request.state,
            zip: request.zip,
            label: request.label,
            is_default: request.is_default,
            created_at,
            updated_at: now,
        };

        let mut writes = Vec::new();
        if address.is_default {
            // Zero, one, or many stale defaults may exist; clear them all.
            let defaults = self
                .store
                .list(&collection, &[Filter::eq("is_default", true)])
                .await?;
            for doc in defaults {
                if doc.id != address_id.to_string() {
                    debug!("Clearing default flag on address {}", doc.id);
                    writes.push(Write::update(
                        &collection,
                        &doc.id,
                        json!({ "is_default": false, "updated_at": now }),
                    ));
                }
            }
        }

        if existing_address_id.is_some() {
            writes.push(Write::update(
                &collection,
                &address_id.to_string(),
                encode(&address)?,
            ));
        } else {
            writes.push(Write::create(
                &collection,
                &address_id.to_string(),
                encode(&address)?,
            ));
        }

        self.store.commit(writes).await?;

        info!(
            "Address {} saved for patient {} (default: {})",
            address_id, patient_id, address.is_default
        );
        Ok(address)
    }

    pub async fn get_address(
        &self,
        patient_id: Uuid,
        address_id: Uuid,
        actor: &Actor,
    ) -> Result<Address, PatientError> {
        self.authorize_owner(patient_id, actor)?;

        let doc = self
            .store
            .get(&addresses_collection(patient_id), &address_id.to_string())
            .await?
            .ok_or(PatientError::AddressNotFound(address_id))?;
        Ok(doc.decode::<Address>()?)
    }

    pub async fn list_addresses(
        &self,
        patient_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Address>, PatientError> {
        self.authorize_owner(patient_id, actor)?;

        let docs = self
            .store
            .list(&addresses_collection(patient_id), &[])
            .await?;
        docs.iter()
            .map(|doc| doc.decode::<Address>().map_err(PatientError::from))
            .collect()
    }

    /// Delete an address. Appointments already referencing it keep their
    /// dangling reference; their address details simply become
    /// unavailable.
    pub async fn delete_address(
        &self,
        patient_id: Uuid,
        address_id: Uuid,
        actor: &Actor,
    ) -> Result<(), PatientError> {
        self.authorize_owner(patient_id, actor)?;

        self.store
            .delete(&addresses_collection(patient_id), &address_id.to_string())
            .await?;

        info!("Address {} deleted for patient {}", address_id, patient_id);
        Ok(())
    }

    fn authorize_owner(&self, patient_id: Uuid, actor: &Actor) -> Result<(), PatientError> {
        match actor.role {
            Role::Patient if actor.id == patient_id => Ok(()),
            Role::Admin | Role::Superadmin => Ok(()),
            _ => Err(PatientError::Unauthorized(
                "Addresses can only be managed by their owner".to_string(),
            )),
        }
    }
}
