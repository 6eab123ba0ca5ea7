// libs/billing-cell/src/services/fees.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_database::{document::encode, DocumentStore};
use shared_models::auth::Actor;

use crate::models::{
    BillingError, FeeConfiguration, SaveFeeConfigurationRequest, FEE_CONFIG_COLLECTION,
    FEE_CONFIG_DOC_ID,
};

/// Percent totals are accepted within this tolerance of 100.
const FEE_TOTAL_TOLERANCE: f64 = 0.01;

/// Split applied when no configuration has been saved yet.
pub fn default_fee_configuration() -> FeeConfiguration {
    FeeConfiguration {
        platform_fee_percentage: 0.15,
        doctor_share_percentage: 0.70,
        admin_fee_percentage: 0.15,
        effective_from: Utc::now(),
        created_at: Utc::now(),
        created_by: None,
    }
}

pub struct FeeConfigService {
    store: Arc<dyn DocumentStore>,
}

impl FeeConfigService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The active configuration, falling back to the built-in default when
    /// none has been persisted. Settlement must never fail for lack of a
    /// configuration.
    pub async fn resolve_fee_configuration(&self) -> Result<FeeConfiguration, BillingError> {
        match self
            .store
            .get(FEE_CONFIG_COLLECTION, FEE_CONFIG_DOC_ID)
            .await?
        {
            Some(doc) => Ok(doc.decode::<FeeConfiguration>()?),
            None => {
                debug!("No fee configuration persisted, using defaults");
                Ok(default_fee_configuration())
            }
        }
    }

    /// Upsert the singleton configuration. Percentages arrive as 0-100 and
    /// must total 100 within tolerance; the original creation timestamp
    /// survives updates.
    pub async fn save_fee_configuration(
        &self,
        request: SaveFeeConfigurationRequest,
        actor: &Actor,
    ) -> Result<FeeConfiguration, BillingError> {
        if !actor.role.is_superadmin() {
            return Err(BillingError::Unauthorized(
                "Only superadmins can change the fee configuration".to_string(),
            ));
        }

        let total = request.platform_fee_percentage
            + request.doctor_share_percentage
            + request.admin_fee_percentage;
        if (total - 100.0).abs() > FEE_TOTAL_TOLERANCE {
            return Err(BillingError::Validation(format!(
                "Fee percentages must total 100, got {}",
                total
            )));
        }

        let existing = self
            .store
            .get(FEE_CONFIG_COLLECTION, FEE_CONFIG_DOC_ID)
            .await?;
        let created_at = match &existing {
            Some(doc) => doc.decode::<FeeConfiguration>()?.created_at,
            None => Utc::now(),
        };

        let config = FeeConfiguration {
            platform_fee_percentage: request.platform_fee_percentage / 100.0,
            doctor_share_percentage: request.doctor_share_percentage / 100.0,
            admin_fee_percentage: request.admin_fee_percentage / 100.0,
            effective_from: Utc::now(),
            created_at,
            created_by: Some(actor.id),
        };

        let data = encode(&config)?;
        if existing.is_some() {
            self.store
                .update(FEE_CONFIG_COLLECTION, FEE_CONFIG_DOC_ID, data)
                .await?;
        } else {
            self.store
                .create(FEE_CONFIG_COLLECTION, FEE_CONFIG_DOC_ID, data)
                .await?;
        }

        info!(
            "Fee configuration saved by {}: platform {:.2} / doctor {:.2} / admin {:.2}",
            actor.id,
            config.platform_fee_percentage,
            config.doctor_share_percentage,
            config.admin_fee_percentage
        );
        Ok(config)
    }
}
