use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firestore_project_id: String,
    pub firestore_api_key: String,
    pub firestore_base_url: String,
    pub jwt_secret: String,
    pub teleconsult_platform: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            firestore_project_id: env::var("FIRESTORE_PROJECT_ID")
                .unwrap_or_else(|_| {
                    warn!("FIRESTORE_PROJECT_ID not set, using empty value");
                    String::new()
                }),
            firestore_api_key: env::var("FIRESTORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("FIRESTORE_API_KEY not set, using empty value");
                    String::new()
                }),
            firestore_base_url: env::var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("FIRESTORE_BASE_URL not set, using default");
                    "https://firestore.googleapis.com/v1".to_string()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            teleconsult_platform: env::var("TELECONSULT_PLATFORM")
                .unwrap_or_else(|_| "carevisit-meet".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.firestore_project_id.is_empty()
            && !self.firestore_api_key.is_empty()
            && !self.jwt_secret.is_empty()
    }
}
