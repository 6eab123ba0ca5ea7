use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Actor, Role, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub firestore_base_url: String,
    pub firestore_project_id: String,
    pub firestore_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            firestore_base_url: "http://localhost:8200/v1".to_string(),
            firestore_project_id: "carevisit-test".to_string(),
            firestore_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            firestore_project_id: self.firestore_project_id.clone(),
            firestore_api_key: self.firestore_api_key.clone(),
            firestore_base_url: self.firestore_base_url.clone(),
            jwt_secret: self.jwt_secret.clone(),
            teleconsult_platform: "carevisit-meet".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn superadmin(email: &str) -> Self {
        Self::new(email, "superadmin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_actor(&self) -> Actor {
        Actor {
            id: Uuid::parse_str(&self.id).unwrap(),
            role: Role::parse(&self.role).unwrap(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp(),
        });

        let header_b64 =
            general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let claims_b64 =
            general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}.{}", header_b64, claims_b64, signature_b64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn issued_token_validates_and_resolves_role() {
        let config = TestConfig::default();
        let user = TestUser::superadmin("root@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

        let validated = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.to_actor().unwrap().role, Role::Superadmin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let user = TestUser::patient("p@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(-1));

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
