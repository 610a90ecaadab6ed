use crate::models::user::{Role, User};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub password_confirm: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: String) -> RegisterRequest {
        RegisterRequest {
            username: "ada".into(),
            email,
            password: "pw".into(),
            password_confirm: "pw".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn ordinary_email_is_accepted() {
        assert!(request("ada@example.com".into()).validate().is_ok());
    }

    #[test]
    fn email_longer_than_column_is_rejected() {
        let label = "a".repeat(60);
        let domain = format!("{label}.{label}.{label}.{label}.com");
        let email = format!("{}@{}", "x".repeat(60), domain);
        assert!(email.len() > 255);
        let errors = request(email).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
