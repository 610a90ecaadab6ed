use crate::dto::auth_dto::RegisterRequest;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: RegisterRequest) -> Result<User> {
        if payload.password != payload.password_confirm {
            return Err(Error::BadRequest("Passwords do not match".to_string()));
        }

        let username = payload.username.trim().to_string();
        let taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)"#)
                .bind(&username)
                .fetch_one(&self.pool)
                .await?;
        if taken {
            return Err(Error::Conflict("Username is already taken".to_string()));
        }

        let password_hash = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&username)
        .bind(payload.email.trim())
        .bind(password_hash)
        .bind(payload.role)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        let invalid = || Error::Unauthorized("Invalid username or password".to_string());
        let user = user.ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(username = %user.username, "failed login");
            return Err(invalid());
        }
        Ok(user)
    }
}
