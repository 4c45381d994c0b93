use crate::dto::user_dto::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::issue_token;
use crate::models::user::User;
use crate::services::mail_service::MailService;
use crate::utils::{crypto, token};
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a pending account. Credentials are only issued once an
    /// admin approves it.
    pub async fn register(&self, req: RegisterRequest) -> Result<()> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO users (first_name, last_name, patronymic, email, phone, school)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.patronymic)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.school)
        .execute(&self.pool)
        .await?;

        tracing::info!("New user registered: {}", req.email);
        Ok(())
    }

    /// Approves a pending account: generates a login and password, stores
    /// the argon2 hash and mails the plaintext credentials to the user.
    pub async fn approve(&self, user_id: i64, mail: &MailService) -> Result<()> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_approved = FALSE",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found or already approved".to_string()))?;

        let login = token::generate_login();
        let password = token::generate_password(7);
        let password_hash = crypto::hash_password(&password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        sqlx::query(
            "UPDATE users SET login = $1, password_hash = $2, is_approved = TRUE WHERE id = $3",
        )
        .bind(&login)
        .bind(&password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let text = format!("Your credentials:\nLogin: {}\nPassword: {}", login, password);
        let html = format!(
            "<p>Your credentials:</p><p><strong>Login:</strong> {}</p><p><strong>Password:</strong> {}</p>",
            login, password
        );
        if !mail
            .send(&user.email, "Your account has been approved", &text, Some(&html))
            .await
        {
            tracing::warn!("Approval mail for user {} was not delivered", user_id);
        }

        tracing::info!("User {} approved", user_id);
        Ok(())
    }

    /// Verifies credentials against an approved account and issues a JWT.
    pub async fn login(&self, req: LoginRequest) -> Result<(String, User)> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE login = $1 AND is_approved = TRUE",
        )
        .bind(&req.login)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::Unauthorized("Invalid credentials or user not approved".to_string())
        })?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            Error::Unauthorized("Invalid credentials or user not approved".to_string())
        })?;
        let ok = crypto::verify_password(&req.password, hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        let config = crate::config::get_config();
        let token = issue_token(&user, &config.jwt_secret, config.jwt_expires_hours)?;
        tracing::info!("User logged in: {}", user.email);
        Ok((token, user))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn update_profile(&self, user_id: i64, req: UpdateProfileRequest) -> Result<User> {
        if req.is_empty() {
            return Err(Error::BadRequest("No fields to update".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                patronymic = COALESCE($3, patronymic),
                phone = COALESCE($4, phone),
                school = COALESCE($5, school)
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.patronymic)
        .bind(&req.phone)
        .bind(&req.school)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("User {} updated profile", user_id);
        Ok(user)
    }
}
