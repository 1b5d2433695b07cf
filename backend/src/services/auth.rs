//! Authentication service for tenant registration, login, and token issuance

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{map_unique_violation, AppError, AppResult};
use shared::validation::{validate_email, validate_password};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new store with its owner account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub store_name: String,
    pub operator_name: String,
    pub email: String,
    pub password: String,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Response carrying an issued access token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    /// Create a new AuthService from the application configuration
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new store (tenant) together with its owner account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        if input.store_name.trim().is_empty() {
            return Err(AppError::validation("store_name", "Store name is required"));
        }
        if input.operator_name.trim().is_empty() {
            return Err(AppError::validation(
                "operator_name",
                "Operator name is required",
            ));
        }
        validate_email(&input.email).map_err(|msg| AppError::validation("email", msg))?;
        validate_password(&input.password).map_err(|msg| AppError::validation("password", msg))?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        let mut tx = self.db.begin().await?;

        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING id",
        )
        .bind(input.store_name.trim())
        .fetch_one(&mut *tx)
        .await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (tenant_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, 'owner')
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(input.operator_name.trim())
        .bind(input.email.to_lowercase())
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        tx.commit().await?;

        self.issue_token(user_id, tenant_id, "owner")
    }

    /// Verify credentials and issue an access token.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let user = sqlx::query_as::<_, (Uuid, Uuid, String, String)>(
            r#"
            SELECT id, tenant_id, password_hash, role
            FROM users
            WHERE email = $1 AND is_active = TRUE
            "#,
        )
        .bind(input.email.to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let (user_id, tenant_id, password_hash, role) = user;

        let valid = verify(&input.password, &password_hash)
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.issue_token(user_id, tenant_id, &role)
    }

    fn issue_token(&self, user_id: Uuid, tenant_id: Uuid, role: &str) -> AppResult<AuthResponse> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        Ok(AuthResponse {
            tenant_id,
            user_id,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}
