use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use gradebook_db::Database;
use gradebook_db::models::NewUser;
use gradebook_gateway::Dispatcher;
use gradebook_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest, UserProfile};
use gradebook_types::models::Role;

use crate::convert::user_profile;
use crate::error::ApiError;
use crate::extract::{JsonBody, present};
use crate::notify::notify;
use crate::task::blocking;
use crate::uploads::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
    pub uploads: Storage,
    pub jwt_secret: Arc<str>,
    /// Password given to students a teacher creates directly.
    pub default_student_password: String,
}

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::internal("Password hashing failed", e)
        })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub fn create_token(secret: &str, user: &UserProfile) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id.clone(),
        name: user.name.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn issue_token(state: &AppState, user: &UserProfile) -> Result<String, ApiError> {
    create_token(&state.jwt_secret, user).map_err(|e| {
        error!("Token creation failed: {}", e);
        ApiError::internal("Token creation failed", e)
    })
}

pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        present(&req.name),
        present(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
        present(&req.role),
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let role: Role = role
        .parse()
        .map_err(|_| ApiError::bad_request("Role must be 'teacher' or 'student'"))?;
    let teacher_id = match role {
        Role::Student => present(&req.teacher_id).map(str::to_string),
        Role::Teacher => None,
    };

    let id = Uuid::new_v4().to_string();
    let (name, email, password) = (name.to_string(), email.to_string(), password.to_string());

    let row = {
        let (id, name, email, teacher_id) = (id.clone(), name.clone(), email, teacher_id.clone());
        blocking(&state, move |db| {
            let password_hash = hash_password(&password)?;
            let row = db.create_user(&NewUser {
                id: &id,
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role,
                teacher_id: teacher_id.as_deref(),
            })?;
            Ok::<_, ApiError>(row)
        })
        .await?
    };

    info!("New {} signed up: {} ({})", role, name, id);

    let mut user = user_profile(row, None);
    user.teacher_id = teacher_id;
    let token = issue_token(&state, &user)?;

    notify(&state, &id, format!("Welcome {} to Grade Manager!", name)).await;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created".into(),
            user,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());

    let (Some(email), Some(password), Some(role)) =
        (present(&req.email), req.password.clone(), present(&req.role))
    else {
        return Err(invalid());
    };
    let role: Role = role.parse().map_err(|_| invalid())?;
    let email = email.to_string();

    let user = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_email(&email)? else {
            return Ok(None);
        };
        if !verify_password(&password, &user.password) || user.role != role.as_str() {
            return Ok(None);
        }
        let student = match role {
            Role::Student => db.get_student(&user.id)?,
            Role::Teacher => None,
        };
        Ok::<_, ApiError>(Some(user_profile(user, student)))
    })
    .await?
    .ok_or_else(invalid)?;

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        user,
        token,
    }))
}
