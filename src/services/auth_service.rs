use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, VerifyTokenResponse},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{issue_token, verify_token},
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::profile_service::user_from_entity,
    state::AppState,
    validation::{require_email, require_non_empty, require_password},
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        display_name,
        role,
    } = payload;
    let email = email.trim().to_lowercase();
    require_email(&email)?;
    require_password(&password)?;
    require_non_empty("display_name", &display_name)?;

    let role = role.unwrap_or(Role::Buyer);
    if role == Role::Admin {
        return Err(AppError::BadRequest("Cannot self-register as admin".into()));
    }

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        display_name: Set(display_name.trim().to_string()),
        role: Set(role.as_str().to_string()),
        phone_number: Set(None),
        address: Set(None),
        location: Set(None),
        profile_picture: Set(None),
        bio: Set(None),
        specialization: Set(None),
        portfolio_url: Set(None),
        years_of_experience: Set(None),
        rating: Set(0.0),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user)?,
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let user = user_from_entity(user)?;
    let token = issue_token(user.id, user.role, &state.config.jwt_secret)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            token_type: "bearer".to_string(),
            user,
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify(state: &AppState, token: &str) -> AppResult<ApiResponse<VerifyTokenResponse>> {
    let claims = verify_token(token, &state.config.jwt_secret)?;
    let user = Users::find_by_id(claims.user_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    let user = user_from_entity(user)?;

    Ok(ApiResponse::success(
        "Token valid",
        VerifyTokenResponse {
            uid: user.id.to_string(),
            role: user.role,
        },
        None,
    ))
}
