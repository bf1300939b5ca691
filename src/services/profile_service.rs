use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::profiles::{UpdateArtisanProfileRequest, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_artisan},
    models::{ArtisanSummary, FALLBACK_AVATAR, Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{require_non_empty, require_phone},
};

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Profile", user_from_entity(model)?, None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = find_user(state, user.user_id).await?;
    let mut active: UserActive = existing.into();
    apply_profile_update(&mut active, payload)?;
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        user_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_me(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Users::delete_by_id(user.user_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "account_delete",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User account successfully deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_artisan_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    ensure_artisan(user)?;
    let model = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Artisan profile", user_from_entity(model)?, None))
}

pub async fn update_artisan_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateArtisanProfileRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_artisan(user)?;
    let UpdateArtisanProfileRequest {
        profile,
        bio,
        specialization,
        portfolio_url,
        years_of_experience,
    } = payload;

    let existing = find_user(state, user.user_id).await?;
    let mut active: UserActive = existing.into();
    apply_profile_update(&mut active, profile)?;

    if let Some(bio) = bio {
        active.bio = Set(non_blank(bio));
    }
    if let Some(specialization) = specialization {
        active.specialization = Set(non_blank(specialization));
    }
    if let Some(portfolio_url) = portfolio_url {
        active.portfolio_url = Set(non_blank(portfolio_url));
    }
    if let Some(years) = years_of_experience {
        if years < 0 {
            return Err(AppError::BadRequest(
                "years_of_experience cannot be negative".into(),
            ));
        }
        active.years_of_experience = Set(Some(years));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "artisan_profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Artisan profile updated",
        user_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

/// Seller display data for a public artisan; buyers and unknown ids are not found.
pub async fn public_artisan(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ArtisanSummary>> {
    let model = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|u| u.is_active && u.role == Role::Artisan.as_str())
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Artisan", artisan_summary(&model), None))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn apply_profile_update(active: &mut UserActive, payload: UpdateProfileRequest) -> AppResult<()> {
    if let Some(display_name) = payload.display_name {
        require_non_empty("display_name", &display_name)?;
        active.display_name = Set(display_name.trim().to_string());
    }
    if let Some(phone) = payload.phone_number {
        if phone.trim().is_empty() {
            active.phone_number = Set(None);
        } else {
            require_phone(&phone)?;
            active.phone_number = Set(Some(phone.trim().to_string()));
        }
    }
    if let Some(address) = payload.address {
        active.address = Set(non_blank(address));
    }
    if let Some(location) = payload.location {
        active.location = Set(non_blank(location));
    }
    if let Some(picture) = payload.profile_picture {
        active.profile_picture = Set(non_blank(picture));
    }
    Ok(())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn artisan_summary(model: &UserModel) -> ArtisanSummary {
    ArtisanSummary {
        id: Some(model.id),
        name: model.display_name.clone(),
        location: model
            .location
            .clone()
            .or_else(|| model.address.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        experience: model
            .years_of_experience
            .map(|years| format!("{years} years"))
            .unwrap_or_else(|| "N/A".to_string()),
        rating: model.rating,
        bio: model
            .bio
            .clone()
            .unwrap_or_else(|| "No bio available.".to_string()),
        avatar: model
            .profile_picture
            .clone()
            .unwrap_or_else(|| FALLBACK_AVATAR.to_string()),
    }
}

pub fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role = model
        .role
        .parse::<Role>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(User {
        id: model.id,
        email: model.email,
        display_name: model.display_name,
        role,
        phone_number: model.phone_number,
        address: model.address,
        location: model.location,
        profile_picture: model.profile_picture,
        bio: model.bio,
        specialization: model.specialization,
        portfolio_url: model.portfolio_url,
        years_of_experience: model.years_of_experience,
        rating: model.rating,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
