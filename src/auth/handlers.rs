use axum::{
    extract::{FromRef, State},
    Json,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{
        AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, PublicUser,
        RefreshRequest, RegisterRequest,
    },
    extractors::CurrentUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::{NewUser, User},
    services::{is_unique_violation, validate_credentials, validate_password},
};
use crate::error::AppError;
use crate::state::AppState;

fn token_pair(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    validate_credentials(&payload.username, &payload.email)?;
    validate_password(&payload.password)?;

    if User::find_by_identifier(&state.db, &payload.email)
        .await?
        .is_some()
        || User::find_by_identifier(&state.db, &payload.username)
            .await?
            .is_some()
    {
        warn!(username = %payload.username, "username or email already registered");
        return Err(AppError::Rejected(
            "Username or email is already registered.".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(
        &state.db,
        NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &hash,
            first_name: payload.first_name.as_deref(),
            last_name: payload.last_name.as_deref(),
        },
    )
    .await
    {
        Ok(u) => u,
        // Lost the race to the unique index between the pre-check and the insert.
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Rejected(
                "Username or email is already registered.".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(token_pair(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email_or_username = payload.email_or_username.trim().to_string();

    let user = User::find_by_identifier(&state.db, &payload.email_or_username)
        .await?
        .ok_or_else(|| {
            warn!(identifier = %payload.email_or_username, "login unknown identifier");
            AppError::Auth("Invalid email/username or password.".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Auth("Invalid email/username or password.".into()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login attempt on deactivated account");
        return Err(AppError::Forbidden(
            "Your account has been deactivated. Please contact an administrator.".into(),
        ));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(token_pair(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".into()))?;

    if !user.is_active {
        return Err(AppError::Forbidden(
            "Your account has been deactivated. Please contact an administrator.".into(),
        ));
    }

    Ok(Json(token_pair(&state, user)?))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

#[instrument(skip(state, payload, user))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !verify_password(&payload.old_password, &user.password_hash)? {
        return Err(AppError::Validation("Current password is incorrect.".into()));
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::ok(
        "Your password has been updated successfully.",
    )))
}
