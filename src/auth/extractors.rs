use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::jwt::AuthUser;
use crate::auth::repo::User;
use crate::error::AppError;
use crate::state::AppState;

/// Loads the full user row behind a valid access token. Deactivated
/// accounts are cut off here, whatever route they were headed for.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".into()))?;
        if !user.is_active {
            return Err(AppError::Forbidden(
                "Your account has been deactivated. Please contact an administrator.".into(),
            ));
        }
        Ok(CurrentUser(user))
    }
}

/// Guard for routes that create or manage events. Admin passes through the
/// role lattice.
pub struct RequireOrganizer(pub User);

#[async_trait]
impl FromRequestParts<AppState> for RequireOrganizer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_organizer() {
            return Err(AppError::Forbidden(
                "You do not have permission to create events.".into(),
            ));
        }
        Ok(RequireOrganizer(user))
    }
}

/// Guard composed in front of every admin handler, replacing an implicit
/// before-request hook with an explicit parameter.
pub struct RequireAdmin(pub User);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Administrator access required.".into()));
        }
        Ok(RequireAdmin(user))
    }
}
