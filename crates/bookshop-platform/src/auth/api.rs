//! Authorization REST API
//!
//! Registration, login, password changes, and account deletion. The API
//! version header selects the audience: version 1 registers and signs in
//! store administrators, version 2 regular shoppers. The guest surface
//! (version 3) has no account operations.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::account::entity::User;
use crate::account::repository::UserRepository;
use crate::auth::auth_service::AuthService;
use crate::auth::password_service::PasswordService;
use crate::order::repository::OrderRepository;
use crate::shared::api_common::SuccessResponse;
use crate::shared::error::{Result, ShopError};
use crate::shared::middleware::{checks, ApiVersion, Authenticated, Versioned};
use bookshop_common::{ROLE_ADMIN, ROLE_USER};

/// Authorization service state
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: Arc<AuthService>,
    pub password_service: Arc<PasswordService>,
    pub users: Arc<dyn UserRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login name
    pub login: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Signed bearer token
    pub token: String,
    /// Expiration time, RFC 3339
    pub expiration: String,
}

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub confirm_email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Registration response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub login: String,
    pub email: String,
    pub roles: Vec<String>,
    pub message: String,
}

/// Self-service password change request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Admin password change request for another account
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetForAccountRequest {
    /// Email of the account to change
    pub email: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Account deletion request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub password: String,
    /// Explicit confirmation; a false value cancels the request
    pub confirm_delete: bool,
}

/// Account operations do not exist on the guest surface.
fn require_member_surface(version: ApiVersion) -> Result<()> {
    if version == ApiVersion::Guest {
        Err(ShopError::forbidden(
            "account operations are not available on the guest surface",
        ))
    } else {
        Ok(())
    }
}

fn check_new_password(current: &str, new: &str, confirm: &str) -> Result<()> {
    if new != confirm {
        return Err(ShopError::validation(
            "The new password and confirmation password do not match",
        ));
    }
    if new == current {
        return Err(ShopError::validation(
            "The new password cannot be the same as the current one, please try another",
        ));
    }
    Ok(())
}

/// Sign in
///
/// Verifies the credentials and returns a bearer token with a 1-hour expiry.
/// On the admin surface (version 1) the account must hold the admin role.
#[utoipa::path(
    post,
    path = "/login",
    tag = "authorization",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Unknown user, wrong password, or insufficient role")
    ),
    security(("api_key" = []))
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Versioned(version): Versioned,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    require_member_surface(version)?;

    let user = state
        .users
        .find_by_username(&req.login)
        .await?
        .ok_or_else(|| ShopError::unauthorized(format!("Not a registered user: '{}'", req.login)))?;

    if !state
        .password_service
        .verify_password(&req.password, &user.password_hash)?
    {
        return Err(ShopError::InvalidCredentials);
    }

    // The admin surface only signs in administrators
    if version == ApiVersion::Admin && !user.is_admin() {
        return Err(ShopError::unauthorized(format!(
            "Access denied for user '{}', the account does not have authority",
            user.username
        )));
    }

    let (token, expiration) = state.auth_service.generate_access_token(&user)?;
    tracing::info!(user = %user.username, "User signed in");

    Ok(Json(TokenResponse {
        token,
        expiration: expiration.to_rfc3339(),
    }))
}

/// Register a new account
///
/// Version 1 grants the admin role, version 2 the user role. Login and email
/// must both be unused.
#[utoipa::path(
    post,
    path = "/register",
    tag = "authorization",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Login or email already registered")
    ),
    security(("api_key" = []))
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Versioned(version): Versioned,
    Json(req): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<RegisterResponse>)> {
    require_member_surface(version)?;

    if req.login.trim().is_empty() {
        return Err(ShopError::validation("A unique login is required"));
    }
    if req.email != req.confirm_email {
        return Err(ShopError::validation(
            "Email and confirmation email do not match",
        ));
    }
    if req.password != req.confirm_password {
        return Err(ShopError::validation(
            "Password and confirmation password do not match",
        ));
    }

    let email_taken = state.users.find_by_email(&req.email).await?.is_some();
    let login_taken = state.users.find_by_username(&req.login).await?.is_some();
    if email_taken || login_taken {
        let (field, value) = if email_taken && login_taken {
            ("email and login", req.login.as_str())
        } else if email_taken {
            ("email", req.email.as_str())
        } else {
            ("login", req.login.as_str())
        };
        return Err(ShopError::duplicate("User", field, value));
    }

    let password_hash = state.password_service.hash_password(&req.password)?;

    let role = match version {
        ApiVersion::Admin => ROLE_ADMIN,
        _ => ROLE_USER,
    };
    let user = User::new(req.login.trim(), req.email.trim(), password_hash)
        .with_roles(vec![role.to_string()]);

    state.users.insert(&user).await?;
    tracing::info!(user = %user.username, roles = ?user.roles, "User registered");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterResponse {
            login: user.username,
            email: user.email,
            roles: user.roles,
            message: "Registered successfully".to_string(),
        }),
    ))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/password/reset",
    tag = "authorization",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 400, description = "Password checks failed"),
        (status = 401, description = "Not signed in or wrong current password")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn password_reset(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<SuccessResponse>> {
    let user = state
        .users
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| ShopError::unauthorized("User was not found, please sign in again"))?;

    if !state
        .password_service
        .verify_password(&req.current_password, &user.password_hash)?
    {
        return Err(ShopError::validation("The entered current password is not correct"));
    }
    check_new_password(&req.current_password, &req.new_password, &req.confirm_password)?;

    let password_hash = state.password_service.hash_password(&req.new_password)?;
    state.users.update_password(&user.id, &password_hash).await?;
    tracing::info!(user = %user.username, "Password changed");

    Ok(Json(SuccessResponse::with_message("Password changed successfully")))
}

/// Change another account's password (admin)
#[utoipa::path(
    put,
    path = "/password/reset/foranother",
    tag = "authorization",
    request_body = PasswordResetForAccountRequest,
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 400, description = "Password checks failed"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No account with that email")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn password_reset_for_account(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<PasswordResetForAccountRequest>,
) -> Result<Json<SuccessResponse>> {
    checks::require_admin(&auth)?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ShopError::not_found("User", &req.email))?;

    if !state
        .password_service
        .verify_password(&req.current_password, &user.password_hash)?
    {
        return Err(ShopError::validation("The entered current password is not correct"));
    }
    check_new_password(&req.current_password, &req.new_password, &req.confirm_password)?;

    let password_hash = state.password_service.hash_password(&req.new_password)?;
    state.users.update_password(&user.id, &password_hash).await?;
    tracing::info!(admin = %auth.username, user = %user.username, "Password changed for another account");

    Ok(Json(SuccessResponse::with_message("Password changed successfully")))
}

/// Delete the caller's account
///
/// Requires the confirmation flag and a verifying password; the user's
/// orders are removed with the account.
#[utoipa::path(
    delete,
    path = "/account/delete",
    tag = "authorization",
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, description = "Account deleted", body = SuccessResponse),
        (status = 400, description = "Deletion not confirmed"),
        (status = 401, description = "Wrong password")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn delete_account(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<Json<SuccessResponse>> {
    if !req.confirm_delete {
        return Err(ShopError::validation("Canceled by user"));
    }

    let user = state
        .users
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| ShopError::unauthorized("User was not found, please sign in again"))?;

    if !state
        .password_service
        .verify_password(&req.password, &user.password_hash)?
    {
        return Err(ShopError::unauthorized("Entered wrong password"));
    }

    let removed_orders = state.orders.delete_by_user(&user.id).await?;
    state.users.delete(&user.id).await?;
    tracing::info!(user = %user.username, removed_orders, "Account deleted");

    Ok(Json(SuccessResponse::with_message("Account deleted")))
}

/// Create the authorization router
pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(register))
        .routes(routes!(password_reset))
        .routes(routes!(password_reset_for_account))
        .routes(routes!(delete_account))
        .with_state(state)
}
