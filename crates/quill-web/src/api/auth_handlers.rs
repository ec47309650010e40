use axum::extract::{FromRequest, Request, State};
use axum::Json;
use quill_core::{Account, Captcha, LoginAttempt, Profile};

use crate::auth::jwt;
use crate::auth::middleware::CurrentUser;
use crate::auth::password::hash_password;
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

/// Takes the raw request so throttling happens before the body is read.
pub async fn login(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<Reply<LoginResponse>>, AppError> {
    state
        .login_limiter
        .wait(state.config.login.wait_timeout())
        .await?;

    let body = Input::<LoginRequest>::from_request(req, &state).await;
    let Input(body) = body.map_err(|e| match e {
        AppError::Fail { detail, .. } => AppError::Fail {
            message: "please enter account and password".to_string(),
            detail,
        },
        other => other,
    })?;

    let attempt = LoginAttempt::from(body);
    let account = state.authenticator.authenticate(&attempt).await?;

    let (token, expires_at) = jwt::create_token(
        &state.config.auth.token_secret,
        state.config.auth.token_ttl_hours,
        account.id,
        account.role,
    )?;
    tracing::info!("Session issued for account: {}", account.num);

    Ok(succ("login succeeded", LoginResponse { token, expires_at }))
}

pub async fn vcode(State(state): State<AppState>) -> Json<Reply<Captcha>> {
    succ("succ", Captcha::issue(&state.config.auth.captcha_key))
}

/// Sessions are stateless; the client just drops its token.
pub async fn logout() -> Json<Reply<()>> {
    done("ok")
}

pub async fn auth_get(
    CurrentUser(ctx): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Reply<Account>>, AppError> {
    let account = state
        .accounts
        .get(ctx.uid)
        .await?
        .ok_or_else(|| AppError::fail("account no longer exists"))?;
    Ok(succ("auth", account))
}

pub async fn auth_edit(
    CurrentUser(ctx): CurrentUser,
    State(state): State<AppState>,
    Input(body): Input<ProfileRequest>,
) -> Result<Json<Reply<()>>, AppError> {
    let profile = Profile {
        name: body.name.trim().to_string(),
        phone: body.phone.trim().to_string(),
        email: body.email.trim().to_string(),
    };
    state
        .accounts
        .update_profile(ctx.uid, profile)
        .await
        .map_err(|e| AppError::fail_with("update failed", e))?;
    Ok(done("succ"))
}

pub async fn auth_passwd(
    CurrentUser(ctx): CurrentUser,
    State(state): State<AppState>,
    Input(body): Input<PasswdRequest>,
) -> Result<Json<Reply<()>>, AppError> {
    if body.npasswd.is_empty() {
        return Err(AppError::fail("new password must not be empty"));
    }

    let account = state
        .accounts
        .get(ctx.uid)
        .await?
        .ok_or_else(|| AppError::fail("invalid input data, please retry"))?;

    let matches = state
        .authenticator
        .check_password(&account.passwd, &body.opasswd)
        .await?;
    if !matches {
        tracing::warn!("Password change refused for account {}: old password mismatch", account.num);
        return Err(AppError::fail("original password incorrect, please retry"));
    }

    let npasswd = body.npasswd;
    let hashed = tokio::task::spawn_blocking(move || hash_password(&npasswd))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    state
        .accounts
        .update_password(ctx.uid, hashed)
        .await
        .map_err(|e| AppError::fail_with("password change failed", e))?;
    tracing::info!("Password changed for account: {}", account.num);
    Ok(done("succ"))
}
