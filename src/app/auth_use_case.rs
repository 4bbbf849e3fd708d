use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::app::submit_use_case::rejection_message;
use crate::auth::{AuthContext, LoginResponse};
use crate::constants;
use crate::error::{ImportError, Result};
use crate::types::{PasswordChange, TeacherRegistration};

/// Exchanges a username and password for an [`AuthContext`].
#[instrument(skip(http, password))]
pub async fn login(http: &dyn HttpClientPort, login_path: &str, username: &str, password: &str) -> Result<AuthContext> {
    let body = serde_json::to_vec(&json!({ "username": username, "password": password }))?;
    let resp = http.post_json(login_path, body).await?;
    if !resp.is_success() {
        return Err(ImportError::Unauthorized(rejection_message(&resp.bytes)));
    }
    let login: LoginResponse = serde_json::from_slice(&resp.bytes)
        .map_err(|e| ImportError::InvalidResponse(format!("login response: {}", e)))?;
    info!(role = %login.role, "logged in");
    Ok(AuthContext::from_login(login))
}

/// Provisions a teacher account. Returns the server's confirmation message.
#[instrument(skip(http, registration), fields(username = %registration.username))]
pub async fn register_teacher(http: &dyn HttpClientPort, path: &str, registration: &TeacherRegistration) -> Result<String> {
    validate_registration(registration)?;
    let resp = http.post_json(path, serde_json::to_vec(registration)?).await?;
    let message = confirmation(resp, constants::MSG_TEACHER_CREATED)?;
    info!("teacher account created");
    Ok(message)
}

/// Changes a user's password. Works without a signed-in session.
#[instrument(skip(http, change), fields(username = %change.username))]
pub async fn change_password(http: &dyn HttpClientPort, path: &str, change: &PasswordChange) -> Result<String> {
    validate_password_change(change)?;
    let resp = http.post_json(path, serde_json::to_vec(change)?).await?;
    let message = confirmation(resp, constants::MSG_PASSWORD_CHANGED)?;
    info!("password changed");
    Ok(message)
}

pub fn validate_registration(r: &TeacherRegistration) -> Result<()> {
    if [&r.username, &r.password, &r.full_name, &r.email]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(ImportError::InvalidInput("username, password, full name and email are all required".into()));
    }
    if r.password.chars().count() < constants::TEACHER_PASSWORD_MIN_LEN {
        return Err(ImportError::InvalidInput(format!(
            "password must be at least {} characters",
            constants::TEACHER_PASSWORD_MIN_LEN
        )));
    }
    if !r.email.contains('@') {
        return Err(ImportError::InvalidInput(format!("invalid email address '{}'", r.email)));
    }
    Ok(())
}

pub fn validate_password_change(c: &PasswordChange) -> Result<()> {
    if c.username.trim().is_empty() {
        return Err(ImportError::InvalidInput("username is required".into()));
    }
    if c.old_password.trim().is_empty() {
        return Err(ImportError::InvalidInput("old password is required".into()));
    }
    if c.new_password.trim().is_empty() {
        return Err(ImportError::InvalidInput("new password is required".into()));
    }
    if c.new_password.chars().count() < constants::NEW_PASSWORD_MIN_LEN {
        return Err(ImportError::InvalidInput(format!(
            "new password must be at least {} characters",
            constants::NEW_PASSWORD_MIN_LEN
        )));
    }
    if c.old_password == c.new_password {
        return Err(ImportError::InvalidInput("new password must differ from the old one".into()));
    }
    Ok(())
}

/// `message` from a 2xx JSON body, else `fallback`.
fn confirmation(resp: HttpResponse, fallback: &str) -> Result<String> {
    if !resp.is_success() {
        return Err(ImportError::RemoteRejection {
            status: resp.status,
            message: rejection_message(&resp.bytes),
        });
    }
    Ok(serde_json::from_slice::<Value>(&resp.bytes)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string()))
}
