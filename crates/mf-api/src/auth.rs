//! Login, sign-up and logout, delegated to the configured `IdentityProvider`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use mf_core::error::AppError;
use mf_core::models::SignUpOutcome;
use mf_ui::{LoginTemplate, SignupTemplate};
use serde::Deserialize;
use tracing::info;

use crate::error::{render_page, ApiError};
use crate::session::{cleared_cookies, redirect_with_cookies, session_cookies, CurrentUser};
use crate::state::SharedState;

pub const MISSING_LOGIN_FIELDS: &str = "Missing email or password";
pub const MISSING_SIGNUP_FIELDS: &str = "Missing email, password or username";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const CONFIRMATION_SENT: &str =
    "Account created. Check your e-mail to confirm it, then log in.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn login_page(status: StatusCode, email: &str, error: Option<String>, success: Option<String>) -> Response {
    render_page(
        status,
        LoginTemplate {
            title: "Log in".to_string(),
            user: None,
            email: email.to_string(),
            error,
            success,
        },
    )
}

fn signup_page(status: StatusCode, form: &SignupForm, error: String) -> Response {
    render_page(
        status,
        SignupTemplate {
            title: "Sign up".to_string(),
            user: None,
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            error: Some(error),
        },
    )
}

pub async fn login_form(CurrentUser(user): CurrentUser) -> Response {
    render_page(
        StatusCode::OK,
        LoginTemplate {
            title: "Log in".to_string(),
            user,
            email: String::new(),
            error: None,
            success: None,
        },
    )
}

pub async fn signup_form(CurrentUser(user): CurrentUser) -> Response {
    render_page(
        StatusCode::OK,
        SignupTemplate {
            title: "Sign up".to_string(),
            user,
            username: String::new(),
            email: String::new(),
            error: None,
        },
    )
}

pub async fn login(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return login_page(StatusCode::BAD_REQUEST, email, Some(MISSING_LOGIN_FIELDS.to_string()), None);
    }

    match state.identity.sign_in(email, &form.password).await {
        Ok(session) => {
            info!("user signed in");
            redirect_with_cookies(session_cookies(&session, state.secure_cookies), "/")
        }
        Err(AppError::Unauthorized(message) | AppError::ValidationError(message)) => {
            login_page(StatusCode::BAD_REQUEST, email, Some(message), None)
        }
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn signup(State(state): State<SharedState>, Form(form): Form<SignupForm>) -> Response {
    let username = form.username.trim();
    let email = form.email.trim();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return signup_page(StatusCode::BAD_REQUEST, &form, MISSING_SIGNUP_FIELDS.to_string());
    }
    if form.password != form.confirm_password {
        return signup_page(StatusCode::BAD_REQUEST, &form, PASSWORD_MISMATCH.to_string());
    }

    match state.identity.sign_up(email, &form.password, username).await {
        Ok(SignUpOutcome::SignedIn(session)) => {
            info!("user signed up");
            redirect_with_cookies(session_cookies(&session, state.secure_cookies), "/")
        }
        Ok(SignUpOutcome::ConfirmationPending) => {
            info!("user signed up, e-mail confirmation pending");
            login_page(StatusCode::OK, email, None, Some(CONFIRMATION_SENT.to_string()))
        }
        Err(AppError::Unauthorized(message) | AppError::ValidationError(message)) => {
            signup_page(StatusCode::BAD_REQUEST, &form, message)
        }
        Err(err) => ApiError(err).into_response(),
    }
}

/// Clears both session cookies. The provider-side session is left to expire.
pub async fn logout(State(state): State<SharedState>) -> Response {
    redirect_with_cookies(cleared_cookies(state.secure_cookies), "/")
}
