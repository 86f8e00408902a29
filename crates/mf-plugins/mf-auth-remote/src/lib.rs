//! # mf-auth-remote
//!
//! `IdentityProvider` backed by a GoTrue-compatible REST service
//! (self-hosted GoTrue, or a hosted project's `/auth/v1` endpoint).
//! The forum never sees password hashes; it only forwards credentials and
//! keeps the returned tokens in cookies.

use std::time::Duration;

use async_trait::async_trait;
use mf_core::error::{AppError, Result};
use mf_core::models::{Session, SignUpOutcome, User};
use mf_core::traits::IdentityProvider;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

pub struct RemoteIdentityProvider {
    client: Client,
    /// Service root, e.g. `https://project.example.com/auth/v1`
    base_url: String,
    api_key: Option<SecretString>,
}

impl RemoteIdentityProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header("apikey", key.expose_secret()),
            None => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenBody {
    fn into_session(self) -> Option<Session> {
        Some(Session {
            access_token: self.access_token.filter(|t| !t.is_empty())?,
            refresh_token: self.refresh_token.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    username: Option<String>,
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        User {
            id: body.id,
            email: body.email,
            username: body.user_metadata.username,
        }
    }
}

/// The service reports errors under different keys depending on the endpoint.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|err| {
            err.msg
                .or(err.error_description)
                .or(err.message)
                .or(err.error)
        })
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| "The identity provider rejected the request".to_string())
}

fn unreachable(err: reqwest::Error) -> AppError {
    AppError::Internal(format!("identity provider request failed: {err}"))
}

/// Client errors carry a user-facing message; anything else is internal.
async fn rejection(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        AppError::Unauthorized(error_message(&body))
    } else {
        AppError::Internal(format!("identity provider returned {status}"))
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome> {
        let response = self
            .request(Method::POST, "/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "username": username },
            }))
            .send()
            .await
            .map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        // With e-mail confirmation enabled the body is a bare user object.
        let body: TokenBody = response.json().await.map_err(unreachable)?;
        Ok(match body.into_session() {
            Some(session) => SignUpOutcome::SignedIn(session),
            None => SignUpOutcome::ConfirmationPending,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .request(Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: TokenBody = response.json().await.map_err(unreachable)?;
        body.into_session()
            .ok_or_else(|| AppError::Internal("identity provider returned no access token".into()))
    }

    async fn verify(&self, access_token: &str) -> Result<Option<User>> {
        let response = self
            .request(Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unreachable)?;

        match response.status() {
            status if status.is_success() => {
                let body: UserBody = response.json().await.map_err(unreachable)?;
                Ok(Some(body.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                tracing::warn!(%status, "unexpected status while verifying access token");
                Err(AppError::Internal(format!("identity provider returned {status}")))
            }
        }
    }
}
