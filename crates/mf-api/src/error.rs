//! Maps `AppError` onto HTTP responses.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use mf_core::error::AppError;
use mf_core::models::User;
use mf_ui::{MessageTemplate, NotFoundTemplate};
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        ApiError(AppError::Internal(format!("template rendering failed: {err}")))
    }
}

/// What an error response shows. It travels on the response as an
/// extension so `personalize_error_pages` can render it again for a
/// signed-in visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Message { title: String, message: String },
}

impl ErrorPage {
    fn message(title: &str, message: impl Into<String>) -> Self {
        ErrorPage::Message {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn render(&self, status: StatusCode, user: Option<User>) -> Response {
        match self {
            ErrorPage::NotFound => render_page(status, NotFoundTemplate::new(user)),
            ErrorPage::Message { title, message } => render_page(
                status,
                MessageTemplate::new(title.clone(), message.clone()).with_user(user),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, page) = match self.0 {
            AppError::NotFound(..) => (StatusCode::NOT_FOUND, ErrorPage::NotFound),
            AppError::ValidationError(msg) | AppError::Unauthorized(msg) => {
                (StatusCode::BAD_REQUEST, ErrorPage::message("Bad request", msg))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorPage::message("Conflict", msg)),
            AppError::RateLimitExceeded(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorPage::message("Too many requests", msg),
            ),
            AppError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorPage::message("Server error", "Server error"),
                )
            }
        };

        let mut response = page.render(status, None);
        response.extensions_mut().insert(page);
        response
    }
}

/// Renders `template` with `status`. A rendering failure degrades to a
/// plain-text 500.
pub fn render_page<T: Template>(status: StatusCode, template: T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("Thread", 1), StatusCode::NOT_FOUND),
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::RateLimitExceeded("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_error_response_carries_its_page() {
        let response = ApiError(AppError::RateLimitExceeded("slow down".into())).into_response();
        assert_eq!(
            response.extensions().get::<ErrorPage>(),
            Some(&ErrorPage::Message {
                title: "Too many requests".to_string(),
                message: "slow down".to_string(),
            })
        );

        let response = ApiError(AppError::not_found("Thread", 9)).into_response();
        assert_eq!(response.extensions().get::<ErrorPage>(), Some(&ErrorPage::NotFound));
    }
}
