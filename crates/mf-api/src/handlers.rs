//! # mf-api Handlers
//!
//! This module coordinates the flow between HTTP requests and `ForumService`.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use mf_core::error::AppError;
use mf_core::models::{ReplyDraft, ThreadDraft};
use mf_core::pagination::PageRequest;
use mf_core::service::{ForumPage, ThreadPage};
use mf_ui::{
    ForumTemplate, HomeTemplate, NewPostsTemplate, NewThreadTemplate, NotFoundTemplate,
    SearchTemplate, ThreadTemplate, SITE_NAME,
};
use askama::Template;
use serde::Deserialize;

use crate::error::{render_page, ApiError, ApiResult};
use crate::session::CurrentUser;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Path ids that are not integers cannot name anything.
fn parse_id(raw: &str, kind: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError(AppError::not_found(kind, raw)))
}

fn render<T: Template>(template: T) -> ApiResult<Html<String>> {
    Ok(Html(template.render()?))
}

/// Renders the forum list (`/`).
pub async fn home(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Html<String>> {
    let forums = state.service.forums().await?;
    render(HomeTemplate {
        title: SITE_NAME.to_string(),
        user,
        forums,
    })
}

/// Renders one page of a forum's threads (`/f/{id}?page=N`).
pub async fn forum_page(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let id = parse_id(&id, "Forum")?;
    let ForumPage { forum, threads } = state.service.forum_page(id, query.request()).await?;
    render(ForumTemplate {
        title: forum.name.clone(),
        user,
        forum,
        threads,
    })
}

pub async fn new_thread_form(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let forum = state.service.forum(parse_id(&id, "Forum")?).await?;
    render(NewThreadTemplate {
        title: format!("New thread in {}", forum.name),
        user,
        forum,
        draft: ThreadDraft::default(),
        error: None,
    })
}

/// Creates a thread and redirects to it. Validation failures re-render the
/// form with the submitted values.
pub async fn create_thread(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(draft): Form<ThreadDraft>,
) -> ApiResult<Response> {
    let forum_id = parse_id(&id, "Forum")?;

    match state.service.create_thread(forum_id, draft.clone()).await {
        Ok(thread) => {
            state.metrics.threads_created.inc();
            Ok(Redirect::to(&format!("/thread/{}", thread.id)).into_response())
        }
        Err(AppError::ValidationError(message)) => {
            let forum = state.service.forum(forum_id).await?;
            Ok(render_page(
                StatusCode::BAD_REQUEST,
                NewThreadTemplate {
                    title: format!("New thread in {}", forum.name),
                    user,
                    forum,
                    draft,
                    error: Some(message),
                },
            ))
        }
        Err(err) => Err(err.into()),
    }
}

/// Renders a thread with one page of replies (`/thread/{id}?page=N`).
pub async fn thread_page(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let id = parse_id(&id, "Thread")?;
    let ThreadPage { thread, replies } = state.service.thread_page(id, query.request()).await?;
    render(ThreadTemplate {
        title: thread.title.clone(),
        user,
        thread,
        replies,
    })
}

/// Creates a reply and redirects to the last page of its thread.
pub async fn create_reply(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Form(draft): Form<ReplyDraft>,
) -> ApiResult<Redirect> {
    let thread_id = parse_id(&id, "Thread")?;
    let created = state.service.create_reply(thread_id, draft).await?;
    state.metrics.replies_created.inc();
    Ok(Redirect::to(&format!(
        "/thread/{thread_id}?page={}",
        created.page
    )))
}

pub async fn delete_thread(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Redirect> {
    let forum_id = state.service.delete_thread(parse_id(&id, "Thread")?).await?;
    state.metrics.threads_deleted.inc();
    Ok(Redirect::to(&format!("/f/{forum_id}")))
}

/// Deletes a reply only if it belongs to the thread in the path; either way
/// the visitor lands back on the thread.
pub async fn delete_reply(
    State(state): State<SharedState>,
    Path((thread_id, reply_id)): Path<(String, String)>,
) -> ApiResult<Redirect> {
    let thread_id = parse_id(&thread_id, "Thread")?;
    let reply_id = parse_id(&reply_id, "Reply")?;

    if state.service.delete_reply(thread_id, reply_id).await? {
        state.metrics.replies_deleted.inc();
    }
    Ok(Redirect::to(&format!("/thread/{thread_id}")))
}

pub async fn search(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Html<String>> {
    let results = state
        .service
        .search(query.q.as_deref().unwrap_or_default())
        .await?;
    render(SearchTemplate {
        title: "Search".to_string(),
        user,
        results,
    })
}

/// Cross-forum feed of recently active threads.
pub async fn new_posts(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Html<String>> {
    let posts = state.service.new_posts().await?;
    render(NewPostsTemplate {
        title: "New posts".to_string(),
        user,
        posts,
    })
}

pub async fn metrics(State(state): State<SharedState>) -> ApiResult<Response> {
    let body = state
        .metrics
        .encode()
        .map_err(|err| ApiError(AppError::Internal(format!("metrics encoding failed: {err}"))))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response())
}

pub async fn not_found(CurrentUser(user): CurrentUser) -> Response {
    render_page(StatusCode::NOT_FOUND, NotFoundTemplate::new(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_non_numeric_as_not_found() {
        assert_eq!(parse_id("42", "Thread").unwrap(), 42);
        assert!(matches!(
            parse_id("abc", "Thread"),
            Err(ApiError(AppError::NotFound(kind, id))) if kind == "Thread" && id == "abc"
        ));
    }
}
