//! # mf-ui
//!
//! Server-rendered pages. Every template extends `layout.html`, which needs
//! `title` and the (optional) signed-in `user`.

use askama::Template;
use mf_core::models::{Forum, Reply, Thread, ThreadActivity, ThreadDraft, ThreadSummary, User};
use mf_core::pagination::Paginated;
use mf_core::search::SearchResults;

pub const SITE_NAME: &str = "Mini Forum";

/// Home page: every forum.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub title: String,
    pub user: Option<User>,
    pub forums: Vec<Forum>,
}

/// One forum with a page of its threads.
#[derive(Template)]
#[template(path = "forum.html")]
pub struct ForumTemplate {
    pub title: String,
    pub user: Option<User>,
    pub forum: Forum,
    pub threads: Paginated<ThreadSummary>,
}

#[derive(Template)]
#[template(path = "new_thread.html")]
pub struct NewThreadTemplate {
    pub title: String,
    pub user: Option<User>,
    pub forum: Forum,
    pub draft: ThreadDraft,
    pub error: Option<String>,
}

/// A thread with a page of its replies and the reply form.
#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate {
    pub title: String,
    pub user: Option<User>,
    pub thread: Thread,
    pub replies: Paginated<Reply>,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub title: String,
    pub user: Option<User>,
    pub results: SearchResults,
}

#[derive(Template)]
#[template(path = "new_posts.html")]
pub struct NewPostsTemplate {
    pub title: String,
    pub user: Option<User>,
    pub posts: Vec<ThreadActivity>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: String,
    pub user: Option<User>,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub title: String,
    pub user: Option<User>,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub title: String,
    pub user: Option<User>,
}

/// Generic message page for 400/429/500 responses.
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub title: String,
    pub user: Option<User>,
    pub message: String,
}

impl NotFoundTemplate {
    pub fn new(user: Option<User>) -> Self {
        Self {
            title: "404 Not Found".to_string(),
            user,
        }
    }
}

impl MessageTemplate {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            user: None,
            message: message.into(),
        }
    }

    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}
