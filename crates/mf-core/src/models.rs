//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! Identifiers are integer surrogate keys assigned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ForumId = i64;
pub type ThreadId = i64;
pub type ReplyId = i64;

/// Shown wherever a post was made without an author name.
pub const ANONYMOUS: &str = "Anonymous";

/// A top-level category (e.g., "General", "Announcements").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forum {
    pub id: ForumId,
    pub name: String,
    /// Unique when present.
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Input for seeding a forum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewForum {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A topic: the root post of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub forum_id: ForumId,
    /// Plain text.
    pub title: String,
    pub author: Option<String>,
    /// Sanitized markup fragment, safe to render unescaped.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// A fully sanitized thread ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewThread {
    pub forum_id: ForumId,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A response to a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub author: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// A fully sanitized reply ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReply {
    pub thread_id: ThreadId,
    pub author: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Raw form input for a new thread, before sanitization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// Raw form input for a new reply, before sanitization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyDraft {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// A thread row on a forum page, with its derived reply count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadSummary {
    pub thread: Thread,
    pub reply_count: i64,
}

/// A row of the cross-forum "new posts" feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadActivity {
    pub thread: Thread,
    pub forum_name: String,
    pub reply_count: i64,
    /// None when the thread has no replies.
    pub last_reply_at: Option<DateTime<Utc>>,
    /// The later of the thread's creation and its newest reply.
    pub latest_activity: DateTime<Utc>,
}

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Tokens issued by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The provider signed the user in immediately.
    SignedIn(Session),
    /// The account exists but must be confirmed by e-mail before login.
    ConfirmationPending,
}
