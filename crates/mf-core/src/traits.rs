//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Forum, ForumId, NewForum, NewReply, NewThread, Reply, ReplyId, Session, SignUpOutcome, Thread,
    ThreadActivity, ThreadId, ThreadSummary, User,
};

/// Data persistence contract for forums, threads, and replies.
///
/// Aggregates (reply counts, latest activity) are computed by the queries
/// themselves and never stored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumRepo: Send + Sync {
    // Forum Operations
    async fn list_forums(&self) -> anyhow::Result<Vec<Forum>>;
    async fn get_forum(&self, id: ForumId) -> anyhow::Result<Option<Forum>>;
    async fn get_forum_by_slug(&self, slug: &str) -> anyhow::Result<Option<Forum>>;
    async fn create_forum(&self, forum: NewForum) -> anyhow::Result<Forum>;

    // Thread Operations
    async fn count_threads(&self, forum_id: ForumId) -> anyhow::Result<i64>;
    /// Newest first, each row with its reply count.
    async fn list_threads_page(
        &self,
        forum_id: ForumId,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ThreadSummary>>;
    async fn get_thread(&self, id: ThreadId) -> anyhow::Result<Option<Thread>>;
    async fn get_threads_by_ids(&self, ids: &[ThreadId]) -> anyhow::Result<Vec<Thread>>;
    async fn create_thread(&self, thread: NewThread) -> anyhow::Result<Thread>;
    /// Removes the thread and all of its replies atomically.
    /// Returns the owning forum, or None if the thread did not exist.
    async fn delete_thread(&self, id: ThreadId) -> anyhow::Result<Option<ForumId>>;
    /// Most recently active threads across all forums.
    async fn recent_activity(&self, limit: i64) -> anyhow::Result<Vec<ThreadActivity>>;

    // Reply Operations
    async fn count_replies(&self, thread_id: ThreadId) -> anyhow::Result<i64>;
    /// Oldest first.
    async fn list_replies_page(
        &self,
        thread_id: ThreadId,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Reply>>;
    async fn create_reply(&self, reply: NewReply) -> anyhow::Result<Reply>;
    /// Deletes only when the reply belongs to `thread_id`.
    async fn delete_reply(&self, thread_id: ThreadId, reply_id: ReplyId) -> anyhow::Result<bool>;

    // Search Operations
    async fn search_threads(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<Thread>>;
    async fn search_replies(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<Reply>>;
}

/// External identity contract. The forum never stores credentials itself.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a new account. Rejections surface as `AppError::Unauthorized`.
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome>;

    /// Exchanges credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Resolves an access token to its user, or None if the token is invalid.
    async fn verify(&self, access_token: &str) -> Result<Option<User>>;
}
