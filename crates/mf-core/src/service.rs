//! # ForumService
//!
//! Orchestrates store calls for every page and mutation. Handlers stay thin:
//! they parse the request, call one method here, and render the result.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{
    Forum, ForumId, NewReply, NewThread, Reply, ReplyDraft, ReplyId, Thread, ThreadActivity,
    ThreadDraft, ThreadId, ThreadSummary,
};
use crate::pagination::{PageRequest, Paginated, total_pages};
use crate::sanitize::{PostKind, sanitize_content, sanitize_optional_text, sanitize_text};
use crate::search::{self, SEARCH_LIMIT, SearchResults};
use crate::traits::ForumRepo;

/// Threads shown on the cross-forum "new posts" page.
pub const FEED_LIMIT: i64 = 40;

/// A forum with one page of its threads.
#[derive(Debug, Clone)]
pub struct ForumPage {
    pub forum: Forum,
    pub threads: Paginated<ThreadSummary>,
}

/// A thread with one page of its replies.
#[derive(Debug, Clone)]
pub struct ThreadPage {
    pub thread: Thread,
    pub replies: Paginated<Reply>,
}

/// A stored reply and the thread page it landed on.
#[derive(Debug, Clone)]
pub struct CreatedReply {
    pub reply: Reply,
    pub page: i64,
}

#[derive(Clone)]
pub struct ForumService {
    repo: Arc<dyn ForumRepo>,
}

impl ForumService {
    pub fn new(repo: Arc<dyn ForumRepo>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Arc<dyn ForumRepo> {
        &self.repo
    }

    pub async fn forums(&self) -> Result<Vec<Forum>> {
        Ok(self.repo.list_forums().await?)
    }

    pub async fn forum(&self, id: ForumId) -> Result<Forum> {
        self.repo
            .get_forum(id)
            .await?
            .ok_or_else(|| AppError::not_found("Forum", id))
    }

    pub async fn thread(&self, id: ThreadId) -> Result<Thread> {
        self.repo
            .get_thread(id)
            .await?
            .ok_or_else(|| AppError::not_found("Thread", id))
    }

    pub async fn forum_page(&self, forum_id: ForumId, page: PageRequest) -> Result<ForumPage> {
        let forum = self.forum(forum_id).await?;
        let total = self.repo.count_threads(forum_id).await?;
        let items = self
            .repo
            .list_threads_page(forum_id, page.limit(), page.offset())
            .await?;

        Ok(ForumPage {
            forum,
            threads: Paginated::new(items, page, total),
        })
    }

    pub async fn thread_page(&self, thread_id: ThreadId, page: PageRequest) -> Result<ThreadPage> {
        let thread = self.thread(thread_id).await?;
        let total = self.repo.count_replies(thread_id).await?;
        let items = self
            .repo
            .list_replies_page(thread_id, page.limit(), page.offset())
            .await?;

        Ok(ThreadPage {
            thread,
            replies: Paginated::new(items, page, total),
        })
    }

    pub async fn new_posts(&self) -> Result<Vec<ThreadActivity>> {
        Ok(self.repo.recent_activity(FEED_LIMIT).await?)
    }

    /// Blank queries return an empty result without touching the store.
    pub async fn search(&self, raw_query: &str) -> Result<SearchResults> {
        let Some(query) = search::normalize_query(raw_query) else {
            return Ok(SearchResults::empty());
        };

        let threads = self.repo.search_threads(query, SEARCH_LIMIT).await?;
        let replies = self.repo.search_replies(query, SEARCH_LIMIT).await?;

        let partial = search::merge(threads, replies);
        let missing = search::missing_thread_ids(&partial);
        let loaded = if missing.is_empty() {
            Vec::new()
        } else {
            self.repo.get_threads_by_ids(&missing).await?
        };

        Ok(SearchResults {
            query: query.to_string(),
            hits: search::hydrate(partial, loaded),
        })
    }

    pub async fn create_thread(&self, forum_id: ForumId, draft: ThreadDraft) -> Result<Thread> {
        let title = sanitize_text(&draft.title);
        if title.is_empty() {
            return Err(AppError::ValidationError("A title is required".into()));
        }
        let content = sanitize_content(&draft.content, PostKind::Thread)
            .ok_or_else(|| AppError::ValidationError("Content is required".into()))?;

        self.forum(forum_id).await?;

        let thread = self
            .repo
            .create_thread(NewThread {
                forum_id,
                title,
                author: sanitize_optional_text(&draft.author),
                content,
                created_at: Utc::now(),
            })
            .await?;

        info!(thread_id = thread.id, forum_id, "thread created");
        Ok(thread)
    }

    pub async fn create_reply(&self, thread_id: ThreadId, draft: ReplyDraft) -> Result<CreatedReply> {
        let content = sanitize_content(&draft.content, PostKind::Reply)
            .ok_or_else(|| AppError::ValidationError("Content is required".into()))?;

        self.thread(thread_id).await?;

        let reply = self
            .repo
            .create_reply(NewReply {
                thread_id,
                author: sanitize_optional_text(&draft.author),
                content,
                created_at: Utc::now(),
            })
            .await?;

        let total = self.repo.count_replies(thread_id).await?;
        let page = total_pages(total, PageRequest::default().limit()).max(1);

        info!(reply_id = reply.id, thread_id, "reply created");
        Ok(CreatedReply { reply, page })
    }

    /// Deletes a thread with its replies and returns the forum it lived in.
    pub async fn delete_thread(&self, thread_id: ThreadId) -> Result<ForumId> {
        let forum_id = self
            .repo
            .delete_thread(thread_id)
            .await?
            .ok_or_else(|| AppError::not_found("Thread", thread_id))?;

        info!(thread_id, forum_id, "thread deleted");
        Ok(forum_id)
    }

    /// Returns whether a reply was removed. A reply addressed through the
    /// wrong thread is left alone.
    pub async fn delete_reply(&self, thread_id: ThreadId, reply_id: ReplyId) -> Result<bool> {
        let deleted = self.repo.delete_reply(thread_id, reply_id).await?;
        if deleted {
            info!(reply_id, thread_id, "reply deleted");
        }
        Ok(deleted)
    }
}
