//! # mf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `mf-core` domain models.

use std::str::FromStr;

use async_trait::async_trait;
use mf_core::error::AppError;
use mf_core::models::{
    Forum, ForumId, NewForum, NewReply, NewThread, Reply, ReplyId, Thread, ThreadActivity,
    ThreadId, ThreadSummary,
};
use mf_core::traits::ForumRepo;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const THREAD_COLUMNS: &str = "t.id, t.forum_id, t.title, t.author, t.content, t.created_at";

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

impl SqliteForumRepo {
    /// Connects with a default pool size and applies pending migrations.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `sqlite::memory:` is its own database, so an
        // in-memory store must live on exactly one connection that never closes.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        MIGRATOR.run(&pool).await?;
        tracing::debug!("sqlite migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Full Unicode lowercasing for the `*_folded` search columns.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Builds a `LIKE` pattern matching `needle` anywhere, with wildcards in the
/// needle itself matched literally (used with `ESCAPE '\'`).
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn forum_from_row(row: &SqliteRow) -> Result<Forum, sqlx::Error> {
    Ok(Forum {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

fn thread_from_row(row: &SqliteRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        forum_id: row.try_get("forum_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reply_from_row(row: &SqliteRow) -> Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        author: row.try_get("author")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ForumRepo for SqliteForumRepo {
    async fn list_forums(&self) -> anyhow::Result<Vec<Forum>> {
        let rows = sqlx::query("SELECT id, name, slug, description FROM forums ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(forum_from_row).collect::<Result<_, _>>()?)
    }

    async fn get_forum(&self, id: ForumId) -> anyhow::Result<Option<Forum>> {
        let row = sqlx::query("SELECT id, name, slug, description FROM forums WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(forum_from_row).transpose()?)
    }

    async fn get_forum_by_slug(&self, slug: &str) -> anyhow::Result<Option<Forum>> {
        let row = sqlx::query("SELECT id, name, slug, description FROM forums WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(forum_from_row).transpose()?)
    }

    /// A taken slug is reported as `AppError::Conflict`.
    async fn create_forum(&self, forum: NewForum) -> anyhow::Result<Forum> {
        let result = sqlx::query("INSERT INTO forums (name, slug, description) VALUES (?, ?, ?)")
            .bind(&forum.name)
            .bind(&forum.slug)
            .bind(&forum.description)
            .execute(&self.pool)
            .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Conflict(format!(
                    "a forum with slug {:?} already exists",
                    forum.slug.unwrap_or_default()
                ))
                .into());
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Forum {
            id,
            name: forum.name,
            slug: forum.slug,
            description: forum.description,
        })
    }

    async fn count_threads(&self, forum_id: ForumId) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE forum_id = ?")
            .bind(forum_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_threads_page(
        &self,
        forum_id: ForumId,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ThreadSummary>> {
        let sql = format!(
            "SELECT {THREAD_COLUMNS}, \
                    (SELECT COUNT(*) FROM replies r WHERE r.thread_id = t.id) AS reply_count \
             FROM threads t \
             WHERE t.forum_id = ? \
             ORDER BY t.created_at DESC, t.id DESC \
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(forum_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let summaries = rows
            .iter()
            .map(|row| -> Result<ThreadSummary, sqlx::Error> {
                Ok(ThreadSummary {
                    thread: thread_from_row(row)?,
                    reply_count: row.try_get("reply_count")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    async fn get_thread(&self, id: ThreadId) -> anyhow::Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads t WHERE t.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(thread_from_row).transpose()?)
    }

    async fn get_threads_by_ids(&self, ids: &[ThreadId]) -> anyhow::Result<Vec<Thread>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {THREAD_COLUMNS} FROM threads t WHERE t.id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(thread_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_thread(&self, thread: NewThread) -> anyhow::Result<Thread> {
        let id = sqlx::query(
            "INSERT INTO threads \
                 (forum_id, title, author, content, created_at, title_folded, content_folded, author_folded) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(thread.forum_id)
        .bind(&thread.title)
        .bind(&thread.author)
        .bind(&thread.content)
        .bind(thread.created_at)
        .bind(fold(&thread.title))
        .bind(fold(&thread.content))
        .bind(thread.author.as_deref().map(fold))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Thread {
            id,
            forum_id: thread.forum_id,
            title: thread.title,
            author: thread.author,
            content: thread.content,
            created_at: thread.created_at,
        })
    }

    /// Replies go first, then the thread, in one transaction so a failure
    /// part-way leaves nothing orphaned.
    async fn delete_thread(&self, id: ThreadId) -> anyhow::Result<Option<ForumId>> {
        let mut tx = self.pool.begin().await?;

        let forum_id: Option<ForumId> =
            sqlx::query_scalar("SELECT forum_id FROM threads WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(forum_id) = forum_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM replies WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(forum_id))
    }

    async fn recent_activity(&self, limit: i64) -> anyhow::Result<Vec<ThreadActivity>> {
        let sql = format!(
            "SELECT {THREAD_COLUMNS}, \
                    f.name AS forum_name, \
                    (SELECT COUNT(*) FROM replies r WHERE r.thread_id = t.id) AS reply_count, \
                    (SELECT MAX(r.created_at) FROM replies r WHERE r.thread_id = t.id) AS last_reply_at, \
                    MAX(t.created_at, COALESCE((SELECT MAX(r.created_at) FROM replies r WHERE r.thread_id = t.id), t.created_at)) AS latest_activity \
             FROM threads t \
             JOIN forums f ON f.id = t.forum_id \
             ORDER BY latest_activity DESC, t.id DESC \
             LIMIT ?"
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;

        let activity = rows
            .iter()
            .map(|row| -> Result<ThreadActivity, sqlx::Error> {
                Ok(ThreadActivity {
                    thread: thread_from_row(row)?,
                    forum_name: row.try_get("forum_name")?,
                    reply_count: row.try_get("reply_count")?,
                    last_reply_at: row.try_get("last_reply_at")?,
                    latest_activity: row.try_get("latest_activity")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activity)
    }

    async fn count_replies(&self, thread_id: ThreadId) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM replies WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_replies_page(
        &self,
        thread_id: ThreadId,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Reply>> {
        let rows = sqlx::query(
            "SELECT id, thread_id, author, content, created_at FROM replies \
             WHERE thread_id = ? ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(thread_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(reply_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_reply(&self, reply: NewReply) -> anyhow::Result<Reply> {
        let id = sqlx::query(
            "INSERT INTO replies \
                 (thread_id, author, content, created_at, content_folded, author_folded) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(reply.thread_id)
        .bind(&reply.author)
        .bind(&reply.content)
        .bind(reply.created_at)
        .bind(fold(&reply.content))
        .bind(reply.author.as_deref().map(fold))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Reply {
            id,
            thread_id: reply.thread_id,
            author: reply.author,
            content: reply.content,
            created_at: reply.created_at,
        })
    }

    async fn delete_reply(&self, thread_id: ThreadId, reply_id: ReplyId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM replies WHERE id = ? AND thread_id = ?")
            .bind(reply_id)
            .bind(thread_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_threads(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<Thread>> {
        let pattern = contains_pattern(&fold(needle));
        let sql = format!(
            r"SELECT {THREAD_COLUMNS} FROM threads t
              WHERE t.title_folded LIKE ? ESCAPE '\'
                 OR t.content_folded LIKE ? ESCAPE '\'
                 OR t.author_folded LIKE ? ESCAPE '\'
              ORDER BY t.created_at DESC, t.id DESC
              LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(thread_from_row).collect::<Result<_, _>>()?)
    }

    async fn search_replies(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<Reply>> {
        let pattern = contains_pattern(&fold(needle));
        let rows = sqlx::query(
            r"SELECT id, thread_id, author, content, created_at FROM replies
              WHERE content_folded LIKE ? ESCAPE '\'
                 OR author_folded LIKE ? ESCAPE '\'
              ORDER BY created_at DESC, id DESC
              LIMIT ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(reply_from_row).collect::<Result<_, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    async fn repo() -> SqliteForumRepo {
        SqliteForumRepo::new("sqlite::memory:").await.unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    async fn forum(repo: &SqliteForumRepo, name: &str) -> Forum {
        repo.create_forum(NewForum {
            name: name.to_string(),
            slug: Some(name.to_lowercase()),
            description: None,
        })
        .await
        .unwrap()
    }

    async fn thread(repo: &SqliteForumRepo, forum_id: ForumId, title: &str, minutes: i64) -> Thread {
        repo.create_thread(NewThread {
            forum_id,
            title: title.to_string(),
            author: None,
            content: format!("<pre>{title} body</pre>"),
            created_at: at(minutes),
        })
        .await
        .unwrap()
    }

    async fn reply(repo: &SqliteForumRepo, thread_id: ThreadId, content: &str, minutes: i64) -> Reply {
        repo.create_reply(NewReply {
            thread_id,
            author: Some("dana".to_string()),
            content: content.to_string(),
            created_at: at(minutes),
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("foo"), "%foo%");
        assert_eq!(contains_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let created = thread(&repo, general.id, "Hello", 0).await;

        let loaded = repo.get_thread(created.id).await.unwrap();
        assert_eq!(loaded, Some(created));
        assert_eq!(repo.get_thread(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_forum_lookup_by_id_and_slug() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;

        assert_eq!(repo.get_forum(general.id).await.unwrap(), Some(general.clone()));
        assert_eq!(repo.get_forum_by_slug("general").await.unwrap(), Some(general));
        assert_eq!(repo.get_forum_by_slug("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected_but_missing_slugs_are_not() {
        let repo = repo().await;
        forum(&repo, "General").await;
        let err = repo
            .create_forum(NewForum {
                name: "Again".into(),
                slug: Some("general".into()),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Conflict(_))));

        for name in ["A", "B"] {
            repo.create_forum(NewForum {
                name: name.into(),
                slug: None,
                description: None,
            })
            .await
            .unwrap();
        }
        assert_eq!(repo.list_forums().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_thread_requires_existing_forum() {
        let repo = repo().await;
        let result = repo
            .create_thread(NewThread {
                forum_id: 404,
                title: "orphan".into(),
                author: None,
                content: "<pre>x</pre>".into(),
                created_at: at(0),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_thread_listing_is_paginated_newest_first() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        for i in 0..25 {
            thread(&repo, general.id, &format!("t{i}"), i).await;
        }

        assert_eq!(repo.count_threads(general.id).await.unwrap(), 25);

        let first = repo.list_threads_page(general.id, 10, 0).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].thread.title, "t24");

        let third = repo.list_threads_page(general.id, 10, 20).await.unwrap();
        assert_eq!(third.len(), 5);
        assert_eq!(third[4].thread.title, "t0");

        let beyond = repo.list_threads_page(general.id, 10, 30).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_listing_carries_reply_counts() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let busy = thread(&repo, general.id, "busy", 0).await;
        thread(&repo, general.id, "quiet", 1).await;
        reply(&repo, busy.id, "<pre>one</pre>", 2).await;
        reply(&repo, busy.id, "<pre>two</pre>", 3).await;

        let page = repo.list_threads_page(general.id, 10, 0).await.unwrap();
        let counts: Vec<_> = page
            .iter()
            .map(|s| (s.thread.title.as_str(), s.reply_count))
            .collect();
        assert_eq!(counts, vec![("quiet", 0), ("busy", 2)]);
    }

    #[tokio::test]
    async fn test_replies_are_listed_oldest_first() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let topic = thread(&repo, general.id, "topic", 0).await;
        for i in 0..12 {
            reply(&repo, topic.id, &format!("<pre>r{i}</pre>"), 20 - i).await;
        }

        assert_eq!(repo.count_replies(topic.id).await.unwrap(), 12);
        let first = repo.list_replies_page(topic.id, 10, 0).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].content, "<pre>r11</pre>");
        let second = repo.list_replies_page(topic.id, 10, 10).await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].content, "<pre>r0</pre>");
    }

    #[tokio::test]
    async fn test_delete_thread_removes_its_replies_only() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let doomed = thread(&repo, general.id, "doomed", 0).await;
        let kept = thread(&repo, general.id, "kept", 1).await;
        reply(&repo, doomed.id, "<pre>a</pre>", 2).await;
        reply(&repo, doomed.id, "<pre>b</pre>", 3).await;
        reply(&repo, kept.id, "<pre>c</pre>", 4).await;

        assert_eq!(repo.delete_thread(doomed.id).await.unwrap(), Some(general.id));
        assert_eq!(repo.get_thread(doomed.id).await.unwrap(), None);
        assert_eq!(repo.count_replies(doomed.id).await.unwrap(), 0);
        assert_eq!(repo.count_replies(kept.id).await.unwrap(), 1);

        assert_eq!(repo.delete_thread(doomed.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_reply_requires_matching_thread() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let a = thread(&repo, general.id, "a", 0).await;
        let b = thread(&repo, general.id, "b", 1).await;
        let r = reply(&repo, a.id, "<pre>mine</pre>", 2).await;

        assert!(!repo.delete_reply(b.id, r.id).await.unwrap());
        assert_eq!(repo.count_replies(a.id).await.unwrap(), 1);

        assert!(repo.delete_reply(a.id, r.id).await.unwrap());
        assert_eq!(repo.count_replies(a.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_a_forum_cascades() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let topic = thread(&repo, general.id, "topic", 0).await;
        reply(&repo, topic.id, "<pre>r</pre>", 1).await;

        sqlx::query("DELETE FROM forums WHERE id = ?")
            .bind(general.id)
            .execute(repo.pool())
            .await
            .unwrap();

        assert_eq!(repo.get_thread(topic.id).await.unwrap(), None);
        assert_eq!(repo.count_replies(topic.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recent_activity_orders_by_latest_reply_or_creation() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let news = forum(&repo, "News").await;
        let old = thread(&repo, general.id, "old", 0).await;
        let middle = thread(&repo, news.id, "middle", 10).await;
        let newest = thread(&repo, general.id, "newest", 20).await;
        reply(&repo, old.id, "<pre>bump</pre>", 30).await;

        let feed = repo.recent_activity(40).await.unwrap();
        let order: Vec<_> = feed.iter().map(|a| a.thread.id).collect();
        assert_eq!(order, vec![old.id, newest.id, middle.id]);

        assert_eq!(feed[0].reply_count, 1);
        assert_eq!(feed[0].last_reply_at, Some(at(30)));
        assert_eq!(feed[0].latest_activity, at(30));
        assert_eq!(feed[2].forum_name, "News");
        assert_eq!(feed[2].last_reply_at, None);
        assert_eq!(feed[2].latest_activity, at(10));
    }

    #[tokio::test]
    async fn test_recent_activity_breaks_ties_by_id_and_honours_limit() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let first = thread(&repo, general.id, "first", 5).await;
        let second = thread(&repo, general.id, "second", 5).await;

        let feed = repo.recent_activity(40).await.unwrap();
        assert_eq!(feed[0].thread.id, second.id);
        assert_eq!(feed[1].thread.id, first.id);

        assert_eq!(repo.recent_activity(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_across_fields() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let foobar = thread(&repo, general.id, "Foobar", 0).await;
        let other = thread(&repo, general.id, "Unrelated", 1).await;
        reply(&repo, foobar.id, "<pre>see foo here</pre>", 2).await;
        reply(&repo, other.id, "<pre>nothing</pre>", 3).await;

        let threads = repo.search_threads("foo", 20).await.unwrap();
        assert_eq!(threads.iter().map(|t| t.id).collect::<Vec<_>>(), vec![foobar.id]);

        let replies = repo.search_replies("FOO", 20).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].thread_id, foobar.id);

        let by_author = repo.search_replies("dan", 20).await.unwrap();
        assert_eq!(by_author.len(), 2);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let privet = thread(&repo, general.id, "Привет мир", 0).await;
        let school = thread(&repo, general.id, "Other", 1).await;
        reply(&repo, school.id, "<pre>ÉCOLE Ünïcode</pre>", 2).await;

        for needle in ["Привет", "привет", "ПРИВЕТ"] {
            let hits = repo.search_threads(needle, 20).await.unwrap();
            assert_eq!(hits.iter().map(|t| t.id).collect::<Vec<_>>(), vec![privet.id], "{needle}");
        }

        let replies = repo.search_replies("école ünï", 20).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].thread_id, school.id);
        assert_eq!(replies[0].content, "<pre>ÉCOLE Ünïcode</pre>");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        thread(&repo, general.id, "100% done", 0).await;
        thread(&repo, general.id, "1000 things", 1).await;

        let hits = repo.search_threads("100%", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% done");
    }

    #[tokio::test]
    async fn test_get_threads_by_ids() {
        let repo = repo().await;
        let general = forum(&repo, "General").await;
        let a = thread(&repo, general.id, "a", 0).await;
        thread(&repo, general.id, "b", 1).await;
        let c = thread(&repo, general.id, "c", 2).await;

        assert!(repo.get_threads_by_ids(&[]).await.unwrap().is_empty());

        let mut loaded = repo.get_threads_by_ids(&[c.id, a.id, 999]).await.unwrap();
        loaded.sort_by_key(|t| t.id);
        assert_eq!(loaded, vec![a, c]);
    }
}
