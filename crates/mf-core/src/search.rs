//! Merging of thread and reply search matches.
//!
//! The store returns two independent match lists. Replies are grouped under
//! their owning thread and every thread that matched, directly or through a
//! reply, becomes one result entry.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Reply, Thread, ThreadId};

/// Maximum threads and maximum replies fetched per search.
pub const SEARCH_LIMIT: i64 = 20;

/// Trims the raw query; blank queries are not searched at all.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// A merged entry whose thread row may not have been loaded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialHit {
    pub thread_id: ThreadId,
    pub thread: Option<Thread>,
    pub matches_in_thread: bool,
    pub reply_matches: Vec<Reply>,
}

/// A complete search result entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub thread: Thread,
    /// True when the thread itself matched, not only its replies.
    pub matches_in_thread: bool,
    pub reply_matches: Vec<Reply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Groups replies by thread and merges them with the direct thread matches.
///
/// Direct matches keep their store order; threads reached only through
/// replies follow in order of their first matching reply.
pub fn merge(threads: Vec<Thread>, replies: Vec<Reply>) -> Vec<PartialHit> {
    let mut reply_order: Vec<ThreadId> = Vec::new();
    let mut by_thread: HashMap<ThreadId, Vec<Reply>> = HashMap::new();
    for reply in replies {
        let group = by_thread.entry(reply.thread_id).or_insert_with(|| {
            reply_order.push(reply.thread_id);
            Vec::new()
        });
        group.push(reply);
    }

    let mut hits: Vec<PartialHit> = Vec::with_capacity(threads.len() + reply_order.len());
    for thread in threads {
        let reply_matches = by_thread.remove(&thread.id).unwrap_or_default();
        hits.push(PartialHit {
            thread_id: thread.id,
            thread: Some(thread),
            matches_in_thread: true,
            reply_matches,
        });
    }

    for thread_id in reply_order {
        if let Some(reply_matches) = by_thread.remove(&thread_id) {
            hits.push(PartialHit {
                thread_id,
                thread: None,
                matches_in_thread: false,
                reply_matches,
            });
        }
    }

    hits
}

/// Thread ids whose rows still need to be loaded.
pub fn missing_thread_ids(hits: &[PartialHit]) -> Vec<ThreadId> {
    hits.iter()
        .filter(|hit| hit.thread.is_none())
        .map(|hit| hit.thread_id)
        .collect()
}

/// Fills in loaded thread rows. Entries whose thread no longer exists are dropped.
pub fn hydrate(hits: Vec<PartialHit>, loaded: Vec<Thread>) -> Vec<SearchHit> {
    let mut loaded: HashMap<ThreadId, Thread> =
        loaded.into_iter().map(|thread| (thread.id, thread)).collect();

    hits.into_iter()
        .filter_map(|hit| {
            let thread = hit.thread.or_else(|| loaded.remove(&hit.thread_id))?;
            Some(SearchHit {
                thread,
                matches_in_thread: hit.matches_in_thread,
                reply_matches: hit.reply_matches,
            })
        })
        .collect()
}
