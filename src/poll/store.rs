//! Poll storage
//!
//! `PollBoard` owns the two maps behind the bot: live polls keyed by the
//! message that displays them, and pending drafts created for inline
//! queries, keyed by a generated result id until the platform reports
//! which result was chosen.
//!
//! Neither map grows without bound: drafts that are never chosen expire
//! after [`PENDING_TTL_MS`], and the live map is capped at
//! [`MAX_LIVE_POLLS`] entries with least-recently-touched eviction.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::model::Poll;

/// How long an unchosen inline draft is kept, in milliseconds.
pub const PENDING_TTL_MS: i64 = 60 * 60 * 1000;

/// Upper bound on live polls; the least recently touched entry is evicted
/// beyond this.
pub const MAX_LIVE_POLLS: usize = 4096;

#[derive(Debug, Clone)]
struct LiveEntry {
    poll: Poll,
    touched_at: i64,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    poll: Poll,
    created_at: i64,
}

/// Owned store for live polls and pending inline drafts.
///
/// The board is only mutated from the single event-processing loop;
/// ingestion tasks never touch it.
#[derive(Debug, Default)]
pub struct PollBoard {
    live: RwLock<HashMap<String, LiveEntry>>,
    pending: RwLock<HashMap<String, PendingEntry>>,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl PollBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a copy of the live poll stored under `key`, refreshing its
    /// eviction clock.
    pub fn get(&self, key: &str) -> Option<Poll> {
        let mut live = self.live.write();
        let entry = live.get_mut(key)?;
        entry.touched_at = now_ms();
        Some(entry.poll.clone())
    }

    /// Store (or replace) the live poll under `key`.
    pub fn put(&self, key: impl Into<String>, poll: Poll) {
        let mut live = self.live.write();
        live.insert(
            key.into(),
            LiveEntry {
                poll,
                touched_at: now_ms(),
            },
        );
        Self::evict_excess(&mut live);
    }

    fn evict_excess(live: &mut HashMap<String, LiveEntry>) {
        while live.len() > MAX_LIVE_POLLS {
            let oldest = live
                .iter()
                .min_by_key(|(_, e)| e.touched_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    live.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Number of live polls currently stored.
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.read().is_empty()
    }

    /// Park a draft poll for an inline query and return its generated
    /// result id (32 alphanumeric characters). Expired drafts are pruned
    /// on the way in.
    pub fn add_pending(&self, poll: Poll) -> String {
        let now = now_ms();
        let id = Uuid::new_v4().simple().to_string();
        let mut pending = self.pending.write();
        pending.retain(|_, entry| now - entry.created_at < PENDING_TTL_MS);
        pending.insert(
            id.clone(),
            PendingEntry {
                poll,
                created_at: now,
            },
        );
        id
    }

    /// Consume the draft stored under `result_id`, if any. A draft can be
    /// taken at most once.
    pub fn take_pending(&self, result_id: &str) -> Option<Poll> {
        self.pending.write().remove(result_id).map(|e| e.poll)
    }

    /// Number of drafts currently parked.
    pub fn pending_len(&self) -> usize {
        self.pending.read().len()
    }

    /// Copy the live map out for a snapshot.
    pub fn export(&self) -> HashMap<String, Poll> {
        self.live
            .read()
            .iter()
            .map(|(k, e)| (k.clone(), e.poll.clone()))
            .collect()
    }

    /// Replace the live map with snapshot contents. Pending drafts are
    /// ephemeral and not restored.
    pub fn import(&self, polls: HashMap<String, Poll>) {
        let now = now_ms();
        let mut live = self.live.write();
        live.clear();
        for (key, poll) in polls {
            live.insert(
                key,
                LiveEntry {
                    poll,
                    touched_at: now,
                },
            );
        }
        Self::evict_excess(&mut live);
    }
}
