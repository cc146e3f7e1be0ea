//! Staleness-bounded status cache
//!
//! A single logical entry holding the most recent [`Status`] with an expiry,
//! plus an in-flight marker so that at most one fetch runs at a time.
//! Readers that find the entry in flight wait and re-read instead of
//! starting a second fetch. Expired entries are evicted on read, so a
//! `get()` after the TTL reports `Missing` rather than the stale value.
//!
//! Error results follow the immediate-clear policy: a failed fetch returns
//! the entry to `Missing` so the next read triggers a fresh fetch instead
//! of serving a cached error.

use std::time::Duration;

use parking_lot::Mutex;
use roomba_core::{AccessoryError, Status};
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Another fetch already holds the in-flight slot
#[derive(Debug, Error)]
#[error("status fetch already in flight")]
pub struct AlreadyInFlight;

/// Non-blocking cache read result
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    /// A status within its TTL
    Fresh(Status),
    /// A fetch is currently executing; wait and re-read
    InFlight,
    /// No usable entry; a fetch is needed
    Missing,
}

enum Entry {
    Missing,
    InFlight,
    Fresh { status: Status, expires_at: Instant },
}

/// Cached robot status shared between the read path and the refresh paths
pub struct StatusCache {
    entry: Mutex<Entry>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            entry: Mutex::new(Entry::Missing),
        }
    }

    /// Non-blocking read; evicts an expired entry on the way
    pub fn get(&self) -> CacheRead {
        let mut entry = self.entry.lock();
        match &*entry {
            Entry::Missing => CacheRead::Missing,
            Entry::InFlight => CacheRead::InFlight,
            Entry::Fresh { status, expires_at } => {
                if *expires_at <= Instant::now() {
                    *entry = Entry::Missing;
                    CacheRead::Missing
                } else {
                    CacheRead::Fresh(status.clone())
                }
            }
        }
    }

    /// Atomically claim the in-flight slot.
    ///
    /// Fails when a fetch is already executing; the caller must wait for
    /// it rather than starting a second one.
    pub fn begin_fetch(&self) -> Result<(), AlreadyInFlight> {
        let mut entry = self.entry.lock();
        if matches!(*entry, Entry::InFlight) {
            return Err(AlreadyInFlight);
        }
        *entry = Entry::InFlight;
        Ok(())
    }

    /// Replace the entry wholesale with a fresh status
    pub fn set(&self, status: Status, ttl: Duration) {
        let mut entry = self.entry.lock();
        *entry = Entry::Fresh {
            status,
            expires_at: Instant::now() + ttl,
        };
    }

    /// Record a failed fetch: clear the entry so the next read refetches
    pub fn set_error(&self, error: &AccessoryError) {
        debug!(%error, "Clearing status cache after failed fetch");
        let mut entry = self.entry.lock();
        *entry = Entry::Missing;
    }

    /// Drop the entry immediately (issued before commands so staleness
    /// cannot mask their effect)
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock();
        *entry = Entry::Missing;
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}
