//! Per-day submission counter for the contact form.
//!
//! Each client has one [`RateLimitRecord`] in a [`UsageStore`]. A record from
//! an earlier day counts as absent. The counter only moves after a message
//! was actually delivered.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Maximum successful submissions per client per day.
pub const DAILY_LIMIT: u32 = 10;

/// Store key for usage records. Server-side records are scoped per client
/// as `contact_form_usage:<client>`.
pub const USAGE_KEY: &str = "contact_form_usage";

/// Usage key for one client.
pub fn usage_key(client: &str) -> String {
    format!("{USAGE_KEY}:{client}")
}

/// Submissions made on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub count: u32,
    pub date: NaiveDate,
}

impl RateLimitRecord {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            count: 0,
            date: today,
        }
    }

    /// Submissions left today after this record.
    pub fn remaining(&self) -> u32 {
        DAILY_LIMIT.saturating_sub(self.count)
    }
}

/// Outcome of [`check_rate_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitCheck {
    /// Submission may proceed; pass the record to [`update_rate_limit`] after a successful send.
    Allowed(RateLimitRecord),
    /// Today's limit is used up.
    Blocked,
}

/// Errors persisting usage records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("usage store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("usage store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Keyed persistence for usage records.
pub trait UsageStore: Send + Sync {
    /// Stored record, or `None` if absent or unreadable.
    fn load(&self, key: &str) -> Option<RateLimitRecord>;

    fn save(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError>;
}

/// Read the client's usage for `today`.
///
/// A missing record or one from another day yields a fresh zero count,
/// which is not persisted here.
pub fn check_rate_limit(store: &dyn UsageStore, key: &str, today: NaiveDate) -> RateLimitCheck {
    match store.load(key) {
        Some(record) if record.date == today => {
            if record.count >= DAILY_LIMIT {
                RateLimitCheck::Blocked
            } else {
                RateLimitCheck::Allowed(record)
            }
        }
        _ => RateLimitCheck::Allowed(RateLimitRecord::fresh(today)),
    }
}

/// Persist one more submission on top of `usage`. Call only after a successful send.
pub fn update_rate_limit(
    store: &dyn UsageStore,
    key: &str,
    usage: RateLimitRecord,
) -> Result<RateLimitRecord, StoreError> {
    let next = RateLimitRecord {
        count: usage.count + 1,
        date: usage.date,
    };
    store.save(key, next)?;
    Ok(next)
}

/// Process-local store. Lost on restart.
#[derive(Default)]
pub struct MemoryUsageStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryUsageStore {
    fn load(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.lock().get(key).copied()
    }

    fn save(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError> {
        self.records.lock().insert(key.to_string(), record);
        Ok(())
    }
}

/// Store backed by a single JSON object file mapping key to record.
///
/// The whole map is kept in memory and rewritten on every save. Saves drop
/// records from days before the saved one, so the file holds at most one
/// record per client that submitted today. Saves do blocking file I/O; call
/// them from a blocking context.
pub struct JsonFileUsageStore {
    path: PathBuf,
    records: Mutex<HashMap<String, RateLimitRecord>>,
    /// Orders file writes. `records` is never held across I/O.
    write: Mutex<()>,
}

impl JsonFileUsageStore {
    /// Open the store, reading existing records if the file exists.
    ///
    /// An unreadable or corrupt file starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let records: HashMap<String, RateLimitRecord> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt usage file");
                HashMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read usage file");
                HashMap::new()
            }
        };

        tracing::info!(path = %path.display(), records = records.len(), "usage store opened");

        Self {
            path,
            records: Mutex::new(records),
            write: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageStore for JsonFileUsageStore {
    fn load(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.lock().get(key).copied()
    }

    fn save(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError> {
        let _write = self.write.lock();

        let json = {
            let mut records = self.records.lock();
            records.retain(|_, r| r.date >= record.date);
            records.insert(key.to_string(), record);
            serde_json::to_string_pretty(&*records)?
        };

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
