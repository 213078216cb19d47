//! # History Cache
//!
//! Simulated day-by-day attendance for the trend chart and calendar. Only
//! entry 0 (today) reflects a real mark; earlier days are randomized once and
//! then kept as-is. Not a historical record.
//!
//! All records live in one persisted map under [`HISTORY_KEY`], bounded by a
//! capacity (least recently used is evicted first) and a TTL after which a
//! record is regenerated.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::AttendanceStatus;
use std::collections::HashMap;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::storage::{LocalStore, LocalStoreExt, StorageError};

pub const HISTORY_KEY: &str = "attendance_history";

/// Chance that a generated past day is absent
pub const PAST_ABSENCE_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPolicy {
    pub days: usize,
    pub capacity: usize,
    pub ttl: Duration,
}

impl From<&DashboardConfig> for HistoryPolicy {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            days: config.history_days,
            capacity: config.history_capacity,
            ttl: config.history_ttl,
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedHistory {
    generated_at: DateTime<Utc>,
    last_used: u64,
    /// Newest first; entry 0 is the day the record was generated
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HistoryState {
    records: HashMap<String, CachedHistory>,
    /// Monotonic use counter for LRU ordering
    clock: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryCache {
    policy: HistoryPolicy,
    state: HistoryState,
}

impl HistoryCache {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            policy,
            state: HistoryState::default(),
        }
    }

    /// Restore the persisted map, starting empty when none is stored
    pub fn load(store: &dyn LocalStore, policy: HistoryPolicy) -> Self {
        Self {
            policy,
            state: store.get_or(HISTORY_KEY, HistoryState::default()),
        }
    }

    pub fn save(&self, store: &mut dyn LocalStore) -> Result<(), StorageError> {
        store.set(HISTORY_KEY, &self.state)
    }

    pub fn len(&self) -> usize {
        self.state.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.records.is_empty()
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.state.records.contains_key(student_id)
    }

    pub fn clear(&mut self) {
        self.state = HistoryState::default();
    }

    /// History for `student_id`, newest first.
    ///
    /// A cached record younger than the TTL is returned unchanged. Otherwise a
    /// new window is generated with `live_status` as today's entry.
    pub fn ensure<R: Rng>(
        &mut self,
        student_id: &str,
        live_status: AttendanceStatus,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<HistoryEntry> {
        self.state.clock += 1;
        let tick = self.state.clock;
        let ttl = self.policy.ttl;

        if let Some(record) = self.state.records.get_mut(student_id) {
            if now - record.generated_at < ttl {
                debug!("History cache hit for {}", student_id);
                record.last_used = tick;
                return record.entries.clone();
            }
            debug!("History for {} expired, regenerating", student_id);
        }

        let entries = generate(self.policy.days, live_status, now.date_naive(), rng);
        self.state.records.insert(
            student_id.to_string(),
            CachedHistory {
                generated_at: now,
                last_used: tick,
                entries: entries.clone(),
            },
        );
        self.evict_over_capacity();
        entries
    }

    /// Overwrite today's entry after a mark. Earlier entries are left untouched.
    pub fn record_mark<R: Rng>(
        &mut self,
        student_id: &str,
        status: AttendanceStatus,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<HistoryEntry> {
        self.ensure(student_id, status, now, rng);
        match self.state.records.get_mut(student_id) {
            Some(record) => {
                if let Some(today) = record.entries.first_mut() {
                    today.status = status;
                }
                record.entries.clone()
            }
            None => Vec::new(),
        }
    }

    fn evict_over_capacity(&mut self) {
        while self.state.records.len() > self.policy.capacity {
            let oldest = self
                .state
                .records
                .iter()
                .min_by_key(|(_, record)| record.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!("Evicting history for {}", id);
                    self.state.records.remove(&id);
                }
                None => break,
            }
        }
    }
}

fn generate<R: Rng>(
    days: usize,
    today_status: AttendanceStatus,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<HistoryEntry> {
    (0..days)
        .map(|offset| {
            let status = if offset == 0 {
                today_status
            } else if rng.gen_bool(PAST_ABSENCE_PROBABILITY) {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            HistoryEntry {
                date: today - Duration::days(offset as i64),
                status,
            }
        })
        .collect()
}
