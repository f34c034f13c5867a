//! Day ledger: the idempotent time-in / time-out contract.
//!
//! One entry per (identity, class, UTC date). The first accepted event of
//! the day records time-in, the next records time-out, and anything after
//! that is a no-op. This in-memory implementation is a reference for the
//! contract; deployments back it with their own store.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What a posted event did to the day's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerStatus {
    TimeIn,
    TimeOut,
    AlreadyComplete,
}

/// One identity's record for one class on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub time_in: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_out: Option<DateTime<Utc>>,
}

/// Flat, serializable form of one ledger entry, for export to callers that
/// persist the ledger themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub identity_id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub time_in: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<DateTime<Utc>>,
}

type Key = (String, String, NaiveDate);

#[derive(Debug, Default)]
pub struct DayLedger {
    entries: Mutex<HashMap<Key, DayEntry>>,
}

impl DayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post an accepted attendance event. Idempotent per day: time-in, then
    /// time-out, then no-op.
    pub fn post(&self, identity_id: &str, class_id: &str, now: DateTime<Utc>) -> LedgerStatus {
        let key = (identity_id.to_string(), class_id.to_string(), now.date_naive());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(&key) {
            None => {
                entries.insert(
                    key,
                    DayEntry {
                        time_in: now,
                        time_out: None,
                    },
                );
                LedgerStatus::TimeIn
            }
            Some(entry) => {
                if entry.time_out.is_none() {
                    entry.time_out = Some(now);
                    LedgerStatus::TimeOut
                } else {
                    LedgerStatus::AlreadyComplete
                }
            }
        }
    }

    /// Rebuild a ledger from previously exported records. A record whose
    /// date disagrees with its time-in is keyed by the recorded date.
    pub fn from_records(records: Vec<LedgerRecord>) -> Self {
        let mut entries = HashMap::new();
        for r in records {
            entries.insert(
                (r.identity_id, r.class_id, r.date),
                DayEntry {
                    time_in: r.time_in,
                    time_out: r.time_out,
                },
            );
        }
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Export all entries, sorted by (date, identity, class) for stable output.
    pub fn to_records(&self) -> Vec<LedgerRecord> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<LedgerRecord> = entries
            .iter()
            .map(|((identity_id, class_id, date), entry)| LedgerRecord {
                identity_id: identity_id.clone(),
                class_id: class_id.clone(),
                date: *date,
                time_in: entry.time_in,
                time_out: entry.time_out,
            })
            .collect();
        records.sort_by(|a, b| {
            (a.date, &a.identity_id, &a.class_id).cmp(&(b.date, &b.identity_id, &b.class_id))
        });
        records
    }

    /// Look up the entry for one identity/class/date, if any.
    pub fn entry(&self, identity_id: &str, class_id: &str, date: NaiveDate) -> Option<DayEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(identity_id.to_string(), class_id.to_string(), date))
            .cloned()
    }
}
