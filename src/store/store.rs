//! In-process store of processed results keyed by processing timestamp
//!
//! The map is unbounded and never evicted; every new batch submission
//! clears it first, so it only ever holds the results of the current
//! session. A single mutex serializes all operations so a clear from one
//! request cannot interleave with an insert or read from another.

use super::models::{FactDiff, ProcessedResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use tracing::debug;

/// Timestamped result store
///
/// At most one result per distinct timestamp; inserting at an existing
/// timestamp replaces the previous entry (last-write-wins).
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: Mutex<BTreeMap<DateTime<Utc>, ProcessedResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all entries; subsequent lookups see an empty store
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("result store lock poisoned");
        let dropped = entries.len();
        entries.clear();
        debug!("Result store cleared, {} entries dropped", dropped);
    }

    /// Add or overwrite the entry at `timestamp`
    pub fn insert(&self, timestamp: DateTime<Utc>, result: ProcessedResult) {
        let mut entries = self.entries.lock().expect("result store lock poisoned");
        entries.insert(timestamp, result);
        debug!("Result stored at {}, store size {}", timestamp, entries.len());
    }

    /// Entry with the maximum timestamp, or None when empty
    pub fn latest(&self) -> Option<ProcessedResult> {
        let entries = self.entries.lock().expect("result store lock poisoned");
        entries.last_key_value().map(|(_, result)| result.clone())
    }

    /// Entry whose timestamp is closest to `query` by absolute distance
    ///
    /// Considers all stored timestamps, not just earlier ones. A tie
    /// between two equidistant candidates resolves to the earlier one.
    pub fn nearest(&self, query: DateTime<Utc>) -> Option<ProcessedResult> {
        let entries = self.entries.lock().expect("result store lock poisoned");

        let mut best: Option<(&DateTime<Utc>, &ProcessedResult)> = None;
        for (ts, result) in entries.iter() {
            let delta = (*ts - query).abs();
            // Strict comparison keeps the earlier candidate on equal distance,
            // since iteration is in ascending timestamp order.
            let closer = match best {
                Some((best_ts, _)) => delta < (*best_ts - query).abs(),
                None => true,
            };
            if closer {
                best = Some((ts, result));
            }
        }

        best.map(|(_, result)| result.clone())
    }

    /// Entry with the greatest timestamp strictly before `timestamp`
    pub fn previous_before(&self, timestamp: DateTime<Utc>) -> Option<ProcessedResult> {
        let entries = self.entries.lock().expect("result store lock poisoned");
        entries
            .range(..timestamp)
            .next_back()
            .map(|(_, result)| result.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("result store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Facts present in `a` but not `b` (`added`) and in `b` but not `a`
/// (`removed`), compared as unordered sets of exact strings. Output is
/// sorted for deterministic responses.
pub fn diff_facts(a: &ProcessedResult, b: &ProcessedResult) -> FactDiff {
    let set_a: BTreeSet<&str> = a.facts.iter().map(String::as_str).collect();
    let set_b: BTreeSet<&str> = b.facts.iter().map(String::as_str).collect();

    FactDiff {
        added: set_a.difference(&set_b).map(|s| s.to_string()).collect(),
        removed: set_b.difference(&set_a).map(|s| s.to_string()).collect(),
    }
}
