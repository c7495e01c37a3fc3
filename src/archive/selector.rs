//! Snapshot selection
//!
//! Turns a time-ordered index listing into the minimal ordered set of
//! captures that reconstructs a page's content history across a window.

use crate::archive::index::IndexEntry;
use crate::archive::time_window::TimeWindow;
use chrono::{DateTime, Utc};

/// An index entry chosen for fetching, with its parsed capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSnapshot {
    pub entry: IndexEntry,
    pub instant: DateTime<Utc>,
}

impl SelectedSnapshot {
    pub fn digest(&self) -> &str {
        &self.entry.digest
    }
}

/// Selects the snapshots worth fetching inside `window`
///
/// # Selection Rules
///
/// 1. Entries with an unparsable timestamp, a status field that is not
///    three characters, or a redirect status (`3xx`) are dropped
/// 2. Until something is emitted, the latest entry at or before
///    `window.start` is held as the anchor; it is emitted as soon as an
///    entry after `window.start` shows up, or at the end of the listing
/// 3. From then on, entries before the start are skipped, the scan stops at
///    the first entry after `window.end`, and an entry is emitted only when
///    its digest differs from the last emitted one
/// 4. An entry whose capture time is not later than the last emitted one is
///    skipped, so the first of several same-second captures wins
///
/// The listing is expected in ascending capture order. An out-of-order
/// listing is logged and stably re-sorted before scanning.
///
/// # Arguments
///
/// * `entries` - Index rows in ascending time order
/// * `window` - The inclusive window of interest
///
/// # Returns
///
/// The selected snapshots in ascending time order
pub fn select_snapshots(entries: &[IndexEntry], window: &TimeWindow) -> Vec<SelectedSnapshot> {
    let mut candidates: Vec<SelectedSnapshot> = entries
        .iter()
        .filter(|entry| is_archived_content(&entry.status_code))
        .filter_map(|entry| {
            entry.instant().map(|instant| SelectedSnapshot {
                entry: entry.clone(),
                instant,
            })
        })
        .collect();

    if !candidates.windows(2).all(|w| w[0].instant <= w[1].instant) {
        tracing::warn!(
            "Index listing for {} is not time ordered, re-sorting {} entries",
            candidates
                .first()
                .map(|c| c.entry.original_url.as_str())
                .unwrap_or("<unknown>"),
            candidates.len()
        );
        candidates.sort_by_key(|c| c.instant);
    }

    let start = window.start();
    let end = window.end();

    let mut selected: Vec<SelectedSnapshot> = Vec::new();
    let mut anchor: Option<SelectedSnapshot> = None;
    let mut last_digest: Option<String> = None;

    for candidate in candidates {
        if selected.is_empty() {
            if candidate.instant > start {
                if let Some(initial) = anchor.take() {
                    last_digest = Some(initial.entry.digest.clone());
                    selected.push(initial);
                }
            } else {
                anchor = Some(candidate.clone());
            }
        }

        if candidate.instant < start {
            continue;
        }

        if candidate.instant > end {
            break;
        }

        if selected
            .last()
            .is_some_and(|last| candidate.instant <= last.instant)
        {
            tracing::trace!(
                "Skipping second capture at {} for {}",
                candidate.entry.timestamp,
                candidate.entry.original_url
            );
            continue;
        }

        if last_digest.as_deref() == Some(candidate.digest()) {
            continue;
        }

        last_digest = Some(candidate.entry.digest.clone());
        selected.push(candidate);
    }

    // Listing ended before the window opened: the last capture is the state at start
    if selected.is_empty() {
        if let Some(initial) = anchor {
            selected.push(initial);
        }
    }

    selected
}

/// Status filter: exactly three characters and not a redirect
fn is_archived_content(status_code: &str) -> bool {
    status_code.chars().count() == 3 && !status_code.starts_with('3')
}
