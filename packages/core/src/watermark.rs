//! Watermark gating.
//!
//! The watermark is the `added_at` of the newest item already reported.
//! Only items strictly newer than it are reported, and it only ever moves
//! forward, so an item is never announced twice.

use chrono::{DateTime, Duration, Utc};

use crate::services::tautulli::RecentlyAddedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    at: DateTime<Utc>,
}

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// The saved watermark, or `now - lookback` on a first run.
    pub fn resolve(saved: Option<DateTime<Utc>>, now: DateTime<Utc>, lookback: Duration) -> Self {
        Self::new(saved.unwrap_or(now - lookback))
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// `true` when something added at `added_at` has not been reported yet.
    pub fn admits(&self, added_at: DateTime<Utc>) -> bool {
        added_at > self.at
    }

    /// Items with an unreadable timestamp are never admitted.
    pub fn admits_item(&self, item: &RecentlyAddedItem) -> bool {
        item.added_at_utc().map_or(false, |added_at| self.admits(added_at))
    }

    /// Move forward to `added_at`; earlier values are ignored.
    pub fn advance(&mut self, added_at: DateTime<Utc>) {
        if added_at > self.at {
            self.at = added_at;
        }
    }

    /// Items newer than the watermark, in input order.
    pub fn filter_new<'a>(&self, items: &'a [RecentlyAddedItem]) -> Vec<&'a RecentlyAddedItem> {
        items.iter().filter(|item| self.admits_item(item)).collect()
    }
}
