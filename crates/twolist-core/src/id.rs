//! Item identifiers
//!
//! An ID is the creation time in Unix milliseconds. IDs are handed out by an
//! [`IdClock`] so two items created within the same millisecond still get
//! distinct, increasing IDs.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Creation-ordered item identifier
///
/// Serialized transparently, so as a JSON map key it is the decimal string
/// (`"1700000000000"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// When the item was created, if the ID is a representable timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.0).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

impl std::str::FromStr for ItemId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ItemId)
            .map_err(|_| crate::Error::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic ID source
///
/// Returns the current wall-clock millisecond unless that would not be
/// greater than the last ID issued (or observed), in which case it steps by one.
/// Once `u64::MAX` has been seen there is nothing left to issue.
#[derive(Debug, Clone, Default)]
pub struct IdClock {
    last: Option<u64>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every future ID is greater than `id`
    pub fn observe(&mut self, id: ItemId) {
        self.last = Some(self.last.map_or(id.0, |last| last.max(id.0)));
    }

    pub fn next(&mut self) -> Option<ItemId> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.next_at(now)
    }

    fn next_at(&mut self, now: u64) -> Option<ItemId> {
        let id = match self.last {
            Some(last) if now <= last => last.checked_add(1)?,
            _ => now,
        };
        self.last = Some(id);
        Some(ItemId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase() {
        let mut clock = IdClock::new();
        let mut prev = clock.next().unwrap();
        for _ in 0..1000 {
            let id = clock.next().unwrap();
            assert!(id > prev);
            prev = id;
        }
    }

    #[test]
    fn test_same_millisecond_steps() {
        let mut clock = IdClock::new();
        assert_eq!(clock.next_at(500), Some(ItemId(500)));
        assert_eq!(clock.next_at(500), Some(ItemId(501)));
        assert_eq!(clock.next_at(400), Some(ItemId(502)));
        assert_eq!(clock.next_at(900), Some(ItemId(900)));
    }

    #[test]
    fn test_observe_future_id() {
        let mut clock = IdClock::new();
        let far = ItemId(u64::MAX / 2);
        clock.observe(far);
        assert!(clock.next().unwrap() > far);
    }

    #[test]
    fn test_exhausted_after_max() {
        let mut clock = IdClock::new();
        clock.observe(ItemId(u64::MAX));
        assert_eq!(clock.next(), None);
        assert_eq!(clock.next(), None);
    }

    #[test]
    fn test_parse_and_display() {
        let id: ItemId = "1700000000000".parse().unwrap();
        assert_eq!(id.as_millis(), 1_700_000_000_000);
        assert_eq!(id.to_string(), "1700000000000");
        assert!("abc".parse::<ItemId>().is_err());
    }

    #[test]
    fn test_created_at() {
        let id = ItemId::from_millis(1_700_000_000_000);
        let created = id.created_at().unwrap();
        assert_eq!(created.timestamp(), 1_700_000_000);
    }
}
