use std::collections::BTreeMap;

use mnp_replay_parser::{Event, MatchKey};

/// Every event observed for one match, in archive encounter order until
/// [`MatchBook::into_matches`] sorts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLog {
    pub key: MatchKey,
    pub events: Vec<Event>,
}

impl MatchLog {
    fn new(key: MatchKey) -> Self {
        Self {
            key,
            events: Vec::new(),
        }
    }
}

/// Match logs keyed by [`MatchKey`]. A match is created on first reference and never replaced.
#[derive(Debug, Default)]
pub struct MatchBook {
    matches: BTreeMap<MatchKey, MatchLog>,
}

impl MatchBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the log for `key`, inserting an empty one on first reference.
    pub fn entry(&mut self, key: MatchKey) -> &mut MatchLog {
        self.matches
            .entry(key)
            .or_insert_with_key(|key| MatchLog::new(key.clone()))
    }

    /// Registers the match and appends the event if there is one.
    pub fn record(&mut self, key: MatchKey, event: Option<Event>) {
        let log = self.entry(key);
        if let Some(event) = event {
            log.events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns the matches in key order with each event list sorted by timestamp.
    /// Equal timestamps keep encounter order.
    pub fn into_matches(self) -> Vec<MatchLog> {
        self.matches
            .into_values()
            .map(|mut log| {
                log.events.sort_by_key(Event::when);
                log
            })
            .collect()
    }
}
