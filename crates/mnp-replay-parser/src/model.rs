use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::extract::scalar_text;

/// One captured HTTP mutation from the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub path: String,
    pub body: Map<String, Value>,
    pub when: i64,
    pub user_id: Option<String>,
    pub ukey: Option<String>,
    pub source_file: String,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    path: String,
    #[serde(default)]
    body: Option<Value>,
    when: Number,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    ukey: Option<Value>,
}

impl Record {
    /// Parses one archive file. A body that is missing or not an object is treated as empty.
    pub fn from_json(source_file: impl Into<String>, content: &str) -> Result<Self, serde_json::Error> {
        let raw: RawRecord = serde_json::from_str(content)?;
        let when = match raw.when.as_i64() {
            Some(ms) => ms,
            None => raw.when.as_f64().map(|ms| ms as i64).unwrap_or_default(),
        };
        let body = match raw.body {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(Self {
            path: raw.path,
            body,
            when,
            user_id: raw.user_id.as_ref().and_then(scalar_text),
            ukey: raw.ukey.as_ref().and_then(scalar_text),
            source_file: source_file.into(),
        })
    }

    pub fn meta(&self) -> EventMeta {
        EventMeta {
            path: self.path.clone(),
            when: self.when,
            user_id: self.user_id.clone(),
            ukey: self.ukey.clone(),
            source_file: self.source_file.clone(),
        }
    }
}

/// Metadata shared by every value derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    pub path: String,
    pub when: i64,
    pub user_id: Option<String>,
    pub ukey: Option<String>,
    pub source_file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one scheduled match. Away/home come from their position in the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub season: String,
    pub week: String,
    pub away: String,
    pub home: String,
}

impl MatchKey {
    pub fn new(
        season: impl Into<String>,
        week: impl Into<String>,
        away: impl Into<String>,
        home: impl Into<String>,
    ) -> Self {
        Self {
            season: season.into(),
            week: week.into(),
            away: away.into(),
            home: home.into(),
        }
    }

    pub fn matchup(&self) -> String {
        format!("{}-{}", self.away, self.home)
    }

    /// Key used by the season archive for the same match.
    pub fn archive_key(&self) -> String {
        format!("mnp-{}-{}-{}-{}", self.season, self.week, self.away, self.home)
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.archive_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub position: u8,
    pub player_id: String,
}

impl Seat {
    pub fn new(position: u8, player_id: impl Into<String>) -> Self {
        Self {
            position,
            player_id: player_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachinePick {
    pub machine: u32,
    pub name: String,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameAssignment {
    pub machine: u32,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picking {
    pub round: u32,
    pub player_count: Option<u8>,
    pub machines: Vec<MachinePick>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responding {
    pub round: u32,
    pub player_count: Option<u8>,
    pub assignments: Vec<GameAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub round: u32,
    pub game: u32,
    pub player_count: Option<u8>,
    /// Raw score text keyed by seat number.
    pub scores: BTreeMap<u8, String>,
    pub photo_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Picking(Picking),
    Responding(Responding),
    Report(Report),
    ConfirmOpponent(Side),
    ConfirmScore(Side),
    Ready { team: Option<String> },
    RosterAdd { team: Option<String>, name: Option<String> },
    RosterRemove { key: Option<String> },
    VenueAdd { mkey: Option<String> },
    VenueRemove { mkey: Option<String> },
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Picking(_) => "picking",
            EventKind::Responding(_) => "responding",
            EventKind::Report(_) => "report",
            EventKind::ConfirmOpponent(_) => "confirmOpponent",
            EventKind::ConfirmScore(_) => "confirm",
            EventKind::Ready { .. } => "ready",
            EventKind::RosterAdd { .. } => "playerAdd",
            EventKind::RosterRemove { .. } => "playerRemove",
            EventKind::VenueAdd { .. } => "venueAdd",
            EventKind::VenueRemove { .. } => "venueRemove",
        }
    }
}

/// A normalized action derived from exactly one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub meta: EventMeta,
}

impl Event {
    pub fn new(kind: EventKind, meta: EventMeta) -> Self {
        Self { kind, meta }
    }

    pub fn when(&self) -> i64 {
        self.meta.when
    }

    pub fn round(&self) -> Option<u32> {
        match &self.kind {
            EventKind::Picking(picking) => Some(picking.round),
            EventKind::Responding(responding) => Some(responding.round),
            EventKind::Report(report) => Some(report.round),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterAction {
    Add {
        name: Option<String>,
        role: Option<String>,
        meta: EventMeta,
    },
    Remove {
        key: Option<String>,
        meta: EventMeta,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueAction {
    Add { mkey: Option<String>, meta: EventMeta },
    Remove { mkey: Option<String>, meta: EventMeta },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineDefinition {
    pub mkey: String,
    pub name: String,
    pub meta: EventMeta,
}

/// What a recognized record contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A match or game record. `event` is absent when the record was recognized but carried
    /// nothing actionable (for example a picks post without a round).
    Match { key: MatchKey, event: Option<Event> },
    Roster { team: String, action: RosterAction },
    Venue { venue: String, action: VenueAction },
    MachineCatalog(Option<MachineDefinition>),
}

/// Which match/game records are excluded from competitive play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    pub scrimmage_week: String,
    pub ignored_seasons: BTreeSet<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            scrimmage_week: "S".to_string(),
            ignored_seasons: BTreeSet::from(["13".to_string()]),
        }
    }
}

impl ClassifierRules {
    pub fn excludes(&self, season: &str, week: &str) -> bool {
        week == self.scrimmage_week || self.ignored_seasons.contains(season)
    }
}
