use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono_tz::Tz;
use mnp_replay_parser::{parse_leading_int, EventKind, EventMeta, MachineDefinition, SkipReason};
use serde::{Deserialize, Serialize};

use crate::pipeline::ReconstructedMatch;
use crate::registries::{LeagueRegistry, MachineChange, PlayerNames, TeamLog, VenueLog};
use crate::rounds::{MachineResult, Phase, Round, Stamp};
use crate::time::format_local;

/// The complete build artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutput {
    pub seasons: Vec<SeasonOutput>,
    pub players: PlayerNames,
    pub teams: BTreeMap<String, TeamOutput>,
    pub venues: BTreeMap<String, VenueOutput>,
    pub machines: BTreeMap<String, MachineDefinitionOutput>,
    pub skipped: SkipCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BuildMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonOutput {
    pub season: i64,
    pub weeks: Vec<WeekOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekOutput {
    pub week: WeekLabel,
    pub matches: Vec<MatchOutput>,
}

/// Numeric weeks serialize as numbers, anything else (`"P1"`) as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeekLabel {
    Number(i64),
    Label(String),
}

impl WeekLabel {
    /// Whether this label names the same week as a query value such as `"3"`.
    pub fn matches_query(&self, week: i64) -> bool {
        matches!(self, WeekLabel::Number(n) if *n == week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutput {
    pub matchup: String,
    pub away: String,
    pub home: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_left: Option<TimestampOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_right: Option<TimestampOutput>,
    pub rounds: Vec<RoundOutput>,
    pub events: Vec<ResidualEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampOutput {
    pub epoch: i64,
    pub local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl TimestampOutput {
    pub fn new(stamp: &Stamp, tz: Tz) -> Self {
        Self {
            epoch: stamp.epoch,
            local: format_local(stamp.epoch, tz),
            uid: stamp.uid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutput {
    pub epoch: i64,
    pub local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl PhaseOutput {
    pub fn new(phase: &Phase, tz: Tz) -> Self {
        Self {
            epoch: phase.at.epoch,
            local: format_local(phase.at.epoch, tz),
            uid: phase.at.uid.clone(),
            duration: phase.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutput {
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picking: Option<PhaseOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responding: Option<PhaseOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_left: Option<TimestampOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_right: Option<TimestampOutput>,
    pub machines: Vec<MachineOutput>,
}

impl RoundOutput {
    pub fn new(round: &Round, tz: Tz) -> Self {
        Self {
            round: round.number,
            picking: round.picking.as_ref().map(|phase| PhaseOutput::new(phase, tz)),
            responding: round.responding.as_ref().map(|phase| PhaseOutput::new(phase, tz)),
            confirm_left: round.confirm_left.as_ref().map(|s| TimestampOutput::new(s, tz)),
            confirm_right: round.confirm_right.as_ref().map(|s| TimestampOutput::new(s, tz)),
            machines: round
                .machines
                .iter()
                .map(|machine| MachineOutput::new(machine, tz))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedOutput {
    pub epoch: i64,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutput {
    pub post: String,
    pub epoch: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineOutput {
    pub machine: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<ReportedOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<UpdateOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub players: Vec<SeatOutput>,
}

impl MachineOutput {
    pub fn new(machine: &MachineResult, tz: Tz) -> Self {
        let report = machine.report.as_ref();
        Self {
            machine: machine.machine,
            name: machine.name.clone(),
            reported: report.map(|report| ReportedOutput {
                epoch: report.reported.epoch,
                local: format_local(report.reported.epoch, tz),
            }),
            post: report.map(|report| report.source_file.clone()),
            uid: report.and_then(|report| report.reported.uid.clone()),
            photo_id: report.and_then(|report| report.photo_id.clone()),
            updates: report
                .map(|report| {
                    report
                        .updates
                        .iter()
                        .map(|update| UpdateOutput {
                            post: update.source_file.clone(),
                            epoch: update.epoch,
                            uid: update.uid.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            duration: machine.duration_ms,
            players: machine
                .seats
                .iter()
                .map(|seat| SeatOutput {
                    player: seat.position,
                    id: seat.player_id.clone(),
                    score: seat.score.clone(),
                    name: None,
                })
                .collect(),
        }
    }
}

/// One seat of a machine. `name` is only filled in when serving queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatOutput {
    pub player: u8,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaOutput {
    pub path: String,
    pub when: i64,
    pub when_local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ukey: Option<String>,
    pub source_file: String,
}

impl MetaOutput {
    pub fn new(meta: &EventMeta, tz: Tz) -> Self {
        Self {
            path: meta.path.clone(),
            when: meta.when,
            when_local: format_local(meta.when, tz),
            user_id: meta.user_id.clone(),
            ukey: meta.ukey.clone(),
            source_file: meta.source_file.clone(),
        }
    }
}

/// A match event that is not folded into a round or confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResidualEvent {
    Ready {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team: Option<String>,
        #[serde(flatten)]
        meta: MetaOutput,
    },
    PlayerAdd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(flatten)]
        meta: MetaOutput,
    },
    PlayerRemove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(flatten)]
        meta: MetaOutput,
    },
    VenueAdd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mkey: Option<String>,
        #[serde(flatten)]
        meta: MetaOutput,
    },
    VenueRemove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mkey: Option<String>,
        #[serde(flatten)]
        meta: MetaOutput,
    },
}

impl ResidualEvent {
    /// `None` for events already represented by rounds or confirmations.
    pub fn from_kind(kind: &EventKind, meta: &EventMeta, tz: Tz) -> Option<Self> {
        let meta = MetaOutput::new(meta, tz);
        let event = match kind {
            EventKind::Ready { team } => ResidualEvent::Ready {
                team: team.clone(),
                meta,
            },
            EventKind::RosterAdd { team, name } => ResidualEvent::PlayerAdd {
                team: team.clone(),
                name: name.clone(),
                meta,
            },
            EventKind::RosterRemove { key } => ResidualEvent::PlayerRemove {
                key: key.clone(),
                meta,
            },
            EventKind::VenueAdd { mkey } => ResidualEvent::VenueAdd {
                mkey: mkey.clone(),
                meta,
            },
            EventKind::VenueRemove { mkey } => ResidualEvent::VenueRemove {
                mkey: mkey.clone(),
                meta,
            },
            EventKind::Picking(_)
            | EventKind::Responding(_)
            | EventKind::Report(_)
            | EventKind::ConfirmOpponent(_)
            | EventKind::ConfirmScore(_) => return None,
        };
        Some(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterAddOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub meta: MetaOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRemoveOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub meta: MetaOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOutput {
    pub roster_adds: Vec<RosterAddOutput>,
    pub roster_removes: Vec<RosterRemoveOutput>,
}

impl TeamOutput {
    pub fn new(log: &TeamLog, tz: Tz) -> Self {
        Self {
            roster_adds: log
                .roster_adds
                .iter()
                .map(|entry| RosterAddOutput {
                    name: entry.name.clone(),
                    role: entry.role.clone(),
                    meta: MetaOutput::new(&entry.meta, tz),
                })
                .collect(),
            roster_removes: log
                .roster_removes
                .iter()
                .map(|entry| RosterRemoveOutput {
                    key: entry.key.clone(),
                    meta: MetaOutput::new(&entry.meta, tz),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineChangeOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkey: Option<String>,
    #[serde(flatten)]
    pub meta: MetaOutput,
}

impl MachineChangeOutput {
    fn new(change: &MachineChange, tz: Tz) -> Self {
        Self {
            mkey: change.mkey.clone(),
            meta: MetaOutput::new(&change.meta, tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueOutput {
    pub machine_adds: Vec<MachineChangeOutput>,
    pub machine_removes: Vec<MachineChangeOutput>,
}

impl VenueOutput {
    pub fn new(log: &VenueLog, tz: Tz) -> Self {
        Self {
            machine_adds: log
                .machine_adds
                .iter()
                .map(|change| MachineChangeOutput::new(change, tz))
                .collect(),
            machine_removes: log
                .machine_removes
                .iter()
                .map(|change| MachineChangeOutput::new(change, tz))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinitionOutput {
    pub name: String,
    #[serde(flatten)]
    pub meta: MetaOutput,
}

impl MachineDefinitionOutput {
    pub fn new(definition: &MachineDefinition, tz: Tz) -> Self {
        Self {
            name: definition.name.clone(),
            meta: MetaOutput::new(&definition.meta, tz),
        }
    }
}

/// Records dropped during classification, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub noise: usize,
    pub parse_errors: usize,
    pub scrimmages: usize,
    pub empty_reports: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Noise => self.noise += 1,
            SkipReason::ParseError => self.parse_errors += 1,
            SkipReason::Scrimmage => self.scrimmages += 1,
            SkipReason::EmptyReport => self.empty_reports += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.noise + self.parse_errors + self.scrimmages + self.empty_reports
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    pub version: String,
    pub build_date: String,
    pub tool_version: String,
    pub options: BuildOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub output: String,
    pub mnp_data_archive: String,
    pub posts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

/// Orders season and week labels numerically; labels that do not start with a number sort
/// after all numeric ones, lexically.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (parse_leading_int(a), parse_leading_int(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn week_label(week: &str) -> WeekLabel {
    match parse_leading_int(week) {
        Some(number) => WeekLabel::Number(number),
        None => WeekLabel::Label(week.to_string()),
    }
}

impl MatchOutput {
    pub fn new(reconstructed: &ReconstructedMatch, venue: Option<String>, tz: Tz) -> Self {
        let key = &reconstructed.key;
        Self {
            matchup: key.matchup(),
            away: key.away.clone(),
            home: key.home.clone(),
            venue,
            confirm_left: reconstructed
                .lineup
                .left
                .as_ref()
                .map(|stamp| TimestampOutput::new(stamp, tz)),
            confirm_right: reconstructed
                .lineup
                .right
                .as_ref()
                .map(|stamp| TimestampOutput::new(stamp, tz)),
            rounds: reconstructed
                .rounds
                .iter()
                .map(|round| RoundOutput::new(round, tz))
                .collect(),
            events: reconstructed
                .residual
                .iter()
                .filter_map(|event| ResidualEvent::from_kind(&event.kind, &event.meta, tz))
                .collect(),
        }
    }
}

/// Groups match outputs into seasons and weeks, ordered by [`compare_labels`], with the
/// matches of each week ordered by matchup.
pub fn assemble_seasons<I>(matches: I) -> Vec<SeasonOutput>
where
    I: IntoIterator<Item = (String, String, MatchOutput)>,
{
    let mut tree: BTreeMap<String, BTreeMap<String, Vec<MatchOutput>>> = BTreeMap::new();
    for (season, week, output) in matches {
        tree.entry(season)
            .or_default()
            .entry(week)
            .or_default()
            .push(output);
    }

    let mut seasons: Vec<(String, BTreeMap<String, Vec<MatchOutput>>)> = tree.into_iter().collect();
    seasons.sort_by(|(a, _), (b, _)| compare_labels(a, b));

    seasons
        .into_iter()
        .map(|(season, weeks)| {
            let mut weeks: Vec<(String, Vec<MatchOutput>)> = weeks.into_iter().collect();
            weeks.sort_by(|(a, _), (b, _)| compare_labels(a, b));
            SeasonOutput {
                season: parse_leading_int(&season).unwrap_or_default(),
                weeks: weeks
                    .into_iter()
                    .map(|(week, mut matches)| {
                        matches.sort_by(|a, b| a.matchup.cmp(&b.matchup));
                        WeekOutput {
                            week: week_label(&week),
                            matches,
                        }
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Converts the side-channel registries into their output form.
pub fn registry_outputs(
    registry: &LeagueRegistry,
    tz: Tz,
) -> (
    BTreeMap<String, TeamOutput>,
    BTreeMap<String, VenueOutput>,
    BTreeMap<String, MachineDefinitionOutput>,
) {
    let teams = registry
        .teams
        .iter()
        .map(|(code, log)| (code.clone(), TeamOutput::new(log, tz)))
        .collect();
    let venues = registry
        .venues
        .iter()
        .map(|(code, log)| (code.clone(), VenueOutput::new(log, tz)))
        .collect();
    let machines = registry
        .machines
        .iter()
        .map(|(mkey, definition)| (mkey.clone(), MachineDefinitionOutput::new(definition, tz)))
        .collect();
    (teams, venues, machines)
}
