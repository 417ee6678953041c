use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use mnp_replay_parser::{EventMeta, MachineDefinition, RosterAction, VenueAction};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Player id → display name.
pub type PlayerNames = BTreeMap<String, String>;
/// Archive match key (`mnp-<season>-<week>-<away>-<home>`) → venue code.
pub type MatchVenues = BTreeMap<String, String>;

const PLAYERS_CSV: &str = "players.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterAddEntry {
    pub name: Option<String>,
    pub role: Option<String>,
    pub meta: EventMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRemoveEntry {
    pub key: Option<String>,
    pub meta: EventMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineChange {
    pub mkey: Option<String>,
    pub meta: EventMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamLog {
    pub roster_adds: Vec<RosterAddEntry>,
    pub roster_removes: Vec<RosterRemoveEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueLog {
    pub machine_adds: Vec<MachineChange>,
    pub machine_removes: Vec<MachineChange>,
}

/// Team, venue and machine-catalog logs collected from non-match records.
#[derive(Debug, Clone, Default)]
pub struct LeagueRegistry {
    pub teams: BTreeMap<String, TeamLog>,
    pub venues: BTreeMap<String, VenueLog>,
    pub machines: BTreeMap<String, MachineDefinition>,
}

impl LeagueRegistry {
    pub fn record_roster(&mut self, team: String, action: RosterAction) {
        let log = self.teams.entry(team).or_default();
        match action {
            RosterAction::Add { name, role, meta } => {
                log.roster_adds.push(RosterAddEntry { name, role, meta })
            }
            RosterAction::Remove { key, meta } => {
                log.roster_removes.push(RosterRemoveEntry { key, meta })
            }
        }
    }

    pub fn record_venue(&mut self, venue: String, action: VenueAction) {
        let log = self.venues.entry(venue).or_default();
        match action {
            VenueAction::Add { mkey, meta } => log.machine_adds.push(MachineChange { mkey, meta }),
            VenueAction::Remove { mkey, meta } => {
                log.machine_removes.push(MachineChange { mkey, meta })
            }
        }
    }

    /// Later definitions of the same machine key replace earlier ones.
    pub fn record_machine(&mut self, definition: MachineDefinition) {
        self.machines.insert(definition.mkey.clone(), definition);
    }
}

/// Reads `name,key,...` rows (header skipped). Rows missing either value are ignored.
pub fn read_players_csv<R: Read>(reader: R) -> Result<PlayerNames, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut players = PlayerNames::new();
    for row in csv_reader.records() {
        let row = row?;
        let name = row.get(0).map(str::trim).unwrap_or_default();
        let key = row.get(1).map(str::trim).unwrap_or_default();
        if !name.is_empty() && !key.is_empty() {
            players.insert(key.to_string(), name.to_string());
        }
    }
    Ok(players)
}

/// Loads `players.csv` from the archive. A missing or unreadable file degrades to an empty
/// registry.
pub fn load_players(archive_dir: &Path) -> PlayerNames {
    let csv_path = archive_dir.join(PLAYERS_CSV);
    let result = std::fs::File::open(&csv_path)
        .map_err(csv::Error::from)
        .and_then(read_players_csv);

    match result {
        Ok(players) => {
            info!(path = %csv_path.display(), players = players.len(), "loaded players");
            players
        }
        Err(err) => {
            warn!(path = %csv_path.display(), error = %err, "could not read players.csv");
            PlayerNames::new()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchiveMatch {
    pub key: String,
    #[serde(default)]
    pub venue: Option<ArchiveVenue>,
    #[serde(default)]
    pub away: Option<ArchiveTeam>,
    #[serde(default)]
    pub home: Option<ArchiveTeam>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveVenue {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveTeam {
    #[serde(default)]
    pub lineup: Vec<ArchiveLineupEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveLineupEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ArchiveMatch {
    /// Records the match venue and fills in lineup names the players table lacks.
    pub fn apply(&self, venues: &mut MatchVenues, players: &mut PlayerNames) {
        if let Some(venue) = self
            .venue
            .as_ref()
            .and_then(|venue| venue.key.as_ref())
            .filter(|key| !key.is_empty())
        {
            venues.insert(self.key.clone(), venue.clone());
        }

        for side in [&self.away, &self.home].into_iter().flatten() {
            for entry in &side.lineup {
                if let (Some(key), Some(name)) = (&entry.key, &entry.name) {
                    if !key.is_empty() && !name.is_empty() && !players.contains_key(key) {
                        players.insert(key.clone(), name.clone());
                    }
                }
            }
        }
    }
}

/// Scans `season-*/matches/*.json` in the archive for match venues, backfilling player names.
pub fn load_match_venues(archive_dir: &Path, players: &mut PlayerNames) -> MatchVenues {
    let mut venues = MatchVenues::new();
    if !archive_dir.is_dir() {
        warn!(path = %archive_dir.display(), "could not read archive directory");
        return venues;
    }

    let base = glob::Pattern::escape(&archive_dir.to_string_lossy());
    let pattern = format!("{base}/season-*/matches/*.json");
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(err) => {
            warn!(%pattern, error = %err, "invalid archive glob pattern");
            return venues;
        }
    };

    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                debug!(error = %err, "skipping unreadable archive entry");
                continue;
            }
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                serde_json::from_str::<ArchiveMatch>(&raw).map_err(|err| err.to_string())
            });
        match parsed {
            Ok(archive_match) => archive_match.apply(&mut venues, players),
            Err(message) => debug!(path = %path.display(), %message, "skipping archive match"),
        }
    }

    info!(match_venues = venues.len(), "loaded archive match venues");
    venues
}
