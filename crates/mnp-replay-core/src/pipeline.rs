use std::path::Path;

use mnp_replay_parser::{classify_record, Classified, Event, EventKind, MatchKey, SkipReason};
use tracing::{debug, info};

use crate::aggregate::{MatchBook, MatchLog};
use crate::config::{PhaseOffsets, PipelineConfig};
use crate::confirmation::{bind_score_confirmations, lineup_confirmations, LineupConfirmations};
use crate::durations::infer_durations;
use crate::error::Result;
use crate::ingestion::{load_posts, IngestionBatch};
use crate::outputs::{assemble_seasons, registry_outputs, MatchOutput, ReplayOutput, SkipCounts};
use crate::registries::{
    load_match_venues, load_players, LeagueRegistry, MatchVenues, PlayerNames,
};
use crate::rounds::{build_rounds, Round};
use crate::summary::RunSummary;

/// Lookups built from the data archive before any match is reconstructed.
#[derive(Debug, Clone, Default)]
pub struct SideChannels {
    pub players: PlayerNames,
    pub match_venues: MatchVenues,
}

/// Loads the players table and the archive match venues. Never fails; missing inputs yield
/// empty lookups.
pub fn load_side_channels(archive_dir: &Path) -> SideChannels {
    let mut players = load_players(archive_dir);
    let match_venues = load_match_venues(archive_dir, &mut players);
    SideChannels {
        players,
        match_venues,
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub output: ReplayOutput,
    pub summary: RunSummary,
}

/// Runs the whole batch: load posts and side channels, classify, reconstruct every match.
///
/// Only an unreadable posts directory is an error.
pub fn run(config: &PipelineConfig) -> Result<PipelineRun> {
    let batch = load_posts(&config.posts_dir)?;
    let side = load_side_channels(&config.archive_dir);
    Ok(reconstruct(batch, side, config))
}

/// A match after round merging, confirmation binding and duration inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedMatch {
    pub key: MatchKey,
    pub lineup: LineupConfirmations,
    pub rounds: Vec<Round>,
    /// Ready, roster and venue events in timeline order.
    pub residual: Vec<Event>,
}

pub fn reconstruct_match(log: MatchLog, offsets: &PhaseOffsets) -> ReconstructedMatch {
    let lineup = lineup_confirmations(&log.events);
    let mut rounds = build_rounds(&log.events);
    bind_score_confirmations(&mut rounds, &log.events);
    infer_durations(&mut rounds, &lineup, offsets);

    let residual = log
        .events
        .into_iter()
        .filter(|event| {
            matches!(
                event.kind,
                EventKind::Ready { .. }
                    | EventKind::RosterAdd { .. }
                    | EventKind::RosterRemove { .. }
                    | EventKind::VenueAdd { .. }
                    | EventKind::VenueRemove { .. }
            )
        })
        .collect();

    ReconstructedMatch {
        key: log.key,
        lineup,
        rounds,
        residual,
    }
}

/// Classifies every loaded record and builds the output document.
pub fn reconstruct(batch: IngestionBatch, side: SideChannels, config: &PipelineConfig) -> PipelineRun {
    let total_files = batch.total_files();
    let mut skipped = SkipCounts::default();
    for _ in &batch.failures {
        skipped.record(SkipReason::ParseError);
    }

    let mut processed = 0usize;
    let mut book = MatchBook::new();
    let mut registry = LeagueRegistry::default();

    for record in &batch.records {
        match classify_record(record, &config.rules) {
            Ok(Classified::Match { key, event }) => book.record(key, event),
            Ok(Classified::Roster { team, action }) => registry.record_roster(team, action),
            Ok(Classified::Venue { venue, action }) => registry.record_venue(venue, action),
            Ok(Classified::MachineCatalog(definition)) => {
                if let Some(definition) = definition {
                    registry.record_machine(definition);
                }
            }
            Err(err) => {
                if let Some(key) = err.match_key() {
                    book.entry(key.clone());
                }
                let reason = err.skip_reason();
                debug!(
                    file = %record.source_file,
                    path = %record.path,
                    %reason,
                    error = %err,
                    "skipped record"
                );
                skipped.record(reason);
                continue;
            }
        }
        processed += 1;
    }

    let tz = config.timezone;
    let match_count = book.len();
    let matches = book.into_matches().into_iter().map(|log| {
        let venue = side.match_venues.get(&log.key.archive_key()).cloned();
        let reconstructed = reconstruct_match(log, &config.offsets);
        let output = MatchOutput::new(&reconstructed, venue, tz);
        let MatchKey { season, week, .. } = reconstructed.key;
        (season, week, output)
    });
    let seasons = assemble_seasons(matches);
    let (teams, venues, machines) = registry_outputs(&registry, tz);

    let summary = RunSummary {
        total_files,
        processed,
        skipped,
        matches: match_count,
        players: side.players.len(),
        machines: machines.len(),
        match_venues: side.match_venues.len(),
    };
    info!(
        total_files,
        processed,
        skipped = skipped.total(),
        matches = match_count,
        "reconstructed timeline"
    );

    PipelineRun {
        output: ReplayOutput {
            seasons,
            players: side.players,
            teams,
            venues,
            machines,
            skipped,
            metadata: None,
        },
        summary,
    }
}
