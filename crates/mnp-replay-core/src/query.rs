//! Read-only queries over a built [`ReplayOutput`], as served by the HTTP API.

use std::collections::BTreeSet;

use mnp_replay_parser::parse_leading_int;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outputs::{MatchOutput, ReplayOutput, SeasonOutput, WeekLabel, WeekOutput};
use crate::registries::PlayerNames;

/// Length of the id suffix shown for players missing from the registry.
const UNKNOWN_PLAYER_SUFFIX: usize = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("season and week are required numeric parameters")]
    MissingParameters,
    #[error("Season {0} not found")]
    SeasonNotFound(i64),
    #[error("Week {week} not found in season {season}")]
    WeekNotFound { season: i64, week: i64 },
}

/// Options for the season/week/venue pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub seasons: Vec<i64>,
    pub weeks: Vec<WeekLabel>,
    pub venues: Vec<String>,
}

/// Parses a query-string number leniently (`"23"`, `" 23abc"`). Empty or non-numeric is `None`.
pub fn parse_query_number(value: Option<&str>) -> Option<i64> {
    value.and_then(parse_leading_int)
}

fn find_season(output: &ReplayOutput, season: i64) -> Option<&SeasonOutput> {
    output.seasons.iter().find(|s| s.season == season)
}

fn find_week(season: &SeasonOutput, week: i64) -> Option<&WeekOutput> {
    season.weeks.iter().find(|w| w.week.matches_query(week))
}

/// Seasons are always listed; weeks only for an existing season; venues only for an existing
/// numeric week of that season.
pub fn filters(output: &ReplayOutput, season: Option<i64>, week: Option<i64>) -> Filters {
    let mut seasons: Vec<i64> = output.seasons.iter().map(|s| s.season).collect();
    seasons.sort_unstable();

    let mut filters = Filters {
        seasons,
        ..Filters::default()
    };

    let Some(season) = season.and_then(|number| find_season(output, number)) else {
        return filters;
    };
    filters.weeks = season.weeks.iter().map(|w| w.week.clone()).collect();

    if let Some(week) = week.and_then(|number| find_week(season, number)) {
        let venues: BTreeSet<&String> = week
            .matches
            .iter()
            .filter_map(|m| m.venue.as_ref())
            .filter(|venue| !venue.is_empty())
            .collect();
        filters.venues = venues.into_iter().cloned().collect();
    }
    filters
}

/// Matches of one week, optionally limited to a venue, with player names resolved.
pub fn matches_for(
    output: &ReplayOutput,
    season: Option<i64>,
    week: Option<i64>,
    venue: Option<&str>,
) -> Result<Vec<MatchOutput>, QueryError> {
    let (Some(season_number), Some(week_number)) = (season, week) else {
        return Err(QueryError::MissingParameters);
    };
    let season = find_season(output, season_number)
        .ok_or(QueryError::SeasonNotFound(season_number))?;
    let week = find_week(season, week_number).ok_or(QueryError::WeekNotFound {
        season: season_number,
        week: week_number,
    })?;

    let venue = venue.filter(|venue| !venue.is_empty());
    let mut matches: Vec<MatchOutput> = week
        .matches
        .iter()
        .filter(|m| venue.is_none() || m.venue.as_deref() == venue)
        .cloned()
        .collect();
    resolve_player_names(&mut matches, &output.players);
    Ok(matches)
}

/// Registered name for `id`, otherwise the last characters of the id.
pub fn display_name(id: &str, players: &PlayerNames) -> String {
    if let Some(name) = players.get(id) {
        return name.clone();
    }
    let skip = id.chars().count().saturating_sub(UNKNOWN_PLAYER_SUFFIX);
    id.chars().skip(skip).collect()
}

pub fn resolve_player_names(matches: &mut [MatchOutput], players: &PlayerNames) {
    let seats = matches
        .iter_mut()
        .flat_map(|m| m.rounds.iter_mut())
        .flat_map(|round| round.machines.iter_mut())
        .flat_map(|machine| machine.players.iter_mut());
    for seat in seats {
        seat.name = Some(display_name(&seat.id, players));
    }
}
