use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ClassifyError;
use crate::extract::{
    body_round, body_text, extract_assignments, extract_machines, player_count_for_round,
};
use crate::model::{
    Classified, ClassifierRules, Event, EventKind, MatchKey, Picking, Record, Responding, Side,
};
use crate::registry::PathGrammar;

use super::mismatch;

static MATCH_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^/matches/mnp-(\d+)-(\w+)-([A-Z]+)-([A-Z]+)/(picks|confirm|ready|players/add|players/remove|venue/add|venue/remove)$",
    )
    .expect("valid match path regex")
});

/// Text a captain submits on the confirm form to accept the opposing lineup.
pub const CONFIRM_OPPONENT: &str = "CONFIRM OPPONENT";

const PICKING_STATE: &str = "picking";

/// `/matches/mnp-<season>-<week>-<AWAY>-<HOME>/<operation>`
pub struct MatchActionGrammar;

impl Default for MatchActionGrammar {
    fn default() -> Self {
        Self
    }
}

impl MatchActionGrammar {
    const NAME: &'static str = "match_action";

    fn extract(operation: &str, record: &Record) -> Option<EventKind> {
        let body = &record.body;
        match operation {
            "picks" => {
                let round = body_round(body, "round")?;
                let player_count = player_count_for_round(round);
                if body_text(body, "state").as_deref() == Some(PICKING_STATE) {
                    Some(EventKind::Picking(Picking {
                        round,
                        player_count,
                        machines: extract_machines(body),
                    }))
                } else {
                    Some(EventKind::Responding(Responding {
                        round,
                        player_count,
                        assignments: extract_assignments(body),
                    }))
                }
            }
            "confirm" => Self::extract_confirm(record),
            "ready" => Some(EventKind::Ready {
                team: body_text(body, "team"),
            }),
            "players/add" => Some(EventKind::RosterAdd {
                team: body_text(body, "team"),
                name: body_text(body, "name"),
            }),
            "players/remove" => Some(EventKind::RosterRemove {
                key: body_text(body, "key"),
            }),
            "venue/add" => Some(EventKind::VenueAdd {
                mkey: body_text(body, "mkey"),
            }),
            "venue/remove" => Some(EventKind::VenueRemove {
                mkey: body_text(body, "mkey"),
            }),
            _ => None,
        }
    }

    /// Lineup confirmations carry the sentinel text; anything else non-blank on a side is a
    /// score confirmation. Left is checked before right for both.
    fn extract_confirm(record: &Record) -> Option<EventKind> {
        let left = body_text(&record.body, "left");
        let right = body_text(&record.body, "right");
        let is_sentinel = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|text| text.trim() == CONFIRM_OPPONENT)
        };

        if is_sentinel(&left) {
            Some(EventKind::ConfirmOpponent(Side::Left))
        } else if is_sentinel(&right) {
            Some(EventKind::ConfirmOpponent(Side::Right))
        } else if left.is_some() {
            Some(EventKind::ConfirmScore(Side::Left))
        } else if right.is_some() {
            Some(EventKind::ConfirmScore(Side::Right))
        } else {
            None
        }
    }
}

impl PathGrammar for MatchActionGrammar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn classify(
        &self,
        record: &Record,
        rules: &ClassifierRules,
    ) -> Result<Classified, ClassifyError> {
        let caps = MATCH_PATH_RE
            .captures(&record.path)
            .ok_or_else(|| mismatch(Self::NAME, &record.path))?;
        let (season, week) = (&caps[1], &caps[2]);
        if rules.excludes(season, week) {
            return Err(ClassifyError::Scrimmage {
                grammar: Self::NAME,
                season: season.to_string(),
                week: week.to_string(),
            });
        }

        let key = MatchKey::new(season, week, &caps[3], &caps[4]);
        let event = Self::extract(&caps[5], record).map(|kind| Event::new(kind, record.meta()));
        Ok(Classified::Match { key, event })
    }
}
