use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ClassifyError;
use crate::extract::{body_text, extract_scores, player_count_for_round};
use crate::model::{Classified, ClassifierRules, Event, EventKind, MatchKey, Record, Report};
use crate::registry::PathGrammar;

use super::mismatch;

static GAME_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/games/mnp-(\d+)-(\w+)-([A-Z]+)-([A-Z]+)\.(\d+)\.(\d+)/report$")
        .expect("valid game path regex")
});

/// `/games/mnp-<season>-<week>-<AWAY>-<HOME>.<round>.<game>/report`
pub struct GameReportGrammar;

impl Default for GameReportGrammar {
    fn default() -> Self {
        Self
    }
}

impl GameReportGrammar {
    const NAME: &'static str = "game_report";
}

impl PathGrammar for GameReportGrammar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn classify(
        &self,
        record: &Record,
        rules: &ClassifierRules,
    ) -> Result<Classified, ClassifyError> {
        let caps = GAME_PATH_RE
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

        let (Ok(round), Ok(game)) = (caps[5].parse::<u32>(), caps[6].parse::<u32>()) else {
            return Err(mismatch(Self::NAME, &record.path));
        };

        let key = MatchKey::new(season, week, &caps[3], &caps[4]);
        if round == 0 {
            return Ok(Classified::Match { key, event: None });
        }

        let scores = extract_scores(&record.body);
        if scores.is_empty() {
            return Err(ClassifyError::EmptyReport {
                grammar: Self::NAME,
                key,
                path: record.path.clone(),
            });
        }

        let report = Report {
            round,
            game,
            player_count: player_count_for_round(round),
            scores,
            photo_id: body_text(&record.body, "photo_data"),
        };

        Ok(Classified::Match {
            key,
            event: Some(Event::new(EventKind::Report(report), record.meta())),
        })
    }
}
