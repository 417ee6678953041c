use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ClassifyError;
use crate::extract::body_text;
use crate::model::{Classified, ClassifierRules, Record, RosterAction};
use crate::registry::PathGrammar;

use super::mismatch;

static TEAM_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/teams/([A-Z0-9]+)/roster/(add|remove)$").expect("valid team path regex")
});

/// `/teams/<CODE>/roster/add|remove`
pub struct RosterGrammar;

impl Default for RosterGrammar {
    fn default() -> Self {
        Self
    }
}

impl RosterGrammar {
    const NAME: &'static str = "roster";
}

impl PathGrammar for RosterGrammar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn classify(
        &self,
        record: &Record,
        _rules: &ClassifierRules,
    ) -> Result<Classified, ClassifyError> {
        let caps = TEAM_PATH_RE
            .captures(&record.path)
            .ok_or_else(|| mismatch(Self::NAME, &record.path))?;

        let action = if &caps[2] == "add" {
            RosterAction::Add {
                name: body_text(&record.body, "name"),
                role: body_text(&record.body, "role"),
                meta: record.meta(),
            }
        } else {
            RosterAction::Remove {
                key: body_text(&record.body, "key"),
                meta: record.meta(),
            }
        };

        Ok(Classified::Roster {
            team: caps[1].to_string(),
            action,
        })
    }
}
