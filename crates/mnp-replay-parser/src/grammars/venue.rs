use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ClassifyError;
use crate::extract::body_text;
use crate::model::{Classified, ClassifierRules, Record, VenueAction};
use crate::registry::PathGrammar;

use super::mismatch;

static VENUE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/venues/([A-Z0-9]+)/(add|remove)$").expect("valid venue path regex")
});

/// `/venues/<CODE>/add|remove`: machines installed at or pulled from a venue.
pub struct VenueGrammar;

impl Default for VenueGrammar {
    fn default() -> Self {
        Self
    }
}

impl VenueGrammar {
    const NAME: &'static str = "venue";
}

impl PathGrammar for VenueGrammar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn classify(
        &self,
        record: &Record,
        _rules: &ClassifierRules,
    ) -> Result<Classified, ClassifyError> {
        let caps = VENUE_PATH_RE
            .captures(&record.path)
            .ok_or_else(|| mismatch(Self::NAME, &record.path))?;

        let mkey = body_text(&record.body, "mkey");
        let action = if &caps[2] == "add" {
            VenueAction::Add {
                mkey,
                meta: record.meta(),
            }
        } else {
            VenueAction::Remove {
                mkey,
                meta: record.meta(),
            }
        };

        Ok(Classified::Venue {
            venue: caps[1].to_string(),
            action,
        })
    }
}
