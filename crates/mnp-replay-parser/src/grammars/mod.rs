mod game_report;
mod machine_catalog;
mod match_action;
mod roster;
mod venue;

pub use game_report::GameReportGrammar;
pub use machine_catalog::MachineCatalogGrammar;
pub use match_action::MatchActionGrammar;
pub use roster::RosterGrammar;
pub use venue::VenueGrammar;

use crate::errors::ClassifyError;

pub(crate) fn mismatch(grammar: &'static str, path: &str) -> ClassifyError {
    ClassifyError::PathMismatch {
        grammar,
        path: path.to_string(),
    }
}
