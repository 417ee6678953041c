use crate::errors::{ClassifyError, GrammarAttempt};
use crate::grammars::{
    GameReportGrammar, MachineCatalogGrammar, MatchActionGrammar, RosterGrammar, VenueGrammar,
};
use crate::model::{Classified, ClassifierRules, Record};

pub trait PathGrammar {
    fn name(&self) -> &'static str;
    fn classify(&self, record: &Record, rules: &ClassifierRules)
        -> Result<Classified, ClassifyError>;
}

/// Classifies a record against every known path grammar, in a fixed order.
pub fn classify_record(record: &Record, rules: &ClassifierRules) -> Result<Classified, ClassifyError> {
    let match_action = MatchActionGrammar;
    let game_report = GameReportGrammar;
    let roster = RosterGrammar;
    let venue = VenueGrammar;
    let machine_catalog = MachineCatalogGrammar;
    let grammars: [&dyn PathGrammar; 5] =
        [&match_action, &game_report, &roster, &venue, &machine_catalog];
    classify_with_grammars(record, rules, &grammars)
}

pub fn classify_with_grammars(
    record: &Record,
    rules: &ClassifierRules,
    grammars: &[&dyn PathGrammar],
) -> Result<Classified, ClassifyError> {
    let mut attempts = Vec::new();

    for grammar in grammars {
        match grammar.classify(record, rules) {
            Ok(classified) => return Ok(classified),
            Err(ClassifyError::PathMismatch { path, .. }) => {
                attempts.push(GrammarAttempt::new(grammar.name(), path));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ClassifyError::NoMatchingGrammar {
        path: record.path.clone(),
        attempts,
    })
}
