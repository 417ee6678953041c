pub mod errors;
pub mod extract;
pub mod grammars;
pub mod model;
mod registry;

pub use errors::{ClassifyError, GrammarAttempt, SkipReason};
pub use extract::{
    extract_assignments, extract_machines, extract_scores, parse_leading_int,
    player_count_for_round,
};
pub use model::{
    Classified, ClassifierRules, Event, EventKind, EventMeta, GameAssignment, MachineDefinition,
    MachinePick, MatchKey, Picking, Record, Report, Responding, RosterAction, Seat, Side,
    VenueAction,
};
pub use registry::{classify_record, classify_with_grammars, PathGrammar};
