use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MatchKey;

/// One grammar that looked at a record path and declined it.
#[derive(Debug, Clone)]
pub struct GrammarAttempt {
    pub grammar: &'static str,
    pub message: String,
}

impl GrammarAttempt {
    pub fn new(grammar: &'static str, message: impl Into<String>) -> Self {
        Self {
            grammar,
            message: message.into(),
        }
    }
}

impl fmt::Display for GrammarAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.grammar, self.message)
    }
}

/// Why a record was dropped instead of contributing to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    Noise,
    ParseError,
    Scrimmage,
    EmptyReport,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Noise => "noise",
            SkipReason::ParseError => "parse_error",
            SkipReason::Scrimmage => "scrimmage",
            SkipReason::EmptyReport => "empty_report",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{grammar} path mismatch: {path}")]
    PathMismatch { grammar: &'static str, path: String },

    #[error("{grammar} record for season {season} week {week} is not competitive play")]
    Scrimmage {
        grammar: &'static str,
        season: String,
        week: String,
    },

    #[error("{grammar} report at {path} carried no scores")]
    EmptyReport {
        grammar: &'static str,
        key: MatchKey,
        path: String,
    },

    #[error("no grammar recognized path {path}; attempts: {attempts:?}")]
    NoMatchingGrammar {
        path: String,
        attempts: Vec<GrammarAttempt>,
    },
}

impl ClassifyError {
    /// Maps a classification failure onto the skip counter it belongs to.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            ClassifyError::PathMismatch { .. } | ClassifyError::NoMatchingGrammar { .. } => {
                SkipReason::Noise
            }
            ClassifyError::Scrimmage { .. } => SkipReason::Scrimmage,
            ClassifyError::EmptyReport { .. } => SkipReason::EmptyReport,
        }
    }

    /// The match a skipped record still names. An empty report registers its match
    /// even though it contributes no event.
    pub fn match_key(&self) -> Option<&MatchKey> {
        match self {
            ClassifyError::EmptyReport { key, .. } => Some(key),
            _ => None,
        }
    }
}
