use mnp_replay_parser::{Event, EventKind, Side};

use crate::rounds::{Round, Stamp};

/// The first lineup confirmation (CONFIRM OPPONENT) observed for each side of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineupConfirmations {
    pub left: Option<Stamp>,
    pub right: Option<Stamp>,
}

impl LineupConfirmations {
    /// The later of the two confirmations, using whichever sides are present.
    pub fn latest(&self) -> Option<i64> {
        latest_epoch(self.left.as_ref(), self.right.as_ref())
    }
}

pub(crate) fn latest_epoch(left: Option<&Stamp>, right: Option<&Stamp>) -> Option<i64> {
    left.into_iter().chain(right).map(|stamp| stamp.epoch).max()
}

fn slot<T>(left: T, right: T, side: Side) -> (T, T) {
    match side {
        Side::Left => (left, right),
        Side::Right => (right, left),
    }
}

/// Collects lineup confirmations; only the first per side is kept.
pub fn lineup_confirmations(events: &[Event]) -> LineupConfirmations {
    let mut confirmations = LineupConfirmations::default();
    for event in events {
        if let EventKind::ConfirmOpponent(side) = &event.kind {
            let (target, _) = slot(
                &mut confirmations.left,
                &mut confirmations.right,
                *side,
            );
            if target.is_none() {
                *target = Some(Stamp::from(&event.meta));
            }
        }
    }
    confirmations
}

/// Index of the round a score confirmation at `when` belongs to: the latest round whose picking
/// was submitted at or before `when`, otherwise the first round. `None` when there are no rounds.
///
/// The first-round fallback can misattribute confirmations from out-of-order archives.
pub fn bind_round_index(rounds: &[Round], when: i64) -> Option<usize> {
    if rounds.is_empty() {
        return None;
    }
    let bound = rounds.iter().rposition(|round| {
        round
            .picking
            .as_ref()
            .is_some_and(|picking| picking.at.epoch <= when)
    });
    Some(bound.unwrap_or(0))
}

/// Attaches each score confirmation to its round. A round keeps the first confirmation per side.
pub fn bind_score_confirmations(rounds: &mut [Round], events: &[Event]) {
    for event in events {
        let EventKind::ConfirmScore(side) = &event.kind else {
            continue;
        };
        let Some(index) = bind_round_index(rounds, event.when()) else {
            continue;
        };
        let round = &mut rounds[index];
        let (target, _) = slot(&mut round.confirm_left, &mut round.confirm_right, *side);
        if target.is_none() {
            *target = Some(Stamp::from(&event.meta));
        }
    }
}
