use crate::config::PhaseOffsets;
use crate::confirmation::{latest_epoch, LineupConfirmations};
use crate::rounds::Round;

/// `end - start` when strictly positive.
pub fn positive_interval(end: i64, start: i64) -> Option<i64> {
    end.checked_sub(start).filter(|interval| *interval > 0)
}

/// Fills in picking, responding and game durations. Score confirmations must already be bound,
/// since they anchor the picking phase of the following round.
pub fn infer_durations(rounds: &mut [Round], lineup: &LineupConfirmations, offsets: &PhaseOffsets) {
    // Anchors come from the unmodified confirmations of the previous round.
    let anchors: Vec<Option<i64>> = (0..rounds.len())
        .map(|index| match index {
            0 => lineup.latest(),
            _ => {
                let previous = &rounds[index - 1];
                latest_epoch(previous.confirm_left.as_ref(), previous.confirm_right.as_ref())
            }
        })
        .collect();

    for (round, anchor) in rounds.iter_mut().zip(anchors) {
        let picking_epoch = round.picking.as_ref().map(|phase| phase.at.epoch);
        let responding_epoch = round.responding.as_ref().map(|phase| phase.at.epoch);

        if let (Some(picking), Some(anchor)) = (round.picking.as_mut(), anchor) {
            picking.duration_ms = positive_interval(
                picking.at.epoch,
                anchor.saturating_add(offsets.picking_start_ms),
            );
        }

        if let (Some(responding), Some(picked_at)) = (round.responding.as_mut(), picking_epoch) {
            responding.duration_ms = positive_interval(
                responding.at.epoch,
                picked_at.saturating_add(offsets.responding_start_ms),
            );
        }

        for machine in &mut round.machines {
            machine.duration_ms = match (&machine.report, responding_epoch) {
                (Some(report), Some(responded_at)) => positive_interval(
                    report.reported.epoch,
                    responded_at.saturating_add(offsets.game_start_ms),
                ),
                _ => None,
            };
        }
    }
}
