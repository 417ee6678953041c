use std::collections::{BTreeMap, BTreeSet};

use mnp_replay_parser::{
    Event, EventKind, EventMeta, GameAssignment, MachinePick, Picking, Report, Responding, Seat,
};

/// A point in the timeline and who caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub epoch: i64,
    pub uid: Option<String>,
}

impl Stamp {
    pub fn new(epoch: i64, uid: Option<String>) -> Self {
        Self { epoch, uid }
    }
}

impl From<&EventMeta> for Stamp {
    fn from(meta: &EventMeta) -> Self {
        Self::new(meta.when, meta.ukey.clone())
    }
}

/// A round phase (picking or responding): when it was submitted and, once inferred, how long
/// it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub at: Stamp,
    pub duration_ms: Option<i64>,
}

impl Phase {
    fn starting(at: Stamp) -> Self {
        Self {
            at,
            duration_ms: None,
        }
    }
}

/// A later report for the same round and game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUpdate {
    pub source_file: String,
    pub epoch: i64,
    pub uid: Option<String>,
}

/// The canonical report for a round and game: the first one received, with the scores of every
/// later report overlaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedReport {
    pub round: u32,
    pub game: u32,
    pub reported: Stamp,
    pub source_file: String,
    pub scores: BTreeMap<u8, String>,
    pub photo_id: Option<String>,
    pub updates: Vec<ReportUpdate>,
}

impl MergedReport {
    fn new(report: &Report, meta: &EventMeta) -> Self {
        Self {
            round: report.round,
            game: report.game,
            reported: Stamp::from(meta),
            source_file: meta.source_file.clone(),
            scores: report.scores.clone(),
            photo_id: report.photo_id.clone(),
            updates: Vec::new(),
        }
    }

    /// Logs the update and overlays its scores. Seats the update does not mention are kept.
    pub fn absorb(&mut self, report: &Report, meta: &EventMeta) {
        self.updates.push(ReportUpdate {
            source_file: meta.source_file.clone(),
            epoch: meta.when,
            uid: meta.ukey.clone(),
        });
        self.scores
            .extend(report.scores.iter().map(|(seat, score)| (*seat, score.clone())));
        if report.photo_id.is_some() {
            self.photo_id = report.photo_id.clone();
        }
    }

    /// The score for a seat, when one was reported and is non-empty.
    pub fn score_for(&self, position: u8) -> Option<&str> {
        self.scores
            .get(&position)
            .map(String::as_str)
            .filter(|score| !score.is_empty())
    }
}

/// Folds `update` into `base`: new seats are added, differing ids are overwritten, and seats
/// absent from the update are left alone.
pub fn merge_seats(base: &mut Vec<Seat>, update: &[Seat]) {
    for seat in update {
        match base.iter_mut().find(|s| s.position == seat.position) {
            Some(existing) => {
                if existing.player_id != seat.player_id {
                    existing.player_id = seat.player_id.clone();
                }
            }
            None => base.push(seat.clone()),
        }
    }
}

/// Folds a later picking submission into the merge base, per machine number.
pub fn merge_picks(base: &mut Vec<MachinePick>, update: &[MachinePick]) {
    for machine in update {
        match base.iter_mut().find(|m| m.machine == machine.machine) {
            Some(existing) => {
                if existing.name != machine.name {
                    existing.name = machine.name.clone();
                }
                merge_seats(&mut existing.seats, &machine.seats);
            }
            None => base.push(machine.clone()),
        }
    }
}

/// Folds a later responding submission into the merge base, per game number.
pub fn merge_assignments(base: &mut Vec<GameAssignment>, update: &[GameAssignment]) {
    for assignment in update {
        match base.iter_mut().find(|a| a.machine == assignment.machine) {
            Some(existing) => merge_seats(&mut existing.seats, &assignment.seats),
            None => base.push(assignment.clone()),
        }
    }
}

/// Merged picking for one round; the timestamp is that of the first submission.
#[derive(Debug, Clone)]
struct MergedPicking {
    at: Stamp,
    machines: Vec<MachinePick>,
}

impl MergedPicking {
    fn fold(events: &[(&Picking, &EventMeta)]) -> Option<Self> {
        let ((first, meta), rest) = events.split_first()?;
        let mut merged = Self {
            at: Stamp::from(*meta),
            machines: first.machines.clone(),
        };
        for (update, _) in rest {
            merge_picks(&mut merged.machines, &update.machines);
        }
        Some(merged)
    }
}

#[derive(Debug, Clone)]
struct MergedResponding {
    at: Stamp,
    assignments: Vec<GameAssignment>,
}

impl MergedResponding {
    fn fold(events: &[(&Responding, &EventMeta)]) -> Option<Self> {
        let ((first, meta), rest) = events.split_first()?;
        let mut merged = Self {
            at: Stamp::from(*meta),
            assignments: first.assignments.clone(),
        };
        for (update, _) in rest {
            merge_assignments(&mut merged.assignments, &update.assignments);
        }
        Some(merged)
    }

    fn seats_for(&self, machine: u32) -> &[Seat] {
        self.assignments
            .iter()
            .find(|a| a.machine == machine)
            .map(|a| a.seats.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatResult {
    pub position: u8,
    pub player_id: String,
    pub score: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineResult {
    pub machine: u32,
    pub name: String,
    pub seats: Vec<SeatResult>,
    pub report: Option<MergedReport>,
    pub duration_ms: Option<i64>,
}

/// Accumulated state of one round of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub number: u32,
    pub picking: Option<Phase>,
    pub responding: Option<Phase>,
    pub machines: Vec<MachineResult>,
    pub confirm_left: Option<Stamp>,
    pub confirm_right: Option<Stamp>,
}

#[derive(Default)]
struct RoundInputs<'a> {
    picking: Vec<(&'a Picking, &'a EventMeta)>,
    responding: Vec<(&'a Responding, &'a EventMeta)>,
}

/// Builds the rounds of a match from its events, which must already be in timeline order.
///
/// A round exists for every round number referenced by a picking, responding or report event.
/// Durations and score confirmations are left empty for the later stages.
pub fn build_rounds(events: &[Event]) -> Vec<Round> {
    let mut inputs: BTreeMap<u32, RoundInputs<'_>> = BTreeMap::new();
    let mut reports: BTreeMap<(u32, u32), MergedReport> = BTreeMap::new();

    for event in events {
        match &event.kind {
            EventKind::Picking(picking) => inputs
                .entry(picking.round)
                .or_default()
                .picking
                .push((picking, &event.meta)),
            EventKind::Responding(responding) => inputs
                .entry(responding.round)
                .or_default()
                .responding
                .push((responding, &event.meta)),
            EventKind::Report(report) => {
                reports
                    .entry((report.round, report.game))
                    .and_modify(|merged| merged.absorb(report, &event.meta))
                    .or_insert_with(|| MergedReport::new(report, &event.meta));
            }
            _ => {}
        }
    }

    let numbers: BTreeSet<u32> = inputs
        .keys()
        .copied()
        .chain(reports.keys().map(|(round, _)| *round))
        .collect();

    numbers
        .into_iter()
        .map(|number| {
            let (picking, responding) = match inputs.get(&number) {
                Some(input) => (
                    MergedPicking::fold(&input.picking),
                    MergedResponding::fold(&input.responding),
                ),
                None => (None, None),
            };
            assemble_round(number, picking, responding, &reports)
        })
        .collect()
}

fn assemble_round(
    number: u32,
    picking: Option<MergedPicking>,
    responding: Option<MergedResponding>,
    reports: &BTreeMap<(u32, u32), MergedReport>,
) -> Round {
    let mut machines: Vec<MachineResult> = picking
        .as_ref()
        .map(|picking| picking.machines.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|pick| {
            let mut seats = pick.seats.clone();
            if let Some(responding) = &responding {
                for seat in responding.seats_for(pick.machine) {
                    if !seats.iter().any(|s| s.position == seat.position) {
                        seats.push(seat.clone());
                    }
                }
            }
            seats.sort_by_key(|seat| seat.position);

            let report = reports.get(&(number, pick.machine)).cloned();
            let seats = seats
                .into_iter()
                .map(|seat| SeatResult {
                    score: report
                        .as_ref()
                        .and_then(|report| report.score_for(seat.position))
                        .map(str::to_string),
                    position: seat.position,
                    player_id: seat.player_id,
                })
                .collect();

            MachineResult {
                machine: pick.machine,
                name: pick.name.clone(),
                seats,
                report,
                duration_ms: None,
            }
        })
        .collect();
    machines.sort_by_key(|machine| machine.machine);

    Round {
        number,
        picking: picking.map(|picking| Phase::starting(picking.at)),
        responding: responding.map(|responding| Phase::starting(responding.at)),
        machines,
        confirm_left: None,
        confirm_right: None,
    }
}
