use std::collections::BTreeMap;

use mnp_replay_core::confirmation::{bind_score_confirmations, lineup_confirmations};
use mnp_replay_core::durations::{infer_durations, positive_interval};
use mnp_replay_core::rounds::{build_rounds, Round};
use mnp_replay_core::PhaseOffsets;
use mnp_replay_parser::{
    Event, EventKind, EventMeta, GameAssignment, MachinePick, Picking, Report, Responding, Seat,
    Side,
};

const MINUTE: i64 = 60_000;

fn meta(when: i64) -> EventMeta {
    EventMeta {
        path: "/matches/mnp-21-3-AAA-BBB/picks".into(),
        when,
        user_id: None,
        ukey: None,
        source_file: format!("{when}.json"),
    }
}

fn picking(round: u32, when: i64) -> Event {
    Event::new(
        EventKind::Picking(Picking {
            round,
            player_count: None,
            machines: vec![MachinePick {
                machine: 1,
                name: "TZ".into(),
                seats: vec![Seat::new(1, "p1")],
            }],
        }),
        meta(when),
    )
}

fn responding(round: u32, when: i64) -> Event {
    Event::new(
        EventKind::Responding(Responding {
            round,
            player_count: None,
            assignments: vec![GameAssignment {
                machine: 1,
                seats: vec![Seat::new(2, "p2")],
            }],
        }),
        meta(when),
    )
}

fn report(round: u32, when: i64) -> Event {
    Event::new(
        EventKind::Report(Report {
            round,
            game: 1,
            player_count: None,
            scores: BTreeMap::from([(1, "100".to_string())]),
            photo_id: None,
        }),
        meta(when),
    )
}

fn reconstruct(events: &[Event], offsets: &PhaseOffsets) -> Vec<Round> {
    let lineup = lineup_confirmations(events);
    let mut rounds = build_rounds(events);
    bind_score_confirmations(&mut rounds, events);
    infer_durations(&mut rounds, &lineup, offsets);
    rounds
}

fn all_durations(rounds: &[Round]) -> Vec<i64> {
    rounds
        .iter()
        .flat_map(|round| {
            round
                .picking
                .iter()
                .chain(round.responding.iter())
                .filter_map(|phase| phase.duration_ms)
                .chain(round.machines.iter().filter_map(|m| m.duration_ms))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn positive_interval_rejects_zero_and_negative() {
    assert_eq!(positive_interval(10, 3), Some(7));
    assert_eq!(positive_interval(3, 3), None);
    assert_eq!(positive_interval(2, 3), None);
}

#[test]
fn full_round_has_every_duration() {
    let events = vec![
        Event::new(EventKind::ConfirmOpponent(Side::Left), meta(0)),
        Event::new(EventKind::ConfirmOpponent(Side::Right), meta(30_000)),
        picking(1, 30_000 + 5 * MINUTE),
        responding(1, 30_000 + 9 * MINUTE),
        report(1, 30_000 + 40 * MINUTE),
        Event::new(EventKind::ConfirmScore(Side::Left), meta(30_000 + 41 * MINUTE)),
        Event::new(EventKind::ConfirmScore(Side::Right), meta(30_000 + 42 * MINUTE)),
        picking(2, 30_000 + 50 * MINUTE),
    ];
    let rounds = reconstruct(&events, &PhaseOffsets::default());

    let first = &rounds[0];
    assert_eq!(first.picking.as_ref().and_then(|p| p.duration_ms), Some(4 * MINUTE));
    assert_eq!(first.responding.as_ref().and_then(|p| p.duration_ms), Some(3 * MINUTE));
    assert_eq!(first.machines[0].duration_ms, Some(30 * MINUTE));

    let second = &rounds[1];
    assert_eq!(second.picking.as_ref().and_then(|p| p.duration_ms), Some(7 * MINUTE));
}

#[test]
fn missing_anchors_leave_durations_absent() {
    let events = vec![picking(1, 5 * MINUTE), report(1, 40 * MINUTE)];
    let rounds = reconstruct(&events, &PhaseOffsets::default());
    let round = &rounds[0];
    assert_eq!(round.picking.as_ref().and_then(|p| p.duration_ms), None);
    assert!(round.responding.is_none());
    assert_eq!(round.machines[0].duration_ms, None);

    let events = vec![responding(1, 5 * MINUTE)];
    let rounds = reconstruct(&events, &PhaseOffsets::default());
    assert_eq!(rounds[0].responding.as_ref().and_then(|p| p.duration_ms), None);
}

#[test]
fn intervals_shorter_than_the_offset_are_dropped() {
    let events = vec![
        Event::new(EventKind::ConfirmOpponent(Side::Left), meta(0)),
        picking(1, 30_000),
        responding(1, 60_000),
    ];
    let rounds = reconstruct(&events, &PhaseOffsets::default());
    assert_eq!(rounds[0].picking.as_ref().and_then(|p| p.duration_ms), None);
    assert_eq!(rounds[0].responding.as_ref().and_then(|p| p.duration_ms), None);
}

#[test]
fn offsets_are_configurable() {
    let events = vec![picking(1, 10_000), responding(1, 20_000)];
    let offsets = PhaseOffsets {
        picking_start_ms: 0,
        responding_start_ms: 5_000,
        game_start_ms: 0,
    };
    let rounds = reconstruct(&events, &offsets);
    assert_eq!(rounds[0].responding.as_ref().and_then(|p| p.duration_ms), Some(5_000));
}

#[test]
fn every_inferred_duration_is_positive() {
    let events = vec![
        Event::new(EventKind::ConfirmOpponent(Side::Right), meta(1_000)),
        picking(1, 2_000),
        responding(1, 500_000),
        report(1, 400_000),
        Event::new(EventKind::ConfirmScore(Side::Left), meta(600_000)),
        picking(2, 601_000),
        responding(2, 900_000),
        report(2, 2_000_000),
    ];
    let rounds = reconstruct(&events, &PhaseOffsets::default());
    let durations = all_durations(&rounds);
    assert!(!durations.is_empty());
    assert!(durations.iter().all(|d| *d > 0), "{durations:?}");
}
