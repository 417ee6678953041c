use std::collections::BTreeMap;

use mnp_replay_core::rounds::{build_rounds, merge_picks, merge_seats};
use mnp_replay_parser::{
    Event, EventKind, EventMeta, GameAssignment, MachinePick, Picking, Report, Responding, Seat,
};

fn meta(when: i64, file: &str) -> EventMeta {
    EventMeta {
        path: "/matches/mnp-21-3-AAA-BBB/picks".into(),
        when,
        user_id: None,
        ukey: Some(format!("user-{file}")),
        source_file: file.into(),
    }
}

fn pick(machine: u32, name: &str, seats: &[(u8, &str)]) -> MachinePick {
    MachinePick {
        machine,
        name: name.into(),
        seats: seats.iter().map(|(p, id)| Seat::new(*p, *id)).collect(),
    }
}

fn picking(round: u32, when: i64, machines: Vec<MachinePick>) -> Event {
    Event::new(
        EventKind::Picking(Picking {
            round,
            player_count: None,
            machines,
        }),
        meta(when, &format!("pick-{when}.json")),
    )
}

fn responding(round: u32, when: i64, game: u32, seats: &[(u8, &str)]) -> Event {
    Event::new(
        EventKind::Responding(Responding {
            round,
            player_count: None,
            assignments: vec![GameAssignment {
                machine: game,
                seats: seats.iter().map(|(p, id)| Seat::new(*p, *id)).collect(),
            }],
        }),
        meta(when, &format!("respond-{when}.json")),
    )
}

fn report(round: u32, game: u32, when: i64, scores: &[(u8, &str)], photo: Option<&str>) -> Event {
    Event::new(
        EventKind::Report(Report {
            round,
            game,
            player_count: None,
            scores: scores
                .iter()
                .map(|(seat, score)| (*seat, score.to_string()))
                .collect::<BTreeMap<_, _>>(),
            photo_id: photo.map(str::to_string),
        }),
        meta(when, &format!("report-{when}.json")),
    )
}

fn seat_ids(round: &mnp_replay_core::rounds::Round, machine: usize) -> Vec<(u8, String)> {
    round.machines[machine]
        .seats
        .iter()
        .map(|seat| (seat.position, seat.player_id.clone()))
        .collect()
}

#[test]
fn later_picking_adds_seats_to_the_first_submission() {
    let events = vec![
        picking(1, 1000, vec![pick(1, "TZ", &[(1, "p1")])]),
        picking(1, 1500, vec![pick(1, "TZ", &[(1, "p1"), (2, "p2")])]),
    ];

    let rounds = build_rounds(&events);
    assert_eq!(rounds.len(), 1);
    let round = &rounds[0];
    assert_eq!(round.number, 1);
    assert_eq!(round.machines.len(), 1);
    assert_eq!(round.machines[0].name, "TZ");
    assert_eq!(
        seat_ids(round, 0),
        vec![(1, "p1".to_string()), (2, "p2".to_string())]
    );
    let picking = round.picking.as_ref().expect("picking phase");
    assert_eq!(picking.at.epoch, 1000, "the first submission is the merge base");
}

#[test]
fn merging_the_same_submission_twice_changes_nothing() {
    let update = vec![pick(1, "TZ", &[(1, "p1"), (3, "p3")])];
    let mut once = vec![pick(1, "Tz", &[(1, "p1")])];
    merge_picks(&mut once, &update);
    let mut twice = once.clone();
    merge_picks(&mut twice, &update);
    assert_eq!(once, twice);
}

#[test]
fn merge_never_drops_seats_but_later_values_win() {
    let mut seats = vec![Seat::new(1, "p1"), Seat::new(2, "p2")];
    merge_seats(&mut seats, &[Seat::new(2, "p9")]);
    assert_eq!(seats, vec![Seat::new(1, "p1"), Seat::new(2, "p9")]);

    merge_seats(&mut seats, &[]);
    assert_eq!(seats.len(), 2);
}

#[test]
fn renamed_and_new_machines_are_folded_in() {
    let events = vec![
        picking(2, 1000, vec![pick(1, "Twlight Zone", &[(1, "a")])]),
        picking(
            2,
            2000,
            vec![pick(2, "Medieval Madness", &[(1, "b")]), pick(1, "Twilight Zone", &[])],
        ),
    ];
    let rounds = build_rounds(&events);
    let machines = &rounds[0].machines;
    assert_eq!(machines.len(), 2);
    assert_eq!(machines[0].machine, 1);
    assert_eq!(machines[0].name, "Twilight Zone");
    assert_eq!(machines[0].seats.len(), 1);
    assert_eq!(machines[1].name, "Medieval Madness");
}

#[test]
fn responding_seats_fill_gaps_left_by_picking() {
    let events = vec![
        picking(1, 1000, vec![pick(1, "TZ", &[(1, "p1"), (3, "p3")])]),
        responding(1, 2000, 1, &[(4, "p4"), (2, "p2"), (1, "other")]),
    ];
    let rounds = build_rounds(&events);
    let round = &rounds[0];
    assert_eq!(
        seat_ids(round, 0),
        vec![
            (1, "p1".to_string()),
            (2, "p2".to_string()),
            (3, "p3".to_string()),
            (4, "p4".to_string()),
        ]
    );
    assert_eq!(round.responding.as_ref().map(|p| p.at.epoch), Some(2000));
}

#[test]
fn later_report_overlays_scores_and_logs_an_update() {
    let events = vec![
        picking(1, 1000, vec![pick(1, "TZ", &[(1, "p1"), (2, "p2")])]),
        report(1, 1, 3000, &[(1, "1000000"), (2, "500")], Some("photo-a")),
        report(1, 1, 4000, &[(1, "1100000")], None),
    ];
    let rounds = build_rounds(&events);
    let machine = &rounds[0].machines[0];
    let report = machine.report.as_ref().expect("merged report");

    assert_eq!(report.reported.epoch, 3000);
    assert_eq!(report.source_file, "report-3000.json");
    assert_eq!(report.scores.get(&1).map(String::as_str), Some("1100000"));
    assert_eq!(report.scores.get(&2).map(String::as_str), Some("500"));
    assert_eq!(report.photo_id.as_deref(), Some("photo-a"));
    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].epoch, 4000);
    assert_eq!(report.updates[0].source_file, "report-4000.json");

    assert_eq!(machine.seats[0].score.as_deref(), Some("1100000"));
    assert_eq!(machine.seats[1].score.as_deref(), Some("500"));
}

#[test]
fn empty_scores_are_not_shown_on_seats() {
    let events = vec![
        picking(1, 1000, vec![pick(1, "TZ", &[(1, "p1"), (2, "p2")])]),
        report(1, 1, 3000, &[(1, ""), (2, "42")], None),
    ];
    let rounds = build_rounds(&events);
    let seats = &rounds[0].machines[0].seats;
    assert_eq!(seats[0].score, None);
    assert_eq!(seats[1].score.as_deref(), Some("42"));
}

#[test]
fn rounds_exist_for_report_only_data_and_are_ordered() {
    let events = vec![
        report(3, 1, 5000, &[(1, "10")], None),
        picking(1, 1000, vec![pick(1, "TZ", &[(1, "p1")])]),
        responding(2, 2000, 1, &[(1, "p1")]),
    ];
    let rounds = build_rounds(&events);
    let numbers: Vec<u32> = rounds.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    assert!(rounds[1].picking.is_none());
    assert!(rounds[1].machines.is_empty());
    assert!(rounds[2].picking.is_none());
    assert!(rounds[2].responding.is_none());
    assert!(rounds[2].machines.is_empty());
}

#[test]
fn no_round_events_means_no_rounds() {
    let events = vec![Event::new(EventKind::Ready { team: None }, meta(10, "ready.json"))];
    assert!(build_rounds(&events).is_empty());
}
