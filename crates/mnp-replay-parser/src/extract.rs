use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{GameAssignment, MachinePick, Seat};

/// Seats per machine a picks form can carry.
pub const MAX_SEATS: u8 = 4;

static ASSIGNMENT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^player_(\d+)\.(\d+)$").expect("valid assignment key regex"));

/// Number of players per machine for a round; `None` for rounds outside the fixed format.
pub fn player_count_for_round(round: u32) -> Option<u8> {
    match round {
        1 | 4 => Some(4),
        2 | 3 => Some(2),
        _ => None,
    }
}

/// Renders a scalar JSON value as text. Containers and null have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A body field that is present and not blank.
pub fn body_text(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(scalar_text)
        .filter(|text| !text.is_empty())
}

/// Leading-digit integer parse: `"3"`, `" 12abc"` and `3` all yield a number, `"abc"` does not.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Round number from a body field. Rounds are 1-based, so zero and negatives count as absent.
pub fn body_round(body: &Map<String, Value>, key: &str) -> Option<u32> {
    body_text(body, key)
        .and_then(|text| parse_leading_int(&text))
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&round| round >= 1)
}

/// Machines named on a picking form: `machine.1`, `machine.2`, ... until the first gap,
/// each with whichever of `player_1.<i>`..`player_4.<i>` are filled in.
pub fn extract_machines(body: &Map<String, Value>) -> Vec<MachinePick> {
    let mut machines = Vec::new();
    let mut index: u32 = 1;
    while let Some(name) = body_text(body, &format!("machine.{index}")) {
        let seats = (1..=MAX_SEATS)
            .filter_map(|position| {
                body_text(body, &format!("player_{position}.{index}"))
                    .map(|id| Seat::new(position, id))
            })
            .collect();
        machines.push(MachinePick {
            machine: index,
            name,
            seats,
        });
        index += 1;
    }
    machines
}

/// Seat assignments on a responding form, grouped by game and ordered by game then seat.
pub fn extract_assignments(body: &Map<String, Value>) -> Vec<GameAssignment> {
    let mut by_game: BTreeMap<u32, Vec<Seat>> = BTreeMap::new();
    for (key, value) in body {
        let Some(caps) = ASSIGNMENT_KEY_RE.captures(key) else {
            continue;
        };
        let (Ok(position), Ok(game)) = (caps[1].parse::<u8>(), caps[2].parse::<u32>()) else {
            continue;
        };
        let Some(id) = scalar_text(value).filter(|id| !id.is_empty()) else {
            continue;
        };
        by_game.entry(game).or_default().push(Seat::new(position, id));
    }

    by_game
        .into_iter()
        .map(|(machine, mut seats)| {
            seats.sort_by_key(|seat| seat.position);
            GameAssignment { machine, seats }
        })
        .collect()
}

/// `score_1`..`score_4` as raw text keyed by seat. Present-but-null fields are ignored.
pub fn extract_scores(body: &Map<String, Value>) -> BTreeMap<u8, String> {
    (1..=MAX_SEATS)
        .filter_map(|seat| {
            body.get(&format!("score_{seat}"))
                .and_then(scalar_text)
                .map(|score| (seat, score))
        })
        .collect()
}
