use std::fmt::Write as _;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use crate::outputs::{ReplayOutput, SkipCounts, WeekLabel};

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: usize,
    pub processed: usize,
    pub skipped: SkipCounts,
    pub matches: usize,
    pub players: usize,
    pub machines: usize,
    pub match_venues: usize,
}

impl RunSummary {
    /// Every input file is either processed or counted under exactly one skip reason.
    pub fn is_balanced(&self) -> bool {
        self.processed + self.skipped.total() == self.total_files
    }
}

fn week_text(week: &WeekLabel) -> String {
    match week {
        WeekLabel::Number(number) => number.to_string(),
        WeekLabel::Label(label) => label.clone(),
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Renders the human-readable build report with a per-season table.
pub fn render_summary(summary: &RunSummary, output: &ReplayOutput) -> String {
    let skipped = &summary.skipped;
    let seasons = output
        .seasons
        .iter()
        .map(|season| season.season.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = String::new();
    let _ = writeln!(text, "=== MNP Replay Data Summary ===");
    let _ = writeln!(text, "Total files: {}", summary.total_files);
    let _ = writeln!(text, "Processed: {}", summary.processed);
    let _ = writeln!(
        text,
        "Skipped - noise: {}, scrimmages: {}, empty reports: {}, parse errors: {}",
        skipped.noise, skipped.scrimmages, skipped.empty_reports, skipped.parse_errors
    );
    let _ = writeln!(text, "Seasons: {seasons}");
    let _ = writeln!(text, "Teams: {}", join_keys(output.teams.keys()));
    let _ = writeln!(text, "Venues: {}", join_keys(output.venues.keys()));
    let _ = writeln!(text, "Players: {} loaded", summary.players);
    let _ = writeln!(text, "Machines: {} defined", summary.machines);
    let _ = writeln!(text, "Match venues loaded: {}", summary.match_venues);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Season", "Weeks", "Matchups", "Week labels"]);
    for season in &output.seasons {
        let matchups: usize = season.weeks.iter().map(|week| week.matches.len()).sum();
        let labels = season
            .weeks
            .iter()
            .map(|week| week_text(&week.week))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            season.season.to_string(),
            season.weeks.len().to_string(),
            matchups.to_string(),
            labels,
        ]);
    }
    let _ = writeln!(text, "\n--- Season Breakdown ---\n{table}");
    text
}
