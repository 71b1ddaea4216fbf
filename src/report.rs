use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{AggregatedGroup, Goal, Ranking};

const BAR_WIDTH: usize = 40;

pub fn format_salary(salary: Option<f64>) -> String {
    match salary {
        Some(value) => format!("${:.1}M", value / 1e6),
        None => "n/a".to_string(),
    }
}

fn format_cav(cav: Option<f64>) -> String {
    cav.map_or_else(|| "n/a".to_string(), |value| format!("{value:.1}"))
}

/// Chart title for a ranking, following the wording of the original charts.
pub fn title(ranking: &Ranking) -> String {
    match (ranking.goal, ranking.position.as_deref()) {
        (Goal::MaxSalary, _) => format!("Top 3 Schools by {} in {}", ranking.goal, ranking.year),
        (Goal::BestCav, Some(position)) => format!("Best CAV for {position} in {}", ranking.year),
        (Goal::MostPicks, Some(position)) => {
            format!("Most Picks for {position} in {}", ranking.year)
        }
        (goal, None) => format!("{goal} in {}", ranking.year),
    }
}

pub fn render_text(ranking: &Ranking) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}:", title(ranking));
    for (index, entry) in ranking.rankings.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {}  salary {}  CAV {}  picks {:.0}",
            index + 1,
            entry.school,
            format_salary(entry.salary),
            format_cav(entry.cav),
            entry.pick
        );
    }
    output
}

pub fn render_json(ranking: &Ranking) -> serde_json::Result<String> {
    serde_json::to_string_pretty(ranking)
}

fn bar(value: Option<f64>, max: f64) -> String {
    let value = value.unwrap_or(0.0);
    let width = if max > 0.0 && value > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "█".repeat(width.max(usize::from(value > 0.0)))
}

fn write_chart(output: &mut String, ranking: &Ranking) {
    let measure = ranking.goal.measure();
    let entries: Vec<&AggregatedGroup> = match ranking.goal {
        Goal::MaxSalary => ranking.rankings.schools().collect(),
        Goal::BestCav | Goal::MostPicks => ranking.rankings.iter().collect(),
    };

    if entries.is_empty() {
        let _ = writeln!(output, "No schools matched this filter.");
        return;
    }

    let max = entries
        .iter()
        .filter_map(|entry| entry.measure(measure))
        .fold(0.0_f64, f64::max);
    let label_width = entries.iter().map(|e| e.school.chars().count()).max().unwrap_or(0);

    let _ = writeln!(output, "```text");
    for entry in entries {
        let value = entry.measure(measure);
        let label = match ranking.goal {
            Goal::MaxSalary => format!("Salary: {}", format_salary(value)),
            Goal::BestCav => format_cav(value),
            Goal::MostPicks => format!("{:.0}", value.unwrap_or(0.0)),
        };
        let _ = writeln!(
            output,
            "{:<label_width$} | {} {}",
            entry.school,
            bar(value, max),
            label
        );
    }
    let _ = writeln!(output, "```");
}

pub fn build_report(ranking: &Ranking, generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", title(ranking));
    let _ = writeln!(
        output,
        "Generated {} for {} (position: {})",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        ranking.year,
        ranking.position.as_deref().unwrap_or("all")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rankings");
    let _ = writeln!(output, "| Rank | School | Salary | CAV | Pick |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for (index, entry) in ranking.rankings.iter().enumerate() {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {:.0} |",
            index + 1,
            entry.school,
            format_salary(entry.salary),
            format_cav(entry.cav),
            entry.pick
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Chart");
    write_chart(&mut output, ranking);

    output
}
