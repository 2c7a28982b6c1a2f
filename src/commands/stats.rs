//! # Stats Command
//!
//! `petctl stats` prints the dashboard summary.

use super::shared::{HttpOperations, validate_args_count_or_exit};
use crate::DashboardStats;
use crate::cli_utils::{self, OutputFormat};
use crate::http_utils::PetLedgerClient;

const STATS_USAGE: &str = "Usage: stats";

fn render(stats: &DashboardStats) -> String {
    let mut sections = vec![cli_utils::render_table(
        &["METRIC", "VALUE"],
        &[
            vec!["Total animals".to_string(), stats.total_animals.to_string()],
            vec!["Alive".to_string(), stats.alive_animals.to_string()],
            vec!["Deceased".to_string(), stats.deceased_animals.to_string()],
            vec!["Average age".to_string(), stats.average_age.to_string()],
            vec!["Total costs".to_string(), stats.formatted_total_costs.clone()],
        ],
    )];

    if !stats.upcoming_birthdays.is_empty() {
        let rows: Vec<Vec<String>> = stats
            .upcoming_birthdays
            .iter()
            .map(|b| vec![b.name.clone(), b.label.clone(), b.turning.to_string()])
            .collect();
        sections.push(cli_utils::render_table(&["BIRTHDAY", "WHEN", "TURNING"], &rows));
    }

    if !stats.top_species.is_empty() {
        let rows: Vec<Vec<String>> = stats
            .top_species
            .iter()
            .map(|s| vec![s.label.clone(), s.count.to_string()])
            .collect();
        sections.push(cli_utils::render_table(&["SPECIES", "COUNT"], &rows));
    }

    if !stats.recently_added.is_empty() {
        let rows: Vec<Vec<String>> = stats
            .recently_added
            .iter()
            .map(|a| {
                vec![
                    a.name.clone(),
                    a.species.as_str().to_string(),
                    a.created_at.format("%Y-%m-%d").to_string(),
                ]
            })
            .collect();
        sections.push(cli_utils::render_table(&["RECENT", "SPECIES", "ADDED"], &rows));
    }

    sections.join("\n\n")
}

/// Handles the stats command.
pub async fn handle_stats_command(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 0, 0, "stats", STATS_USAGE);
    let stats: DashboardStats = HttpOperations::get(client, "stats", &[], "get stats").await;
    if output_format == OutputFormat::Table {
        println!("{}", render(&stats));
    } else {
        cli_utils::print_structured_or_exit(&stats, output_format, "stats");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppSettings;
    use crate::test_utils::test_helpers::{fixed_now, sample_animal};

    #[test]
    fn empty_ledger_renders_only_totals() {
        let settings = AppSettings::defaults(fixed_now());
        let stats = DashboardStats::compute(&[], &settings, fixed_now().date_naive());
        let text = render(&stats);
        assert!(text.contains("Total costs"));
        assert!(text.contains("$0.00"));
        assert!(!text.contains("RECENT"));
    }

    #[test]
    fn recent_animals_are_listed() {
        let settings = AppSettings::defaults(fixed_now());
        let animals = vec![sample_animal("Rex")];
        let stats = DashboardStats::compute(&animals, &settings, fixed_now().date_naive());
        let text = render(&stats);
        assert!(text.contains("RECENT"));
        assert!(text.contains("Rex"));
    }
}
