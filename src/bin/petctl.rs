use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use pet_ledger::{
    cli_utils::{self, OutputFormat},
    commands::{
        handle_animal_command, handle_event_command, handle_settings_command,
        handle_stats_command,
    },
    http_utils,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Base URL of the pet-ledger API server")]
    base_url: Option<String>,
    #[arrrg(optional, "Bearer token sent with every request")]
    token: Option<String>,
    #[arrrg(optional, "Output format: json, yaml, or table (default: table)")]
    output: Option<String>,
}

const USAGE: &str = r#"Usage: petctl [options] <command> [args...]

Options:
  --base-url <url>     Base URL of the pet-ledger API server (default: http://localhost:8080)
  --token <token>      Bearer token sent with every request (or PET_LEDGER_TOKEN)
  --output <format>    Output format: json, yaml, or table (default: table)

Commands:
  animal list [search=<text>] [species=<s>] [status=<all|alive|deceased>]
                                              List animals
  animal get <animal-id>                      Show one animal
  animal create <json|@file>                  Create an animal from a profile form
  animal update <animal-id> <json|@file>      Replace an animal's profile
  animal delete <animal-id>                   Delete an animal
  animal weight <animal-id> <value> <unit> [notes]
                                              Record a weight measurement
  animal height <animal-id> <value> <unit> [type] [notes]
                                              Record a height measurement
  event list <animal-id> [type]               Show an animal's timeline
  event add <animal-id> <json|@file>          Add a timeline event
  event update <animal-id> <event-id> <json|@file>
                                              Replace a timeline event
  event delete <animal-id> <event-id>         Delete a timeline event
  settings get                                Show your settings
  settings set <json|@file>                   Replace your settings
  settings reset                              Restore default settings
  settings currencies                         List selectable currencies
  stats                                       Show dashboard statistics"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: petctl <command> [args...]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No command specified", USAGE);
    }

    let base_url = options
        .base_url
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let token = options
        .token
        .or_else(|| std::env::var("PET_LEDGER_TOKEN").ok())
        .filter(|t| !t.is_empty());
    let output = match options.output {
        Some(format) => format
            .parse::<OutputFormat>()
            .unwrap_or_else(|e| cli_utils::exit_with_usage_error(&e, USAGE)),
        None => OutputFormat::default(),
    };

    let client = http_utils::PetLedgerClient::new(base_url, token);

    match free[0].as_str() {
        "animal" => {
            handle_animal_command(&free[1..], &client, output).await;
        }
        "event" => {
            handle_event_command(&free[1..], &client, output).await;
        }
        "settings" => {
            handle_settings_command(&free[1..], &client, output).await;
        }
        "stats" => {
            handle_stats_command(&free[1..], &client, output).await;
        }
        _ => {
            cli_utils::exit_with_error(&format!(
                "Unknown command '{}'. Available commands: animal, event, settings, stats",
                free[0]
            ));
        }
    }

    Ok(())
}
