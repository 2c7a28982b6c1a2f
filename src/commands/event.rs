//! # Event Commands
//!
//! Handlers for `petctl event` subcommands, which work on one animal's timeline.

use super::shared::{
    HttpOperations, dispatch_command, parse_animal_id_or_exit, read_body_or_exit,
    validate_args_count_or_exit,
};
use crate::cli_utils::{self, OutputFormat};
use crate::http_utils::PetLedgerClient;
use crate::{Animal, EventRequest, EventType, TimelineEntry};

const EVENT_USAGE: &str = "Usage: event <subcommand> [args...]
Subcommands:
  list <animal-id> [type]
  add <animal-id> <json | @file.json | @file.yaml>
  update <animal-id> <event-id> <json | @file.json | @file.yaml>
  delete <animal-id> <event-id>";

/// Handles event commands.
pub async fn handle_event_command(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    dispatch_command!("event", EVENT_USAGE, args, client, output_format, {
        "list" => handle_event_list,
        "add" => handle_event_add,
        "update" => handle_event_update,
        "delete" => handle_event_delete,
    });
}

fn timeline_rows(entries: &[TimelineEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|entry| {
            vec![
                entry.event.id.to_string(),
                entry.formatted_date.clone(),
                entry.type_label.clone(),
                entry.event.title.clone(),
                entry.formatted_cost.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

async fn handle_event_list(args: &[String], client: &PetLedgerClient, output_format: OutputFormat) {
    validate_args_count_or_exit(args, 2, 3, "list", EVENT_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let mut query = Vec::new();
    if let Some(kind) = args.get(2) {
        let kind: EventType = kind.parse().unwrap_or_else(|_| {
            let known: Vec<&str> = EventType::ALL.iter().map(|t| t.as_str()).collect();
            cli_utils::exit_with_error(&format!(
                "Unknown event type '{}'. Expected one of: {}",
                kind,
                known.join(", ")
            ))
        });
        query.push(("type", kind.as_str().to_string()));
    }

    let entries: Vec<TimelineEntry> = HttpOperations::get(
        client,
        &format!("animal/{}/event", id),
        &query,
        "list events",
    )
    .await;

    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(&entries, output_format, "events");
    } else if entries.is_empty() {
        println!("No events found");
    } else {
        println!(
            "{}",
            cli_utils::render_table(
                &["ID", "DATE", "TYPE", "TITLE", "COST"],
                &timeline_rows(&entries)
            )
        );
    }
}

fn report(animal: &Animal, verb: &str, output_format: OutputFormat) {
    if output_format == OutputFormat::Table {
        cli_utils::print_success(&format!(
            "{} event for {}; {} on the timeline",
            verb,
            animal.name,
            animal.events.len()
        ));
    } else {
        cli_utils::print_structured_or_exit(animal, output_format, "animal");
    }
}

async fn handle_event_add(args: &[String], client: &PetLedgerClient, output_format: OutputFormat) {
    validate_args_count_or_exit(args, 3, 3, "add", EVENT_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let request: EventRequest = read_body_or_exit(&args[2]);
    let animal: Animal = HttpOperations::post(
        client,
        &format!("animal/{}/event", id),
        &request,
        "add event",
    )
    .await;
    report(&animal, "Added", output_format);
}

async fn handle_event_update(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 4, 4, "update", EVENT_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let request: EventRequest = read_body_or_exit(&args[3]);
    let animal: Animal = HttpOperations::put(
        client,
        &format!("animal/{}/event/{}", id, args[2]),
        &request,
        "update event",
    )
    .await;
    report(&animal, "Updated", output_format);
}

async fn handle_event_delete(
    args: &[String],
    client: &PetLedgerClient,
    _output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 3, 3, "delete", EVENT_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let _: serde_json::Value = HttpOperations::delete(
        client,
        &format!("animal/{}/event/{}", id, args[2]),
        "delete event",
    )
    .await;
    cli_utils::print_success(&format!("Deleted event: {}", args[2]));
}
