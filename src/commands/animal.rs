//! # Animal Commands
//!
//! Handlers for `petctl animal` subcommands.

use chrono::Utc;
use serde::de::DeserializeOwned;

use super::errors::ValidationError;
use super::shared::{
    HttpOperations, dispatch_command, exit_with_handled, parse_animal_id_or_exit,
    parse_key_values_or_exit, parse_positive_or_exit, read_body_or_exit,
    validate_args_count_or_exit,
};
use crate::cli_utils::{self, OutputFormat};
use crate::http_utils::PetLedgerClient;
use crate::{
    Animal, AnimalForm, HeightRecord, HeightRequest, HeightUnit, MeasurementType, WeightRecord,
    WeightRequest, WeightUnit,
};

const ANIMAL_USAGE: &str = "Usage: animal <subcommand> [args...]
Subcommands:
  list [search=<text>] [species=<species>] [status=all|alive|deceased]
  get <animal-id>
  create <json | @file.json | @file.yaml>
  update <animal-id> <json | @file.json | @file.yaml>
  delete <animal-id>
  weight <animal-id> <value> <lbs|kg> [notes]
  height <animal-id> <value> <inches|cm|hands> [shoulder|withers|total] [notes]";

/// Handles animal commands.
pub async fn handle_animal_command(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    dispatch_command!("animal", ANIMAL_USAGE, args, client, output_format, {
        "list" => handle_animal_list,
        "get" => handle_animal_get,
        "create" => handle_animal_create,
        "update" => handle_animal_update,
        "delete" => handle_animal_delete,
        "weight" => handle_animal_weight,
        "height" => handle_animal_height,
    });
}

/// Parses a lowercase enum value the way the API names it.
fn parse_unit_or_exit<T>(value: &str, field: &str) -> T
where
    T: DeserializeOwned,
{
    serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase())).unwrap_or_else(
        |_| {
            exit_with_handled(&ValidationError {
                field: field.to_string(),
                value: value.to_string(),
                reason: "unknown unit".to_string(),
            })
        },
    )
}

fn describe_weight(name: &str, record: &WeightRecord) -> String {
    format!(
        "Recorded weight for {}: {} {} on {}",
        name,
        record.weight,
        unit_name(&record.unit),
        record.date.format("%Y-%m-%d")
    )
}

fn describe_height(name: &str, record: &HeightRecord) -> String {
    format!(
        "Recorded height for {}: {} {} at the {} on {}",
        name,
        record.height,
        unit_name(&record.unit),
        unit_name(&record.measurement_type),
        record.date.format("%Y-%m-%d")
    )
}

/// The serialized name of a unit-like enum.
fn unit_name<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

fn print_animal(animal: &Animal, output_format: OutputFormat) {
    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(animal, output_format, "animal");
        return;
    }
    let today = Utc::now().date_naive();
    let mut rows = vec![
        vec!["ID".to_string(), animal.id.to_string()],
        vec!["Name".to_string(), animal.name.clone()],
        vec!["Species".to_string(), animal.species.label().to_string()],
        vec!["Breed".to_string(), animal.breed.clone().unwrap_or_default()],
        vec!["Age".to_string(), animal.age(today).to_string()],
        vec![
            "Status".to_string(),
            if animal.is_deceased() { "deceased" } else { "alive" }.to_string(),
        ],
        vec!["Owner".to_string(), animal.owner_info.name.clone()],
    ];
    if let Some(weight) = animal.latest_weight() {
        rows.push(vec![
            "Weight".to_string(),
            format!("{} {}", weight.weight, unit_name(&weight.unit)),
        ]);
    }
    if let Some(height) = animal.latest_height() {
        rows.push(vec![
            "Height".to_string(),
            format!("{} {}", height.height, unit_name(&height.unit)),
        ]);
    }
    rows.push(vec!["Events".to_string(), animal.events.len().to_string()]);
    println!("{}", cli_utils::render_table(&["FIELD", "VALUE"], &rows));
}

async fn handle_animal_list(args: &[String], client: &PetLedgerClient, output_format: OutputFormat) {
    let query: Vec<(&str, String)> = parse_key_values_or_exit(&args[1..], ANIMAL_USAGE)
        .into_iter()
        .map(|(key, value)| match key {
            "search" | "species" | "status" => (key, value.to_string()),
            _ => cli_utils::exit_with_usage_error(
                &format!("Unknown filter '{}'", key),
                ANIMAL_USAGE,
            ),
        })
        .collect();

    let animals: Vec<Animal> =
        HttpOperations::get(client, "animal", &query, "list animals").await;

    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(&animals, output_format, "animals");
        return;
    }
    if animals.is_empty() {
        println!("No animals found");
        return;
    }
    let today = Utc::now().date_naive();
    let rows: Vec<Vec<String>> = animals
        .iter()
        .map(|animal| {
            vec![
                animal.id.to_string(),
                animal.name.clone(),
                animal.species.as_str().to_string(),
                animal.breed.clone().unwrap_or_default(),
                animal.age(today).to_string(),
                if animal.is_deceased() { "deceased" } else { "alive" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        cli_utils::render_table(&["ID", "NAME", "SPECIES", "BREED", "AGE", "STATUS"], &rows)
    );
}

async fn handle_animal_get(args: &[String], client: &PetLedgerClient, output_format: OutputFormat) {
    validate_args_count_or_exit(args, 2, 2, "get", ANIMAL_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let animal: Animal =
        HttpOperations::get(client, &format!("animal/{}", id), &[], "get animal").await;
    print_animal(&animal, output_format);
}

async fn handle_animal_create(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "create", ANIMAL_USAGE);
    let form: AnimalForm = read_body_or_exit(&args[1]);
    let animal: Animal = HttpOperations::post(client, "animal", &form, "create animal").await;
    if output_format == OutputFormat::Table {
        cli_utils::print_success(&format!("Created animal: {} ({})", animal.name, animal.id));
    } else {
        cli_utils::print_structured_or_exit(&animal, output_format, "animal");
    }
}

async fn handle_animal_update(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 3, 3, "update", ANIMAL_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let form: AnimalForm = read_body_or_exit(&args[2]);
    let animal: Animal =
        HttpOperations::put(client, &format!("animal/{}", id), &form, "update animal").await;
    if output_format == OutputFormat::Table {
        cli_utils::print_success(&format!("Updated animal: {} ({})", animal.name, animal.id));
    } else {
        cli_utils::print_structured_or_exit(&animal, output_format, "animal");
    }
}

async fn handle_animal_delete(
    args: &[String],
    client: &PetLedgerClient,
    _output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "delete", ANIMAL_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let _: serde_json::Value =
        HttpOperations::delete(client, &format!("animal/{}", id), "delete animal").await;
    cli_utils::print_success(&format!("Deleted animal: {}", id));
}

async fn handle_animal_weight(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 4, 5, "weight", ANIMAL_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let request = WeightRequest {
        weight: parse_positive_or_exit(&args[2], "weight"),
        unit: parse_unit_or_exit::<WeightUnit>(&args[3], "weight unit"),
        notes: args.get(4).cloned(),
    };
    let animal: Animal = HttpOperations::post(
        client,
        &format!("animal/{}/weight", id),
        &request,
        "record weight",
    )
    .await;
    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(&animal, output_format, "animal");
    } else if let Some(record) = animal.latest_weight() {
        cli_utils::print_success(&describe_weight(&animal.name, record));
    }
}

async fn handle_animal_height(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 4, 6, "height", ANIMAL_USAGE);
    let id = parse_animal_id_or_exit(&args[1]);
    let measurement_type = match args.get(4) {
        Some(kind) => parse_unit_or_exit::<MeasurementType>(kind, "measurement type"),
        None => MeasurementType::default(),
    };
    let request = HeightRequest {
        height: parse_positive_or_exit(&args[2], "height"),
        unit: parse_unit_or_exit::<HeightUnit>(&args[3], "height unit"),
        measurement_type,
        notes: args.get(5).cloned(),
    };
    let animal: Animal = HttpOperations::post(
        client,
        &format!("animal/{}/height", id),
        &request,
        "record height",
    )
    .await;
    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(&animal, output_format, "animal");
    } else if let Some(record) = animal.latest_height() {
        cli_utils::print_success(&describe_height(&animal.name, record));
    }
}
