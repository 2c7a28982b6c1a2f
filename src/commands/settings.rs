//! # Settings Commands
//!
//! Handlers for `petctl settings` subcommands.

use super::shared::{
    HttpOperations, dispatch_command, read_body_or_exit, validate_args_count_or_exit,
};
use crate::cli_utils::{self, OutputFormat};
use crate::http_utils::PetLedgerClient;
use crate::{AppSettings, SettingsForm};

const SETTINGS_USAGE: &str = "Usage: settings <subcommand> [args...]
Subcommands:
  get
  set <json | @file.json | @file.yaml>
  reset
  currencies";

/// Handles settings commands.
pub async fn handle_settings_command(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    dispatch_command!("settings", SETTINGS_USAGE, args, client, output_format, {
        "get" => handle_settings_get,
        "set" => handle_settings_set,
        "reset" => handle_settings_reset,
        "currencies" => handle_settings_currencies,
    });
}

fn serialized_name<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

fn settings_rows(settings: &AppSettings) -> Vec<Vec<String>> {
    vec![
        vec![
            "Currency".to_string(),
            format!(
                "{} ({}, {}, {} decimals)",
                settings.currency.code,
                settings.currency.symbol,
                serialized_name(&settings.currency.position),
                settings.currency.decimals
            ),
        ],
        vec![
            "Date format".to_string(),
            serialized_name(&settings.display.date_format),
        ],
        vec!["Language".to_string(), settings.display.language.clone()],
        vec![
            "Show deceased".to_string(),
            settings.display.show_deceased.to_string(),
        ],
        vec![
            "Default view".to_string(),
            serialized_name(&settings.display.default_view),
        ],
        vec![
            "Items per page".to_string(),
            settings.display.items_per_page.to_string(),
        ],
        vec![
            "Custom fields".to_string(),
            settings.field_options.custom_fields.len().to_string(),
        ],
    ]
}

fn print_settings(settings: &AppSettings, output_format: OutputFormat) {
    if output_format == OutputFormat::Table {
        println!(
            "{}",
            cli_utils::render_table(&["SETTING", "VALUE"], &settings_rows(settings))
        );
    } else {
        cli_utils::print_structured_or_exit(settings, output_format, "settings");
    }
}

async fn handle_settings_get(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "get", SETTINGS_USAGE);
    let settings: AppSettings = HttpOperations::get(client, "settings", &[], "get settings").await;
    print_settings(&settings, output_format);
}

async fn handle_settings_set(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "set", SETTINGS_USAGE);
    let form: SettingsForm = read_body_or_exit(&args[1]);
    let settings: AppSettings =
        HttpOperations::put(client, "settings", &form, "update settings").await;
    print_settings(&settings, output_format);
}

async fn handle_settings_reset(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "reset", SETTINGS_USAGE);
    let settings: AppSettings =
        HttpOperations::delete(client, "settings", "reset settings").await;
    print_settings(&settings, output_format);
}

async fn handle_settings_currencies(
    args: &[String],
    client: &PetLedgerClient,
    output_format: OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "currencies", SETTINGS_USAGE);
    let currencies: Vec<serde_json::Value> =
        HttpOperations::get(client, "settings/currencies", &[], "list currencies").await;
    if output_format != OutputFormat::Table {
        cli_utils::print_structured_or_exit(&currencies, output_format, "currencies");
        return;
    }
    let field = |c: &serde_json::Value, key: &str| {
        c.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let rows: Vec<Vec<String>> = currencies
        .iter()
        .map(|c| vec![field(c, "code"), field(c, "symbol"), field(c, "name")])
        .collect();
    println!(
        "{}",
        cli_utils::render_table(&["CODE", "SYMBOL", "NAME"], &rows)
    );
}
