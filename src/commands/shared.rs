//! # Shared Command Utilities
//!
//! This module provides shared validation, parsing, and utility functions
//! used across multiple command handlers to reduce code duplication.

use std::path::Path;
use std::str::FromStr;

use handled::Handle;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::commands::errors::{UserError, ValidationError, format_cli_error};
use crate::http_utils::{HttpError, PetLedgerClient};
use crate::{AnimalId, cli_utils};

/// Prints a handled error with its hint and exits.
pub fn exit_with_handled<E>(error: &E) -> !
where
    E: Handle<UserError> + std::fmt::Display,
{
    eprintln!("{}", format_cli_error(error));
    std::process::exit(1);
}

/// Generic ID parsing function that works with any ID type that implements FromStr
/// and whose error type implements Handle<UserError>.
fn parse_id_or_exit_generic<T, E>(id_str: &str) -> T
where
    T: FromStr<Err = E>,
    E: Handle<UserError> + std::fmt::Display,
{
    id_str.parse().unwrap_or_else(|e: E| exit_with_handled(&e))
}

/// Validates and parses an animal ID, exiting with a hint when it is not a UUID.
pub fn parse_animal_id_or_exit(id_str: &str) -> AnimalId {
    parse_id_or_exit_generic(id_str)
}

/// Parses a positive measurement such as a weight or height.
pub fn parse_positive_or_exit(value: &str, field: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => exit_with_handled(&ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be a positive number".to_string(),
        }),
    }
}

/// Validates both minimum and maximum argument counts.
///
/// # Arguments
/// * `args` - The command arguments array
/// * `min_count` - The minimum number of arguments required (including subcommand)
/// * `max_count` - The maximum number of arguments allowed (including subcommand)
/// * `command` - The command name for error message
/// * `usage` - The usage string to display
pub fn validate_args_count_or_exit(
    args: &[String],
    min_count: usize,
    max_count: usize,
    command: &str,
    usage: &str,
) {
    if args.len() < min_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command requires more arguments", command),
            usage,
        );
    }
    if args.len() > max_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command has too many arguments", command),
            usage,
        );
    }
}

/// Splits `key=value` arguments into pairs, exiting on anything else.
pub fn parse_key_values_or_exit<'a>(args: &'a [String], usage: &str) -> Vec<(&'a str, &'a str)> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => (key, value),
            _ => cli_utils::exit_with_usage_error(
                &format!("Expected key=value, got '{}'", arg),
                usage,
            ),
        })
        .collect()
}

/// Reads a request body from an argument.
///
/// `@path` reads a file, parsed as YAML when it ends in `.yaml` or `.yml`
/// and as JSON otherwise. Anything else is parsed as inline JSON.
pub fn read_body_or_exit<T>(arg: &str) -> T
where
    T: DeserializeOwned,
{
    let Some(path) = arg.strip_prefix('@') else {
        return serde_json::from_str(arg).unwrap_or_else(|e| exit_with_handled(&e));
    };
    let path = Path::new(path);
    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| exit_with_handled(&e));
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yml::from_str(&contents).unwrap_or_else(|e| exit_with_handled(&e))
    } else {
        serde_json::from_str(&contents).unwrap_or_else(|e| exit_with_handled(&e))
    }
}

/// Macro to generate command dispatcher boilerplate.
macro_rules! dispatch_command {
    ($command_name:expr, $usage:expr, $args:expr, $client:expr, $output_format:expr, {
        $($subcommand:expr => $handler:expr),* $(,)?
    }) => {
        if $args.is_empty() {
            crate::cli_utils::exit_with_usage_error(
                &format!("{} command requires a subcommand", $command_name),
                $usage,
            );
        }

        match $args[0].as_str() {
            $(
                $subcommand => $handler($args, $client, $output_format).await,
            )*
            _ => {
                let available_subcommands = vec![$($subcommand),*];
                crate::cli_utils::exit_with_error(&format!(
                    "Unknown {} subcommand '{}'. Available subcommands: {}",
                    $command_name,
                    $args[0],
                    available_subcommands.join(", ")
                ));
            }
        }
    };
}

pub(crate) use dispatch_command;

/// HTTP operation helper utilities to reduce duplicate request patterns.
pub struct HttpOperations;

impl HttpOperations {
    async fn run<T, Fut>(request: Fut, context: &str) -> T
    where
        Fut: std::future::Future<Output = Result<T, Box<dyn std::error::Error>>>,
    {
        match request.await {
            Ok(value) => value,
            Err(e) => match e.downcast_ref::<HttpError>() {
                Some(http) => {
                    eprintln!("Failed to {}", context);
                    exit_with_handled(http)
                }
                None => cli_utils::exit_with_error(&format!("Failed to {}: {}", context, e)),
            },
        }
    }

    /// GET with optional query parameters.
    pub async fn get<Resp>(
        client: &PetLedgerClient,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Resp
    where
        Resp: DeserializeOwned,
    {
        Self::run(client.get_with_query(path, query), context).await
    }

    /// Generic POST operation with error handling.
    pub async fn post<Req, Resp>(
        client: &PetLedgerClient,
        path: &str,
        request: &Req,
        context: &str,
    ) -> Resp
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        Self::run(client.post(path, request), context).await
    }

    /// Generic PUT operation with error handling.
    pub async fn put<Req, Resp>(
        client: &PetLedgerClient,
        path: &str,
        request: &Req,
        context: &str,
    ) -> Resp
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        Self::run(client.put(path, request), context).await
    }

    /// Generic DELETE operation with error handling.
    pub async fn delete<Resp>(client: &PetLedgerClient, path: &str, context: &str) -> Resp
    where
        Resp: DeserializeOwned,
    {
        Self::run(client.delete(path), context).await
    }
}
