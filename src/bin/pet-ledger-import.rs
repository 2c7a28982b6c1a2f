//! Copies legacy JSON data into a Pet Ledger store.

use std::path::{Path, PathBuf};

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tracing_subscriber::EnvFilter;

use pet_ledger::UserId;
use pet_ledger::config::{ConfigOverrides, ServerConfig};
use pet_ledger::import::import_files;

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(required, "Legacy animals file (flat list or keyed by user)")]
    animals: String,
    #[arrrg(optional, "Legacy settings file")]
    settings: Option<String>,
    #[arrrg(required, "User who will own the imported records")]
    user: String,
    #[arrrg(optional, "Key to read from keyed files (default: --user)")]
    source_user: Option<String>,
    #[arrrg(optional, "Configuration file naming the target store")]
    config: Option<String>,
    #[arrrg(optional, "Target JSON-file data directory")]
    data_dir: Option<String>,
    #[arrrg(optional, "Target PostgreSQL database URL")]
    database_url: Option<String>,
}

const USAGE: &str = r#"Usage: pet-ledger-import --animals <PATH> --user <USER> [options]

Copy legacy JSON data into a Pet Ledger store.

Arguments:
  --animals <PATH>        animals.json (a list) or dev-animals.json (keyed by user)
  --settings <PATH>       settings.json to import as the user's settings
  --user <USER>           User who will own the imported records
  --source-user <USER>    Key to read from keyed files (default: --user)
  --config <PATH>         Configuration file naming the target store
  --data-dir <PATH>       Target JSON-file data directory
  --database-url <URL>    Target PostgreSQL database URL

Animals already present in the target are skipped, so the import can be rerun."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line(USAGE);

    if !free.is_empty() {
        eprintln!("Error: Unexpected arguments: {:?}", free);
        eprintln!();
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match &options.config {
        Some(path) => ServerConfig::load(Path::new(path))?,
        None => ServerConfig::default(),
    };
    let config = config.with_overrides(ConfigOverrides {
        data_dir: options.data_dir.map(PathBuf::from),
        database_url: options.database_url,
        ..ConfigOverrides::default()
    });

    println!("🔄 Importing into {}...", config.storage);
    let store = config.build_store().await?;
    let user = UserId::new(options.user);

    let report = import_files(
        store.as_ref(),
        &user,
        Path::new(&options.animals),
        options.settings.as_deref().map(Path::new),
        options.source_user.as_deref(),
    )
    .await?;

    for error in &report.errors {
        eprintln!("❌ {}", error);
    }
    println!("🎉 Import for {} finished: {}", user, report);

    if report.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
